//! Role-gated access control for a school-management application.
//!
//! The crate is the in-process authorization layer sitting between a
//! hosting UI framework and two external collaborators: an identity
//! provider (credentials and sessions) and a profile store (one document
//! per user, carrying the declared role and activation status). Five
//! roles exist: learner, parent, educator, admin and principal.
//!
//! Three components make the render-vs-redirect decision for every
//! protected view:
//!
//! - [`access::SessionObserver`] mirrors the provider's session-change
//!   stream,
//! - [`access::RoleResolver`] turns a session into a fresh role fact,
//! - [`access::AccessGuard`] orders the checks and returns a loading
//!   state, the rendered view, or a redirect to the sign-in view.
//!
//! Around that core sit the flows that produce what the guard consumes:
//! account sign-up/sign-in/verification ([`access::AccountService`]),
//! administrative role and status management ([`access::AdminService`]),
//! and an audit trail ([`access::AuditLogger`]). In-memory
//! implementations of both collaborators back the test suites and demos.

pub mod access;
pub mod error;
