//! Access-control and identity layer.
//!
//! # Module Structure
//!
//! - `role` - the closed role and activation-status model
//! - `session` - session references issued by the identity provider
//! - `profile` - the persisted user record
//! - `provider` - identity-provider boundary (subscriptions, sign-in/out)
//! - `store` - profile-store boundary (document reads and writes)
//! - `observer` - live session state (`SessionObserver`, `SessionHandle`)
//! - `resolver` - fresh session-to-role resolution with retry policy
//! - `guard` - the render-vs-redirect authorization checkpoint
//! - `accounts` - sign-up, sign-in, verification and reset flows
//! - `admin` - administrative role/status management
//! - `audit` - access audit trail
//! - `crypto` - password encoding for the in-memory provider

// Re-exports for convenience
pub use crate::error::AccessError;

pub use accounts::{AccountError, AccountService, SignUpRequest};
pub use admin::{AdminError, AdminService, NewUserRequest};
pub use audit::{
    AccessEvent, AccessEventHandler, AccessEventSeverity, AccessEventType, AuditLogger,
    InMemoryEventStore, StdoutHandler,
};
pub use crypto::{Argon2PasswordEncoder, NoOpPasswordEncoder, PasswordEncoder};
pub use guard::{
    AccessDecision, AccessGuard, DenialMessage, GuardOutcome, GuardState, MismatchKind, Redirect,
};
pub use observer::{SessionHandle, SessionObserver, SessionSnapshot};
pub use profile::Profile;
pub use provider::{
    EmailKind, IdentityProvider, InMemoryIdentityProvider, ListenerRegistry, OutboundEmail,
    ProviderError, SessionListener, SessionSubscription,
};
pub use resolver::{LookupFailed, Resolution, RetryConfig, RoleFact, RoleResolver};
pub use role::{ActivationStatus, ParseRoleError, ParseStatusError, Role};
pub use session::Session;
pub use store::{InMemoryProfileStore, ProfileManager, ProfileStore, StoreError};

pub mod accounts;
pub mod admin;
pub mod audit;
pub mod crypto;
pub mod guard;
pub mod observer;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod session;
pub mod store;
