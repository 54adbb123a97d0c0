//! The access guard.
//!
//! Every protected view passes through [`AccessGuard::guard`], the single
//! authorization checkpoint. The guard reads the observed session, asks
//! the resolver for a fresh role fact, and decides render-vs-redirect.
//! It is pure with respect to sessions and profiles: it mutates neither,
//! and a denial's only effect is the redirect instruction it returns.
//!
//! Evaluation order, first matching rule wins:
//!
//! 1. Session still resolving -> neutral loading outcome, so a page load
//!    never flash-redirects to sign-in before the session is known.
//! 2. No session -> redirect to sign-in (the resolver is never invoked).
//! 3. Email not verified -> redirect to sign-in with a verify prompt,
//!    regardless of any profile state.
//! 4. Missing profile, or a non-learner profile that is not active ->
//!    redirect to sign-in.
//! 5. Required role differs from the declared role -> redirect to
//!    sign-in.
//! 6. Otherwise render the wrapped view.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use classgate_core::access::{
//!     AccessGuard, IdentityProvider, InMemoryIdentityProvider, InMemoryProfileStore,
//!     Profile, Role, RoleResolver, SessionObserver,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = InMemoryIdentityProvider::new()
//!     .with_account("thandi@school.example", "secret", true);
//! let uid = provider.uid_for("thandi@school.example").unwrap();
//!
//! let mut profile = Profile::new(&uid, "thandi@school.example", Role::Admin);
//! profile.set_status(classgate_core::access::ActivationStatus::Active);
//! let store = Arc::new(InMemoryProfileStore::new().with_profile(profile));
//!
//! let observer = SessionObserver::attach(&provider);
//! let guard = AccessGuard::new(observer.handle(), RoleResolver::new(store));
//!
//! provider.sign_in("thandi@school.example", "secret").await.unwrap();
//!
//! let outcome = guard
//!     .guard(Some(Role::Admin), || Box::pin(async { "admin dashboard" }))
//!     .await;
//! assert!(outcome.is_render());
//! # }
//! ```

use futures_util::future::LocalBoxFuture;

use crate::access::observer::SessionHandle;
use crate::access::resolver::{Resolution, RetryConfig, RoleFact, RoleResolver};
use crate::access::role::Role;
use crate::error::AccessError;

// =============================================================================
// Decisions and outcomes
// =============================================================================

/// The ephemeral authorization decision computed per evaluation. Never
/// persisted; recomputed on every navigation and session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    DenyUnauthenticated,
    DenyUnverified,
    DenyWrongRole,
}

/// Why a role-gated evaluation fell through to a wrong-role denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// No profile document exists for the identity.
    MissingProfile,
    /// The profile exists but has not been activated (and is not a
    /// learner, which is exempt from activation gating).
    NotActive,
    /// The declared role differs from the required role.
    WrongRole,
}

/// Terminal state of one guard evaluation.
///
/// Each evaluation starts at `Resolving` and ends in exactly one of the
/// other states; the next navigation or session change begins a fresh
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The initial session resolution has not completed yet.
    Resolving,
    /// Nobody is signed in.
    Unauthenticated,
    /// The identity has not confirmed ownership of its email.
    Unverified,
    /// The identity holds no authorized role for this view.
    RoleMismatch(MismatchKind),
    /// The identity may see the view; carries the resolved fact.
    Authorized(RoleFact),
}

impl GuardState {
    /// The access decision this state corresponds to, if the evaluation
    /// got far enough to make one.
    pub fn decision(&self) -> Option<AccessDecision> {
        match self {
            GuardState::Resolving => None,
            GuardState::Unauthenticated => Some(AccessDecision::DenyUnauthenticated),
            GuardState::Unverified => Some(AccessDecision::DenyUnverified),
            GuardState::RoleMismatch(_) => Some(AccessDecision::DenyWrongRole),
            GuardState::Authorized(_) => Some(AccessDecision::Allow),
        }
    }
}

/// Message shown on the sign-in view after a denial.
///
/// Every denial lands on the same sign-in target; the denial kind only
/// changes what the user is told there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialMessage {
    SignInRequired,
    VerifyEmail,
    AccountNotActive,
    AccessDenied,
}

impl DenialMessage {
    /// User-facing text for the sign-in view.
    pub fn as_user_text(&self) -> &'static str {
        match self {
            DenialMessage::SignInRequired => "Please sign in to continue.",
            DenialMessage::VerifyEmail => {
                "Please verify your email address, then sign in again. \
                 You can request a new verification email below."
            }
            DenialMessage::AccountNotActive => "Your account is not yet active.",
            DenialMessage::AccessDenied => "You are not authorized to view this page.",
        }
    }
}

/// Redirect instruction handed to the hosting framework.
///
/// The host must *replace* the current navigation entry rather than push
/// a new one, so the denied destination is not reachable via
/// back-navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    target: String,
    message: DenialMessage,
    decision: AccessDecision,
}

impl Redirect {
    /// Navigation target, always the sign-in view.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Message to surface on the target view.
    pub fn message(&self) -> DenialMessage {
        self.message
    }

    /// The decision that produced this redirect.
    pub fn decision(&self) -> AccessDecision {
        self.decision
    }

    /// Redirects replace the current navigation entry.
    pub fn replaces_entry(&self) -> bool {
        true
    }
}

/// What one guard evaluation produced for the hosting framework.
#[derive(Debug)]
pub enum GuardOutcome<V> {
    /// The session is still resolving; show a neutral loading state, no
    /// content and no redirect.
    Loading,
    /// Access granted; the wrapped view, rendered.
    Render(V),
    /// Access denied; navigate to the sign-in view.
    Redirect(Redirect),
    /// Access could not be verified at all. Distinct from a denial: shown
    /// as "unable to verify access, try again", not as a sign-in prompt.
    Unavailable(AccessError),
}

impl<V> GuardOutcome<V> {
    /// Whether the wrapped view was rendered.
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutcome::Render(_))
    }

    /// The redirect instruction, if access was denied.
    pub fn as_redirect(&self) -> Option<&Redirect> {
        match self {
            GuardOutcome::Redirect(redirect) => Some(redirect),
            _ => None,
        }
    }

    /// The decision made, if the evaluation reached one.
    pub fn decision(&self) -> Option<AccessDecision> {
        match self {
            GuardOutcome::Loading | GuardOutcome::Unavailable(_) => None,
            GuardOutcome::Render(_) => Some(AccessDecision::Allow),
            GuardOutcome::Redirect(redirect) => Some(redirect.decision()),
        }
    }
}

// =============================================================================
// The guard
// =============================================================================

/// The authorization checkpoint wrapping every protected view.
///
/// One guard instance per protected view is fine: each holds only a cheap
/// session handle, and the underlying provider supports any number of
/// independent listeners.
pub struct AccessGuard {
    sessions: SessionHandle,
    resolver: RoleResolver,
    retry: RetryConfig,
    sign_in_target: String,
}

impl AccessGuard {
    /// Creates a guard with the default sign-in target (`/login`) and
    /// retry policy.
    pub fn new(sessions: SessionHandle, resolver: RoleResolver) -> Self {
        AccessGuard {
            sessions,
            resolver,
            retry: RetryConfig::default(),
            sign_in_target: "/login".to_string(),
        }
    }

    /// Sets the sign-in view every denial redirects to.
    pub fn sign_in_target(mut self, target: &str) -> Self {
        self.sign_in_target = target.to_string();
        self
    }

    /// Sets the retry policy for transient profile-lookup failures.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Runs one evaluation and returns its terminal state.
    ///
    /// `Err(TransientLookupFailure)` means the retry budget ran out before
    /// the store answered; `Err(SessionSubscriptionFailure)` means no
    /// session state can be trusted at all. Neither is a denial.
    ///
    /// A session change while a lookup is in flight discards that
    /// lookup's result and restarts the evaluation, so the decision
    /// always reflects the most recent session. Dropping the returned
    /// future (the view was unmounted) cancels the pending lookup.
    pub async fn evaluate(&self, required_role: Option<Role>) -> Result<GuardState, AccessError> {
        loop {
            let snapshot = self.sessions.snapshot();
            if let Some(error) = snapshot.error {
                return Err(error);
            }
            if snapshot.is_resolving {
                return Ok(GuardState::Resolving);
            }
            let session = match snapshot.session {
                Some(session) => session,
                None => return Ok(GuardState::Unauthenticated),
            };
            if !session.is_email_verified() {
                return Ok(GuardState::Unverified);
            }

            let issued_for = session.get_uid().to_string();
            let resolution = self.resolver.resolve_with_retry(&session, &self.retry).await;

            // The session may have changed while the lookup was in
            // flight; a fact fetched for a previous identity must not
            // decide access for the current one.
            let still_current = self
                .sessions
                .session()
                .map(|current| current.get_uid() == issued_for)
                .unwrap_or(false);
            if !still_current {
                continue;
            }

            let fact = match resolution {
                Err(_) => return Err(AccessError::TransientLookupFailure),
                Ok(Resolution::NotFound) => {
                    return Ok(GuardState::RoleMismatch(MismatchKind::MissingProfile))
                }
                Ok(Resolution::Resolved(fact)) => fact,
            };

            if !fact.status.is_active() && fact.role != Role::Learner {
                return Ok(GuardState::RoleMismatch(MismatchKind::NotActive));
            }
            if let Some(required) = required_role {
                if required != fact.role {
                    return Ok(GuardState::RoleMismatch(MismatchKind::WrongRole));
                }
            }
            return Ok(GuardState::Authorized(fact));
        }
    }

    /// Evaluates access and, when authorized, renders the wrapped view.
    ///
    /// # Arguments
    /// * `required_role` - the role the view demands, or `None` for views
    ///   that only require authentication
    /// * `view` - deferred view construction; only invoked on allow
    pub async fn guard<V>(
        &self,
        required_role: Option<Role>,
        view: impl FnOnce() -> LocalBoxFuture<'static, V>,
    ) -> GuardOutcome<V> {
        match self.evaluate(required_role).await {
            Err(error) => GuardOutcome::Unavailable(error),
            Ok(GuardState::Resolving) => GuardOutcome::Loading,
            Ok(GuardState::Unauthenticated) => {
                self.deny(AccessDecision::DenyUnauthenticated, DenialMessage::SignInRequired)
            }
            Ok(GuardState::Unverified) => {
                self.deny(AccessDecision::DenyUnverified, DenialMessage::VerifyEmail)
            }
            Ok(GuardState::RoleMismatch(kind)) => {
                let message = match kind {
                    MismatchKind::NotActive => DenialMessage::AccountNotActive,
                    MismatchKind::MissingProfile | MismatchKind::WrongRole => {
                        DenialMessage::AccessDenied
                    }
                };
                self.deny(AccessDecision::DenyWrongRole, message)
            }
            Ok(GuardState::Authorized(_)) => GuardOutcome::Render(view().await),
        }
    }

    fn deny<V>(&self, decision: AccessDecision, message: DenialMessage) -> GuardOutcome<V> {
        GuardOutcome::Redirect(Redirect {
            target: self.sign_in_target.clone(),
            message,
            decision,
        })
    }
}
