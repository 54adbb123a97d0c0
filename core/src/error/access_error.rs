use derive_more::{Display, Error};

/// The closed error taxonomy the access guard decides on.
///
/// Identity-provider and profile-store failures are translated into these
/// variants at the session-observer / role-resolver boundary; the guard
/// never handles raw backend errors directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum AccessError {
    /// The profile store could not be reached. Retryable; degrades to a
    /// visible "unable to verify access" state once retries are
    /// exhausted, which is distinct from an access denial.
    #[display("unable to verify access")]
    TransientLookupFailure,
    /// No profile document exists for the identity. A real absence, not
    /// retryable; surfaced as an authorization denial.
    #[display("no profile exists for this account")]
    ProfileNotFound,
    /// The identity has not confirmed ownership of its email address.
    #[display("email address has not been verified")]
    UnverifiedEmail,
    /// The session-change subscription could not be established. Fatal:
    /// without it no authorization decision can be trusted.
    #[display("session subscription failed")]
    SessionSubscriptionFailure,
}
