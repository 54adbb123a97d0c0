//! Account lifecycle flows.
//!
//! Sign-up, sign-in/out, email verification and password reset. These are
//! the producers of the session-change notifications and profile
//! documents the access guard consumes: sign-up creates exactly one
//! profile per identity, and the email-verification flow is the only
//! non-administrative path that activates a pending profile.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use classgate_core::access::{
//!     AccountService, ActivationStatus, InMemoryIdentityProvider, InMemoryProfileStore,
//!     Role, SignUpRequest,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = Arc::new(InMemoryIdentityProvider::new());
//! let profiles = Arc::new(InMemoryProfileStore::new());
//! let accounts = AccountService::new(provider, profiles);
//!
//! let profile = accounts
//!     .sign_up(SignUpRequest {
//!         email: "naledi@school.example".to_string(),
//!         password: "strong-enough".to_string(),
//!         confirm_password: "strong-enough".to_string(),
//!         display_name: "Naledi Mokoena".to_string(),
//!         role: Role::Learner,
//!     })
//!     .await
//!     .unwrap();
//!
//! // Learners are activated at creation.
//! assert_eq!(profile.get_status(), ActivationStatus::Active);
//! # }
//! ```

use std::sync::Arc;

use derive_more::{Display, Error, From};
use regex::Regex;
use serde::Deserialize;

use crate::access::audit::{AccessEvent, AuditLogger};
use crate::access::profile::Profile;
use crate::access::provider::{IdentityProvider, ProviderError};
use crate::access::role::{ActivationStatus, Role};
use crate::access::session::Session;
use crate::access::store::{ProfileManager, StoreError};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const MIN_PASSWORD_LEN: usize = 6;

/// Errors surfaced by the account flows.
#[derive(Debug, Display, Error, From)]
pub enum AccountError {
    #[display("passwords do not match")]
    PasswordMismatch,
    #[display("password must be at least 6 characters")]
    WeakPassword,
    #[display("invalid email address")]
    InvalidEmail,
    #[display("display name must not be empty")]
    MissingDisplayName,
    #[display("nobody is signed in")]
    NotSignedIn,
    #[display("no profile exists for this account")]
    ProfileMissing,
    #[display("identity provider error: {_0}")]
    #[from]
    Provider(ProviderError),
    #[display("profile store error: {_0}")]
    #[from]
    Store(StoreError),
}

/// A sign-up form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
    pub role: Role,
}

/// Orchestrates the account lifecycle against the identity provider and
/// the profile store.
pub struct AccountService {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileManager>,
    audit: AuditLogger,
    email_format: Regex,
}

impl AccountService {
    /// Creates the service with a disabled audit logger.
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileManager>) -> Self {
        AccountService {
            provider,
            profiles,
            audit: AuditLogger::new(),
            email_format: Regex::new(EMAIL_PATTERN).expect("valid email pattern"),
        }
    }

    /// Sets the audit logger (builder pattern).
    pub fn audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    /// Registers a new user.
    ///
    /// Creates the identity, writes its profile document, and requests a
    /// verification email for every role except `learner` (learner
    /// accounts are activated immediately). The fresh identity is signed
    /// out again: registering does not leave a live session behind.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Profile, AccountError> {
        self.validate(&request)?;

        let session = self
            .provider
            .create_account(&request.email, &request.password)
            .await?;
        let uid = session.get_uid().to_string();

        let profile = Profile::new(&uid, &request.email, request.role)
            .display_name(request.display_name.trim());
        self.profiles.create_profile(&profile).await?;
        self.audit
            .log(AccessEvent::profile_created(&uid, request.role));

        if request.role != Role::Learner {
            self.provider.send_verification_email(&uid).await?;
            self.audit.log(AccessEvent::verification_email_sent(&uid));
        }

        self.provider.sign_out().await?;
        self.audit
            .log(AccessEvent::sign_up_completed(&uid, request.role));
        Ok(profile)
    }

    /// Authenticates an email/password pair.
    ///
    /// When the identity's email has been verified but its profile is
    /// still `pending`, sign-in promotes the profile to `active`. The
    /// promotion is best-effort: a store hiccup does not fail a sign-in
    /// the provider already accepted.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let session = match self.provider.sign_in(email, password).await {
            Ok(session) => session,
            Err(err) => {
                self.audit.log(AccessEvent::sign_in_failure(email));
                return Err(err.into());
            }
        };

        if session.is_email_verified() {
            self.promote_if_pending(&session).await;
        }

        self.audit
            .log(AccessEvent::sign_in_success(session.get_uid(), email));
        Ok(session)
    }

    /// Tears down the current session.
    pub async fn sign_out(&self) -> Result<(), AccountError> {
        let uid = self.provider.current_session().map(|s| s.get_uid().to_string());
        self.provider.sign_out().await?;
        if let Some(uid) = uid {
            self.audit.log(AccessEvent::sign_out(&uid));
        }
        Ok(())
    }

    /// Re-requests the verification email for the signed-in identity.
    ///
    /// This is the user-actionable half of the unverified-email denial.
    pub async fn resend_verification(&self) -> Result<(), AccountError> {
        let session = self
            .provider
            .current_session()
            .ok_or(AccountError::NotSignedIn)?;
        self.provider
            .send_verification_email(session.get_uid())
            .await?;
        self.audit
            .log(AccessEvent::verification_email_sent(session.get_uid()));
        Ok(())
    }

    /// Requests a password-reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        self.provider.send_password_reset(email).await?;
        self.audit
            .log(AccessEvent::password_reset_requested(email));
        Ok(())
    }

    /// Completes the email-verification flow for an identity: the
    /// provider records the confirmed email, and the profile mirrors it
    /// and becomes `active`.
    pub async fn complete_email_verification(&self, uid: &str) -> Result<(), AccountError> {
        self.provider.mark_email_verified(uid).await?;

        let mut profile = self
            .profiles
            .get_profile_by_id(uid)
            .await?
            .ok_or(AccountError::ProfileMissing)?;
        profile.set_status(ActivationStatus::Active);
        profile.mark_email_verified();
        self.profiles.update_profile(&profile).await?;

        self.audit.log(AccessEvent::email_verified(uid));
        Ok(())
    }

    async fn promote_if_pending(&self, session: &Session) {
        if let Ok(Some(mut profile)) = self.profiles.get_profile_by_id(session.get_uid()).await {
            if profile.get_status() == ActivationStatus::Pending {
                let from = profile.get_status();
                profile.set_status(ActivationStatus::Active);
                profile.mark_email_verified();
                if self.profiles.update_profile(&profile).await.is_ok() {
                    self.audit.log(AccessEvent::status_changed(
                        session.get_uid(),
                        session.get_uid(),
                        from,
                        ActivationStatus::Active,
                    ));
                }
            }
        }
    }

    fn validate(&self, request: &SignUpRequest) -> Result<(), AccountError> {
        if request.password != request.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::WeakPassword);
        }
        if !self.email_format.is_match(&request.email) {
            return Err(AccountError::InvalidEmail);
        }
        if request.display_name.trim().is_empty() {
            return Err(AccountError::MissingDisplayName);
        }
        Ok(())
    }
}
