//! Administrative user management.
//!
//! Role and status changes, user creation and deletion, performed on
//! behalf of an authenticated administrative actor. This module is the
//! only place a declared role ever changes and the only place a profile
//! is ever deleted: holders cannot change their own role, and nothing
//! else in the crate deletes documents.
//!
//! Every operation takes the actor's profile as evidence of who is
//! acting; callers obtain it from a guard evaluation or a fresh resolver
//! lookup, never from user input.

use std::sync::Arc;

use derive_more::{Display, Error, From};

use crate::access::audit::{AccessEvent, AuditLogger};
use crate::access::profile::Profile;
use crate::access::provider::{IdentityProvider, ProviderError};
use crate::access::role::{ActivationStatus, Role};
use crate::access::store::{ProfileManager, StoreError};

/// Errors surfaced by administrative operations.
#[derive(Debug, Display, Error, From)]
pub enum AdminError {
    /// The actor does not hold an active administrative role.
    #[display("administrative role required")]
    NotAuthorized,
    /// An actor may not change their own declared role.
    #[display("own role cannot be changed")]
    SelfRoleChange,
    /// No profile exists for the target identity.
    #[display("no profile exists for the target user")]
    TargetNotFound,
    #[display("identity provider error: {_0}")]
    #[from]
    Provider(ProviderError),
    #[display("profile store error: {_0}")]
    #[from]
    Store(StoreError),
}

/// A user record an administrator creates directly.
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    pub email: String,
    /// Temporary password the user is expected to reset.
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

/// Administrative operations over profiles.
pub struct AdminService {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileManager>,
    audit: AuditLogger,
}

impl AdminService {
    /// Creates the service with a disabled audit logger.
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileManager>) -> Self {
        AdminService {
            provider,
            profiles,
            audit: AuditLogger::new(),
        }
    }

    /// Sets the audit logger (builder pattern).
    pub fn audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    /// Changes a user's declared role.
    pub async fn set_role(
        &self,
        actor: &Profile,
        uid: &str,
        role: Role,
    ) -> Result<Profile, AdminError> {
        self.ensure_administrative(actor)?;
        if actor.get_uid() == uid {
            return Err(AdminError::SelfRoleChange);
        }

        let mut profile = self.fetch(uid).await?;
        let from = profile.get_role();
        profile.set_role(role);
        self.profiles.update_profile(&profile).await?;

        self.audit
            .log(AccessEvent::role_changed(uid, actor.get_uid(), from, role));
        Ok(profile)
    }

    /// Changes a user's activation status.
    pub async fn set_status(
        &self,
        actor: &Profile,
        uid: &str,
        status: ActivationStatus,
    ) -> Result<Profile, AdminError> {
        self.ensure_administrative(actor)?;

        let mut profile = self.fetch(uid).await?;
        let from = profile.get_status();
        profile.set_status(status);
        self.profiles.update_profile(&profile).await?;

        self.audit.log(AccessEvent::status_changed(
            uid,
            actor.get_uid(),
            from,
            status,
        ));
        Ok(profile)
    }

    /// Creates a user on behalf of an administrator.
    ///
    /// Same rules as self-service sign-up: learners are activated at
    /// creation, everyone else starts pending and receives a verification
    /// email. The provider signs in as the identity it creates, so the
    /// flow signs out again before returning.
    pub async fn create_user(
        &self,
        actor: &Profile,
        request: NewUserRequest,
    ) -> Result<Profile, AdminError> {
        self.ensure_administrative(actor)?;

        let session = self
            .provider
            .create_account(&request.email, &request.password)
            .await?;
        let uid = session.get_uid().to_string();

        let profile = Profile::new(&uid, &request.email, request.role)
            .display_name(request.display_name.trim());
        self.profiles.create_profile(&profile).await?;

        if request.role != Role::Learner {
            self.provider.send_verification_email(&uid).await?;
        }
        self.provider.sign_out().await?;

        self.audit.log(
            AccessEvent::profile_created(&uid, request.role).detail("actor", actor.get_uid()),
        );
        Ok(profile)
    }

    /// Deletes a user's profile. The only deletion path in the crate.
    pub async fn delete_user(&self, actor: &Profile, uid: &str) -> Result<(), AdminError> {
        self.ensure_administrative(actor)?;

        match self.profiles.delete_profile(uid).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(AdminError::TargetNotFound),
            Err(err) => return Err(err.into()),
        }

        self.audit
            .log(AccessEvent::profile_deleted(uid, actor.get_uid()));
        Ok(())
    }

    /// Lists every profile.
    pub async fn list_users(&self, actor: &Profile) -> Result<Vec<Profile>, AdminError> {
        self.ensure_administrative(actor)?;
        Ok(self.profiles.list_profiles().await?)
    }

    fn ensure_administrative(&self, actor: &Profile) -> Result<(), AdminError> {
        if actor.get_role().is_administrative() && actor.is_active() {
            Ok(())
        } else {
            Err(AdminError::NotAuthorized)
        }
    }

    async fn fetch(&self, uid: &str) -> Result<Profile, AdminError> {
        self.profiles
            .get_profile_by_id(uid)
            .await?
            .ok_or(AdminError::TargetNotFound)
    }
}
