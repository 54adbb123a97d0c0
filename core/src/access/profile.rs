//! Profile model.
//!
//! A profile is the application-level user record held in the profile
//! store, one document per identity, keyed by the identity id. It carries
//! the declared role and the activation status the access guard decides
//! on.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::access::role::{ActivationStatus, Role};

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The application's persisted record describing a user.
///
/// A profile must exist for every identity that completed sign-up. The
/// role is immutable by its holder; only administrative flows change it.
///
/// Learners are auto-activated at creation: a learner profile starts
/// `active` with the email-verified mirror already set, every other role
/// starts `pending` until the email-verification flow completes.
///
/// # Example
/// ```
/// use classgate_core::access::{ActivationStatus, Profile, Role};
///
/// let profile = Profile::new("uid-1", "pieter@school.example", Role::Parent)
///     .display_name("Pieter van Wyk");
///
/// assert_eq!(profile.get_status(), ActivationStatus::Pending);
/// assert!(!profile.is_email_verified());
///
/// let learner = Profile::new("uid-2", "naledi@school.example", Role::Learner);
/// assert_eq!(learner.get_status(), ActivationStatus::Active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    uid: String,
    email: String,
    #[serde(default)]
    display_name: String,
    role: Role,
    status: ActivationStatus,
    email_verified: bool,
    created_at: u64,
    updated_at: u64,
}

impl Profile {
    /// Creates a fresh profile for a newly signed-up identity.
    pub fn new(uid: &str, email: &str, role: Role) -> Self {
        let now = epoch_millis();
        let learner = role == Role::Learner;
        Profile {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: String::new(),
            role,
            status: if learner {
                ActivationStatus::Active
            } else {
                ActivationStatus::Pending
            },
            email_verified: learner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display name (builder pattern).
    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    /// Returns the identity id this profile belongs to.
    pub fn get_uid(&self) -> &str {
        &self.uid
    }

    /// Returns the email recorded at sign-up.
    pub fn get_email(&self) -> &str {
        &self.email
    }

    /// Returns the display name.
    pub fn get_display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the declared role.
    pub fn get_role(&self) -> Role {
        self.role
    }

    /// Returns the activation status.
    pub fn get_status(&self) -> ActivationStatus {
        self.status
    }

    /// Returns the email-verified mirror flag.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    /// Creation time, in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Last-update time, in milliseconds since the Unix epoch.
    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Whether the profile has been activated.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Changes the declared role. Administrative flows only.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.touch();
    }

    /// Changes the activation status.
    pub fn set_status(&mut self, status: ActivationStatus) {
        self.status = status;
        self.touch();
    }

    /// Sets the email-verified mirror flag.
    pub fn mark_email_verified(&mut self) {
        self.email_verified = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = epoch_millis();
    }
}
