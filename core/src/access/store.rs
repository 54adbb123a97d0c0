//! Profile-store boundary.
//!
//! The profile store is the hosted document database holding one profile
//! per identity. Absence of a document is a valid outcome (`Ok(None)`),
//! kept strictly separate from transport failure (`Err(Unavailable)`) so
//! callers can tell a real absence from a retryable blip.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use classgate_core::access::{InMemoryProfileStore, Profile, ProfileStore, Role};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryProfileStore::new()
//!     .with_profile(Profile::new("u1", "thandi@school.example", Role::Admin));
//!
//! let store: Arc<dyn ProfileStore> = Arc::new(store);
//! assert!(store.get_profile_by_id("u1").await.unwrap().is_some());
//! assert!(store.get_profile_by_id("u2").await.unwrap().is_none());
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use derive_more::{Display, Error};

use crate::access::profile::Profile;

/// Errors surfaced by a profile store.
#[derive(Debug, Clone, Display, Error)]
pub enum StoreError {
    /// The store could not be reached. Retryable.
    #[display("profile store unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// A profile already exists for the identity.
    #[display("profile already exists")]
    AlreadyExists,
    /// No profile exists for the identity (write paths only; reads report
    /// absence as `Ok(None)`).
    #[display("profile not found")]
    NotFound,
    /// The store rejected the operation.
    #[display("profile store error: {_0}")]
    Internal(#[error(not(source))] String),
}

/// Read-only access to profile documents.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the single profile for an identity id.
    ///
    /// Returns `Ok(Some(profile))` if found, `Ok(None)` if no document
    /// exists, or `Err(...)` if the store could not be reached.
    async fn get_profile_by_id(&self, uid: &str) -> Result<Option<Profile>, StoreError>;
}

/// Extended store contract for flows that create and mutate profiles
/// (sign-up, email verification, administrative management).
#[async_trait]
pub trait ProfileManager: ProfileStore {
    /// Creates the profile document for a new identity.
    async fn create_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Replaces an existing profile document.
    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    /// Deletes a profile document. Administrative flows only.
    async fn delete_profile(&self, uid: &str) -> Result<(), StoreError>;

    /// Lists every profile document.
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;
}

/// In-memory profile store for tests and demos.
///
/// The outage switch makes every operation fail with
/// [`StoreError::Unavailable`] while set, to exercise retry paths.
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
    unavailable: AtomicBool,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        InMemoryProfileStore {
            profiles: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Seeds a profile (builder pattern).
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.get_uid().to_string(), profile);
        self
    }

    /// Switches the simulated outage on or off.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored profiles.
    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no profiles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile_by_id(&self, uid: &str) -> Result<Option<Profile>, StoreError> {
        self.check_available()?;
        Ok(self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned())
    }
}

#[async_trait]
impl ProfileManager for InMemoryProfileStore {
    async fn create_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.check_available()?;
        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if profiles.contains_key(profile.get_uid()) {
            return Err(StoreError::AlreadyExists);
        }
        profiles.insert(profile.get_uid().to_string(), profile.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.check_available()?;
        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !profiles.contains_key(profile.get_uid()) {
            return Err(StoreError::NotFound);
        }
        profiles.insert(profile.get_uid().to_string(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if profiles.remove(uid).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.check_available()?;
        let mut profiles: Vec<Profile> = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| {
            a.get_uid().cmp(b.get_uid())
        }));
        Ok(profiles)
    }
}
