//! Identity-provider boundary.
//!
//! The identity provider is an external collaborator: it owns credentials
//! and sessions, and pushes session-change notifications (sign-in,
//! sign-out, token refresh) to subscribed listeners. The crate consumes it
//! through [`IdentityProvider`] so that tests and demos can substitute the
//! in-memory implementation for the hosted service.
//!
//! # Example
//! ```
//! use classgate_core::access::{IdentityProvider, InMemoryIdentityProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = InMemoryIdentityProvider::new()
//!     .with_account("thandi@school.example", "secret", true);
//!
//! let session = provider
//!     .sign_in("thandi@school.example", "secret")
//!     .await
//!     .unwrap();
//! assert!(session.is_email_verified());
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use derive_more::{Display, Error};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::access::crypto::{NoOpPasswordEncoder, PasswordEncoder};
use crate::access::session::Session;

// =============================================================================
// Listener plumbing
// =============================================================================

/// Callback invoked with the new session state on every change.
pub type SessionListener = Arc<dyn Fn(Option<Session>) + Send + Sync>;

/// Registry of active listeners, shared between a provider and the
/// subscriptions it hands out.
pub type ListenerRegistry = Mutex<HashMap<u64, SessionListener>>;

/// Handle to an active session-change subscription.
///
/// Dropping the handle unsubscribes: the listener is removed from the
/// provider's registry and no further notifications are delivered.
pub struct SessionSubscription {
    listeners: Weak<ListenerRegistry>,
    id: u64,
}

impl SessionSubscription {
    /// Creates a subscription backed by a listener registry.
    pub fn new(listeners: Weak<ListenerRegistry>, id: u64) -> Self {
        SessionSubscription { listeners, id }
    }

    /// Creates a subscription with no registry behind it, for providers
    /// that manage listener lifetimes themselves.
    pub fn detached() -> Self {
        SessionSubscription {
            listeners: Weak::new(),
            id: 0,
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

// =============================================================================
// Provider contract
// =============================================================================

/// Errors surfaced by an identity provider.
#[derive(Debug, Clone, Display, Error)]
pub enum ProviderError {
    /// The session-change subscription could not be established.
    #[display("could not establish session subscription: {_0}")]
    SubscriptionFailed(#[error(not(source))] String),
    /// Email/password pair did not match an account.
    #[display("invalid email or password")]
    InvalidCredentials,
    /// An account already exists for the email.
    #[display("an account already exists for {_0}")]
    EmailAlreadyInUse(#[error(not(source))] String),
    /// No account exists for the email or identity id.
    #[display("no account exists for {_0}")]
    AccountNotFound(#[error(not(source))] String),
    /// The provider could not be reached.
    #[display("identity provider unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

/// Trait for the external identity service.
///
/// `subscribe` must deliver the current session state to a new listener as
/// its first notification, and invoke the listener again on every
/// subsequent sign-in, sign-out and token refresh. Multiple independent
/// listeners are supported.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribes to session changes. The returned handle unsubscribes on
    /// drop.
    fn subscribe(&self, listener: SessionListener) -> Result<SessionSubscription, ProviderError>;

    /// Returns the session currently held by the provider, if any.
    fn current_session(&self) -> Option<Session>;

    /// Authenticates an email/password pair and establishes a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// Tears down the current session.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Creates a new identity. On success the provider holds a session for
    /// the new identity, exactly as after a sign-in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// Requests a verification email for the identity.
    async fn send_verification_email(&self, uid: &str) -> Result<(), ProviderError>;

    /// Requests a password-reset email for the account.
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    /// Records that the identity confirmed ownership of its email. If a
    /// session for the identity is live, subscribers see a refreshed
    /// session with the flag set.
    async fn mark_email_verified(&self, uid: &str) -> Result<(), ProviderError>;
}

// =============================================================================
// In-memory provider
// =============================================================================

/// Kind of transactional email a provider sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
}

/// Record of a transactional email the in-memory provider "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub email: String,
    pub kind: EmailKind,
}

struct StoredAccount {
    uid: String,
    email: String,
    password_hash: String,
    email_verified: bool,
}

/// In-memory identity provider for tests and demos.
///
/// Keeps an account map with encoded passwords, issues sessions on
/// sign-in, and fans session changes out to all subscribed listeners
/// synchronously. Transactional emails are captured in an outbox rather
/// than delivered.
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    current: Mutex<Option<Session>>,
    listeners: Arc<ListenerRegistry>,
    next_listener_id: AtomicU64,
    outbox: Mutex<Vec<OutboundEmail>>,
    password_encoder: Arc<dyn PasswordEncoder>,
}

impl InMemoryIdentityProvider {
    /// Creates an empty provider with the no-op password encoder.
    pub fn new() -> Self {
        InMemoryIdentityProvider {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(1),
            outbox: Mutex::new(Vec::new()),
            password_encoder: Arc::new(NoOpPasswordEncoder),
        }
    }

    /// Sets the password encoder used to store and verify credentials.
    pub fn password_encoder<E: PasswordEncoder + 'static>(mut self, encoder: E) -> Self {
        self.password_encoder = Arc::new(encoder);
        self
    }

    /// Seeds an account (builder pattern). The password is encoded with
    /// the configured encoder.
    pub fn with_account(
        mut self,
        email: &str,
        password: &str,
        email_verified: bool,
    ) -> Self {
        let hash = self.password_encoder.encode(password);
        let account = StoredAccount {
            uid: random_uid(),
            email: email.to_string(),
            password_hash: hash,
            email_verified,
        };
        self.accounts
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(email.to_string(), account);
        self
    }

    /// Looks up the identity id assigned to a seeded account.
    pub fn uid_for(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .map(|a| a.uid.clone())
    }

    /// Number of live session-change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Transactional emails recorded so far, oldest first.
    pub fn sent_emails(&self) -> Vec<OutboundEmail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current(&self, session: Option<Session>) {
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = session.clone();
        self.notify(session);
    }

    fn notify(&self, session: Option<Session>) {
        // Snapshot the listener set first so a callback that drops its own
        // subscription does not deadlock against the registry lock.
        let listeners: Vec<SessionListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(session.clone());
        }
    }

    fn record_email(&self, email: &str, kind: EmailKind) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OutboundEmail {
                email: email.to_string(),
                kind,
            });
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn subscribe(&self, listener: SessionListener) -> Result<SessionSubscription, ProviderError> {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener.clone());

        // New subscribers learn the current state immediately; this is the
        // initial notification that ends a fresh observer's resolving
        // phase.
        listener(self.current_session());

        Ok(SessionSubscription::new(Arc::downgrade(&self.listeners), id))
    }

    fn current_session(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let session = {
            let accounts = self
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get(email)
                .ok_or(ProviderError::InvalidCredentials)?;
            if !self
                .password_encoder
                .matches(password, &account.password_hash)
            {
                return Err(ProviderError::InvalidCredentials);
            }
            Session::new(&account.uid, &account.email, account.email_verified)
        };

        self.set_current(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.set_current(None);
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let session = {
            let mut accounts = self
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(email) {
                return Err(ProviderError::EmailAlreadyInUse(email.to_string()));
            }
            let account = StoredAccount {
                uid: random_uid(),
                email: email.to_string(),
                password_hash: self.password_encoder.encode(password),
                email_verified: false,
            };
            let session = Session::new(&account.uid, &account.email, false);
            accounts.insert(email.to_string(), account);
            session
        };

        self.set_current(Some(session.clone()));
        Ok(session)
    }

    async fn send_verification_email(&self, uid: &str) -> Result<(), ProviderError> {
        let email = self.email_for_uid(uid)?;
        self.record_email(&email, EmailKind::Verification);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let known = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(email);
        if !known {
            return Err(ProviderError::AccountNotFound(email.to_string()));
        }
        self.record_email(email, EmailKind::PasswordReset);
        Ok(())
    }

    async fn mark_email_verified(&self, uid: &str) -> Result<(), ProviderError> {
        let email = {
            let mut accounts = self
                .accounts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .values_mut()
                .find(|a| a.uid == uid)
                .ok_or_else(|| ProviderError::AccountNotFound(uid.to_string()))?;
            account.email_verified = true;
            account.email.clone()
        };

        // A live session for this identity is refreshed in place, which
        // subscribers observe as a token-refresh notification.
        let refreshed = {
            let current = self
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match current.as_ref() {
                Some(s) if s.get_uid() == uid => Some(Session::new(uid, &email, true)),
                _ => None,
            }
        };
        if let Some(session) = refreshed {
            self.set_current(Some(session));
        }
        Ok(())
    }
}

impl InMemoryIdentityProvider {
    fn email_for_uid(&self, uid: &str) -> Result<String, ProviderError> {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|a| a.uid == uid)
            .map(|a| a.email.clone())
            .ok_or_else(|| ProviderError::AccountNotFound(uid.to_string()))
    }
}

fn random_uid() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(28)
        .map(char::from)
        .collect()
}
