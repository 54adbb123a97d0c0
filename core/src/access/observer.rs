//! Live session state.
//!
//! The [`SessionObserver`] subscribes to the identity provider's
//! session-change stream and exposes the current session, an initial
//! resolving flag, and a subscription error to the rest of the
//! application. Components that only need to branch on sign-in state (a
//! navigation bar, for instance) read through a cloned [`SessionHandle`]
//! without enforcing any redirect.
//!
//! # Example
//! ```
//! use classgate_core::access::{IdentityProvider, InMemoryIdentityProvider, SessionObserver};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = InMemoryIdentityProvider::new()
//!     .with_account("thandi@school.example", "secret", true);
//!
//! let observer = SessionObserver::attach(&provider);
//! assert!(!observer.snapshot().is_resolving);
//! assert!(observer.session().is_none());
//!
//! provider.sign_in("thandi@school.example", "secret").await.unwrap();
//! assert!(observer.session().is_some());
//! # }
//! ```

use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::access::provider::{IdentityProvider, SessionSubscription};
use crate::access::session::Session;
use crate::error::AccessError;

#[derive(Debug)]
struct ObserverState {
    session: Option<Session>,
    is_resolving: bool,
    error: Option<AccessError>,
}

/// Point-in-time view of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// The current session, if anyone is signed in.
    pub session: Option<Session>,
    /// True from subscription start until the first notification arrives.
    /// Later changes are instantaneous updates to `session`; this flag
    /// never flips back to true.
    pub is_resolving: bool,
    /// Set when the subscription itself could not be established.
    pub error: Option<AccessError>,
}

/// Cheap cloneable read accessor for the observed session state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<ObserverState>>,
}

impl SessionHandle {
    /// Returns the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        SessionSnapshot {
            session: state.session.clone(),
            is_resolving: state.is_resolving,
            error: state.error,
        }
    }

    /// Returns the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .clone()
    }

    /// Whether the initial session resolution is still in flight.
    pub fn is_resolving(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_resolving
    }
}

/// Subscribes to an identity provider and mirrors its session state.
///
/// Dropping the observer tears the subscription down; the provider stops
/// delivering notifications and the internal listener holds only a weak
/// reference, so no callback can outlive the observer's state.
pub struct SessionObserver {
    state: Arc<RwLock<ObserverState>>,
    _subscription: Option<SessionSubscription>,
}

impl SessionObserver {
    /// Attaches to a provider's session-change stream.
    ///
    /// The returned observer starts in the resolving phase; the provider's
    /// initial notification ends it. If the subscription cannot be
    /// established the observer carries
    /// [`AccessError::SessionSubscriptionFailure`] instead, with no
    /// session and resolving over.
    pub fn attach(provider: &dyn IdentityProvider) -> Self {
        let state = Arc::new(RwLock::new(ObserverState {
            session: None,
            is_resolving: true,
            error: None,
        }));

        let sink: Weak<RwLock<ObserverState>> = Arc::downgrade(&state);
        let result = provider.subscribe(Arc::new(move |session| {
            if let Some(state) = sink.upgrade() {
                let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
                state.session = session;
                state.is_resolving = false;
            }
        }));

        match result {
            Ok(subscription) => SessionObserver {
                state,
                _subscription: Some(subscription),
            },
            Err(_) => {
                {
                    let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
                    state.session = None;
                    state.is_resolving = false;
                    state.error = Some(AccessError::SessionSubscriptionFailure);
                }
                SessionObserver {
                    state,
                    _subscription: None,
                }
            }
        }
    }

    /// Returns a cloneable read accessor onto this observer's state.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle().snapshot()
    }

    /// Returns the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.handle().session()
    }
}
