//! Access audit trail.
//!
//! Records the security-relevant moments of the account lifecycle:
//! sign-ins and failures, sign-ups, verification traffic, and every
//! administrative mutation of a profile. The guard itself never logs (it
//! is side-effect free); the account and admin services do, and hosts may
//! record guard outcomes with the granted/denied constructors if they
//! choose to.
//!
//! The logger is passed explicitly wherever it is needed, so tests swap
//! in a capturing handler instead of fishing events out of process-wide
//! state.
//!
//! # Example
//! ```
//! use classgate_core::access::{AccessEvent, AuditLogger, InMemoryEventStore};
//!
//! let store = InMemoryEventStore::new();
//! let logger = AuditLogger::new().with_handler(store.clone());
//!
//! logger.log(AccessEvent::sign_in_success("u1", "thandi@school.example"));
//! assert_eq!(store.events().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::access::profile::epoch_millis;
use crate::access::role::{ActivationStatus, Role};

// =============================================================================
// Events
// =============================================================================

/// Kinds of audited events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventType {
    SignInSuccess,
    SignInFailure,
    SignOut,
    SignUpCompleted,
    VerificationEmailSent,
    EmailVerified,
    PasswordResetRequested,
    ProfileCreated,
    ProfileDeleted,
    RoleChanged,
    StatusChanged,
    AccessGranted,
    AccessDenied,
}

impl fmt::Display for AccessEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessEventType::SignInSuccess => "SIGN_IN_SUCCESS",
            AccessEventType::SignInFailure => "SIGN_IN_FAILURE",
            AccessEventType::SignOut => "SIGN_OUT",
            AccessEventType::SignUpCompleted => "SIGN_UP_COMPLETED",
            AccessEventType::VerificationEmailSent => "VERIFICATION_EMAIL_SENT",
            AccessEventType::EmailVerified => "EMAIL_VERIFIED",
            AccessEventType::PasswordResetRequested => "PASSWORD_RESET_REQUESTED",
            AccessEventType::ProfileCreated => "PROFILE_CREATED",
            AccessEventType::ProfileDeleted => "PROFILE_DELETED",
            AccessEventType::RoleChanged => "ROLE_CHANGED",
            AccessEventType::StatusChanged => "STATUS_CHANGED",
            AccessEventType::AccessGranted => "ACCESS_GRANTED",
            AccessEventType::AccessDenied => "ACCESS_DENIED",
        };
        f.write_str(name)
    }
}

/// Severity of an audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventSeverity {
    Info,
    Warning,
    Critical,
}

/// One audited event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessEvent {
    pub event_type: AccessEventType,
    pub severity: AccessEventSeverity,
    /// Identity the event is about, when known.
    pub uid: Option<String>,
    /// Email involved, when known.
    pub email: Option<String>,
    /// Free-form context (actor ids, old/new values).
    pub detail: HashMap<String, String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl AccessEvent {
    fn new(event_type: AccessEventType, severity: AccessEventSeverity) -> Self {
        AccessEvent {
            event_type,
            severity,
            uid: None,
            email: None,
            detail: HashMap::new(),
            timestamp: epoch_millis(),
        }
    }

    /// Attaches a detail entry (builder pattern).
    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }

    fn uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn sign_in_success(uid: &str, email: &str) -> Self {
        Self::new(AccessEventType::SignInSuccess, AccessEventSeverity::Info)
            .uid(uid)
            .email(email)
    }

    pub fn sign_in_failure(email: &str) -> Self {
        Self::new(AccessEventType::SignInFailure, AccessEventSeverity::Warning).email(email)
    }

    pub fn sign_out(uid: &str) -> Self {
        Self::new(AccessEventType::SignOut, AccessEventSeverity::Info).uid(uid)
    }

    pub fn sign_up_completed(uid: &str, role: Role) -> Self {
        Self::new(AccessEventType::SignUpCompleted, AccessEventSeverity::Info)
            .uid(uid)
            .detail("role", role.as_str())
    }

    pub fn verification_email_sent(uid: &str) -> Self {
        Self::new(
            AccessEventType::VerificationEmailSent,
            AccessEventSeverity::Info,
        )
        .uid(uid)
    }

    pub fn email_verified(uid: &str) -> Self {
        Self::new(AccessEventType::EmailVerified, AccessEventSeverity::Info).uid(uid)
    }

    pub fn password_reset_requested(email: &str) -> Self {
        Self::new(
            AccessEventType::PasswordResetRequested,
            AccessEventSeverity::Info,
        )
        .email(email)
    }

    pub fn profile_created(uid: &str, role: Role) -> Self {
        Self::new(AccessEventType::ProfileCreated, AccessEventSeverity::Info)
            .uid(uid)
            .detail("role", role.as_str())
    }

    pub fn profile_deleted(uid: &str, actor_uid: &str) -> Self {
        Self::new(AccessEventType::ProfileDeleted, AccessEventSeverity::Warning)
            .uid(uid)
            .detail("actor", actor_uid)
    }

    pub fn role_changed(uid: &str, actor_uid: &str, from: Role, to: Role) -> Self {
        Self::new(AccessEventType::RoleChanged, AccessEventSeverity::Warning)
            .uid(uid)
            .detail("actor", actor_uid)
            .detail("from", from.as_str())
            .detail("to", to.as_str())
    }

    pub fn status_changed(
        uid: &str,
        actor_uid: &str,
        from: ActivationStatus,
        to: ActivationStatus,
    ) -> Self {
        Self::new(AccessEventType::StatusChanged, AccessEventSeverity::Info)
            .uid(uid)
            .detail("actor", actor_uid)
            .detail("from", from.as_str())
            .detail("to", to.as_str())
    }

    pub fn access_granted(uid: &str, role: Role) -> Self {
        Self::new(AccessEventType::AccessGranted, AccessEventSeverity::Info)
            .uid(uid)
            .detail("role", role.as_str())
    }

    pub fn access_denied(uid: Option<&str>, reason: &str) -> Self {
        let event = Self::new(AccessEventType::AccessDenied, AccessEventSeverity::Warning)
            .detail("reason", reason);
        match uid {
            Some(uid) => event.uid(uid),
            None => event,
        }
    }
}

// =============================================================================
// Handlers and logger
// =============================================================================

/// Receiver for audited events.
pub trait AccessEventHandler: Send + Sync {
    fn handle(&self, event: &AccessEvent);
}

impl<F> AccessEventHandler for F
where
    F: Fn(&AccessEvent) + Send + Sync,
{
    fn handle(&self, event: &AccessEvent) {
        self(event)
    }
}

/// Handler that prints events to stdout.
pub struct StdoutHandler;

impl AccessEventHandler for StdoutHandler {
    fn handle(&self, event: &AccessEvent) {
        println!(
            "[AUDIT] {} uid={} email={} detail={:?}",
            event.event_type,
            event.uid.as_deref().unwrap_or("-"),
            event.email.as_deref().unwrap_or("-"),
            event.detail
        );
    }
}

/// Cloneable in-memory event sink for tests and small deployments.
#[derive(Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<AccessEvent>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        InMemoryEventStore {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events of one kind, oldest first.
    pub fn events_of_type(&self, event_type: &AccessEventType) -> Vec<AccessEvent> {
        self.events()
            .into_iter()
            .filter(|e| &e.event_type == event_type)
            .collect()
    }

    /// Events concerning one identity, oldest first.
    pub fn events_for_uid(&self, uid: &str) -> Vec<AccessEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.uid.as_deref() == Some(uid))
            .collect()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessEventHandler for InMemoryEventStore {
    fn handle(&self, event: &AccessEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Fans audited events out to the configured handlers.
///
/// A logger with no handlers drops events, which is the default for
/// callers that do not care about auditing.
#[derive(Clone, Default)]
pub struct AuditLogger {
    handlers: Vec<Arc<dyn AccessEventHandler>>,
}

impl AuditLogger {
    /// Creates a logger with no handlers.
    pub fn new() -> Self {
        AuditLogger {
            handlers: Vec::new(),
        }
    }

    /// Adds a handler (builder pattern).
    pub fn with_handler<H: AccessEventHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Delivers an event to every handler.
    pub fn log(&self, event: AccessEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}
