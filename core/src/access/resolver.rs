//! Role resolution.
//!
//! Translates a session into an authorization fact (declared role plus
//! activation status) by fetching the profile document fresh on every
//! call. Nothing is cached: freshness is chosen over performance, and the
//! guard's stale-lookup discard covers the race that choice opens.
//!
//! Resolution is strictly read-only. A missing profile is reported as
//! [`Resolution::NotFound`] and must never be "repaired" by creating a
//! document with a guessed role mid-check; provisioning belongs to the
//! sign-up and administrative flows.

use std::sync::Arc;
use std::time::Duration;

use derive_more::{Display, Error};
use rand::{thread_rng, Rng};

use crate::access::role::{ActivationStatus, Role};
use crate::access::session::Session;
use crate::access::store::ProfileStore;

/// The authorization fact a profile declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleFact {
    pub role: Role,
    pub status: ActivationStatus,
}

/// Outcome of a successful profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A profile exists and declares this fact.
    Resolved(RoleFact),
    /// No profile document exists for the identity. A real absence, not
    /// an error; retrying will not change it.
    NotFound,
}

/// The profile store could not be reached. Retryable.
#[derive(Debug, Clone, Display, Error)]
#[display("profile lookup failed: {detail}")]
pub struct LookupFailed {
    pub detail: String,
}

/// Backoff policy for retrying transient lookup failures.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use classgate_core::access::RetryConfig;
///
/// let retry = RetryConfig::new()
///     .max_attempts(5)
///     .initial_backoff(Duration::from_millis(20));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Ceiling for the doubling backoff.
    pub max_backoff: Duration,
    /// Adds up to 50% random spread on each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total attempt budget, including the first attempt.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the second attempt.
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the backoff ceiling.
    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Enables or disables jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Translates sessions into authorization facts.
pub struct RoleResolver {
    store: Arc<dyn ProfileStore>,
}

impl RoleResolver {
    /// Creates a resolver over a profile store.
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        RoleResolver { store }
    }

    /// Fetches the profile for the session's identity, fresh.
    ///
    /// Callers must hold a present session; the guard enforces that
    /// ordering and never invokes the resolver while signed out.
    pub async fn resolve(&self, session: &Session) -> Result<Resolution, LookupFailed> {
        match self.store.get_profile_by_id(session.get_uid()).await {
            Ok(Some(profile)) => Ok(Resolution::Resolved(RoleFact {
                role: profile.get_role(),
                status: profile.get_status(),
            })),
            Ok(None) => Ok(Resolution::NotFound),
            Err(err) => Err(LookupFailed {
                detail: err.to_string(),
            }),
        }
    }

    /// Like [`resolve`](Self::resolve), retrying transient failures with
    /// exponential backoff. `NotFound` is never retried; it is a real
    /// absence.
    pub async fn resolve_with_retry(
        &self,
        session: &Session,
        retry: &RetryConfig,
    ) -> Result<Resolution, LookupFailed> {
        let mut backoff = retry.initial_backoff;
        let mut attempt = 1u32;

        loop {
            match self.resolve(session).await {
                Ok(resolution) => return Ok(resolution),
                Err(err) => {
                    if attempt >= retry.max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(delay_for(backoff, retry.jitter)).await;
                    backoff = (backoff * 2).min(retry.max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

fn delay_for(backoff: Duration, jitter: bool) -> Duration {
    if !jitter {
        return backoff;
    }
    let millis = backoff.as_millis() as u64;
    if millis == 0 {
        return backoff;
    }
    let spread = (millis / 2).max(1);
    Duration::from_millis(millis + thread_rng().gen_range(0..=spread))
}
