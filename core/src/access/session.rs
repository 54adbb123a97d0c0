//! Session model.

use serde::{Deserialize, Serialize};

/// A live, authenticated identity reference issued by the identity
/// provider.
///
/// The application only ever holds a read-only copy: sessions are created
/// on sign-in and destroyed on sign-out or credential expiry, and both
/// transitions arrive asynchronously through the provider's notification
/// stream.
///
/// # Example
/// ```
/// use classgate_core::access::Session;
///
/// let session = Session::new("uid-1", "thandi@school.example", true);
/// assert_eq!(session.get_uid(), "uid-1");
/// assert!(session.is_email_verified());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    uid: String,
    email: String,
    email_verified: bool,
}

impl Session {
    /// Creates a session reference.
    pub fn new(uid: &str, email: &str, email_verified: bool) -> Self {
        Session {
            uid: uid.to_string(),
            email: email.to_string(),
            email_verified,
        }
    }

    /// Returns the unique identity id.
    pub fn get_uid(&self) -> &str {
        &self.uid
    }

    /// Returns the email the identity signed in with.
    pub fn get_email(&self) -> &str {
        &self.email
    }

    /// Whether the identity provider has confirmed ownership of the email.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }
}
