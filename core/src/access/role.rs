//! Role and activation-status model.
//!
//! Roles form a closed set: every comparison in the crate is an exhaustive
//! match, so an unrecognized role value coming out of the profile store is
//! a parse error at the boundary, never a silent pass-through.

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// An authorization level a profile can declare.
///
/// # Example
/// ```
/// use classgate_core::access::Role;
///
/// let role: Role = "educator".parse().unwrap();
/// assert_eq!(role, Role::Educator);
/// assert!("superuser".parse::<Role>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Parent,
    Educator,
    Admin,
    Principal,
}

impl Role {
    /// Every declarable role, in display order.
    pub const ALL: [Role; 5] = [
        Role::Learner,
        Role::Parent,
        Role::Educator,
        Role::Admin,
        Role::Principal,
    ];

    /// Returns the lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Parent => "parent",
            Role::Educator => "educator",
            Role::Admin => "admin",
            Role::Principal => "principal",
        }
    }

    /// Whether holders of this role may perform administrative mutations
    /// (role/status changes, user creation and deletion).
    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin | Role::Principal)
    }

    /// The dashboard a signed-in holder of this role lands on.
    pub fn dashboard_target(&self) -> &'static str {
        match self {
            Role::Learner => "/learner-dashboard",
            Role::Parent => "/parent-dashboard",
            Role::Educator => "/educator-dashboard",
            Role::Admin => "/admin-dashboard",
            Role::Principal => "/principal-dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not one of the five known roles.
#[derive(Debug, Clone, Display, Error)]
#[display("unrecognized role: {value}")]
pub struct ParseRoleError {
    pub value: String,
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learner" => Ok(Role::Learner),
            "parent" => Ok(Role::Parent),
            "educator" => Ok(Role::Educator),
            "admin" => Ok(Role::Admin),
            "principal" => Ok(Role::Principal),
            other => Err(ParseRoleError {
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle state of a profile.
///
/// Only `Active` profiles are authorized for role-gated views; learners
/// are exempt from this gate because they are activated at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl ActivationStatus {
    /// Returns the lowercase wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationStatus::Pending => "pending",
            ActivationStatus::Active => "active",
            ActivationStatus::Inactive => "inactive",
            ActivationStatus::Suspended => "suspended",
        }
    }

    /// Whether the profile has been activated.
    pub fn is_active(&self) -> bool {
        matches!(self, ActivationStatus::Active)
    }
}

impl fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the known states.
#[derive(Debug, Clone, Display, Error)]
#[display("unrecognized activation status: {value}")]
pub struct ParseStatusError {
    pub value: String,
}

impl FromStr for ActivationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ActivationStatus::Pending),
            "active" => Ok(ActivationStatus::Active),
            "inactive" => Ok(ActivationStatus::Inactive),
            "suspended" => Ok(ActivationStatus::Suspended),
            other => Err(ParseStatusError {
                value: other.to_string(),
            }),
        }
    }
}
