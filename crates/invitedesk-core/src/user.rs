//! Staff identity types.

use serde::{Deserialize, Serialize};

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular intake staff; sees only their own invitations.
    #[default]
    Staff,
    /// Administrative identity; bypasses the per-inviter listing filter.
    Admin,
}

impl Role {
    /// Parses the backend's role string; anything other than `admin` is
    /// regular staff.
    #[must_use]
    pub fn from_remote(role: Option<&str>) -> Self {
        match role {
            Some(value) if value.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Staff,
        }
    }
}

/// A signed-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    /// Display name; also the inviter identity on records.
    pub name: String,
    /// Role controlling listing visibility.
    pub role: Role,
}

impl StaffUser {
    /// Creates a new staff user.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Returns true for the distinguished administrative identity.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<invitedesk_gateway::RemoteUser> for StaffUser {
    fn from(remote: invitedesk_gateway::RemoteUser) -> Self {
        let role = Role::from_remote(remote.role.as_deref());
        Self {
            name: remote.name,
            role,
        }
    }
}
