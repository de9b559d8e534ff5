//! User roles.

use serde::{Deserialize, Serialize};

/// Role assigned to a user account.
///
/// Roles are hierarchical in practice: admins can do everything managers can,
/// and managers invite waiters. The database stores roles as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator. Invites managers, sees global statistics.
    Admin,
    /// Restaurant manager. Owns at most one restaurant, invites waiters.
    Manager,
    /// Waiter. Browses the menu of the restaurant they are assigned to.
    Waiter,
}

impl Role {
    /// Returns true for roles allowed to manage menu content.
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Role name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Waiter => "waiter",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "waiter" => Ok(Self::Waiter),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!("waiter".parse::<Role>(), Ok(Role::Waiter));
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_storage_form() {
        assert_eq!(Role::Manager.to_string(), "manager");
    }

    #[test]
    fn management_capability() {
        assert!(Role::Admin.can_manage());
        assert!(Role::Manager.can_manage());
        assert!(!Role::Waiter.can_manage());
    }
}
