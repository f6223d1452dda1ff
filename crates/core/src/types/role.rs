//! User role carried in the auth user's application metadata.

use serde::{Deserialize, Serialize};

/// Role attribute of an account.
///
/// The backend stores the role as free text in `app_metadata.role`. Only the
/// exact value `admin` grants anything; every other value, including a
/// missing one, is an ordinary reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Role {
    /// May write and delete articles and view the dashboard.
    Admin,
    /// Any other role value reported by the backend.
    Other(String),
    /// No role attribute at all.
    #[default]
    None,
}

impl Role {
    /// Whether this role grants admin rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Label shown in listings (`user` when no role is set).
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Other(role) => role,
            Self::None => "user",
        }
    }
}

impl From<Option<String>> for Role {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(role) if role == "admin" => Self::Admin,
            Some(role) if !role.is_empty() => Self::Other(role),
            _ => Self::None,
        }
    }
}

impl From<Role> for Option<String> {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Some("admin".to_string()),
            Role::Other(role) => Some(role),
            Role::None => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_admin_is_admin() {
        assert!(Role::from(Some("admin".to_string())).is_admin());
        assert!(!Role::from(Some("Admin".to_string())).is_admin());
        assert!(!Role::from(Some("editor".to_string())).is_admin());
        assert!(!Role::from(None).is_admin());
    }

    #[test]
    fn test_deserialize_from_nullable_string() {
        let role: Role = serde_json::from_str("null").unwrap();
        assert_eq!(role, Role::None);
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str("\"authenticated\"").unwrap();
        assert_eq!(role, Role::Other("authenticated".to_string()));
    }

    #[test]
    fn test_label() {
        assert_eq!(Role::None.label(), "user");
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
