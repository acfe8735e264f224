use serde::{Deserialize, Serialize};

/// Back-office role.
///
/// Variants are declared in ascending privilege so the derived `Ord`
/// matches the hierarchy `User < Manager < Admin`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum Role {
    #[default]
    #[display("USER")]
    User = 0,
    #[display("MANAGER")]
    Manager = 1,
    #[display("ADMIN")]
    Admin = 2,
}

impl Role {
    /// Storage id, also the privilege rank.
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            User => "USER",
            Manager => "MANAGER",
            Admin => "ADMIN",
        }
    }

    /// Returns `None` for ids that do not name a role.
    #[inline]
    pub const fn from_id(id: i16) -> Option<Self> {
        use Role::*;
        match id {
            0 => Some(User),
            1 => Some(Manager),
            2 => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "USER" => Some(User),
            "MANAGER" => Some(Manager),
            "ADMIN" => Some(Admin),
            _ => None,
        }
    }

    /// True when this role ranks at or above `min`.
    #[inline]
    pub fn is_at_least(&self, min: Role) -> bool {
        *self >= min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_order() {
        assert!(Role::User < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Admin.is_at_least(Role::Manager));
        assert!(!Role::User.is_at_least(Role::Manager));
    }

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(0), Some(Role::User));
        assert_eq!(Role::from_id(1), Some(Role::Manager));
        assert_eq!(Role::from_id(2), Some(Role::Admin));
        assert_eq!(Role::from_id(3), None);
        assert_eq!(Role::from_id(-1), None);
    }

    #[test]
    fn test_role_from_code() {
        assert_eq!(Role::from_code("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::from_code("manager"), None);
        assert_eq!(Role::from_code("SUPER_ADMIN"), None);
    }

    #[test]
    fn test_role_serde_and_display() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, Role::Manager);
        assert_eq!(Role::User.to_string(), "USER");
        assert!(serde_json::from_str::<Role>("\"ROOT\"").is_err());
    }
}
