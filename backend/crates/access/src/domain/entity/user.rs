//! User Entity
//!
//! The slice of a back-office user this layer needs: identity, role, store
//! scope and the stored password digest.

use chrono::{DateTime, Utc};
use kernel::id::{StoreId, UserId};

use crate::domain::value_object::{Principal, Role};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Login name as entered at creation
    pub user_name: String,
    pub role: Role,
    /// Store the user is scoped to; `None` for cross-store staff
    pub store_id: Option<StoreId>,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Disabled users cannot log in or confirm their password
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        user_name: impl Into<String>,
        role: Role,
        store_id: Option<StoreId>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            user_name: user_name.into(),
            role,
            store_id,
            password_hash: password_hash.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.role, self.store_id)
    }

    /// Lookup key for login names: trimmed and lowercased.
    pub fn canonical_name(user_name: &str) -> String {
        user_name.trim().to_lowercase()
    }

    pub fn user_name_canonical(&self) -> String {
        Self::canonical_name(&self.user_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name() {
        assert_eq!(User::canonical_name("  Alice "), "alice");
        let user = User::new("Bob", Role::Manager, None, "$argon2id$...");
        assert_eq!(user.user_name_canonical(), "bob");
        assert!(user.is_active);
    }

    #[test]
    fn test_principal_carries_role_and_store() {
        let store = StoreId::new();
        let user = User::new("carol", Role::User, Some(store), "$argon2id$...");
        let principal = user.principal();
        assert_eq!(principal.id, user.user_id);
        assert_eq!(principal.role, Role::User);
        assert_eq!(principal.store_id, Some(store));
    }
}
