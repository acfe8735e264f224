use kernel::id::{StoreId, UserId};
use serde::{Deserialize, Serialize};

use super::permission::Permission;
use super::role::Role;

/// Authenticated caller, fixed for the lifetime of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub store_id: Option<StoreId>,
}

impl Principal {
    pub fn new(id: UserId, role: Role, store_id: Option<StoreId>) -> Self {
        Self { id, role, store_id }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        Permission::granted_to(self.role)
    }
}
