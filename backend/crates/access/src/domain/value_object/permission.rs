use serde::{Deserialize, Serialize};

use super::role::Role;

/// Operation-level permission checked by the policy engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Permission {
    #[serde(rename = "checks:read")]
    #[display("checks:read")]
    ReadChecks,
    #[serde(rename = "checks:create")]
    #[display("checks:create")]
    CreateChecks,
    #[serde(rename = "checks:void")]
    #[display("checks:void")]
    VoidChecks,
    #[serde(rename = "vendors:read")]
    #[display("vendors:read")]
    ReadVendors,
    #[serde(rename = "vendors:write")]
    #[display("vendors:write")]
    WriteVendors,
    #[serde(rename = "banks:read")]
    #[display("banks:read")]
    ReadBanks,
    #[serde(rename = "banks:write")]
    #[display("banks:write")]
    WriteBanks,
    #[serde(rename = "banks:credentials")]
    #[display("banks:credentials")]
    EditBankCredentials,
    #[serde(rename = "stores:write")]
    #[display("stores:write")]
    WriteStores,
    #[serde(rename = "users:manage")]
    #[display("users:manage")]
    ManageUsers,
    #[serde(rename = "audit:read")]
    #[display("audit:read")]
    ReadAudit,
}

use Permission::*;

const USER_GRANTS: &[Permission] = &[ReadChecks, CreateChecks, VoidChecks, ReadVendors];

const MANAGER_GRANTS: &[Permission] = &[
    ReadChecks,
    CreateChecks,
    VoidChecks,
    ReadVendors,
    WriteVendors,
    ReadBanks,
    WriteBanks,
    ReadAudit,
];

const ADMIN_GRANTS: &[Permission] = &[
    ReadChecks,
    CreateChecks,
    VoidChecks,
    ReadVendors,
    WriteVendors,
    ReadBanks,
    WriteBanks,
    EditBankCredentials,
    WriteStores,
    ManageUsers,
    ReadAudit,
];

impl Permission {
    pub const ALL: [Permission; 11] = [
        ReadChecks,
        CreateChecks,
        VoidChecks,
        ReadVendors,
        WriteVendors,
        ReadBanks,
        WriteBanks,
        EditBankCredentials,
        WriteStores,
        ManageUsers,
        ReadAudit,
    ];

    /// Permission grants for a role.
    pub const fn granted_to(role: Role) -> &'static [Permission] {
        match role {
            Role::User => USER_GRANTS,
            Role::Manager => MANAGER_GRANTS,
            Role::Admin => ADMIN_GRANTS,
        }
    }

    pub fn is_granted_to(&self, role: Role) -> bool {
        Self::granted_to(role).contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_every_permission() {
        for permission in Permission::ALL {
            assert!(permission.is_granted_to(Role::Admin), "{permission}");
        }
    }

    #[test]
    fn test_grants_are_monotonic_in_rank() {
        for permission in Permission::ALL {
            if permission.is_granted_to(Role::User) {
                assert!(permission.is_granted_to(Role::Manager), "{permission}");
            }
            if permission.is_granted_to(Role::Manager) {
                assert!(permission.is_granted_to(Role::Admin), "{permission}");
            }
        }
    }

    #[test]
    fn test_bank_credentials_are_admin_only() {
        assert!(!EditBankCredentials.is_granted_to(Role::User));
        assert!(!EditBankCredentials.is_granted_to(Role::Manager));
        assert!(VoidChecks.is_granted_to(Role::User));
        assert!(!ReadBanks.is_granted_to(Role::User));
        assert!(ReadAudit.is_granted_to(Role::Manager));
    }

    #[test]
    fn test_permission_wire_names() {
        assert_eq!(VoidChecks.to_string(), "checks:void");
        assert_eq!(
            serde_json::to_string(&EditBankCredentials).unwrap(),
            "\"banks:credentials\""
        );
    }
}
