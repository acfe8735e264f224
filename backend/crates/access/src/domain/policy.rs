//! RBAC Policy
//!
//! Pure decisions over a principal. Authentication happens before these are
//! consulted; see `application::authorization`.

use crate::domain::value_object::{Permission, Principal, Role};
use crate::error::{AccessError, AccessResult};

/// What a route demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Exactly this role
    Role(Role),
    /// This role or any above it
    MinimumRole(Role),
    Permission(Permission),
}

impl Requirement {
    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        match *self {
            Requirement::Role(role) => principal.role == role,
            Requirement::MinimumRole(min) => principal.role.is_at_least(min),
            Requirement::Permission(permission) => permission.is_granted_to(principal.role),
        }
    }

    /// Short label used as the audit entity id.
    pub fn label(&self) -> String {
        match self {
            Requirement::Role(role) => format!("role:{role}"),
            Requirement::MinimumRole(role) => format!("min_role:{role}"),
            Requirement::Permission(permission) => format!("permission:{permission}"),
        }
    }

    pub fn check(&self, principal: &Principal) -> AccessResult<()> {
        if self.is_satisfied_by(principal) {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}

pub fn require_role(principal: &Principal, role: Role) -> AccessResult<()> {
    Requirement::Role(role).check(principal)
}

pub fn require_minimum_role(principal: &Principal, min: Role) -> AccessResult<()> {
    Requirement::MinimumRole(min).check(principal)
}

pub fn require_permission(principal: &Principal, permission: Permission) -> AccessResult<()> {
    Requirement::Permission(permission).check(principal)
}
