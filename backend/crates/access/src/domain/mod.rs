//! Domain Layer
//!
//! Entities, value objects, the RBAC policy and repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

pub use entity::{AttemptRecord, AttemptUpdate, AuditEntry, LockoutPolicy, User};
pub use policy::Requirement;
pub use repository::{AccessRepository, AttemptStore, AuditStore, UserRepository};
