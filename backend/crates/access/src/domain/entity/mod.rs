//! Entity Module

pub mod attempt;
pub mod audit_entry;
pub mod user;

pub use attempt::{AttemptRecord, AttemptUpdate, LockoutPolicy};
pub use audit_entry::AuditEntry;
pub use user::User;
