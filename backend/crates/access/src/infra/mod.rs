//! Infrastructure Layer
//!
//! Storage backends for users, attempt counters and the audit log.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccessRepository;
pub use postgres::PgAccessRepository;
