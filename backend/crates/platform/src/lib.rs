//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256 signing, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Clock abstraction for expiry checks
//! - Request header helpers (bearer tokens, client IP)

pub mod client;
pub mod clock;
pub mod crypto;
pub mod password;
