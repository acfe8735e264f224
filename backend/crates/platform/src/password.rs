//! Password hashing
//!
//! Argon2id digests in PHC string form. Clear text is NFKC-normalized and
//! zeroized on drop.
//!
//! [`ClearTextPassword::new`] applies the policy and is used when a password
//! is set (bootstrap accounts, fixtures). [`ClearTextPassword::for_verification`]
//! only normalizes: a submitted password that predates the policy just fails
//! to match.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Shortest password accepted when one is set
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest password accepted when one is set, in code points
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Passwords refused outright regardless of length
const DENYLIST: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "qwertyuiop",
    "letmein123",
    "welcome1",
    "admin123",
    "changeme",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be blank")]
    Blank,

    #[error("Password contains control characters")]
    ControlCharacter,

    #[error("Password is too easy to guess")]
    Guessable,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Normalized clear text, wiped from memory on drop. Not `Clone`.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// assert!(ClearTextPassword::new("Ledger#Vault2024!".to_string()).is_ok());
/// assert!(ClearTextPassword::new("short".to_string()).is_err());
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize and check a password that is about to be stored.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let password = Self::normalize(raw);
        let text = password.0.as_str();

        if text.trim().is_empty() {
            return Err(PasswordPolicyError::Blank);
        }

        let actual = text.chars().count();
        if actual < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual,
            });
        }
        if actual > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual,
            });
        }

        if text.chars().any(|ch| ch.is_control() && ch != '\t') {
            return Err(PasswordPolicyError::ControlCharacter);
        }

        if is_guessable(text) {
            return Err(PasswordPolicyError::Guessable);
        }

        Ok(password)
    }

    /// Normalize a submitted password for comparison. `None` when empty or
    /// absurdly long.
    pub fn for_verification(raw: String) -> Option<Self> {
        let password = Self::normalize(raw);
        let count = password.0.chars().count();
        (count > 0 && count <= MAX_PASSWORD_LENGTH * 4).then_some(password)
    }

    fn normalize(mut raw: String) -> Self {
        let normalized = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(pepper) = pepper {
            bytes.extend_from_slice(pepper);
        }
        bytes
    }

    /// Hash with Argon2id default parameters (m=19456, t=2, p=1) and a
    /// random 16-byte salt.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClearTextPassword([REDACTED])")
    }
}

/// Stored password digest (`$argon2id$v=19$...`)
///
/// ```rust
/// use platform::password::{ClearTextPassword, HashedPassword};
///
/// let stored = ClearTextPassword::new("Ledger#Vault2024!".to_string())
///     .unwrap()
///     .hash(None)
///     .unwrap();
/// let digest = HashedPassword::from_phc_string(stored.as_phc_string()).unwrap();
/// let submitted = ClearTextPassword::for_verification("Ledger#Vault2024!".into()).unwrap();
/// assert!(digest.verify(&submitted, None));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Constant-time check of `password` against this digest. The pepper
    /// must match the one used when hashing.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([HASH])")
    }
}

/// Denylisted, a single repeated character, or a run of consecutive digits.
fn is_guessable(password: &str) -> bool {
    let lower = password.to_lowercase();
    if DENYLIST.contains(&lower.as_str()) {
        return true;
    }

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    let digits: Vec<u32> = lower.chars().map_while(|c| c.to_digit(10)).collect();
    digits.len() == lower.chars().count()
        && (digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10)
            || digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(raw: &str) -> ClearTextPassword {
        ClearTextPassword::for_verification(raw.to_string()).unwrap()
    }

    #[test]
    fn test_policy_rejections() {
        assert!(matches!(
            ClearTextPassword::new("short".into()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        ));
        assert!(matches!(
            ClearTextPassword::new("ab".repeat(MAX_PASSWORD_LENGTH)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
        assert_eq!(
            ClearTextPassword::new("          ".into()).unwrap_err(),
            PasswordPolicyError::Blank
        );
        assert_eq!(
            ClearTextPassword::new("line\u{0007}bell!".into()).unwrap_err(),
            PasswordPolicyError::ControlCharacter
        );
    }

    #[test]
    fn test_guessable_passwords() {
        for weak in ["Password123", "12345678", "98765432", "zzzzzzzzzz"] {
            assert_eq!(
                ClearTextPassword::new(weak.into()).unwrap_err(),
                PasswordPolicyError::Guessable,
                "{weak}"
            );
        }
        assert!(ClearTextPassword::new("Ledger#Vault2024!".into()).is_ok());
        assert!(ClearTextPassword::new("13572468".into()).is_ok());
    }

    #[test]
    fn test_for_verification_skips_policy() {
        assert!(ClearTextPassword::for_verification("abc".into()).is_some());
        assert!(ClearTextPassword::for_verification(String::new()).is_none());
    }

    #[test]
    fn test_hash_and_verify() {
        let hashed = submitted("Ledger#Vault2024!").hash(None).unwrap();

        assert!(hashed.verify(&submitted("Ledger#Vault2024!"), None));
        assert!(!hashed.verify(&submitted("Ledger#Vault2025!"), None));
    }

    #[test]
    fn test_verify_normalizes_unicode() {
        // Fullwidth digits normalize to ASCII under NFKC
        let hashed = submitted("pass-phrase-９９").hash(None).unwrap();
        assert!(hashed.verify(&submitted("pass-phrase-99"), None));
    }

    #[test]
    fn test_pepper_must_match() {
        let password = submitted("Ledger#Vault2024!");
        let hashed = password.hash(Some(b"back-office-pepper")).unwrap();

        assert!(hashed.verify(&password, Some(b"back-office-pepper")));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"other")));
    }

    #[test]
    fn test_phc_string() {
        let hashed = submitted("Ledger#Vault2024!").hash(None).unwrap();
        assert!(hashed.as_phc_string().starts_with("$argon2id$"));

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&submitted("Ledger#Vault2024!"), None));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let debug_output = format!("{:?}", submitted("secret-value"));
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret-value"));
    }
}
