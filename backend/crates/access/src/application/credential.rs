//! Credential Verifier
//!
//! Compares a submitted password against a stored digest. Any failure along
//! the way (unparsable digest, hashing error, a panicked blocking task) is a
//! mismatch.

use platform::password::{ClearTextPassword, HashedPassword};

#[trait_variant::make(CredentialVerifier: Send)]
pub trait LocalCredentialVerifier {
    async fn verify(&self, password: String, stored_digest: &str) -> bool;
}

/// Argon2id verification on the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct Argon2Verifier {
    pepper: Option<Vec<u8>>,
}

impl Argon2Verifier {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self { pepper }
    }
}

impl CredentialVerifier for Argon2Verifier {
    async fn verify(&self, password: String, stored_digest: &str) -> bool {
        let Ok(digest) = HashedPassword::from_phc_string(stored_digest) else {
            tracing::warn!("Stored password digest is not a valid PHC string");
            return false;
        };
        let Some(password) = ClearTextPassword::for_verification(password) else {
            return false;
        };
        let pepper = self.pepper.clone();

        match tokio::task::spawn_blocking(move || digest.verify(&password, pepper.as_deref())).await
        {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2Verifier, CredentialVerifier};
    use platform::password::ClearTextPassword;

    fn digest(raw: &str, pepper: Option<&[u8]>) -> String {
        ClearTextPassword::new(raw.to_string())
            .unwrap()
            .hash(pepper)
            .unwrap()
            .as_phc_string()
            .to_string()
    }

    #[tokio::test]
    async fn test_verify_matches() {
        let stored = digest("Correct-Horse-42", None);
        let verifier = Argon2Verifier::default();

        assert!(verifier.verify("Correct-Horse-42".into(), &stored).await);
        assert!(!verifier.verify("correct-horse-42".into(), &stored).await);
    }

    #[tokio::test]
    async fn test_verify_uses_pepper() {
        let stored = digest("Correct-Horse-42", Some(b"pepper"));

        assert!(
            Argon2Verifier::new(Some(b"pepper".to_vec()))
                .verify("Correct-Horse-42".into(), &stored)
                .await
        );
        assert!(
            !Argon2Verifier::default()
                .verify("Correct-Horse-42".into(), &stored)
                .await
        );
    }

    #[tokio::test]
    async fn test_fails_closed() {
        let verifier = Argon2Verifier::default();
        assert!(!verifier.verify("anything".into(), "not-a-phc-string").await);
        assert!(!verifier.verify(String::new(), &digest("Correct-Horse-42", None)).await);

        let mut truncated = digest("Correct-Horse-42", None);
        truncated.truncate(truncated.len() - 4);
        assert!(!verifier.verify("Correct-Horse-42".into(), &truncated).await);
    }
}
