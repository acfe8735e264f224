//! Application Configuration
//!
//! Token lifetimes, lockout policy and secrets for the access layer.

use std::fmt;
use std::time::Duration;

use platform::crypto::{from_base64, random_key};
use thiserror::Error;

use crate::domain::entity::LockoutPolicy;
use crate::domain::value_object::SensitivityPolicy;

pub const ENV_TOKEN_SECRET: &str = "ACCESS_TOKEN_SECRET";
pub const ENV_SESSION_TTL_SECS: &str = "ACCESS_SESSION_TTL_SECS";
pub const ENV_STEP_UP_TTL_SECS: &str = "ACCESS_STEP_UP_TTL_SECS";
pub const ENV_LOCKOUT_THRESHOLD: &str = "ACCESS_LOCKOUT_THRESHOLD";
pub const ENV_LOCKOUT_SECS: &str = "ACCESS_LOCKOUT_SECS";
pub const ENV_SENSITIVE_AMOUNT_CENTS: &str = "ACCESS_SENSITIVE_AMOUNT_CENTS";
pub const ENV_PASSWORD_PEPPER: &str = "ACCESS_PASSWORD_PEPPER";

/// Upper bound for every configured lifetime and lock window (366 days).
pub const MAX_DURATION: Duration = Duration::from_secs(366 * 24 * 3600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Access application configuration
#[derive(Clone)]
pub struct AccessConfig {
    /// HMAC-SHA256 key for session and step-up tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// Session token lifetime (24 hours)
    pub session_ttl: Duration,
    /// Step-up token lifetime (5 minutes)
    pub step_up_ttl: Duration,
    /// Consecutive failures before lockout
    pub lockout_threshold: u32,
    /// Lockout duration (5 minutes)
    pub lockout_duration: Duration,
    /// Check amounts above this many cents need step-up ($10,000)
    pub sensitive_amount_cents: i64,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            session_ttl: Duration::from_secs(24 * 3600),
            step_up_ttl: Duration::from_secs(5 * 60),
            lockout_threshold: 3,
            lockout_duration: Duration::from_secs(5 * 60),
            sensitive_amount_cents: 1_000_000,
            password_pepper: None,
        }
    }
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("token_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("step_up_ttl", &self.step_up_ttl)
            .field("lockout_threshold", &self.lockout_threshold)
            .field("lockout_duration", &self.lockout_duration)
            .field("sensitive_amount_cents", &self.sensitive_amount_cents)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AccessConfig {
    /// Create config with a random token secret
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: random_key(),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Read configuration from the process environment.
    pub fn from_env(allow_random_secret: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), allow_random_secret)
    }

    /// Read configuration through `lookup`; unset values keep their defaults.
    ///
    /// Without `ACCESS_TOKEN_SECRET` a random secret is generated only when
    /// `allow_random_secret` is set, otherwise this fails.
    pub fn from_lookup<F>(lookup: F, allow_random_secret: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let token_secret = match lookup(ENV_TOKEN_SECRET) {
            Some(encoded) => decode_secret(&encoded)?,
            None if allow_random_secret => random_key(),
            None => return Err(ConfigError::Missing(ENV_TOKEN_SECRET)),
        };

        let session_ttl = parse_duration(&lookup, ENV_SESSION_TTL_SECS)?.unwrap_or(defaults.session_ttl);
        let step_up_ttl = parse_duration(&lookup, ENV_STEP_UP_TTL_SECS)?.unwrap_or(defaults.step_up_ttl);
        let lockout_threshold =
            parse_var(&lookup, ENV_LOCKOUT_THRESHOLD)?.unwrap_or(defaults.lockout_threshold);
        let lockout_duration = parse_duration(&lookup, ENV_LOCKOUT_SECS)?.unwrap_or(defaults.lockout_duration);
        let sensitive_amount_cents = parse_var(&lookup, ENV_SENSITIVE_AMOUNT_CENTS)?
            .unwrap_or(defaults.sensitive_amount_cents);
        let password_pepper = lookup(ENV_PASSWORD_PEPPER)
            .filter(|pepper| !pepper.is_empty())
            .map(String::into_bytes);

        if lockout_threshold == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_LOCKOUT_THRESHOLD,
                reason: "must be at least 1".into(),
            });
        }
        if step_up_ttl.is_zero() || session_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: if step_up_ttl.is_zero() {
                    ENV_STEP_UP_TTL_SECS
                } else {
                    ENV_SESSION_TTL_SECS
                },
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            token_secret,
            session_ttl,
            step_up_ttl,
            lockout_threshold,
            lockout_duration,
            sensitive_amount_cents,
            password_pepper,
        })
    }

    pub fn session_ttl_ms(&self) -> i64 {
        bounded_millis(self.session_ttl)
    }

    pub fn step_up_ttl_ms(&self) -> i64 {
        bounded_millis(self.step_up_ttl)
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            threshold: self.lockout_threshold,
            duration: chrono::Duration::milliseconds(bounded_millis(self.lockout_duration)),
        }
    }

    pub fn sensitivity_policy(&self) -> SensitivityPolicy {
        SensitivityPolicy::new(self.sensitive_amount_cents)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn decode_secret(encoded: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = from_base64(encoded.trim()).map_err(|e| ConfigError::Invalid {
        var: ENV_TOKEN_SECRET,
        reason: e.to_string(),
    })?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::Invalid {
        var: ENV_TOKEN_SECRET,
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

/// Milliseconds in `duration`, clamped to [`MAX_DURATION`].
fn bounded_millis(duration: Duration) -> i64 {
    let millis = duration.min(MAX_DURATION).as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Whole seconds, at most [`MAX_DURATION`].
fn parse_duration<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(secs) = parse_var::<F, u64>(lookup, var)? else {
        return Ok(None);
    };
    let duration = Duration::from_secs(secs);
    if duration > MAX_DURATION {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be at most {} seconds", MAX_DURATION.as_secs()),
        });
    }
    Ok(Some(duration))
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::crypto::to_base64;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AccessConfig::default();
        assert_eq!(config.session_ttl_ms(), 86_400_000);
        assert_eq!(config.step_up_ttl_ms(), 300_000);
        assert_eq!(config.lockout_policy(), LockoutPolicy::default());
        assert_eq!(config.sensitive_amount_cents, 1_000_000);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let secret = [9u8; 32];
        let config = AccessConfig::from_lookup(
            lookup(&[
                (ENV_TOKEN_SECRET, to_base64(&secret)),
                (ENV_STEP_UP_TTL_SECS, "120".into()),
                (ENV_LOCKOUT_THRESHOLD, "5".into()),
                (ENV_PASSWORD_PEPPER, "pepper".into()),
            ]),
            false,
        )
        .unwrap();

        assert_eq!(config.token_secret, secret);
        assert_eq!(config.step_up_ttl, Duration::from_secs(120));
        assert_eq!(config.lockout_threshold, 5);
        assert_eq!(config.pepper(), Some(&b"pepper"[..]));
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_missing_secret() {
        let err = AccessConfig::from_lookup(lookup(&[]), false).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_TOKEN_SECRET));

        let config = AccessConfig::from_lookup(lookup(&[]), true).unwrap();
        assert_ne!(config.token_secret, [0u8; 32]);
    }

    #[test]
    fn test_rejects_short_secret_and_bad_numbers() {
        let err =
            AccessConfig::from_lookup(lookup(&[(ENV_TOKEN_SECRET, to_base64(&[1u8; 16]))]), false)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_TOKEN_SECRET, .. }));

        let err = AccessConfig::from_lookup(
            lookup(&[(ENV_LOCKOUT_THRESHOLD, "three".into())]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_LOCKOUT_THRESHOLD, .. }));

        let err =
            AccessConfig::from_lookup(lookup(&[(ENV_LOCKOUT_THRESHOLD, "0".into())]), true)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_LOCKOUT_THRESHOLD, .. }));
    }

    #[test]
    fn test_rejects_durations_beyond_bound() {
        for var in [ENV_SESSION_TTL_SECS, ENV_STEP_UP_TTL_SECS, ENV_LOCKOUT_SECS] {
            for raw in ["18446744073709551615", "1000000000000000", "31622401"] {
                let err = AccessConfig::from_lookup(lookup(&[(var, raw.into())]), true).unwrap_err();
                assert!(
                    matches!(err, ConfigError::Invalid { var: v, .. } if v == var),
                    "{var}={raw}"
                );
            }
        }

        let config =
            AccessConfig::from_lookup(lookup(&[(ENV_LOCKOUT_SECS, "31622400".into())]), true)
                .unwrap();
        assert_eq!(config.lockout_policy().duration, chrono::Duration::days(366));
    }

    #[test]
    fn test_oversized_fields_are_clamped() {
        let config = AccessConfig {
            session_ttl: Duration::from_secs(u64::MAX),
            lockout_duration: Duration::from_secs(u64::MAX),
            ..AccessConfig::with_random_secret()
        };
        assert_eq!(config.session_ttl_ms(), 366 * 24 * 3600 * 1000);
        assert_eq!(config.lockout_policy().duration, chrono::Duration::days(366));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AccessConfig {
            password_pepper: Some(b"pepper".to_vec()),
            ..AccessConfig::with_random_secret()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("pepper\""));
    }
}
