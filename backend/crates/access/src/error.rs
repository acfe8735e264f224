//! Access Error Types
//!
//! Access-control failures and their mapping onto the unified
//! `kernel::error::AppError` problem body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::SensitiveAction;

/// Access-specific result type alias
pub type AccessResult<T> = Result<T, AccessError>;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Missing, malformed, badly signed or expired session token
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid session, insufficient role or permission
    #[error("Insufficient permissions")]
    Forbidden,

    /// Sensitive action without a live step-up token
    #[error("Password confirmation required for {action}")]
    ReAuthRequired { action: SensitiveAction },

    /// Re-authentication request without a password
    #[error("Password is required")]
    PasswordRequired,

    /// Wrong password during re-authentication
    #[error("Invalid password")]
    InvalidCredentials { remaining_attempts: u32 },

    /// Wrong user name or password at login
    #[error("Invalid user name or password")]
    LoginFailed,

    /// Too many consecutive failures
    #[error("Too many failed attempts")]
    LockedOut {
        locked_until: DateTime<Utc>,
        retry_after_secs: i64,
    },

    /// Request body could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccessError {
    pub fn locked_out(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining_ms = (locked_until - now).num_milliseconds().max(0);
        AccessError::LockedOut {
            locked_until,
            // round up so clients never retry a moment too early
            retry_after_secs: (remaining_ms + 999) / 1000,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::Unauthenticated | AccessError::LoginFailed => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden | AccessError::ReAuthRequired { .. } => StatusCode::FORBIDDEN,
            AccessError::PasswordRequired
            | AccessError::InvalidCredentials { .. }
            | AccessError::LockedOut { .. }
            | AccessError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AccessError::Database(_) | AccessError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Unauthenticated | AccessError::LoginFailed => ErrorKind::Unauthorized,
            AccessError::Forbidden | AccessError::ReAuthRequired { .. } => ErrorKind::Forbidden,
            AccessError::PasswordRequired
            | AccessError::InvalidCredentials { .. }
            | AccessError::LockedOut { .. }
            | AccessError::InvalidRequest(_) => ErrorKind::BadRequest,
            AccessError::Database(_) | AccessError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "UNAUTHENTICATED",
            AccessError::Forbidden => "FORBIDDEN",
            AccessError::ReAuthRequired { .. } => "REAUTH_REQUIRED",
            AccessError::PasswordRequired => "PASSWORD_REQUIRED",
            AccessError::InvalidCredentials { .. } => "INVALID_PASSWORD",
            AccessError::LoginFailed => "INVALID_LOGIN",
            AccessError::LockedOut { .. } => "LOCKED_OUT",
            AccessError::InvalidRequest(_) => "INVALID_REQUEST",
            AccessError::Database(_) | AccessError::Internal(_) => "INTERNAL",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        // Server-side details stay in the logs.
        let message = match self {
            AccessError::Database(_) | AccessError::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        };
        let error = AppError::new(self.kind(), message).with_code(self.code());

        match self {
            AccessError::ReAuthRequired { action } => error
                .with_extension("reAuthRequired", true)
                .with_extension("sensitiveAction", action),
            AccessError::InvalidCredentials { remaining_attempts } => {
                error.with_extension("remainingAttempts", remaining_attempts)
            }
            AccessError::LockedOut {
                locked_until,
                retry_after_secs,
            } => error
                .with_extension(
                    "lockedUntil",
                    locked_until.to_rfc3339_opts(SecondsFormat::Millis, true),
                )
                .with_extension("retryAfterSecs", retry_after_secs),
            _ => error,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AccessError::Database(e) => {
                tracing::error!(error = %e, "Access database error");
            }
            AccessError::Internal(msg) => {
                tracing::error!(message = %msg, "Access internal error");
            }
            AccessError::LockedOut { locked_until, .. } => {
                tracing::warn!(%locked_until, "Attempt rejected while locked out");
            }
            AccessError::InvalidCredentials { remaining_attempts } => {
                tracing::warn!(remaining_attempts, "Password confirmation failed");
            }
            AccessError::LoginFailed => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Access error");
            }
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AccessError {
    fn from(err: AppError) -> Self {
        AccessError::Internal(err.to_string())
    }
}

/// Audit storage failure. Absorbed by the recorder, never sent to clients.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Audit store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(AccessError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AccessError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AccessError::ReAuthRequired {
                action: SensitiveAction::VoidCheck
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AccessError::PasswordRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AccessError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reauth_required_body() {
        let problem = AccessError::ReAuthRequired {
            action: SensitiveAction::VoidCheck,
        }
        .to_app_error()
        .to_problem();

        assert_eq!(problem["status"], 403);
        assert_eq!(problem["reAuthRequired"], true);
        assert_eq!(problem["sensitiveAction"], "VOID_CHECK");
        assert_eq!(problem["error"], "REAUTH_REQUIRED");
    }

    #[test]
    fn test_forbidden_has_no_reauth_flag() {
        let problem = AccessError::Forbidden.to_app_error().to_problem();
        assert_eq!(problem["status"], 403);
        assert!(problem.get("reAuthRequired").is_none());
    }

    #[test]
    fn test_locked_out_body() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let until = now + Duration::milliseconds(299_001);
        let error = AccessError::locked_out(until, now);

        let problem = error.to_app_error().to_problem();
        assert_eq!(problem["retryAfterSecs"], 300);
        assert_eq!(problem["lockedUntil"], "2023-11-14T22:18:19.001Z");
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let problem = AccessError::Internal("pool exhausted".into())
            .to_app_error()
            .to_problem();
        assert_eq!(problem["detail"], "Internal server error");
    }
}
