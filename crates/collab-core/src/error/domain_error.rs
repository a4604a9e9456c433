//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Credential Errors
    // =========================================================================
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Revocation list unavailable: {0}")]
    RevocationUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::RevocationUnavailable(_) => "REVOCATION_UNAVAILABLE",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error means the presented credential must be refused
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::TokenExpired | Self::TokenRevoked
        )
    }
}
