//! Handshake rejection

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use collab_common::{AppError, ErrorResponse};
use collab_core::DomainError;
use thiserror::Error;

/// Reason a handshake was refused
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingCredential,

    #[error(transparent)]
    Credential(#[from] DomainError),
}

impl AuthError {
    fn as_app_error(&self) -> AppError {
        match self {
            Self::MissingCredential => AppError::MissingAuth,
            Self::Credential(e) => match e {
                DomainError::InvalidToken => AppError::InvalidToken,
                DomainError::TokenExpired => AppError::TokenExpired,
                DomainError::TokenRevoked => AppError::Domain(DomainError::TokenRevoked),
                DomainError::RevocationUnavailable(msg) => {
                    AppError::Domain(DomainError::RevocationUnavailable(msg.clone()))
                }
                DomainError::InternalError(msg) => {
                    AppError::Domain(DomainError::InternalError(msg.clone()))
                }
            },
        }
    }

    /// HTTP status of the rejection
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.as_app_error().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine readable error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        self.as_app_error().error_code()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let app_error = self.as_app_error();
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Handshake could not be authenticated");
        }

        let mut response = (status, Json(ErrorResponse::from(&app_error))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
