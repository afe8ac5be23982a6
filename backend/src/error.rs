//! Error taxonomy for the audit API.
//!
//! `ValidationError` covers everything detected locally before a store
//! round-trip; `ApiError` adds authentication failures and the single
//! opaque store failure. Every variant carries a stable machine-readable
//! code that clients may match on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use shared::ErrorResponse;
use thiserror::Error;

/// Which request field a date-format failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    From,
    To,
    Date,
}

impl DateField {
    pub fn as_str(self) -> &'static str {
        match self {
            DateField::From => "from",
            DateField::To => "to",
            DateField::Date => "date",
        }
    }
}

/// Locally detected request problems; never retried, always a 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid '{}' date: expected YYYY-MM-DD", field.as_str())]
    InvalidDateFormat { field: DateField },
    #[error("'from' must be earlier than or equal to 'to'")]
    InvalidDateRange,
    #[error("date range exceeds the maximum of {max_days} days")]
    RangeTooLarge { max_days: i64 },
    #[error("'page' must be a positive integer")]
    InvalidPage,
    #[error("'size' must be a positive integer")]
    InvalidSize,
    #[error("'date' parameter is required (format: YYYY-MM-DD)")]
    MissingDate,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidDateFormat { .. } => "INVALID_DATE_FORMAT",
            ValidationError::InvalidDateRange => "INVALID_DATE_RANGE",
            ValidationError::RangeTooLarge { .. } => "RANGE_TOO_LARGE",
            ValidationError::InvalidPage => "INVALID_PAGE",
            ValidationError::InvalidSize => "INVALID_SIZE",
            ValidationError::MissingDate => "MISSING_DATE",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to query the ledger store")]
    Store(#[source] anyhow::Error),
    #[error("authentication token missing")]
    MissingToken,
    #[error("invalid token format, expected: Bearer TOKEN")]
    InvalidTokenFormat,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("endpoint not found")]
    NotFound,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(err) => err.code(),
            ApiError::Store(_) => "STORE_ERROR",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidTokenFormat => "INVALID_TOKEN_FORMAT",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ApiError::NotFound => "NOT_FOUND",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingToken
            | ApiError::InvalidTokenFormat
            | ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken | ApiError::InsufficientPermissions => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Render the standard error envelope.
    ///
    /// Store failures are opaque: the underlying cause is attached only
    /// when not running in production.
    pub fn into_envelope(self, request_id: &str, production: bool) -> Response {
        let details = match &self {
            ApiError::Store(source) if !production => Some(format!("{source:#}")),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.code().to_string(),
            request_id: request_id.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}
