use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::crypto::TokenError;
use crate::domain::ResourceCategory;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every expected, caller-recoverable failure of the REST surface.
///
/// Each variant maps to a status code and a structured JSON body; only
/// `Internal` hides its cause from the client (it is logged instead).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Daily {category} quota exceeded ({current}/{limit})")]
    QuotaExceeded {
        category: ResourceCategory,
        limit: i32,
        current: i32,
    },

    #[error("Too many failed login attempts, retry in {retry_after_seconds} seconds")]
    Cooldown { retry_after_seconds: i64 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable code included in every error body
    fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InvalidState(_) => "invalid_state",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Cooldown { .. } => "cooldown",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Map a unique-index violation to `Conflict`, anything else to a
    /// logged internal error
    pub fn conflict_on_unique(e: sqlx::Error, message: &str) -> Self {
        match &e {
            sqlx::Error::Database(db)
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                Self::Conflict(message.into())
            }
            _ => Self::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => Self::Unauthenticated("Session token is expired".into()),
            TokenError::SignatureMismatch | TokenError::DecodeEncodeError => {
                Self::Unauthenticated("Invalid session token".into())
            }
        }
    }
}

/// Serialized error payload
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<i64>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Parse(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::QuotaExceeded { .. } | Self::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
            limit: None,
            current: None,
            retry_after_seconds: None,
        };

        match self {
            Self::QuotaExceeded { limit, current, .. } => {
                body.limit = Some(*limit);
                body.current = Some(*current);
            }
            Self::Cooldown {
                retry_after_seconds,
            } => {
                body.retry_after_seconds = Some(*retry_after_seconds);
            }
            Self::Internal(e) => {
                // Never leak internals to the client
                tracing::error!(error.cause_chain = ?e, "Internal server error");
                body.message = "Internal Server Error".into();
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
