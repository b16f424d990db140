//! API Errors
//!
//! Every failure leaves the server as `{ "error": ..., "code": ... }`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use agent_core::AgentError;
use crypto_analyst::AnalystError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Opportunity not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Agent not initialized")]
    AgentUnavailable,

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AgentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Agent(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "INVALID_REQUEST",
            Self::AgentUnavailable => "AGENT_UNAVAILABLE",
            Self::Agent(_) => "AGENT_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AnalystError> for ApiError {
    fn from(err: AnalystError) -> Self {
        match err {
            AnalystError::NotFound(id) => Self::NotFound(id),
            AnalystError::Validation(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            Self::Agent(e) => {
                tracing::error!(error = %e, "Agent error");
                e.user_message()
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
