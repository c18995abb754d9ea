// SPDX-License-Identifier: MIT

//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::calc::error::{ParseError, RegistryError};
use crate::orchestrator::types::ErrorBody;

/// Errors a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    /// Expression text was rejected
    Parse(ParseError),

    /// Caller broke the task/expression protocol
    Registry(RegistryError),

    /// No ready task right now; workers should retry later
    NoTaskAvailable,

    /// Body could not be decoded or was incomplete
    InvalidBody(String),

    /// Path parameter could not be decoded
    InvalidPath(String),
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidPath(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let (status, kind) = match self {
            Self::Parse(err) => (StatusCode::UNPROCESSABLE_ENTITY, Some(err.kind())),
            Self::Registry(err) => {
                let status = match err {
                    RegistryError::TaskNotFound(_) | RegistryError::ExpressionNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    RegistryError::AlreadyCompleted(_) | RegistryError::TaskNotDispatched(_) => {
                        StatusCode::CONFLICT
                    }
                };
                (status, Some(err.kind()))
            }
            Self::NoTaskAvailable => (StatusCode::NOT_FOUND, Some("no_task_available")),
            Self::InvalidBody(_) => (StatusCode::UNPROCESSABLE_ENTITY, Some("invalid_body")),
            Self::InvalidPath(_) => (StatusCode::BAD_REQUEST, Some("invalid_path")),
        };

        let error = match self {
            Self::Parse(err) => err.to_string(),
            Self::Registry(err) => err.to_string(),
            Self::NoTaskAvailable => "No tasks available".to_string(),
            Self::InvalidBody(msg) | Self::InvalidPath(msg) => msg.clone(),
        };

        (
            status,
            ErrorBody {
                error,
                kind: kind.map(str::to_string),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if !matches!(self, Self::NoTaskAvailable) {
            log::debug!("Responding {}: {}", status, body.error);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::Parse(ParseError::EmptyExpression),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Registry(RegistryError::TaskNotFound(1)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Registry(RegistryError::ExpressionNotFound(1)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Registry(RegistryError::AlreadyCompleted(1)),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Registry(RegistryError::TaskNotDispatched(1)),
                StatusCode::CONFLICT,
            ),
            (ApiError::NoTaskAvailable, StatusCode::NOT_FOUND),
            (
                ApiError::InvalidBody("missing field".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, expected) in cases {
            let (status, _) = err.status_and_body();
            assert_eq!(status, expected, "{:?}", err);
        }
    }

    #[test]
    fn test_body_carries_kind() {
        let (_, body) = ApiError::Parse(ParseError::ConsecutiveOperators).status_and_body();
        assert_eq!(body.kind.as_deref(), Some("consecutive_operators"));
        assert_eq!(body.error, "Consecutive operators");
    }
}
