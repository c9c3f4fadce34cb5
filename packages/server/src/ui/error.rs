//! Mapping of use case errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::ValueObjectError,
    infrastructure::dto::http::ErrorResponse,
    usecase::{AiReplyError, HeartbeatError, QueryError, RelayError},
};

/// Error returned by HTTP handlers, rendered as `{"success": false, "error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    NotConfigured(String),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(error: ValueObjectError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::Validation(e) => e.into(),
            RelayError::NotFound(_) => ApiError::NotFound(error.to_string()),
            RelayError::Storage(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<HeartbeatError> for ApiError {
    fn from(error: HeartbeatError) -> Self {
        match error {
            HeartbeatError::Validation(e) => e.into(),
            HeartbeatError::Storage(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<AiReplyError> for ApiError {
    fn from(error: AiReplyError) -> Self {
        match error {
            AiReplyError::NotConfigured => ApiError::NotConfigured(error.to_string()),
            AiReplyError::NotFound(_) => ApiError::NotFound(error.to_string()),
            AiReplyError::Upstream(_) => ApiError::Upstream(error.to_string()),
            AiReplyError::Relay(e) => e.into(),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, RepositoryError};

    #[test]
    fn test_status_mapping() {
        // テスト項目: ユースケースのエラーが対応する HTTP ステータスに変換される
        // given (前提条件):
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                RelayError::Validation(ValueObjectError::MessageTextEmpty).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RelayError::NotFound(MessageId::new(1)).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                RelayError::Storage(RepositoryError::Unavailable("x".to_string())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AiReplyError::NotConfigured.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AiReplyError::Upstream("x".to_string()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AiReplyError::Relay(RelayError::NotFound(MessageId::new(2))).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                HeartbeatError::Validation(ValueObjectError::UsernameEmpty).into(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        // then (期待する結果):
        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error:?}");
        }
    }

    #[test]
    fn test_error_response_status() {
        // テスト項目: レスポンスに ApiError のステータスコードが設定される
        // when (操作):
        let response = ApiError::NotFound("Message 3 not found".to_string()).into_response();

        // then (期待する結果):
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
