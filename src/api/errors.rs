use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::session::UsersError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    UserNotFound(String),
    Unauthorized(String),
    InvalidRequest(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::UserNotFound(id) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("User not found: {id}"),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UsersError> for ApiError {
    fn from(err: UsersError) -> Self {
        match err {
            UsersError::UserNotFound(id) => ApiError::UserNotFound(id),
            other => ApiError::InvalidRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn error_to_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn user_not_found_returns_404() {
        let (status, json) = error_to_json(ApiError::UserNotFound("abc".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "USER_NOT_FOUND");
        assert_eq!(json["error"]["message"], "User not found: abc");
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let (status, json) = error_to_json(ApiError::Unauthorized("missing user id".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn users_error_converts_to_api_error() {
        let api_err: ApiError = UsersError::UserNotFound("ghost".into()).into();
        let (status, _) = error_to_json(api_err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let api_err: ApiError = UsersError::AlreadyQueued.into();
        let (status, json) = error_to_json(api_err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    }
}
