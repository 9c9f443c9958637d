// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::TokenError;
use crate::services::ServiceError;
use crate::storage::TransactionError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::NotFound => ApiError::not_found(err.to_string()),
            ServiceError::Token(TokenError::Encoding(msg)) => {
                error!(error = %msg, "Token signing failed");
                ApiError::internal()
            }
            ServiceError::Token(e) => ApiError::unauthorized(e.to_string()),
            ServiceError::Transaction(TransactionError::Cancelled) => {
                ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request cancelled")
            }
            other => {
                error!(error = %other, "Request failed");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbError;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let conflict = ApiError::conflict("taken");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.message, "taken");
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Token(TokenError::Expired), StatusCode::UNAUTHORIZED),
            (
                ServiceError::Token(TokenError::Encoding("key".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Database(DbError::Task("panicked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Transaction(TransactionError::Cancelled),
                StatusCode::REQUEST_TIMEOUT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(ServiceError::Database(DbError::NotFound("users/x".into())));
        assert_eq!(err.message, "Internal server error");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
