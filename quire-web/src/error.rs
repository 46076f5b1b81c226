// Quire - A component-based CMS built with Rust
// Copyright (C) 2025 Quire Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use quire_core::validation::ValidationErrors;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::fmt;

pub const REDACTED_MESSAGE: &str = "An internal error occurred";

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    Unauthorized,
    Forbidden,
    Conflict,
    BadRequest,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    RateLimited,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Internal => "INTERNAL_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
        }
    }

    pub fn default_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Validation | ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Application error type that includes context for better debugging
#[derive(Debug)]
pub struct AppError {
    pub code: ErrorCode,
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: code.default_status(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::RateLimited, "Too many requests")
    }

    /// JSON body shared by every error response
    pub fn body(code: ErrorCode, message: &str) -> serde_json::Value {
        json!({ "error": { "code": code, "message": message } })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {}", self.message, details)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = ?self.status,
                code = self.code.as_str(),
                message = %self.message,
                details = ?self.details,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = ?self.status,
                code = self.code.as_str(),
                message = %self.message,
                "Request rejected"
            );
        }

        let mut response =
            (self.status, Json(AppError::body(self.code, &self.message))).into_response();
        // Lets the redaction layer recognise error bodies it may rewrite
        response.extensions_mut().insert(self.code);
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Internal server error").with_details(format!("{:?}", err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::validation(err.to_string())
    }
}

/// Replace 5xx error messages with a generic phrase in production
pub async fn redact_internal_errors(
    State(production): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !production || !response.status().is_server_error() {
        return response;
    }

    let Some(code) = response.extensions().get::<ErrorCode>().copied() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let body = Json(AppError::body(code, REDACTED_MESSAGE)).into_response();
    let (body_parts, body) = body.into_parts();
    if let Some(content_type) = body_parts.headers.get(axum::http::header::CONTENT_TYPE) {
        parts
            .headers
            .insert(axum::http::header::CONTENT_TYPE, content_type.clone());
    }

    Response::from_parts(parts, body)
}

/// Answer a panicking handler with a 500 instead of dropping the connection
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "non-string panic payload"
    };
    tracing::error!(panic = detail, "Request handler panicked");

    AppError::internal("Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_taxonomy_statuses() {
        assert_eq!(AppError::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(AppError::validation("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(AppError::conflict("x").status, StatusCode::CONFLICT);
        assert_eq!(AppError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::internal("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::rate_limited().status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_codes_serialize_like_as_str() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::Validation,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::Conflict,
            ErrorCode::BadRequest,
            ErrorCode::Internal,
            ErrorCode::RateLimited,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = AppError::conflict("User with this email already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            read_json(response).await,
            json!({"error": {"code": "CONFLICT", "message": "User with this email already exists"}})
        );
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.unwrap().contains("disk on fire"));
    }

    fn app(production: bool) -> Router {
        Router::new()
            .route(
                "/boom",
                get(|| async { AppError::internal("database path /var/secret.db locked") }),
            )
            .route("/missing", get(|| async { AppError::not_found("Page not found") }))
            .layer(middleware::from_fn_with_state(production, redact_internal_errors))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_production_redacts_server_errors() {
        let response = app(true).oneshot(get_request("/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await,
            json!({"error": {"code": "INTERNAL_ERROR", "message": REDACTED_MESSAGE}})
        );
    }

    #[tokio::test]
    async fn test_production_keeps_client_errors() {
        let response = app(true).oneshot(get_request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["error"]["message"], "Page not found");
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = handle_panic(Box::new("index out of bounds"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorCode>(),
            Some(&ErrorCode::Internal)
        );
    }

    #[tokio::test]
    async fn test_development_keeps_server_error_message() {
        let response = app(false).oneshot(get_request("/boom")).await.unwrap();
        assert_eq!(
            read_json(response).await["error"]["message"],
            "database path /var/secret.db locked"
        );
    }
}
