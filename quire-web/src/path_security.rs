use crate::error::AppError;
use axum::{extract::Request, middleware::Next, response::Response};

/// True for paths that try to climb out of the site root or smuggle empty segments
pub fn is_suspicious_path(path: &str) -> bool {
    path.contains("..") || path.contains("//") || path.contains('\0')
}

/// Reject traversal attempts before routing
pub async fn path_traversal_guard(request: Request, next: Next) -> Result<Response, AppError> {
    let path = request.uri().path();
    if is_suspicious_path(path) {
        tracing::warn!(path = %path, "Rejected suspicious request path");
        return Err(AppError::bad_request("Invalid path"));
    }

    Ok(next.run(request).await)
}
