pub mod admin;
pub mod auth;
pub mod csrf;
pub mod health;
pub mod pages;

pub use admin::{dashboard, login_form, login_submit, logout};
pub use auth::{api_login, api_logout, api_register, me};
pub use csrf::csrf_token;
pub use health::health;
pub use pages::{api_home_page, api_page, home_page, show_page, sitemap_xml};

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use tera::Context;

/// Template context with the values every layout needs
pub(crate) fn base_context(state: &AppState) -> Context {
    let mut context = Context::new();
    context.insert("site_name", &state.config.site_name);
    context
}

/// Unwrap a JSON body, reporting malformed input as a 400 in the common error shape
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            Err(AppError::bad_request("Invalid request body"))
        }
    }
}
