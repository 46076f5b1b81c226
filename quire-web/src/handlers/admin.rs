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

use crate::auth::{
    accepts_json, auth_cookie, clear_auth_cookie, CurrentUser, OptionalUser, LOGIN_PATH,
};
use crate::csrf::csrf_cookie;
use crate::error::{AppError, ErrorCode};
use crate::handlers::base_context;
use crate::services::auth_service::INVALID_CREDENTIALS;
use crate::services::LoginRequest;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::CookieJar;
use quire_core::validation::Validate;
use serde::Deserialize;
use serde_json::json;

pub const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Render the login form with a fresh CSRF token in both the form and the cookie
async fn login_page(
    state: &AppState,
    jar: CookieJar,
    email: &str,
    error: Option<&str>,
) -> Result<(CookieJar, Html<String>), AppError> {
    let token = state.csrf.generate().await;

    let mut context = base_context(state);
    context.insert("csrf_token", &token);
    context.insert("email", email);
    if let Some(error) = error {
        context.insert("error", error);
    }

    let html = state.templates.render("login.html", &context)?;
    let jar = jar.add(csrf_cookie(token, state.config.cookie_secure()));
    Ok((jar, Html(html)))
}

/// GET /admin/login
pub async fn login_form(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }

    Ok(login_page(&state, jar, "", None).await?.into_response())
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let request = LoginRequest {
        email: form.email,
        password: form.password,
    };

    let outcome = match request.validate() {
        Ok(()) => state.auth.login(&request).await,
        Err(errors) => Err(errors.into()),
    };

    match outcome {
        Ok(response) => {
            tracing::info!(user_id = ?response.user.id, "Admin login");
            let jar = jar.add(auth_cookie(response.token, state.config.cookie_secure()));
            Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(err) if err.status.is_server_error() => Err(err),
        Err(err) => {
            let (status, message) = match err.code {
                ErrorCode::Forbidden => (StatusCode::FORBIDDEN, err.message.as_str()),
                _ => (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
            };
            let (jar, html) = login_page(&state, jar, &request.email, Some(message)).await?;
            Ok((status, jar, html).into_response())
        }
    }
}

/// POST /admin/logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_auth_cookie(jar), Redirect::to(LOGIN_PATH))
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let pages = state.pages.all_pages().await?;
    let permissions = json!({ "can_edit": user.can_edit(), "can_delete": user.can_delete() });

    if accepts_json(&headers) {
        return Ok(Json(json!({ "user": user, "pages": pages, "permissions": permissions }))
            .into_response());
    }

    let token = state.csrf.generate().await;
    let mut context = base_context(&state);
    context.insert("user", &user);
    context.insert("pages", &pages);
    context.insert("permissions", &permissions);
    context.insert("csrf_token", &token);

    let html = state.templates.render("dashboard.html", &context)?;
    let jar = jar.add(csrf_cookie(token, state.config.cookie_secure()));
    Ok((jar, Html(html)).into_response())
}
