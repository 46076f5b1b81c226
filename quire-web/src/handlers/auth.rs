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

use crate::auth::{auth_cookie, clear_auth_cookie, CurrentUser};
use crate::error::AppError;
use crate::handlers::json_body;
use crate::services::{LoginRequest, LoginResponse, RegisterRequest};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use quire_core::models::user::User;
use quire_core::validation::Validate;
use serde_json::json;

/// POST /api/auth/login
pub async fn api_login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let response = state.auth.login(&request).await?;
    let jar = jar.add(auth_cookie(
        response.token.clone(),
        state.config.cookie_secure(),
    ));

    Ok((jar, Json(response)))
}

/// POST /api/auth/register
pub async fn api_register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let user = state.auth.register(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn api_logout(jar: CookieJar) -> impl IntoResponse {
    (
        clear_auth_cookie(jar),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user)
}
