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

use crate::error::AppError;
use crate::services::AuthService;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::ACCEPT, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use quire_core::models::permission::{self, Permission, Role};
use serde::Serialize;
use std::convert::Infallible;

pub const AUTH_COOKIE: &str = "auth_token";
pub const LOGIN_PATH: &str = "/admin/login";

/// Identity attached to a request once its token has been validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    /// A token is only issued to an active account, so the identity counts as active.
    pub fn can(&self, action: Permission) -> bool {
        permission::has_permission(self.role.as_str(), true, action)
    }

    pub fn can_edit(&self) -> bool {
        permission::can_edit(self.role.as_str(), true)
    }

    pub fn can_delete(&self) -> bool {
        permission::can_delete(self.role.as_str(), true)
    }
}

/// Bearer credential for a request. An Authorization header wins over the cookie.
pub fn credential(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if headers.contains_key(axum::http::header::AUTHORIZATION) {
        return headers
            .typed_get::<Authorization<Bearer>>()
            .map(|Authorization(bearer)| bearer.token().to_string());
    }

    jar.get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Attach an [`AuthContext`] when the request carries a valid token.
///
/// Missing or invalid credentials leave the request anonymous.
pub async fn authenticate(
    State(auth): State<AuthService>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = credential(request.headers(), &jar) {
        match auth.validate_token(&token) {
            Ok(claims) => match claims.role.parse::<Role>() {
                Ok(role) => {
                    request.extensions_mut().insert(AuthContext {
                        user_id: claims.user_id(),
                        email: claims.email,
                        role,
                    });
                }
                Err(e) => tracing::debug!(error = %e, "Token carries an unknown role"),
            },
            Err(_) => tracing::debug!(path = %request.uri().path(), "Ignoring invalid auth token"),
        }
    }

    next.run(request).await
}

pub(crate) fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// JSON clients get 401, browsers are sent to the login form
pub async fn require_authenticated(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthContext>().is_some() {
        return next.run(request).await;
    }

    if accepts_json(request.headers()) {
        AppError::unauthorized("Unauthorized").into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Reject identities whose role lacks `action` with 403.
pub async fn require_permission(
    State(action): State<Permission>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

    if !context.can(action) {
        tracing::warn!(
            user_id = context.user_id,
            role = %context.role,
            permission = action.as_str(),
            path = %request.uri().path(),
            "Permission denied"
        );
        return Err(AppError::forbidden("Insufficient permissions"));
    }

    Ok(next.run(request).await)
}

/// HttpOnly session cookie carrying the access token
pub fn auth_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

pub fn clear_auth_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(AUTH_COOKIE).path("/"))
}

/// Authenticated identity; rejects with 401 when absent
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))
    }
}

#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<AuthContext>().cloned()))
    }
}
