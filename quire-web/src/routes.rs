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

use crate::{
    auth::{authenticate, require_authenticated, require_permission},
    config::Config,
    csrf::{csrf_protection_middleware, CSRF_HEADER},
    error::{handle_panic, redact_internal_errors},
    handlers,
    path_security::path_traversal_guard,
    rate_limit::rate_limit_middleware,
    request_logging::request_logging_middleware,
    security_headers::security_headers_middleware,
    AppState,
};
use axum::extract::DefaultBodyLimit;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use quire_core::models::permission::Permission;
use tower::{Layer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Required for the admin area. Only admins and editors hold it.
const ADMIN_AREA: Permission = Permission::PagesDelete;

/// The router wrapped so `/about/` resolves like `/about`.
///
/// Trailing slashes have to be trimmed before routing, so this wraps the
/// whole router instead of being one of its layers.
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}

pub fn create_router(state: AppState) -> Router {
    with_middleware(routes(&state), state)
}

fn routes(state: &AppState) -> Router<AppState> {
    let auth_limit =
        middleware::from_fn_with_state(state.auth_rate_limiter.clone(), rate_limit_middleware);
    let api_limit =
        middleware::from_fn_with_state(state.api_rate_limiter.clone(), rate_limit_middleware);

    // Credential endpoints share the strict limiter
    let auth_api = Router::new()
        .route("/api/auth/login", post(handlers::api_login))
        .route("/api/auth/register", post(handlers::api_register))
        .route("/api/auth/logout", post(handlers::api_logout))
        .route_layer(auth_limit.clone());

    let api = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route("/api/csrf-token", get(handlers::csrf_token))
        .route("/api/pages/home", get(handlers::api_home_page))
        .route("/api/pages/{slug}", get(handlers::api_page))
        .route_layer(api_limit.clone());

    let admin = Router::new()
        .route("/admin/dashboard", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(ADMIN_AREA, require_permission))
        .route_layer(middleware::from_fn(require_authenticated));

    // Every form view mints a CSRF token, so it is limited like the API
    let login = get(handlers::login_form)
        .layer(api_limit)
        .merge(post(handlers::login_submit).layer(auth_limit));

    Router::new()
        .route("/", get(handlers::home_page))
        .route("/health", get(handlers::health))
        .route("/sitemap.xml", get(handlers::sitemap_xml))
        .route("/admin/login", login)
        .route("/admin/logout", post(handlers::logout))
        .merge(auth_api)
        .merge(api)
        .merge(admin)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Public pages last so fixed paths win
        .route("/{slug}", get(handlers::show_page))
}

/// Global stack, innermost first
fn with_middleware(router: Router<AppState>, state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;

    router
        .layer(middleware::from_fn_with_state(
            state.csrf.clone(),
            csrf_protection_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            authenticate,
        ))
        .layer(middleware::from_fn(path_traversal_guard))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.config.is_production(),
            redact_internal_errors,
        ))
        .layer(middleware::from_fn_with_state(
            state.config.uses_https(),
            security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .with_state(state)
}

/// Any origin in development, only the site itself in production
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(CSRF_HEADER),
        ]);

    match config.allowed_origins() {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect();
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
        }
        None => cors.allow_origin(Any),
    }
}
