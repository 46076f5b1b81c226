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

use crate::config::Config;
use crate::csrf::CsrfGuard;
use crate::rate_limit::{forwarded_ip_key, RateLimiter};
use crate::seo::SeoManager;
use crate::services::{AuthService, PageRenderingService};
use crate::sitemap::SitemapGenerator;
use crate::templates::TemplateEngine;
use axum::extract::FromRef;
use quire_core::{IdentityStore, PageStore, PasswordHasher, TokenManager};
use quire_db::{PageRepository, UserRepository};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Every stateful service, built once at startup and shared by handle
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub pages: PageRenderingService,
    pub csrf: CsrfGuard,
    pub auth_rate_limiter: RateLimiter,
    pub api_rate_limiter: RateLimiter,
    pub seo: SeoManager,
    pub sitemap: SitemapGenerator,
    pub templates: TemplateEngine,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, templates: TemplateEngine) -> Self {
        let users: Arc<dyn IdentityStore> = Arc::new(UserRepository::new(pool.clone()));
        let pages: Arc<dyn PageStore> = Arc::new(PageRepository::new(pool.clone()));
        let tokens = Arc::new(TokenManager::new(&config.jwt_secret, config.jwt_expiration()));
        let limiter = |per_minute: u32| {
            let limiter = RateLimiter::per_minute(per_minute);
            if config.rate_limit.trust_proxy_headers {
                limiter.with_key_fn(forwarded_ip_key)
            } else {
                limiter
            }
        };

        Self {
            auth: AuthService::new(users, tokens, PasswordHasher::new(config.password)),
            pages: PageRenderingService::new(pages.clone()),
            csrf: CsrfGuard::new(config.csrf_token_ttl(), config.csrf.exempt_paths.clone()),
            auth_rate_limiter: limiter(config.rate_limit.auth_requests_per_minute),
            api_rate_limiter: limiter(config.rate_limit.api_requests_per_minute),
            seo: SeoManager::new(&config.base_url, &config.site_name, &config.site_description),
            sitemap: SitemapGenerator::new(&config.base_url, &config.sitemap_path, pages),
            templates,
            pool,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for CsrfGuard {
    fn from_ref(state: &AppState) -> Self {
        state.csrf.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
