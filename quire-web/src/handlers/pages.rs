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
use crate::handlers::base_context;
use crate::services::RenderedPage;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::io::ErrorKind;

async fn render_html(state: &AppState, slug: &str) -> Result<Html<String>, AppError> {
    let rendered = state.pages.render_slug(slug).await?;
    let seo = state.seo.for_page(&rendered.page);

    let mut context = base_context(state);
    context.insert("seo", &seo);
    context.insert("json_ld", &seo.json_ld_script());
    context.insert("body", &rendered.html());

    let html = state.templates.render("page.html", &context)?;
    Ok(Html(html))
}

pub async fn home_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_html(&state, "").await
}

pub async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    render_html(&state, &slug).await
}

pub async fn api_home_page(State(state): State<AppState>) -> Result<Json<RenderedPage>, AppError> {
    Ok(Json(state.pages.render_slug("").await?))
}

pub async fn api_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RenderedPage>, AppError> {
    Ok(Json(state.pages.render_slug(&slug).await?))
}

/// Serve the generated sitemap, building it first if the file does not exist yet
pub async fn sitemap_xml(State(state): State<AppState>) -> Result<Response, AppError> {
    let path = state.sitemap.output_path();

    let xml = match tokio::fs::read_to_string(path).await {
        Ok(xml) => xml,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "Sitemap missing, generating on demand");
            state.sitemap.generate().await?;
            tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::internal("Failed to read sitemap").with_details(e.to_string())
            })?
        }
        Err(e) => {
            return Err(AppError::internal("Failed to read sitemap").with_details(e.to_string()))
        }
    };

    Ok(([(CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}
