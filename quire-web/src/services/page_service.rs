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
use quire_core::models::component_renderer::{ComponentRenderer, RenderedComponent};
use quire_core::models::page::Page;
use quire_core::PageStore;
use serde::Serialize;
use std::sync::Arc;

/// A page together with its display-ready blocks
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub page: Page,
    pub blocks: Vec<RenderedComponent>,
}

impl RenderedPage {
    pub fn html(&self) -> String {
        self.blocks
            .iter()
            .map(RenderedComponent::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone)]
pub struct PageRenderingService {
    pages: Arc<dyn PageStore>,
    renderer: ComponentRenderer,
}

impl PageRenderingService {
    pub fn new(pages: Arc<dyn PageStore>) -> Self {
        Self {
            pages,
            renderer: ComponentRenderer::new(),
        }
    }

    /// Load a page and its components. The empty slug is the home page.
    ///
    /// Components are best-effort: a failed lookup leaves the page without them.
    pub async fn get_page_by_slug(&self, slug: &str) -> Result<Page, AppError> {
        let mut page = self
            .pages
            .find_page_by_slug(slug)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Page not found"))?;

        if let Some(page_id) = page.id {
            match self.pages.components_for_page(page_id).await {
                Ok(components) => page.components = components,
                Err(e) => {
                    tracing::warn!(page_id, error = ?e, "Failed to load page components");
                    page.components.clear();
                }
            }
        }

        Ok(page)
    }

    pub fn render_page(&self, page: &Page) -> Result<Vec<RenderedComponent>, AppError> {
        if page.components.is_empty() {
            return Ok(vec![RenderedComponent::fallback(&page.title, &page.content)]);
        }

        self.renderer
            .render_multiple(&page.ordered_components())
            .map_err(|e| AppError::internal("Failed to render page").with_details(e.to_string()))
    }

    /// Public lookup: drafts and archived pages are reported as missing
    pub async fn render_slug(&self, slug: &str) -> Result<RenderedPage, AppError> {
        let page = self.get_page_by_slug(slug).await?;
        if !page.is_published() {
            return Err(AppError::not_found("Page not found"));
        }

        let blocks = self.render_page(&page)?;
        Ok(RenderedPage { page, blocks })
    }

    pub async fn published_pages(&self) -> Result<Vec<Page>, AppError> {
        Ok(self.pages.list_published().await?)
    }

    /// Every page regardless of status, for the admin area
    pub async fn all_pages(&self) -> Result<Vec<Page>, AppError> {
        Ok(self.pages.list_all().await?)
    }
}
