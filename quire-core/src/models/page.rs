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

use crate::models::component::Component;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slugs that collide with fixed routes
pub const RESERVED_SLUGS: &[&str] = &["home"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
            PageStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            "archived" => Ok(PageStatus::Archived),
            other => Err(format!("unknown page status: {}", other)),
        }
    }
}

/// A component placed on a page at an explicit ordinal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageComponent {
    pub component: Component,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Option<i64>,
    /// Empty for the home page
    pub slug: String,
    pub title: String,
    pub content: String,
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub og_image: String,
    pub status: PageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub components: Vec<PageComponent>,
}

impl Page {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            slug: slug.into(),
            title: title.into(),
            content: String::new(),
            meta_title: String::new(),
            meta_description: String::new(),
            meta_keywords: String::new(),
            og_image: String::new(),
            status: PageStatus::Draft,
            created_at: now,
            updated_at: now,
            components: Vec::new(),
        }
    }

    pub fn is_home(&self) -> bool {
        self.slug.is_empty()
    }

    pub fn is_published(&self) -> bool {
        self.status == PageStatus::Published
    }

    /// Public URL path for this page
    pub fn path(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Components sorted by their stored position
    pub fn ordered_components(&self) -> Vec<Component> {
        let mut placed: Vec<&PageComponent> = self.components.iter().collect();
        placed.sort_by_key(|pc| pc.position);
        placed.into_iter().map(|pc| pc.component.clone()).collect()
    }

    pub fn validate_title(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if self.title.len() > 255 {
            return Err("Title cannot exceed 255 characters".to_string());
        }
        Ok(())
    }

    pub fn validate_slug(&self) -> Result<(), String> {
        if self.slug.is_empty() {
            return Ok(());
        }
        if self.slug.len() > 100 {
            return Err("Slug cannot exceed 100 characters".to_string());
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(
                "Slug can only contain lowercase letters, numbers, and hyphens".to_string(),
            );
        }
        if self.slug.starts_with('-') || self.slug.ends_with('-') {
            return Err("Slug cannot start or end with a hyphen".to_string());
        }
        // `/api/pages/home` always serves the empty-slug page
        if RESERVED_SLUGS.contains(&self.slug.as_str()) {
            return Err(format!("Slug '{}' is reserved", self.slug));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> Result<(), String> {
        self.validate_title()?;
        self.validate_slug()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page() {
        let page = Page::new("about", "About");
        assert_eq!(page.status, PageStatus::Draft);
        assert!(!page.is_home());
        assert_eq!(page.path(), "/about");
        assert!(page.components.is_empty());
    }

    #[test]
    fn test_home_page() {
        let page = Page::new("", "Home");
        assert!(page.is_home());
        assert_eq!(page.path(), "/");
        assert!(page.validate_slug().is_ok());
    }

    #[test]
    fn test_ordered_components() {
        let mut page = Page::new("", "Home");
        page.components = vec![
            PageComponent {
                component: Component::new("about", "second"),
                position: 2,
            },
            PageComponent {
                component: Component::new("hero", "first"),
                position: 1,
            },
        ];

        let names: Vec<String> = page
            .ordered_components()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_validate_slug() {
        let mut page = Page::new("valid-slug-2", "T");
        assert!(page.validate_slug().is_ok());

        for bad in ["Upper", "has space", "-lead", "trail-", "under_score"] {
            page.slug = bad.to_string();
            assert!(page.validate_slug().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_home_slug_is_reserved() {
        let page = Page::new("home", "Home");
        assert_eq!(page.validate_slug(), Err("Slug 'home' is reserved".to_string()));
        assert!(Page::new("home-office", "Home office").validate_slug().is_ok());
    }

    #[test]
    fn test_validate_title() {
        let mut page = Page::new("x", "  ");
        assert!(page.validate_title().is_err());
        page.title = "a".repeat(256);
        assert!(page.validate_title().is_err());
        page.title = "Fine".to_string();
        assert!(page.is_valid().is_ok());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("published".parse::<PageStatus>().unwrap(), PageStatus::Published);
        assert!("deleted".parse::<PageStatus>().is_err());
        assert_eq!(PageStatus::default(), PageStatus::Draft);
    }
}
