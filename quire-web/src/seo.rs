//! Head metadata for public pages.

use quire_core::models::page::Page;
use quire_core::sanitize::strip_tags;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_image: String,
    pub og_type: String,
    pub canonical_url: String,
    pub json_ld: Value,
}

impl SeoMeta {
    /// Structured data as a string safe to embed in a `<script>` element
    pub fn json_ld_script(&self) -> String {
        self.json_ld.to_string().replace("</", "<\\/")
    }
}

#[derive(Debug, Clone)]
pub struct SeoManager {
    base_url: String,
    site_name: String,
    site_description: String,
}

impl SeoManager {
    pub fn new(base_url: &str, site_name: &str, site_description: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            site_name: site_name.to_string(),
            site_description: site_description.to_string(),
        }
    }

    pub fn canonical_url(&self, slug: &str) -> String {
        let slug = slug.trim_matches('/');
        if slug.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, slug)
        }
    }

    pub fn for_page(&self, page: &Page) -> SeoMeta {
        let title = [&page.meta_title, &page.title]
            .into_iter()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.site_name.clone());
        let description = strip_tags(&page.meta_description);
        let description = if description.trim().is_empty() {
            self.site_description.clone()
        } else {
            description.trim().to_string()
        };
        let canonical_url = self.canonical_url(&page.slug);

        let json_ld = if page.is_home() {
            json!({
                "@context": "https://schema.org",
                "@type": "WebSite",
                "name": self.site_name,
                "url": self.base_url,
                "description": self.site_description,
            })
        } else {
            json!({
                "@context": "https://schema.org",
                "@type": "WebPage",
                "name": title,
                "url": canonical_url,
                "description": description,
                "isPartOf": { "@type": "WebSite", "name": self.site_name, "url": self.base_url },
            })
        };

        SeoMeta {
            title,
            description,
            keywords: page.meta_keywords.clone(),
            og_image: page.og_image.clone(),
            og_type: "website".to_string(),
            canonical_url,
            json_ld,
        }
    }
}
