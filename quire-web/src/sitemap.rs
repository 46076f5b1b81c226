use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use quire_core::models::page::Page;
use quire_core::PageStore;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const REGENERATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct SitemapGenerator {
    base_url: String,
    output_path: PathBuf,
    pages: Arc<dyn PageStore>,
}

impl SitemapGenerator {
    pub fn new(base_url: &str, output_path: impl Into<PathBuf>, pages: Arc<dyn PageStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            output_path: output_path.into(),
            pages,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Home first, then every other published page
    pub fn build_xml(&self, pages: &[Page], today: NaiveDate) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(xml, "<urlset xmlns=\"{}\">", SITEMAP_NAMESPACE);

        push_url(&mut xml, &self.base_url, today, "daily", "1.0");
        for page in pages.iter().filter(|p| p.is_published() && !p.is_home()) {
            let loc = format!("{}/{}", self.base_url, page.slug);
            push_url(&mut xml, &loc, page.updated_at.date_naive(), "weekly", "0.8");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write the sitemap, replacing the previous file atomically.
    ///
    /// Returns the number of URLs written.
    pub async fn generate(&self) -> Result<usize> {
        let pages = self
            .pages
            .list_published()
            .await
            .context("Failed to load published pages")?;
        let xml = self.build_xml(&pages, Utc::now().date_naive());
        let count = xml.matches("<url>").count();

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp_path = self.output_path.with_extension("xml.tmp");
        tokio::fs::write(&tmp_path, xml)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.output_path)
            .await
            .with_context(|| format!("Failed to move sitemap into {}", self.output_path.display()))?;

        tracing::info!(path = %self.output_path.display(), urls = count, "Sitemap generated");
        Ok(count)
    }

    /// Generate now, then again every `interval` until `shutdown` fires
    pub fn spawn_scheduler(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let generator = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Sitemap scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = generator.generate().await {
                            tracing::error!(error = ?e, "Sitemap generation failed");
                        }
                    }
                }
            }
        })
    }
}

fn push_url(xml: &mut String, loc: &str, lastmod: NaiveDate, changefreq: &str, priority: &str) {
    let _ = write!(
        xml,
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
        escape_xml(loc),
        lastmod.format("%Y-%m-%d"),
        changefreq,
        priority
    );
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_pool;
    use chrono::TimeZone;
    use quire_core::models::page::PageStatus;
    use quire_db::PageRepository;
    use tempfile::TempDir;

    fn page(slug: &str, status: PageStatus) -> Page {
        let mut page = Page::new(slug, "Title");
        page.status = status;
        page.updated_at = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        page
    }

    async fn generator(output: PathBuf) -> (SitemapGenerator, PageRepository) {
        let repo = PageRepository::new(test_pool().await);
        (
            SitemapGenerator::new("https://example.com/", output, Arc::new(repo.clone())),
            repo,
        )
    }

    #[tokio::test]
    async fn test_build_xml() {
        let (generator, _) = generator(PathBuf::from("unused.xml")).await;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let xml = generator.build_xml(
            &[
                page("", PageStatus::Published),
                page("about", PageStatus::Published),
                page("draft", PageStatus::Draft),
            ],
            today,
        );

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(SITEMAP_NAMESPACE));
        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains(
            "<loc>https://example.com</loc>\n    <lastmod>2025-06-01</lastmod>\n    <changefreq>daily</changefreq>\n    <priority>1.0</priority>"
        ));
        assert!(xml.contains(
            "<loc>https://example.com/about</loc>\n    <lastmod>2025-03-04</lastmod>\n    <changefreq>weekly</changefreq>\n    <priority>0.8</priority>"
        ));
        assert!(!xml.contains("/draft"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("static").join("sitemap.xml");
        let (generator, repo) = generator(output.clone()).await;

        repo.create(&page("contact", PageStatus::Published)).await.unwrap();
        repo.create(&page("hidden", PageStatus::Archived)).await.unwrap();

        assert_eq!(generator.generate().await.unwrap(), 2);

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("https://example.com/contact"));
        assert!(!written.contains("hidden"));
        assert!(!output.with_extension("xml.tmp").exists());
    }
}
