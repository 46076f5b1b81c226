use crate::repositories::component_repository::{component_from_row, COMPONENT_COLUMNS};
use crate::repositories::parse_datetime;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use quire_core::models::page::{Page, PageComponent, PageStatus};
use quire_core::store::PageStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const PAGE_COLUMNS: &str = "id, slug, title, content, meta_title, meta_description, \
     meta_keywords, og_image, status, created_at, updated_at";

#[derive(Clone)]
pub struct PageRepository {
    pool: SqlitePool,
}

impl PageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, page: &Page) -> Result<i64> {
        page.is_valid()
            .map_err(|e| anyhow!("Invalid page: {}", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO pages (slug, title, content, meta_title, meta_description, meta_keywords,
                               og_image, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(&page.meta_keywords)
        .bind(&page.og_image)
        .bind(page.status.as_str())
        .bind(page.created_at)
        .bind(page.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create page")?;

        Ok(result.last_insert_rowid())
    }

    /// Place a component on a page at `position`
    pub async fn attach_component(&self, page_id: i64, component_id: i64, position: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO page_components (page_id, component_id, position) VALUES (?, ?, ?)",
        )
        .bind(page_id)
        .bind(component_id)
        .bind(position)
        .execute(&self.pool)
        .await
        .context("Failed to attach component to page")?;

        Ok(())
    }

    pub async fn update_status(&self, page_id: i64, status: PageStatus) -> Result<()> {
        sqlx::query("UPDATE pages SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(page_id)
            .execute(&self.pool)
            .await
            .context("Failed to update page status")?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Page>> {
        let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find page by id")?;

        row.as_ref().map(page_from_row).transpose()
    }

    /// Page by slug, without components. The empty slug is the home page.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let row = sqlx::query(&format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find page by slug")?;

        row.as_ref().map(page_from_row).transpose()
    }

    pub async fn components_for_page(&self, page_id: i64) -> Result<Vec<PageComponent>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, pc.position
            FROM page_components pc
            JOIN components c ON c.id = pc.component_id
            WHERE pc.page_id = ?
            ORDER BY pc.position ASC, c.id ASC
            "#,
            COMPONENT_COLUMNS
        ))
        .bind(page_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load page components")?;

        rows.iter()
            .map(|row| {
                Ok(PageComponent {
                    component: component_from_row(row)?,
                    position: row.try_get("position")?,
                })
            })
            .collect()
    }

    pub async fn list_published(&self) -> Result<Vec<Page>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE status = 'published' ORDER BY slug",
            PAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list published pages")?;

        rows.iter().map(page_from_row).collect()
    }

    pub async fn list_all(&self) -> Result<Vec<Page>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pages ORDER BY updated_at DESC, id DESC",
            PAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pages")?;

        rows.iter().map(page_from_row).collect()
    }
}

fn page_from_row(row: &SqliteRow) -> Result<Page> {
    let status: String = row.try_get("status")?;

    Ok(Page {
        id: Some(row.try_get("id")?),
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        meta_title: row.try_get("meta_title")?,
        meta_description: row.try_get("meta_description")?,
        meta_keywords: row.try_get("meta_keywords")?,
        og_image: row.try_get("og_image")?,
        status: status.parse().map_err(|e: String| anyhow!(e))?,
        created_at: parse_datetime(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_datetime(&row.try_get::<String, _>("updated_at")?)?,
        components: Vec::new(),
    })
}

#[async_trait]
impl PageStore for PageRepository {
    async fn find_page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        self.find_by_slug(slug).await
    }

    async fn components_for_page(&self, page_id: i64) -> Result<Vec<PageComponent>> {
        PageRepository::components_for_page(self, page_id).await
    }

    async fn list_published(&self) -> Result<Vec<Page>> {
        PageRepository::list_published(self).await
    }

    async fn list_all(&self) -> Result<Vec<Page>> {
        PageRepository::list_all(self).await
    }
}
