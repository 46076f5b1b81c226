use crate::repositories::parse_datetime;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use quire_core::models::component::Component;
use quire_core::store::ComponentStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub(crate) const COMPONENT_COLUMNS: &str = "c.id, c.type, c.name, c.title, c.subtitle, c.content, \
     c.image_url, c.link_url, c.link_text, c.data_json, c.created_at, c.updated_at";

#[derive(Clone)]
pub struct ComponentRepository {
    pool: SqlitePool,
}

impl ComponentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, component: &Component) -> Result<i64> {
        component
            .validate_name()
            .map_err(|e| anyhow!("Invalid component: {}", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO components (type, name, title, subtitle, content, image_url, link_url, link_text, data_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&component.component_type)
        .bind(&component.name)
        .bind(&component.title)
        .bind(&component.subtitle)
        .bind(&component.content)
        .bind(&component.image_url)
        .bind(&component.link_url)
        .bind(&component.link_text)
        .bind(&component.data_json)
        .execute(&self.pool)
        .await
        .context("Failed to create component")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Component>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM components c WHERE c.id = ?",
            COMPONENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find component by id")?;

        row.as_ref().map(component_from_row).transpose()
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Component>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM components c WHERE c.name = ?",
            COMPONENT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find component by name")?;

        row.as_ref().map(component_from_row).transpose()
    }

    pub async fn find_by_type(&self, component_type: &str) -> Result<Vec<Component>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM components c WHERE c.type = ? ORDER BY c.name",
            COMPONENT_COLUMNS
        ))
        .bind(component_type)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find components by type")?;

        rows.iter().map(component_from_row).collect()
    }
}

pub(crate) fn component_from_row(row: &SqliteRow) -> Result<Component> {
    Ok(Component {
        id: Some(row.try_get("id")?),
        component_type: row.try_get("type")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        link_url: row.try_get("link_url")?,
        link_text: row.try_get("link_text")?,
        data_json: row.try_get("data_json")?,
        created_at: Some(parse_datetime(&row.try_get::<String, _>("created_at")?)?),
        updated_at: Some(parse_datetime(&row.try_get::<String, _>("updated_at")?)?),
    })
}

#[async_trait]
impl ComponentStore for ComponentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Component>> {
        ComponentRepository::find_by_id(self, id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Component>> {
        ComponentRepository::find_by_name(self, name).await
    }

    async fn find_by_type(&self, component_type: &str) -> Result<Vec<Component>> {
        ComponentRepository::find_by_type(self, component_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::init_memory_database;

    #[tokio::test]
    async fn test_create_and_find() -> Result<()> {
        let repo = ComponentRepository::new(init_memory_database().await?);

        let mut hero = Component::new("hero", "home-hero");
        hero.title = "Hello".to_string();
        let id = repo.create(&hero).await?;
        repo.create(&Component::new("text", "intro")).await?;
        repo.create(&Component::new("hero", "about-hero")).await?;

        let by_id = repo.find_by_id(id).await?.unwrap();
        assert_eq!(by_id.name, "home-hero");
        assert_eq!(by_id.title, "Hello");
        assert_eq!(by_id.component_type, "hero");

        let by_name = repo.find_by_name("intro").await?.unwrap();
        assert_eq!(by_name.component_type, "text");

        let heroes: Vec<String> = repo
            .find_by_type("hero")
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(heroes, vec!["about-hero", "home-hero"]);

        assert!(repo.find_by_name("missing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_name_is_unique() -> Result<()> {
        let repo = ComponentRepository::new(init_memory_database().await?);
        repo.create(&Component::new("text", "intro")).await?;
        assert!(repo.create(&Component::new("about", "intro")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_unnamed_component_rejected() -> Result<()> {
        let repo = ComponentRepository::new(init_memory_database().await?);
        assert!(repo.create(&Component::new("text", "")).await.is_err());
        Ok(())
    }
}
