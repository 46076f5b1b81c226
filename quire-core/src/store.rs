//! Persistence seams consumed by the services.

use crate::models::{Component, Page, PageComponent, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Insert a new credential and return its id
    async fn create(&self, user: &User) -> Result<i64>;

    async fn update_last_login(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    /// An empty slug selects the home page
    async fn find_page_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    /// Components placed on a page, ordered by position
    async fn components_for_page(&self, page_id: i64) -> Result<Vec<PageComponent>>;

    async fn list_published(&self) -> Result<Vec<Page>>;

    async fn list_all(&self) -> Result<Vec<Page>>;
}

#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Component>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Component>>;

    async fn find_by_type(&self, component_type: &str) -> Result<Vec<Component>>;
}
