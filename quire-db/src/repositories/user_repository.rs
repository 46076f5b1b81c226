use crate::repositories::parse_datetime;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use quire_core::models::user::User;
use quire_core::store::IdentityStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, is_active, last_login_at, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by id")?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by email")?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update last login")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("User {} not found", id));
        }

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(user_from_row).collect()
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    let last_login_at: Option<String> = row.try_get("last_login_at")?;

    Ok(User {
        id: Some(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        role: role.parse().map_err(|e: String| anyhow!(e))?,
        is_active: row.try_get("is_active")?,
        last_login_at: last_login_at.as_deref().map(parse_datetime).transpose()?,
        created_at: parse_datetime(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_datetime(&row.try_get::<String, _>("updated_at")?)?,
    })
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        UserRepository::find_by_email(self, email).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        UserRepository::find_by_id(self, id).await
    }

    async fn create(&self, user: &User) -> Result<i64> {
        UserRepository::create(self, user).await
    }

    async fn update_last_login(&self, id: i64) -> Result<()> {
        UserRepository::update_last_login(self, id).await
    }
}
