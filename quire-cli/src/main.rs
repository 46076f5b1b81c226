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

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use quire_core::models::permission::Role;
use quire_core::models::user::User;
use quire_core::validation::Validate;
use quire_core::PasswordHasher;
use quire_db::{PageRepository, UserRepository};
use quire_web::services::RegisterRequest;
use quire_web::sitemap::SitemapGenerator;
use quire_web::Config;
use sqlx::SqlitePool;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Quire CLI tool for database and user management")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate,

    /// Delete the database file and migrate from scratch
    MigrateFresh {
        /// Seed sample content afterwards
        #[arg(long)]
        seed: bool,
    },

    /// Insert sample components, pages and users
    Seed,

    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// admin, editor, author or viewer
        #[arg(long, default_value = "viewer")]
        role: String,
        /// Password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },

    /// Regenerate sitemap.xml
    Sitemap,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire=info,quire_db=info,quire_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Migrate => {
            println!("Migrating database at: {}", config.database_url);
            quire_db::init_database(&config.database_url).await?;
            println!("Database is up to date");
            Ok(())
        }
        Commands::MigrateFresh { seed } => migrate_fresh(&config, seed).await,
        Commands::Seed => {
            let pool = quire_db::init_database(&config.database_url).await?;
            seed(&pool, &config).await
        }
        Commands::CreateUser {
            email,
            name,
            role,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            let pool = quire_db::init_database(&config.database_url).await?;
            let user = create_user(&pool, &config, email, name, &role, password).await?;
            println!(
                "User {} created with ID {} and role {}",
                user.email,
                user.id.unwrap_or_default(),
                user.role
            );
            Ok(())
        }
        Commands::Sitemap => {
            let pool = quire_db::init_database(&config.database_url).await?;
            let generator = SitemapGenerator::new(
                &config.base_url,
                &config.sitemap_path,
                Arc::new(PageRepository::new(pool)),
            );
            let urls = generator.generate().await?;
            println!(
                "Sitemap written to {} ({} URLs)",
                generator.output_path().display(),
                urls
            );
            Ok(())
        }
    }
}

async fn migrate_fresh(config: &Config, with_seed: bool) -> Result<()> {
    for removed in quire_db::remove_database_files(&config.database_url)? {
        println!("Removed {}", removed.display());
    }

    let pool = quire_db::init_database(&config.database_url).await?;
    println!("Database recreated at: {}", config.database_url);

    if with_seed {
        seed(&pool, config).await?;
    }
    Ok(())
}

async fn seed(pool: &SqlitePool, config: &Config) -> Result<()> {
    let report = quire_db::seed::seed_database(pool, &PasswordHasher::new(config.password)).await?;
    println!(
        "Seeded {} components, {} pages, {} users",
        report.components, report.pages, report.users
    );
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let password = rpassword::read_password().context("Failed to read password")?;

    print!("Confirm password: ");
    std::io::stdout().flush()?;
    let confirm = rpassword::read_password().context("Failed to read password")?;

    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

/// Create an account under the same rules as self-registration, except the role is explicit
async fn create_user(
    pool: &SqlitePool,
    config: &Config,
    email: String,
    name: String,
    role: &str,
    password: String,
) -> Result<User> {
    let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;

    let request = RegisterRequest {
        email,
        password,
        name,
        role: Some(role.to_string()),
    };
    request
        .validate()
        .map_err(|e| anyhow!("Invalid user data: {}", e))?;

    let users = UserRepository::new(pool.clone());
    if users.find_by_email(&request.email).await?.is_some() {
        anyhow::bail!("A user with email {} already exists", request.email);
    }

    let hash = PasswordHasher::new(config.password)
        .hash(&request.password)
        .context("Failed to hash password")?;

    let mut user = User::new(request.email, request.name, hash, role);
    let id = users.create(&user).await.context("Failed to create user")?;
    user.id = Some(id);
    Ok(user)
}
