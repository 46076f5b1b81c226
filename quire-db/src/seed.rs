//! Idempotent demo content: rows that already exist are left alone.

use crate::repositories::{ComponentRepository, PageRepository, UserRepository};
use anyhow::{Context, Result};
use quire_core::models::component::Component;
use quire_core::models::page::{Page, PageStatus};
use quire_core::models::permission::Role;
use quire_core::models::user::User;
use quire_core::password::PasswordHasher;
use sqlx::SqlitePool;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub components: usize,
    pub pages: usize,
    pub users: usize,
}

struct PageSeed {
    page: Page,
    components: &'static [&'static str],
}

struct UserSeed {
    email: &'static str,
    name: &'static str,
    password: &'static str,
    role: Role,
}

fn component_seeds() -> Vec<Component> {
    let mut home_hero = Component::new("hero", "home-hero");
    home_hero.title = "Build pages from reusable blocks".to_string();
    home_hero.subtitle = "Fast, secure and simple content management".to_string();
    home_hero.link_text = "Learn more".to_string();
    home_hero.link_url = "/about".to_string();

    let mut home_about = Component::new("about", "home-about");
    home_about.title = "Who we are".to_string();
    home_about.content =
        "<p>We are a small team that cares about <strong>performance</strong> and <em>clarity</em>.</p>"
            .to_string();

    let mut about_hero = Component::new("hero", "about-hero");
    about_hero.title = "About us".to_string();
    about_hero.subtitle = "The people behind the product".to_string();

    let mut about_intro = Component::new("text", "about-intro");
    about_intro.content =
        "<p>Founded to make publishing straightforward, we keep every page fast and accessible.</p>"
            .to_string();

    let mut contact_intro = Component::new("cta", "contact-intro");
    contact_intro.title = "Get in touch".to_string();
    contact_intro.content = "<p>Questions or ideas? We would love to hear from you.</p>".to_string();
    contact_intro.link_text = "Email us".to_string();
    contact_intro.link_url = "mailto:hello@example.com".to_string();

    vec![home_hero, home_about, about_hero, about_intro, contact_intro]
}

fn page_seeds() -> Vec<PageSeed> {
    let published = |slug: &str, title: &str, description: &str| {
        let mut page = Page::new(slug, title);
        page.meta_title = title.to_string();
        page.meta_description = description.to_string();
        page.status = PageStatus::Published;
        page
    };

    let mut contact = published("contact", "Contact", "How to reach us");
    contact.content = "<p>Write to us at hello@example.com.</p>".to_string();

    vec![
        PageSeed {
            page: published("", "Home", "Reusable blocks, fast pages"),
            components: &["home-hero", "home-about"],
        },
        PageSeed {
            page: published("about", "About", "The people behind the product"),
            components: &["about-hero", "about-intro"],
        },
        PageSeed {
            page: contact,
            components: &["contact-intro"],
        },
    ]
}

fn user_seeds() -> Vec<UserSeed> {
    vec![
        UserSeed {
            email: "admin@example.com",
            name: "Administrator",
            password: "admin123",
            role: Role::Admin,
        },
        UserSeed {
            email: "editor@example.com",
            name: "Editor",
            password: "editor123",
            role: Role::Editor,
        },
    ]
}

pub async fn seed_database(pool: &SqlitePool, hasher: &PasswordHasher) -> Result<SeedReport> {
    tracing::info!("Seeding database...");

    let components = ComponentRepository::new(pool.clone());
    let pages = PageRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let mut report = SeedReport::default();

    for component in component_seeds() {
        if components.find_by_name(&component.name).await?.is_some() {
            tracing::debug!(name = %component.name, "Component already exists, skipping");
            continue;
        }
        components.create(&component).await?;
        report.components += 1;
    }

    for seed in page_seeds() {
        let label = if seed.page.is_home() { "home" } else { seed.page.slug.as_str() };
        if pages.find_by_slug(&seed.page.slug).await?.is_some() {
            tracing::debug!(page = %label, "Page already exists, skipping");
            continue;
        }

        let page_id = pages.create(&seed.page).await?;
        for (position, name) in seed.components.iter().enumerate() {
            let Some(component) = components.find_by_name(name).await? else {
                tracing::warn!(component = %name, page = %label, "Component not found, skipping association");
                continue;
            };
            let component_id = component
                .id
                .context("Stored component is missing its id")?;
            pages
                .attach_component(page_id, component_id, position as i32)
                .await?;
        }
        report.pages += 1;
    }

    for seed in user_seeds() {
        if users.find_by_email(seed.email).await?.is_some() {
            tracing::debug!(email = %seed.email, "User already exists, skipping");
            continue;
        }

        let hash = hasher
            .hash(seed.password)
            .with_context(|| format!("Failed to hash password for {}", seed.email))?;
        users
            .create(&User::new(
                seed.email.to_string(),
                seed.name.to_string(),
                hash,
                seed.role,
            ))
            .await?;
        report.users += 1;
    }

    tracing::info!(
        components = report.components,
        pages = report.pages,
        users = report.users,
        "Database seeding complete"
    );

    Ok(report)
}
