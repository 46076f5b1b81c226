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

use crate::{templates::TemplateEngine, AppState, Config};
use quire_core::{HashParams, PasswordHasher};
use sqlx::SqlitePool;

/// Argon2 settings cheap enough for unit tests
pub fn fast_params() -> HashParams {
    HashParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        ..HashParams::default()
    }
}

pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(fast_params())
}

/// Fresh in-memory database with the schema applied
pub async fn test_pool() -> SqlitePool {
    quire_db::init_memory_database()
        .await
        .expect("in-memory database")
}

pub fn test_config() -> Config {
    Config {
        base_url: "http://localhost:3000".to_string(),
        jwt_secret: "test-secret".to_string(),
        password: fast_params(),
        ..Config::default()
    }
}

pub async fn test_state() -> AppState {
    AppState::new(
        test_pool().await,
        test_config(),
        TemplateEngine::new().expect("templates compile"),
    )
}
