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

use crate::models::permission::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored credential. The hash never leaves the process in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user from an already hashed password
    pub fn new(email: String, name: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email,
            password_hash,
            name,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "$argon2id$v=19$...".to_string(),
            role,
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user(Role::Viewer);
        assert_eq!(user.id, None);
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(Role::Admin)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["email"], "alice@example.com");
    }
}
