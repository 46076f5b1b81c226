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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Author,
    Viewer,
}

impl Role {
    /// Role assigned when none, or an unrecognized one, is requested
    pub fn lowest() -> Role {
        Role::Viewer
    }

    /// Get all available roles
    pub fn all() -> Vec<Role> {
        vec![Role::Admin, Role::Editor, Role::Author, Role::Viewer]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Author => "author",
            Role::Viewer => "viewer",
        }
    }

    /// Explicit allow-list. Admin is handled separately and implicitly has everything.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => Permission::ALL,
            Role::Editor => &[
                PagesRead,
                PagesWrite,
                PagesDelete,
                ComponentsRead,
                ComponentsWrite,
            ],
            Role::Author => &[PagesRead, PagesWrite, ComponentsRead],
            Role::Viewer => &[PagesRead, ComponentsRead],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "author" => Ok(Role::Author),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    PagesRead,
    PagesWrite,
    PagesDelete,
    ComponentsRead,
    ComponentsWrite,
    ComponentsDelete,
    MediaRead,
    MediaWrite,
    MediaDelete,
    UsersRead,
    UsersWrite,
    UsersDelete,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::PagesRead,
        Permission::PagesWrite,
        Permission::PagesDelete,
        Permission::ComponentsRead,
        Permission::ComponentsWrite,
        Permission::ComponentsDelete,
        Permission::MediaRead,
        Permission::MediaWrite,
        Permission::MediaDelete,
        Permission::UsersRead,
        Permission::UsersWrite,
        Permission::UsersDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::PagesRead => "pages:read",
            Permission::PagesWrite => "pages:write",
            Permission::PagesDelete => "pages:delete",
            Permission::ComponentsRead => "components:read",
            Permission::ComponentsWrite => "components:write",
            Permission::ComponentsDelete => "components:delete",
            Permission::MediaRead => "media:read",
            Permission::MediaWrite => "media:write",
            Permission::MediaDelete => "media:delete",
            Permission::UsersRead => "users:read",
            Permission::UsersWrite => "users:write",
            Permission::UsersDelete => "users:delete",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {}", s))
    }
}

/// Check whether a role string grants `action`.
///
/// Inactive identities and unknown roles get nothing.
pub fn has_permission(role: &str, is_active: bool, action: Permission) -> bool {
    if !is_active {
        return false;
    }

    match role.parse::<Role>() {
        Ok(Role::Admin) => true,
        Ok(role) => role.permissions().contains(&action),
        Err(_) => false,
    }
}

pub fn can_edit(role: &str, is_active: bool) -> bool {
    has_permission(role, is_active, Permission::PagesWrite)
}

pub fn can_delete(role: &str, is_active: bool) -> bool {
    has_permission(role, is_active, Permission::PagesDelete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        for action in Permission::ALL {
            assert!(has_permission("admin", true, *action), "{:?}", action);
        }
    }

    #[test]
    fn test_inactive_has_nothing() {
        for role in Role::all() {
            for action in Permission::ALL {
                assert!(!has_permission(role.as_str(), false, *action));
            }
        }
    }

    #[test]
    fn test_editor_permissions() {
        assert!(has_permission("editor", true, Permission::PagesRead));
        assert!(has_permission("editor", true, Permission::PagesWrite));
        assert!(has_permission("editor", true, Permission::PagesDelete));
        assert!(has_permission("editor", true, Permission::ComponentsWrite));
        assert!(!has_permission("editor", true, Permission::UsersWrite));
        assert!(!has_permission("editor", true, Permission::ComponentsDelete));
    }

    #[test]
    fn test_author_permissions() {
        assert!(has_permission("author", true, Permission::PagesWrite));
        assert!(!has_permission("author", true, Permission::PagesDelete));
        assert!(!has_permission("author", true, Permission::ComponentsWrite));
    }

    #[test]
    fn test_viewer_permissions() {
        assert!(has_permission("viewer", true, Permission::PagesRead));
        assert!(has_permission("viewer", true, Permission::ComponentsRead));
        assert!(!has_permission("viewer", true, Permission::PagesWrite));
    }

    #[test]
    fn test_unknown_role_has_nothing() {
        for role in ["", "root", "Admin", "superuser"] {
            for action in Permission::ALL {
                assert!(!has_permission(role, true, *action), "{} {:?}", role, action);
            }
        }
    }

    #[test]
    fn test_derived_checks() {
        assert!(can_edit("author", true));
        assert!(!can_delete("author", true));
        assert!(can_delete("editor", true));
        assert!(!can_edit("viewer", true));
        assert!(!can_edit("admin", false));
    }

    #[test]
    fn test_role_round_trip() {
        for role in Role::all() {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(Role::lowest(), Role::Viewer);
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(
            "pages:write".parse::<Permission>().unwrap(),
            Permission::PagesWrite
        );
        assert!("pages:publish".parse::<Permission>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let role: Role = serde_json::from_str("\"author\"").unwrap();
        assert_eq!(role, Role::Author);
    }
}
