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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every component type the renderer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Hero,
    About,
    Text,
    Image,
    Cta,
    Grid,
    List,
}

impl ComponentKind {
    pub fn all() -> Vec<ComponentKind> {
        vec![
            ComponentKind::Hero,
            ComponentKind::About,
            ComponentKind::Text,
            ComponentKind::Image,
            ComponentKind::Cta,
            ComponentKind::Grid,
            ComponentKind::List,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Hero => "hero",
            ComponentKind::About => "about",
            ComponentKind::Text => "text",
            ComponentKind::Image => "image",
            ComponentKind::Cta => "cta",
            ComponentKind::Grid => "grid",
            ComponentKind::List => "list",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown component type: {}", s))
    }
}

/// A named, reusable content block.
///
/// `component_type` stays a string because stored rows may carry types this
/// build has no renderer for; rendering reports those instead of failing to load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Component {
    pub id: Option<i64>,
    pub component_type: String,
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub image_url: String,
    pub link_url: String,
    pub link_text: String,
    pub data_json: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Component {
    pub fn new(component_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> Option<ComponentKind> {
        self.component_type.parse().ok()
    }

    /// Fill empty displayable fields from the type's defaults.
    ///
    /// Only empty fields change, so applying this twice is the same as once.
    pub fn merge_with_defaults(&self) -> Component {
        let defaults = defaults_for(&self.component_type);
        let mut merged = self.clone();

        fill(&mut merged.title, &defaults.title);
        fill(&mut merged.subtitle, &defaults.subtitle);
        fill(&mut merged.content, &defaults.content);
        fill(&mut merged.link_text, &defaults.link_text);
        fill(&mut merged.link_url, &defaults.link_url);

        merged
    }

    pub fn validate_name(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Component name cannot be empty".to_string());
        }
        if self.name.len() > 100 {
            return Err("Component name cannot exceed 100 characters".to_string());
        }
        Ok(())
    }

    pub fn validate_type(&self) -> Result<(), String> {
        self.component_type.parse::<ComponentKind>().map(|_| ())
    }

    pub fn is_valid(&self) -> Result<(), String> {
        self.validate_name()?;
        self.validate_type()?;
        if !self.data_json.is_empty() {
            serde_json::from_str::<serde_json::Value>(&self.data_json)
                .map_err(|e| format!("Invalid data JSON: {}", e))?;
        }
        Ok(())
    }
}

fn fill(field: &mut String, default: &str) {
    if field.is_empty() && !default.is_empty() {
        *field = default.to_string();
    }
}

/// Canonical placeholder values for a component type.
///
/// Unknown types and types without placeholders get an empty component, so
/// merging against them changes nothing.
pub fn defaults_for(component_type: &str) -> Component {
    let mut defaults = Component::new(component_type, "");

    match component_type.parse::<ComponentKind>() {
        Ok(ComponentKind::Hero) => {
            defaults.title = "Welcome".to_string();
            defaults.subtitle = "Modern and performant solutions".to_string();
            defaults.link_text = "Explore".to_string();
            defaults.link_url = "/".to_string();
        }
        Ok(ComponentKind::About) => {
            defaults.title = "About Us".to_string();
            defaults.content = "About us content will appear here.".to_string();
        }
        Ok(ComponentKind::Text) => {
            defaults.content = "Text content will appear here.".to_string();
        }
        Ok(ComponentKind::Cta) => {
            defaults.title = "Ready to get started?".to_string();
            defaults.link_text = "Contact us".to_string();
            defaults.link_url = "/contact".to_string();
        }
        Ok(ComponentKind::Image | ComponentKind::Grid | ComponentKind::List) | Err(_) => {}
    }

    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_parse() {
        for kind in ComponentKind::all() {
            assert_eq!(kind.as_str().parse::<ComponentKind>().unwrap(), kind);
        }
        assert!("carousel".parse::<ComponentKind>().is_err());
        assert!("Hero".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_hero_defaults() {
        let defaults = defaults_for("hero");
        assert_eq!(defaults.title, "Welcome");
        assert_eq!(defaults.subtitle, "Modern and performant solutions");
        assert_eq!(defaults.link_text, "Explore");
        assert_eq!(defaults.link_url, "/");
        assert_eq!(defaults.content, "");
    }

    #[test]
    fn test_unknown_type_defaults_are_empty() {
        let defaults = defaults_for("carousel");
        assert_eq!(defaults, Component::new("carousel", ""));
    }

    #[test]
    fn test_merge_fills_only_empty_fields() {
        let mut hero = Component::new("hero", "home-hero");
        hero.title = "Custom title".to_string();

        let merged = hero.merge_with_defaults();
        assert_eq!(merged.title, "Custom title");
        assert_eq!(merged.subtitle, "Modern and performant solutions");
        assert_eq!(merged.link_text, "Explore");
        assert_eq!(merged.name, "home-hero");
    }

    #[test]
    fn test_merge_leaves_other_fields() {
        let mut about = Component::new("about", "about");
        about.image_url = "/img/team.jpg".to_string();
        about.data_json = r#"{"a":1}"#.to_string();

        let merged = about.merge_with_defaults();
        assert_eq!(merged.image_url, "/img/team.jpg");
        assert_eq!(merged.data_json, r#"{"a":1}"#);
        assert_eq!(merged.content, "About us content will appear here.");
    }

    #[test]
    fn test_merge_is_idempotent_for_every_type() {
        let mut types: Vec<String> = ComponentKind::all()
            .iter()
            .map(|k| k.as_str().to_string())
            .collect();
        types.push("unknown".to_string());

        for component_type in types {
            let empty = Component::new(component_type.as_str(), "c");
            let mut partial = Component::new(component_type.as_str(), "c");
            partial.title = "Mine".to_string();
            partial.content = "<p>body</p>".to_string();

            for c in [empty, partial] {
                let once = c.merge_with_defaults();
                assert_eq!(once.merge_with_defaults(), once, "{}", component_type);
            }
        }
    }

    #[test]
    fn test_is_valid() {
        let mut c = Component::new("text", "intro");
        assert!(c.is_valid().is_ok());

        c.data_json = "{not json".to_string();
        assert!(c.is_valid().is_err());

        let unknown = Component::new("carousel", "x");
        assert!(unknown.is_valid().is_err());

        let unnamed = Component::new("text", "  ");
        assert!(unnamed.is_valid().is_err());
    }
}
