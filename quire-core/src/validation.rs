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

//! Declarative field validation.
//!
//! Request types list their fields with a static rule set and get
//! [`Validate::validate`] for free:
//!
//! ```ignore
//! impl Validate for LoginRequest {
//!     fn fields(&self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("email", &self.email, &[Rule::Required, Rule::Email]),
//!             Field::new("password", &self.password, &[Rule::Required, Rule::Min(6)]),
//!         ]
//!     }
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$")
        .expect("Failed to compile email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    /// Minimum length in characters
    Min(usize),
    /// Maximum length in characters
    Max(usize),
    Email,
    Url,
}

impl Rule {
    /// Check one value. Empty values only fail `Required`.
    fn check(&self, value: &str) -> Result<(), String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return match self {
                Rule::Required => Err("is required".to_string()),
                _ => Ok(()),
            };
        }

        match self {
            Rule::Required => Ok(()),
            Rule::Min(min) if value.chars().count() < *min => {
                Err(format!("must be at least {} characters", min))
            }
            Rule::Max(max) if value.chars().count() > *max => {
                Err(format!("must be at most {} characters", max))
            }
            Rule::Min(_) | Rule::Max(_) => Ok(()),
            Rule::Email if value.len() > 255 || !EMAIL_REGEX.is_match(value) => {
                Err("must be a valid email address".to_string())
            }
            Rule::Email => Ok(()),
            Rule::Url => match url::Url::parse(value) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
                _ => Err("must be a valid URL".to_string()),
            },
        }
    }
}

pub struct Field<'a> {
    pub name: &'static str,
    pub value: &'a str,
    pub rules: &'static [Rule],
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, value: &'a str, rules: &'static [Rule]) -> Self {
        Self { name, value, rules }
    }

    /// Optional fields only get checked when a value is present
    pub fn optional(name: &'static str, value: Option<&'a str>, rules: &'static [Rule]) -> Self {
        Self::new(name, value.unwrap_or(""), rules)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field} {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    messages.join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

/// Evaluate every rule of every field; the first failing rule per field is reported.
pub fn validate_fields(fields: &[Field<'_>]) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = fields
        .iter()
        .filter_map(|field| {
            field
                .rules
                .iter()
                .find_map(|rule| rule.check(field.value).err())
                .map(|message| FieldError {
                    field: field.name,
                    message,
                })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

pub trait Validate {
    fn fields(&self) -> Vec<Field<'_>>;

    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_fields(&self.fields())
    }
}
