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

use serde::{Serialize, Serializer};
use std::fmt;

/// HTML that has been through the user-content policy.
///
/// Only [`sanitize_html`] constructs one, so holding a `SafeHtml` means the
/// markup was cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SafeHtml {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Clean user-generated HTML: scripts, event handlers and unsafe URLs are
/// removed while benign formatting tags survive.
pub fn sanitize_html(input: &str) -> SafeHtml {
    SafeHtml(ammonia::clean(input))
}

/// Remove every tag, keeping text content.
pub fn strip_tags(input: &str) -> String {
    ammonia::Builder::empty().clean(input).to_string()
}

/// Escape text for inclusion in HTML content or attributes
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Accept relative links and http(s)/mailto URLs; anything else is dropped.
pub fn safe_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if (trimmed.starts_with('/') && !trimmed.starts_with("//")) || trimmed.starts_with('#') {
        return Some(trimmed.to_string());
    }

    match url::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "mailto") => Some(trimmed.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_script_keeps_paragraph() {
        let clean = sanitize_html("<p>Hello</p><script>alert('xss')</script>");
        assert_eq!(clean.as_str(), "<p>Hello</p>");
    }

    #[test]
    fn test_sanitize_removes_event_handlers() {
        let clean = sanitize_html(r#"<img src="/a.png" onerror="alert(1)"><b>bold</b>"#);
        assert!(!clean.as_str().contains("onerror"));
        assert!(clean.as_str().contains("<b>bold</b>"));
    }

    #[test]
    fn test_sanitize_removes_javascript_links() {
        let clean = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!clean.as_str().contains("javascript:"));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<h1>Title</h1><script>bad()</script>"), "Title");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("/contact"), Some("/contact".to_string()));
        assert_eq!(safe_url("#top"), Some("#top".to_string()));
        assert_eq!(
            safe_url("https://example.com/a"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(
            safe_url("mailto:hi@example.com"),
            Some("mailto:hi@example.com".to_string())
        );
        assert_eq!(safe_url("javascript:alert(1)"), None);
        assert_eq!(safe_url("//evil.example"), None);
        assert_eq!(safe_url("data:text/html,<script>"), None);
        assert_eq!(safe_url("  "), None);
    }
}
