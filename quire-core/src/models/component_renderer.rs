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

use crate::models::component::{Component, ComponentKind};
use crate::sanitize::{escape_html, safe_url, sanitize_html, SafeHtml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error(
        "failed to render component {name}: no renderer registered for component type: {component_type}"
    )]
    NoRenderer {
        name: String,
        component_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedItem {
    pub title: String,
    pub content: SafeHtml,
    pub image_url: Option<String>,
    pub url: Option<String>,
}

/// Display-ready component. Every HTML-bearing field is a [`SafeHtml`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderedComponent {
    Hero {
        name: String,
        title: String,
        subtitle: String,
        image_url: Option<String>,
        link: Option<Link>,
    },
    About {
        name: String,
        title: String,
        content: SafeHtml,
        image_url: Option<String>,
    },
    Text {
        name: String,
        title: String,
        content: SafeHtml,
    },
    Image {
        name: String,
        image_url: Option<String>,
        alt: String,
        caption: SafeHtml,
    },
    Cta {
        name: String,
        title: String,
        content: SafeHtml,
        link: Option<Link>,
    },
    Grid {
        name: String,
        title: String,
        items: Vec<RenderedItem>,
    },
    List {
        name: String,
        title: String,
        items: Vec<RenderedItem>,
    },
    /// Raw page content used when a page has no components
    Content { title: String, content: SafeHtml },
}

impl RenderedComponent {
    pub fn fallback(title: &str, raw_content: &str) -> Self {
        RenderedComponent::Content {
            title: title.to_string(),
            content: sanitize_html(raw_content),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            RenderedComponent::Hero {
                name,
                title,
                subtitle,
                image_url,
                link,
            } => {
                let style = image_url
                    .as_ref()
                    .map(|url| format!(r#" style="background-image: url('{}')""#, escape_html(url)))
                    .unwrap_or_default();
                format!(
                    r#"<section class="component hero" id="{}"{}><h1>{}</h1><p class="subtitle">{}</p>{}</section>"#,
                    escape_html(name),
                    style,
                    escape_html(title),
                    escape_html(subtitle),
                    link_html(link.as_ref(), "button"),
                )
            }
            RenderedComponent::About {
                name,
                title,
                content,
                image_url,
            } => format!(
                r#"<section class="component about" id="{}"><h2>{}</h2>{}<div class="content">{}</div></section>"#,
                escape_html(name),
                escape_html(title),
                image_html(image_url.as_deref(), title),
                content,
            ),
            RenderedComponent::Text {
                name,
                title,
                content,
            } => format!(
                r#"<section class="component text" id="{}">{}<div class="content">{}</div></section>"#,
                escape_html(name),
                heading_html(title),
                content,
            ),
            RenderedComponent::Image {
                name,
                image_url,
                alt,
                caption,
            } => format!(
                r#"<figure class="component image" id="{}">{}<figcaption>{}</figcaption></figure>"#,
                escape_html(name),
                image_html(image_url.as_deref(), alt),
                caption,
            ),
            RenderedComponent::Cta {
                name,
                title,
                content,
                link,
            } => format!(
                r#"<section class="component cta" id="{}"><h2>{}</h2><div class="content">{}</div>{}</section>"#,
                escape_html(name),
                escape_html(title),
                content,
                link_html(link.as_ref(), "button"),
            ),
            RenderedComponent::Grid { name, title, items } => format!(
                r#"<section class="component grid" id="{}">{}<div class="grid-items">{}</div></section>"#,
                escape_html(name),
                heading_html(title),
                items.iter().map(grid_item_html).collect::<String>(),
            ),
            RenderedComponent::List { name, title, items } => format!(
                r#"<section class="component list" id="{}">{}<ul>{}</ul></section>"#,
                escape_html(name),
                heading_html(title),
                items.iter().map(list_item_html).collect::<String>(),
            ),
            RenderedComponent::Content { title, content } => format!(
                r#"<article class="page-content">{}<div class="content">{}</div></article>"#,
                heading_html(title),
                content,
            ),
        }
    }
}

fn heading_html(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!("<h2>{}</h2>", escape_html(title))
    }
}

fn image_html(url: Option<&str>, alt: &str) -> String {
    match url {
        Some(url) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(url),
            escape_html(alt)
        ),
        None => String::new(),
    }
}

fn link_html(link: Option<&Link>, class: &str) -> String {
    match link {
        Some(link) => format!(
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            escape_html(&link.url),
            escape_html(&link.text)
        ),
        None => String::new(),
    }
}

fn grid_item_html(item: &RenderedItem) -> String {
    format!(
        r#"<div class="grid-item">{}<h3>{}</h3><div class="content">{}</div>{}</div>"#,
        image_html(item.image_url.as_deref(), &item.title),
        escape_html(&item.title),
        item.content,
        item.url
            .as_ref()
            .map(|url| format!(r#"<a href="{}">More</a>"#, escape_html(url)))
            .unwrap_or_default(),
    )
}

fn list_item_html(item: &RenderedItem) -> String {
    let label = if item.content.is_empty() {
        escape_html(&item.title)
    } else if item.title.is_empty() {
        item.content.to_string()
    } else {
        format!("<strong>{}</strong> {}", escape_html(&item.title), item.content)
    };

    match &item.url {
        Some(url) => format!(r#"<li><a href="{}">{}</a></li>"#, escape_html(url), label),
        None => format!("<li>{}</li>", label),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ItemsData {
    #[serde(default)]
    items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemEntry {
    Label(String),
    Full {
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        image_url: String,
        #[serde(default)]
        link_url: String,
    },
}

/// Malformed or absent item data renders as an empty collection
fn parse_items(data_json: &str) -> Vec<RenderedItem> {
    let data: ItemsData = serde_json::from_str(data_json).unwrap_or_default();

    data.items
        .into_iter()
        .map(|entry| match entry {
            ItemEntry::Label(title) => RenderedItem {
                title,
                content: SafeHtml::default(),
                image_url: None,
                url: None,
            },
            ItemEntry::Full {
                title,
                content,
                image_url,
                link_url,
            } => RenderedItem {
                title,
                content: sanitize_html(&content),
                image_url: safe_url(&image_url),
                url: safe_url(&link_url),
            },
        })
        .collect()
}

fn link(text: &str, url: &str) -> Option<Link> {
    safe_url(url).map(|url| Link {
        text: if text.is_empty() {
            url.clone()
        } else {
            text.to_string()
        },
        url,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentRenderer;

impl ComponentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render one component as stored, without applying defaults
    pub fn render(&self, component: &Component) -> Result<RenderedComponent, RenderError> {
        let kind = component
            .kind()
            .ok_or_else(|| RenderError::NoRenderer {
                name: component.name.clone(),
                component_type: component.component_type.clone(),
            })?;

        // Sanitized before dispatch so no kind can skip it
        let content = sanitize_html(&component.content);
        let name = component.name.clone();
        let title = component.title.clone();
        let image_url = safe_url(&component.image_url);

        let rendered = match kind {
            ComponentKind::Hero => RenderedComponent::Hero {
                name,
                title,
                subtitle: component.subtitle.clone(),
                image_url,
                link: link(&component.link_text, &component.link_url),
            },
            ComponentKind::About => RenderedComponent::About {
                name,
                title,
                content,
                image_url,
            },
            ComponentKind::Text => RenderedComponent::Text {
                name,
                title,
                content,
            },
            ComponentKind::Image => RenderedComponent::Image {
                name,
                image_url,
                alt: if component.subtitle.is_empty() {
                    title
                } else {
                    component.subtitle.clone()
                },
                caption: content,
            },
            ComponentKind::Cta => RenderedComponent::Cta {
                name,
                title,
                content,
                link: link(&component.link_text, &component.link_url),
            },
            ComponentKind::Grid => RenderedComponent::Grid {
                name,
                title,
                items: parse_items(&component.data_json),
            },
            ComponentKind::List => RenderedComponent::List {
                name,
                title,
                items: parse_items(&component.data_json),
            },
        };

        Ok(rendered)
    }

    /// Merge defaults and render each component in the given order.
    ///
    /// Fails as a whole on the first component without a renderer.
    pub fn render_multiple(
        &self,
        components: &[Component],
    ) -> Result<Vec<RenderedComponent>, RenderError> {
        components
            .iter()
            .map(|component| self.render(&component.merge_with_defaults()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn component(component_type: &str, name: &str) -> Component {
        Component::new(component_type, name)
    }

    #[test]
    fn test_render_text_sanitizes_content() {
        let mut text = component("text", "intro");
        text.content = "<p>Hello</p><script>alert(1)</script>".to_string();

        let rendered = ComponentRenderer::new().render(&text).unwrap();
        match rendered {
            RenderedComponent::Text { content, .. } => assert_eq!(content.as_str(), "<p>Hello</p>"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_every_kind_sanitizes_content() {
        let renderer = ComponentRenderer::new();
        for kind in ComponentKind::all() {
            let mut c = component(kind.as_str(), "c");
            c.content = "<p>ok</p><script>evil()</script>".to_string();
            c.data_json =
                r#"{"items":[{"title":"A","content":"<p>i</p><script>x()</script>"}]}"#.to_string();

            let html = renderer.render(&c).unwrap().to_html();
            assert!(!html.contains("<script"), "{}: {}", kind, html);
            assert!(!html.contains("evil()"), "{}: {}", kind, html);
        }
    }

    #[test]
    fn test_plain_fields_are_escaped() {
        let mut hero = component("hero", "hero");
        hero.title = "<img src=x onerror=alert(1)>".to_string();
        hero.link_text = "Go".to_string();
        hero.link_url = "javascript:alert(1)".to_string();

        let rendered = ComponentRenderer::new().render(&hero).unwrap();
        let html = rendered.to_html();
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("javascript:"));
        match rendered {
            RenderedComponent::Hero { link, .. } => assert!(link.is_none()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_render_multiple_preserves_order_and_merges() {
        let hero = component("hero", "home-hero");
        let mut about = component("about", "home-about");
        about.content = "<p>We build things</p>".to_string();

        let rendered = ComponentRenderer::new()
            .render_multiple(&[hero, about])
            .unwrap();

        assert_eq!(rendered.len(), 2);
        match &rendered[0] {
            RenderedComponent::Hero { title, link, .. } => {
                assert_eq!(title, "Welcome");
                assert_eq!(
                    link,
                    &Some(Link {
                        text: "Explore".to_string(),
                        url: "/".to_string()
                    })
                );
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        match &rendered[1] {
            RenderedComponent::About { title, content, .. } => {
                assert_eq!(title, "About Us");
                assert_eq!(content.as_str(), "<p>We build things</p>");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_render_multiple_fails_whole_batch() {
        let batch = vec![
            component("hero", "ok"),
            component("carousel", "spinner"),
            component("text", "never-reached"),
        ];

        let err = ComponentRenderer::new().render_multiple(&batch).unwrap_err();
        assert_eq!(
            err,
            RenderError::NoRenderer {
                name: "spinner".to_string(),
                component_type: "carousel".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "failed to render component spinner: no renderer registered for component type: carousel"
        );
    }

    #[test]
    fn test_grid_items_from_data() {
        let mut grid = component("grid", "features");
        grid.data_json = r#"{"items":[
            {"title":"Fast","content":"<em>quick</em>","link_url":"/fast"},
            {"title":"Safe","image_url":"javascript:x"}
        ]}"#
        .to_string();

        match ComponentRenderer::new().render(&grid).unwrap() {
            RenderedComponent::Grid { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].content.as_str(), "<em>quick</em>");
                assert_eq!(items[0].url.as_deref(), Some("/fast"));
                assert_eq!(items[1].image_url, None);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_list_accepts_plain_labels() {
        let mut list = component("list", "steps");
        list.data_json = r#"{"items":["One","Two"]}"#.to_string();

        let html = ComponentRenderer::new().render(&list).unwrap().to_html();
        assert!(html.contains("<li>One</li><li>Two</li>"));
    }

    #[test]
    fn test_malformed_item_data_renders_empty() {
        let mut list = component("list", "broken");
        list.data_json = "{oops".to_string();

        match ComponentRenderer::new().render(&list).unwrap() {
            RenderedComponent::List { items, .. } => assert!(items.is_empty()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_fallback_block_is_sanitized() {
        let block = RenderedComponent::fallback("About", "<p>Hi</p><script>x()</script>");
        assert_eq!(
            block,
            RenderedComponent::Content {
                title: "About".to_string(),
                content: sanitize_html("<p>Hi</p>"),
            }
        );
    }

    #[test]
    fn test_rendered_serializes_with_type_tag() {
        let rendered = ComponentRenderer::new()
            .render(&component("text", "t"))
            .unwrap();
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["name"], "t");
    }
}
