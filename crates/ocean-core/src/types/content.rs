//! Block content model
//!
//! Each block carries a type-specific content variant. The variant set is
//! closed: extracting searchable text and converting between types both
//! require an exhaustive match, so adding a variant is a compile-visible
//! change everywhere it matters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OceanError, Result};

/// Separator used when flattening list items into searchable text and
/// when splitting text back into items during conversion.
const LIST_SEPARATOR: char = '\n';

/// The closed set of block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading,
    List,
    Task,
    /// External link with display text and URL
    Link,
    /// Link to another page in the workspace
    PageLink,
}

impl BlockType {
    /// Parse a block type from its wire name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "heading" => Ok(Self::Heading),
            "list" => Ok(Self::List),
            "task" => Ok(Self::Task),
            "link" => Ok(Self::Link),
            "page_link" => Ok(Self::PageLink),
            other => Err(OceanError::validation(format!(
                "unknown block type: {other}"
            ))),
        }
    }

    /// Wire name of this block type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::List => "list",
            Self::Task => "task",
            Self::Link => "link",
            Self::PageLink => "page_link",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific block content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockContent {
    Text {
        text: String,
    },
    Heading {
        text: String,
        level: u8,
    },
    List {
        items: Vec<String>,
    },
    Task {
        text: String,
        checked: bool,
    },
    Link {
        text: String,
        url: String,
    },
    PageLink {
        display_text: String,
        /// Target page; `None` until the caller wires one up (e.g. right
        /// after converting another block type into a page link)
        page_id: Option<Uuid>,
    },
}

impl BlockContent {
    /// The block type this content belongs to
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Text { .. } => BlockType::Text,
            Self::Heading { .. } => BlockType::Heading,
            Self::List { .. } => BlockType::List,
            Self::Task { .. } => BlockType::Task,
            Self::Link { .. } => BlockType::Link,
            Self::PageLink { .. } => BlockType::PageLink,
        }
    }

    /// Extract the text used for embedding and substring matching.
    ///
    /// Returns an empty string for content with nothing searchable;
    /// blocks with empty searchable text never get a vector reference.
    pub fn searchable_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Heading { text, .. } => text.clone(),
            Self::List { items } => items.join(&LIST_SEPARATOR.to_string()),
            Self::Task { text, .. } => text.clone(),
            Self::Link { text, url } => {
                if text.is_empty() {
                    url.clone()
                } else {
                    format!("{text} {url}")
                }
            }
            Self::PageLink { display_text, .. } => display_text.clone(),
        }
    }

    /// Convert this content into another block type, preserving text.
    ///
    /// Conversion rules:
    /// - text / heading / task carry their text across
    /// - list flattens to newline-separated text and splits back
    /// - link keeps its display text; the URL survives a round-trip only
    ///   through the searchable text of the link itself
    /// - page link keeps display text; the target must be re-set by the
    ///   caller after converting into a page link
    pub fn convert_to(&self, new_type: BlockType) -> BlockContent {
        if self.block_type() == new_type {
            return self.clone();
        }

        let text = self.plain_text();
        match new_type {
            BlockType::Text => BlockContent::Text { text },
            BlockType::Heading => BlockContent::Heading { text, level: 1 },
            BlockType::List => BlockContent::List {
                items: text
                    .split(LIST_SEPARATOR)
                    .map(str::to_string)
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            BlockType::Task => BlockContent::Task {
                text,
                checked: false,
            },
            BlockType::Link => BlockContent::Link {
                text,
                url: String::new(),
            },
            BlockType::PageLink => BlockContent::PageLink {
                display_text: text,
                page_id: None,
            },
        }
    }

    /// Display text without any URL suffix, used as the carrier during
    /// type conversion
    fn plain_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Heading { text, .. } => text.clone(),
            Self::List { items } => items.join(&LIST_SEPARATOR.to_string()),
            Self::Task { text, .. } => text.clone(),
            Self::Link { text, .. } => text.clone(),
            Self::PageLink { display_text, .. } => display_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_text_per_variant() {
        assert_eq!(
            BlockContent::Text {
                text: "hello".into()
            }
            .searchable_text(),
            "hello"
        );
        assert_eq!(
            BlockContent::List {
                items: vec!["a".into(), "b".into()]
            }
            .searchable_text(),
            "a\nb"
        );
        assert_eq!(
            BlockContent::Link {
                text: "docs".into(),
                url: "https://example.com".into()
            }
            .searchable_text(),
            "docs https://example.com"
        );
        assert_eq!(
            BlockContent::PageLink {
                display_text: "Roadmap".into(),
                page_id: None
            }
            .searchable_text(),
            "Roadmap"
        );
    }

    #[test]
    fn text_to_task_adds_unchecked_flag() {
        let converted = BlockContent::Text {
            text: "ship it".into(),
        }
        .convert_to(BlockType::Task);
        assert_eq!(
            converted,
            BlockContent::Task {
                text: "ship it".into(),
                checked: false
            }
        );
    }

    #[test]
    fn list_round_trips_through_text() {
        let list = BlockContent::List {
            items: vec!["one".into(), "two".into()],
        };
        let text = list.convert_to(BlockType::Text);
        assert_eq!(
            text,
            BlockContent::Text {
                text: "one\ntwo".into()
            }
        );
        assert_eq!(text.convert_to(BlockType::List), list);
    }

    #[test]
    fn task_to_text_drops_checked_flag() {
        let converted = BlockContent::Task {
            text: "done".into(),
            checked: true,
        }
        .convert_to(BlockType::Text);
        assert_eq!(converted, BlockContent::Text { text: "done".into() });
    }

    #[test]
    fn convert_to_same_type_is_identity() {
        let heading = BlockContent::Heading {
            text: "Title".into(),
            level: 3,
        };
        assert_eq!(heading.convert_to(BlockType::Heading), heading);
    }

    #[test]
    fn link_conversion_drops_url_but_keeps_text() {
        let link = BlockContent::Link {
            text: "docs".into(),
            url: "https://example.com".into(),
        };
        assert_eq!(
            link.convert_to(BlockType::Text),
            BlockContent::Text { text: "docs".into() }
        );
    }

    #[test]
    fn block_type_parse_rejects_unknown() {
        assert!(BlockType::parse("text").is_ok());
        assert!(matches!(
            BlockType::parse("video"),
            Err(OceanError::Validation(_))
        ));
    }

    #[test]
    fn content_serde_is_internally_tagged() {
        let json = serde_json::to_value(BlockContent::Heading {
            text: "T".into(),
            level: 2,
        })
        .unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
    }
}
