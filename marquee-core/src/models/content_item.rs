use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a content item is located.
///
/// The locator fields live inline with the item (internally tagged), so the
/// replicated JSON stays flat: `{"id": ..., "kind": "direct", "url": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentKind {
    /// Raw file or page URL.
    Direct { url: String },
    /// Movie looked up in the external catalog.
    CatalogMovie {
        tmdb_id: Option<i64>,
        imdb_id: Option<String>,
    },
    /// Series looked up in the external catalog.
    CatalogShow {
        tmdb_id: Option<i64>,
        imdb_id: Option<String>,
    },
    /// Single episode of a series.
    CatalogEpisode {
        tmdb_id: Option<i64>,
        imdb_id: Option<String>,
        season: u32,
        episode: u32,
    },
    /// Media uploaded into this device's blob store.
    LocalUpload { blob_key: String },
}

impl ContentKind {
    /// Short label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Direct { .. } => "direct",
            ContentKind::CatalogMovie { .. } => "movie",
            ContentKind::CatalogShow { .. } => "show",
            ContentKind::CatalogEpisode { .. } => "episode",
            ContentKind::LocalUpload { .. } => "upload",
        }
    }
}

/// One playable unit in the playlist.
///
/// Items reference their media by locator, never by embedded bytes; the
/// source resolver turns the locator into a render instruction at play time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub added_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            tags: Vec::new(),
            added_at: Utc::now(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.kind.label())?;
        if !self.tags.is_empty() {
            write!(f, " [{}]", self.tags.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_item_new() {
        let item = ContentItem::new(
            "Intro",
            ContentKind::Direct {
                url: "https://example.com/intro.mp4".to_string(),
            },
        );
        assert_eq!(item.title, "Intro");
        assert!(item.tags.is_empty());
        assert_eq!(item.kind.label(), "direct");
    }

    #[test]
    fn test_content_item_with_tags() {
        let item = ContentItem::new(
            "Promo",
            ContentKind::Direct {
                url: "https://example.com/promo.mp4".to_string(),
            },
        )
        .with_tags(vec!["lobby".into(), "morning".into()]);

        assert_eq!(item.tags.len(), 2);
    }

    #[test]
    fn test_kind_labels() {
        let movie = ContentKind::CatalogMovie {
            tmdb_id: Some(603),
            imdb_id: None,
        };
        assert_eq!(movie.label(), "movie");

        let upload = ContentKind::LocalUpload {
            blob_key: "abc".to_string(),
        };
        assert_eq!(upload.label(), "upload");
    }

    #[test]
    fn test_kind_tag_is_flattened() {
        let item = ContentItem::new(
            "Clip",
            ContentKind::Direct {
                url: "https://example.com/clip.mp4".to_string(),
            },
        );

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "direct");
        assert_eq!(value["url"], "https://example.com/clip.mp4");
    }

    #[test]
    fn test_episode_json_roundtrip() {
        let item = ContentItem::new(
            "S2E5",
            ContentKind::CatalogEpisode {
                tmdb_id: Some(1396),
                imdb_id: Some("tt0903747".to_string()),
                season: 2,
                episode: 5,
            },
        );

        let json = serde_json::to_string(&item).unwrap();
        let parsed: ContentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_content_item_display() {
        let item = ContentItem::new(
            "Demo Reel",
            ContentKind::LocalUpload {
                blob_key: "key-1".to_string(),
            },
        )
        .with_tags(vec!["demo".into()]);

        let output = format!("{}", item);
        assert!(output.contains("Demo Reel"));
        assert!(output.contains("upload"));
        assert!(output.contains("demo"));
    }
}
