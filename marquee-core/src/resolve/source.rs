//! Source resolution: content descriptor to renderable instruction.
//!
//! The resolver is total: every item maps to exactly one instruction.
//! Whether the bytes behind the instruction exist is a playback-time
//! concern (blob store lookup, renderer load failure), never resolved here.

use urlencoding::encode;

use crate::models::{ContentItem, ContentKind, PlayerConfig};

/// Base URL of the third-party embed provider for catalog content.
const EMBED_BASE: &str = "https://vidsrc.to/embed";

/// The normalized, renderer-ready description of how to play an item.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction {
    /// Raw streamable file, handed to the media element as-is
    Stream { url: String },
    /// Third-party page shown in an embedded frame
    Embed { url: String },
    /// Key into this device's blob store; bytes resolved at playback time
    LocalBlob { key: String },
}

/// Maps a content item to its render instruction. Never fails; malformed
/// or missing catalog identifiers produce a best-effort URL.
pub fn resolve(item: &ContentItem, config: &PlayerConfig) -> RenderInstruction {
    match &item.kind {
        ContentKind::LocalUpload { blob_key } => RenderInstruction::LocalBlob {
            key: blob_key.clone(),
        },
        ContentKind::Direct { url } => match youtube_video_id(url) {
            Some(video_id) => RenderInstruction::Embed {
                url: youtube_embed_url(&video_id, config),
            },
            None => RenderInstruction::Stream { url: url.clone() },
        },
        ContentKind::CatalogMovie { tmdb_id, imdb_id } => RenderInstruction::Embed {
            url: catalog_embed_url("movie", catalog_id(tmdb_id, imdb_id), None, config),
        },
        ContentKind::CatalogShow { tmdb_id, imdb_id } => RenderInstruction::Embed {
            url: catalog_embed_url("tv", catalog_id(tmdb_id, imdb_id), None, config),
        },
        ContentKind::CatalogEpisode {
            tmdb_id,
            imdb_id,
            season,
            episode,
        } => RenderInstruction::Embed {
            url: catalog_embed_url(
                "tv",
                catalog_id(tmdb_id, imdb_id),
                Some((*season, *episode)),
                config,
            ),
        },
    }
}

/// Picks the catalog identifier for embed URLs.
///
/// The cross-catalog IMDB ID is stable across providers and preferred over
/// the provider-specific TMDB ID when both are present.
fn catalog_id(tmdb_id: &Option<i64>, imdb_id: &Option<String>) -> Option<String> {
    imdb_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| tmdb_id.map(|id| id.to_string()))
}

/// Extracts the video ID from a recognized short-video host URL.
///
/// Recognized forms: `youtube.com/watch?v=ID`, `youtu.be/ID`, and
/// `youtube.com/shorts/ID`, with optional scheme and `www.`/`m.` prefixes.
fn youtube_video_id(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest
        .strip_prefix("www.")
        .or_else(|| rest.strip_prefix("m."))
        .unwrap_or(rest);

    if let Some(path) = rest.strip_prefix("youtu.be/") {
        return leading_video_id(path);
    }
    if let Some(query) = rest.strip_prefix("youtube.com/watch?") {
        return query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))
            .and_then(leading_video_id);
    }
    if let Some(path) = rest.strip_prefix("youtube.com/shorts/") {
        return leading_video_id(path);
    }
    None
}

/// Takes the leading video-ID characters, stopping at any delimiter.
fn leading_video_id(s: &str) -> Option<String> {
    let id: String = s
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn youtube_embed_url(video_id: &str, config: &PlayerConfig) -> String {
    let mut params = vec![
        format!("autoplay={}", flag(config.autoplay)),
        format!("mute={}", flag(config.muted)),
    ];
    if config.loop_playback {
        // The embed player only loops with a single-entry playlist param
        params.push("loop=1".to_string());
        params.push(format!("playlist={}", encode(video_id)));
    }
    if !config.language.is_empty() {
        params.push(format!("hl={}", encode(&config.language)));
    }

    format!(
        "https://www.youtube-nocookie.com/embed/{}?{}",
        encode(video_id),
        params.join("&")
    )
}

fn catalog_embed_url(
    section: &str,
    id: Option<String>,
    episode: Option<(u32, u32)>,
    config: &PlayerConfig,
) -> String {
    let mut url = format!("{}/{}", EMBED_BASE, section);
    if let Some(id) = id {
        url.push('/');
        url.push_str(&encode(&id));
        if let Some((season, episode)) = episode {
            url.push_str(&format!("/{}/{}", season, episode));
        }
    }

    let mut params = vec![format!("autoplay={}", flag(config.autoplay))];
    if !config.language.is_empty() {
        params.push(format!("lang={}", encode(&config.language)));
    }

    format!("{}?{}", url, params.join("&"))
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}
