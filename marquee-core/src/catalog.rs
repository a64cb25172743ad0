//! Read-only client for the external movie/TV catalog.
//!
//! Consumed by the authoring flow to turn a title search into catalog
//! identifiers; the viewing path never touches it. The API surface is
//! TMDB-compatible: `GET /search/{movie|tv}` and
//! `GET /{movie|tv}/{id}/external_ids`.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Movie,
    Show,
}

impl CatalogKind {
    fn section(self) -> &'static str {
        match self {
            CatalogKind::Movie => "movie",
            CatalogKind::Show => "tv",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Movie => write!(f, "movie"),
            CatalogKind::Show => write!(f, "show"),
        }
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(CatalogKind::Movie),
            "show" | "tv" => Ok(CatalogKind::Show),
            _ => Err(format!(
                "Invalid catalog kind '{}'. Valid options: movie, show",
                s
            )),
        }
    }
}

/// One search hit. Movie and TV payloads use different field names for
/// title and date; the aliases fold them together.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResult {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: String,
}

/// Cross-catalog identifiers for one catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<CatalogResult>,
}

/// Errors from catalog lookups.
#[derive(Debug)]
pub enum CatalogError {
    /// No catalog API key configured
    NotConfigured,
    /// Request failed or returned a non-success status
    Http(String),
    /// Response body was not the expected shape
    Decode(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotConfigured => {
                write!(f, "Catalog not configured. Add catalog api_key to config.")
            }
            CatalogError::Http(e) => write!(f, "Catalog HTTP error: {}", e),
            CatalogError::Decode(e) => write!(f, "Catalog response error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

pub struct CatalogClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Searches the catalog by title.
    pub async fn search(
        &self,
        query: &str,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogResult>, CatalogError> {
        let url = format!(
            "{}/search/{}?query={}",
            self.base_url,
            kind.section(),
            urlencoding::encode(query)
        );

        let response = self.get(&url).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(parsed.results)
    }

    /// Fetches the cross-catalog stable identifiers for an entry.
    pub async fn external_ids(
        &self,
        catalog_id: i64,
        kind: CatalogKind,
    ) -> Result<ExternalIds, CatalogError> {
        let url = format!(
            "{}/{}/{}/external_ids",
            self.base_url,
            kind.section(),
            catalog_id
        );

        let response = self.get(&url).await?;
        response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CatalogError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Http(format!(
                "Server returned status {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_kind_from_str() {
        assert_eq!(CatalogKind::from_str("movie").unwrap(), CatalogKind::Movie);
        assert_eq!(CatalogKind::from_str("Show").unwrap(), CatalogKind::Show);
        assert_eq!(CatalogKind::from_str("tv").unwrap(), CatalogKind::Show);
        assert!(CatalogKind::from_str("music").is_err());
    }

    #[test]
    fn test_search_response_movie_fields() {
        let json = r#"{"results":[{"id":603,"title":"The Matrix","release_date":"1999-03-30","overview":"A hacker."}]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].id, 603);
        assert_eq!(parsed.results[0].title, "The Matrix");
        assert_eq!(parsed.results[0].release_date.as_deref(), Some("1999-03-30"));
    }

    #[test]
    fn test_search_response_tv_aliases() {
        let json = r#"{"results":[{"id":1396,"name":"Breaking Bad","first_air_date":"2008-01-20"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].title, "Breaking Bad");
        assert_eq!(
            parsed.results[0].release_date.as_deref(),
            Some("2008-01-20")
        );
        assert!(parsed.results[0].overview.is_empty());
    }

    #[test]
    fn test_external_ids_allow_missing_imdb() {
        let parsed: ExternalIds = serde_json::from_str(r#"{"imdb_id":null}"#).unwrap();
        assert!(parsed.imdb_id.is_none());

        let parsed: ExternalIds =
            serde_json::from_str(r#"{"imdb_id":"tt0133093","facebook_id":null}"#).unwrap();
        assert_eq!(parsed.imdb_id.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = CatalogClient::new(
            "https://api.example.com/3/".to_string(),
            "key".to_string(),
        );
        assert_eq!(client.base_url, "https://api.example.com/3");
    }
}
