//! External metadata catalog client
//!
//! The engine consumes the catalog through the [`CatalogClient`] trait.
//! [`TvMazeClient`] is the production implementation (TVMaze is a free API
//! that doesn't require authentication); [`StaticCatalog`] is the in-memory
//! double used by tests.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rate_limiter::{RateLimitedClient, RetryConfig, retry_async};

/// A series the catalog offered for a name search
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCandidate {
    pub external_id: i32,
    pub name: String,
    pub first_aired: Option<NaiveDate>,
}

/// One episode as described by the catalog
#[derive(Debug, Clone)]
pub struct CatalogEpisode {
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
}

/// Full series detail fetched by external id
#[derive(Debug, Clone)]
pub struct CatalogSeriesDetail {
    pub external_id: i32,
    pub name: String,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub first_aired: Option<NaiveDate>,
    pub episodes: Vec<CatalogEpisode>,
}

/// Boundary to the external metadata catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search series by name, best match first
    async fn search_by_name(&self, name: &str) -> Result<Vec<CatalogCandidate>>;

    /// Fetch full series detail (including episodes) for a stable external id
    async fn fetch_detail(&self, external_id: i32) -> Result<CatalogSeriesDetail>;
}

/// Show search result from TVMaze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeSearchResult {
    pub score: f64,
    pub show: TvMazeShow,
}

/// Show details from TVMaze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeShow {
    pub id: i32,
    pub name: String,
    pub status: Option<String>,
    pub premiered: Option<String>,
    pub summary: Option<String>,
}

/// Episode from TVMaze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeEpisode {
    pub id: i32,
    pub name: Option<String>,
    pub season: i32,
    pub number: Option<i32>,
    pub airdate: Option<String>,
    pub summary: Option<String>,
}

/// TVMaze API client
pub struct TvMazeClient {
    client: RateLimitedClient,
    retry: RetryConfig,
    base_url: String,
}

impl TvMazeClient {
    pub fn new() -> Self {
        Self::with_base_url("https://api.tvmaze.com")
    }

    /// Point the client at a different base URL (stub servers in tests)
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: RateLimitedClient::for_tvmaze(),
            retry: RetryConfig::default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        operation: &str,
    ) -> Result<T> {
        let url = url.to_string();
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        retry_async(
            || {
                let url = url.clone();
                let query = query.clone();
                let operation = operation.to_string();
                async move {
                    let response = if query.is_empty() {
                        self.client.get(&url).await?
                    } else {
                        self.client.get_with_query(&url, &query).await?
                    };

                    if !response.status().is_success() {
                        return Err(anyhow!(
                            "{operation} failed with status: {}",
                            response.status()
                        ));
                    }

                    response
                        .json::<T>()
                        .await
                        .with_context(|| format!("Failed to parse {operation} response"))
                }
            },
            &self.retry,
            operation,
        )
        .await
    }
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_air_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// TVMaze summaries are HTML fragments; keep the text only
fn strip_tags(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.trim().to_string()
}

#[async_trait]
impl CatalogClient for TvMazeClient {
    async fn search_by_name(&self, name: &str) -> Result<Vec<CatalogCandidate>> {
        info!(query = %name, "Searching catalog for series");

        let url = format!("{}/search/shows", self.base_url);
        let results: Vec<TvMazeSearchResult> = self
            .get_json(&url, &[("q", name)], "catalog search")
            .await?;

        debug!(count = results.len(), "Catalog search returned results");

        Ok(results
            .into_iter()
            .map(|r| CatalogCandidate {
                external_id: r.show.id,
                name: r.show.name,
                first_aired: parse_air_date(r.show.premiered.as_deref()),
            })
            .collect())
    }

    async fn fetch_detail(&self, external_id: i32) -> Result<CatalogSeriesDetail> {
        info!(external_id = external_id, "Fetching series detail from catalog");

        let show_url = format!("{}/shows/{}", self.base_url, external_id);
        let show: TvMazeShow = self.get_json(&show_url, &[], "catalog show fetch").await?;

        let episodes_url = format!("{}/shows/{}/episodes", self.base_url, external_id);
        let episodes: Vec<TvMazeEpisode> = self
            .get_json(&episodes_url, &[], "catalog episode fetch")
            .await?;

        let episodes = episodes
            .into_iter()
            .filter_map(|e| {
                // Specials without an episode number cannot be tracked
                let number = e.number?;
                Some(CatalogEpisode {
                    season_number: e.season,
                    episode_number: number,
                    title: e.name,
                    overview: e.summary.as_deref().map(strip_tags),
                    air_date: parse_air_date(e.airdate.as_deref()),
                })
            })
            .collect();

        Ok(CatalogSeriesDetail {
            external_id: show.id,
            name: show.name,
            overview: show.summary.as_deref().map(strip_tags),
            status: show.status,
            first_aired: parse_air_date(show.premiered.as_deref()),
            episodes,
        })
    }
}

/// In-memory catalog for tests: a fixed set of series and their episodes
#[derive(Default)]
pub struct StaticCatalog {
    series: RwLock<HashMap<i32, CatalogSeriesDetail>>,
    /// Artificial latency, for exercising in-flight job behavior
    delay: Option<Duration>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            delay: Some(delay),
        }
    }

    pub fn insert(&self, detail: CatalogSeriesDetail) {
        self.series.write().insert(detail.external_id, detail);
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn search_by_name(&self, name: &str) -> Result<Vec<CatalogCandidate>> {
        self.simulate_latency().await;
        let needle = name.to_lowercase();
        let mut candidates: Vec<_> = self
            .series
            .read()
            .values()
            .filter(|d| d.name.to_lowercase().contains(&needle) || needle.contains(&d.name.to_lowercase()))
            .map(|d| CatalogCandidate {
                external_id: d.external_id,
                name: d.name.clone(),
                first_aired: d.first_aired,
            })
            .collect();
        candidates.sort_by_key(|c| c.external_id);
        Ok(candidates)
    }

    async fn fetch_detail(&self, external_id: i32) -> Result<CatalogSeriesDetail> {
        self.simulate_latency().await;
        self.series
            .read()
            .get(&external_id)
            .cloned()
            .with_context(|| format!("series {external_id} not in catalog"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>A scrappy <b>crew</b>.</p>"), "A scrappy crew.");
        assert_eq!(strip_tags("plain text"), "plain text");
    }

    #[test]
    fn test_parse_air_date() {
        assert_eq!(
            parse_air_date(Some("2005-03-24")),
            NaiveDate::from_ymd_opt(2005, 3, 24)
        );
        assert_eq!(parse_air_date(Some("not-a-date")), None);
        assert_eq!(parse_air_date(None), None);
    }

    #[tokio::test]
    async fn test_static_catalog_search_and_fetch() {
        let catalog = StaticCatalog::new();
        catalog.insert(CatalogSeriesDetail {
            external_id: 65432,
            name: "The Office (US)".to_string(),
            overview: None,
            status: Some("Ended".to_string()),
            first_aired: NaiveDate::from_ymd_opt(2005, 3, 24),
            episodes: vec![],
        });

        let hits = catalog.search_by_name("the office").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, 65432);

        let detail = catalog.fetch_detail(65432).await.unwrap();
        assert_eq!(detail.name, "The Office (US)");

        assert!(catalog.fetch_detail(99999).await.is_err());
    }
}
