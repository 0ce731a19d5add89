//! Wikimedia pageviews "top articles" adapter.
//!
//! Endpoint: `{base}/metrics/pageviews/top/{project}/{access}/{YYYY}/{MM}/{DD}`
//! Returns: the most viewed articles of that day, in rank order.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

use crate::source::{DataSource, FetchError};
use crate::stats::{DayKey, ItemCount};

pub const DEFAULT_BASE_URL: &str = "https://wikimedia.org/api/rest_v1";
pub const DEFAULT_PROJECT: &str = "en.wikipedia";
pub const DEFAULT_ACCESS: &str = "all-access";
pub const DEFAULT_USER_AGENT: &str = concat!("topviews/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub base_url: Url,
    pub project: String,
    pub access: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl WikipediaConfig {
    /// Configuration for `base_url` with the default project, access type,
    /// user agent and timeout.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            project: DEFAULT_PROJECT.to_string(),
            access: DEFAULT_ACCESS.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopPayload {
    #[serde(default)]
    items: Vec<TopItem>,
}

#[derive(Debug, Deserialize)]
struct TopItem {
    #[serde(default)]
    articles: Vec<TopArticle>,
}

#[derive(Debug, Deserialize)]
struct TopArticle {
    article: String,
    views: u64,
    #[serde(default)]
    rank: u32,
}

pub struct WikipediaSource {
    client: reqwest::blocking::Client,
    config: WikipediaConfig,
}

impl WikipediaSource {
    pub fn new(config: WikipediaConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WikipediaConfig {
        &self.config
    }

    pub fn request_url(&self, day: DayKey) -> Result<Url, FetchError> {
        let year = format!("{:04}", day.year());
        let month = format!("{:02}", day.month());
        let day_of_month = format!("{:02}", day.day());

        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::other(day, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend([
                "metrics",
                "pageviews",
                "top",
                self.config.project.as_str(),
                self.config.access.as_str(),
                year.as_str(),
                month.as_str(),
                day_of_month.as_str(),
            ]);
        Ok(url)
    }
}

impl DataSource for WikipediaSource {
    fn fetch(&self, day: DayKey) -> Result<Vec<ItemCount>, FetchError> {
        let start_time = Instant::now();
        let url = self.request_url(day)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Request { day, source })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                action = "fetch",
                component = "wikipedia",
                day = %day,
                status = status.as_u16(),
                url = %url,
                "Upstream returned an error status"
            );
            return Err(FetchError::Status {
                day,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|source| FetchError::Request { day, source })?;
        let items = decode_payload(day, &body)?;

        info!(
            action = "complete",
            component = "wikipedia",
            day = %day,
            article_count = items.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Fetched day counts"
        );
        Ok(items)
    }
}

/// Flattens a top-articles payload into counts, in rank order.
pub fn decode_payload(day: DayKey, body: &str) -> Result<Vec<ItemCount>, FetchError> {
    let payload: TopPayload =
        serde_json::from_str(body).map_err(|source| FetchError::Decode { day, source })?;

    if payload.items.is_empty() {
        return Err(FetchError::NoData { day });
    }

    let mut articles: Vec<TopArticle> = payload
        .items
        .into_iter()
        .flat_map(|item| item.articles)
        .collect();
    articles.sort_by_key(|article| article.rank);

    Ok(articles
        .into_iter()
        .map(|article| ItemCount::new(article.article, article.views))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> DayKey {
        DayKey::from(NaiveDate::from_ymd_opt(2022, 1, 5).unwrap())
    }

    #[test]
    fn builds_top_endpoint_url() {
        let config = WikipediaConfig::new(Url::parse(DEFAULT_BASE_URL).unwrap());
        let source = WikipediaSource::new(config).unwrap();
        assert_eq!(
            source.request_url(day()).unwrap().as_str(),
            "https://wikimedia.org/api/rest_v1/metrics/pageviews/top/en.wikipedia/all-access/2022/01/05"
        );
    }

    #[test]
    fn trailing_slash_in_base_is_tolerated() {
        let config = WikipediaConfig {
            project: "de.wikipedia".to_string(),
            ..WikipediaConfig::new(Url::parse("http://localhost:9000/api/").unwrap())
        };
        let source = WikipediaSource::new(config).unwrap();
        assert_eq!(source.config().project, "de.wikipedia");
        assert_eq!(source.config().timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            source.request_url(day()).unwrap().as_str(),
            "http://localhost:9000/api/metrics/pageviews/top/de.wikipedia/all-access/2022/01/05"
        );
    }

    #[test]
    fn decodes_articles_in_rank_order() {
        let body = r#"{"items":[{"project":"en.wikipedia","access":"all-access","year":"2022","month":"01","day":"05",
            "articles":[
                {"article":"Special:Search","views":1500000,"rank":2},
                {"article":"Main_Page","views":10226718,"rank":1},
                {"article":"Dua_Lipa","views":32000,"rank":3}
            ]}]}"#;
        let items = decode_payload(day(), body).unwrap();
        assert_eq!(
            items,
            vec![
                ItemCount::new("Main_Page", 10226718),
                ItemCount::new("Special:Search", 1500000),
                ItemCount::new("Dua_Lipa", 32000),
            ]
        );
    }

    #[test]
    fn empty_items_means_no_data() {
        let err = decode_payload(day(), r#"{"items":[]}"#).unwrap_err();
        assert!(matches!(err, FetchError::NoData { .. }));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode_payload(day(), "<html>not json</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.day(), day());
    }
}
