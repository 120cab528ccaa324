use analysis_core::{NewsItem, NewsProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

const BASE_URL: &str = "https://newsapi.org/v2/everything";
const REMOVED_TITLE: &str = "[Removed]";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    source: Option<ArticleSource>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl EverythingResponse {
    /// Usable headlines. A body whose status is not "ok" carries none.
    fn into_headlines(self) -> Vec<NewsItem> {
        if self.status != "ok" {
            tracing::debug!("NewsAPI answered with status '{}'", self.status);
            return vec![];
        }
        self.articles
            .into_iter()
            .filter_map(Article::into_news_item)
            .collect()
    }
}

impl Article {
    fn into_news_item(self) -> Option<NewsItem> {
        let title = self.title.filter(|t| !t.is_empty() && t != REMOVED_TITLE)?;
        Some(NewsItem {
            title,
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "N/A".to_string()),
            url: self.url.unwrap_or_else(|| "#".to_string()),
        })
    }
}

/// Which NewsAPI parameter the query is matched against
#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchMode {
    /// `qInTitle`, newest first
    Title,
    /// `q`, most relevant first
    Broad,
}

impl SearchMode {
    fn params(&self) -> (&'static str, &'static str) {
        match self {
            SearchMode::Title => ("qInTitle", "publishedAt"),
            SearchMode::Broad => ("q", "relevance"),
        }
    }
}

/// Search phrase for a ticker: the company name when one is known, otherwise
/// "{TICKER} stock". Company suffixes are dropped.
pub fn build_query(ticker: &str, company_name: &str) -> String {
    let ticker = ticker.to_uppercase();
    let query = if !company_name.trim().is_empty() && company_name != ticker {
        company_name.to_string()
    } else {
        format!("{} stock", ticker)
    };
    query.replace(" Ltd", "").replace(" Limited", "")
}

/// The title search is considered thin below half the requested count.
fn needs_broader_search(found: usize, limit: usize) -> bool {
    found == 0 || found < limit / 2
}

/// Append broader-search results, skipping titles already present.
fn merge_unique(headlines: &mut Vec<NewsItem>, extra: Vec<NewsItem>, limit: usize) {
    let mut seen: HashSet<String> = headlines.iter().map(|h| h.title.clone()).collect();
    for item in extra {
        if headlines.len() >= limit {
            break;
        }
        if seen.insert(item.title.clone()) {
            headlines.push(item);
        }
    }
}

/// Headline provider backed by the NewsAPI `everything` endpoint.
pub struct NewsApiClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: BASE_URL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(
        &self,
        api_key: &str,
        query: &str,
        mode: SearchMode,
        limit: usize,
    ) -> Result<Vec<NewsItem>, NewsError> {
        let (query_param, sort_by) = mode.params();
        let page_size = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                (query_param, query),
                ("language", "en"),
                ("sortBy", sort_by),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: EverythingResponse = response.json().await?;
        Ok(body.into_headlines())
    }

    async fn fetch(&self, api_key: &str, query: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
        let mut headlines = self.search(api_key, query, SearchMode::Title, limit).await?;
        headlines.truncate(limit);

        if needs_broader_search(headlines.len(), limit) {
            tracing::debug!(
                "Title search for '{}' found {} headline(s), broadening",
                query,
                headlines.len()
            );
            let broader = self.search(api_key, query, SearchMode::Broad, limit).await?;
            merge_unique(&mut headlines, broader, limit);
        }

        Ok(headlines)
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn headlines(&self, ticker: &str, company_name: &str, limit: usize) -> Vec<NewsItem> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return vec![NewsItem::placeholder("NewsAPI key not configured.", "System")],
        };

        let query = build_query(ticker, company_name);

        match self.fetch(api_key, &query, limit).await {
            Ok(headlines) if headlines.is_empty() => vec![NewsItem::placeholder(
                format!("No recent headlines found for '{}'.", query),
                "NewsAPI",
            )],
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("Error fetching news for '{}': {}", query, e);
                vec![NewsItem::placeholder(format!("Could not fetch news. Error: {}", e), "System")]
            }
        }
    }
}
