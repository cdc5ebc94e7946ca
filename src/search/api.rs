//! 需要API KEY的搜索服务：Brave Search 与 Tavily

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchError, SearchProvider, SearchResult};

const BRAVE: &str = "Brave Search";
const BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const TAVILY: &str = "Tavily";
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

pub struct BraveSearchProvider {
    client: reqwest::Client,
    api_key: String,
}

impl BraveSearchProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveItem>,
}

#[derive(Debug, Deserialize)]
struct BraveItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for BraveSearchProvider {
    fn name(&self) -> &str {
        BRAVE
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(BRAVE_ENDPOINT)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &max_results.to_string())])
            .send()
            .await
            .map_err(|error| SearchError::Request {
                provider: BRAVE,
                error,
            })?;

        let body = read_body(BRAVE, response).await?;
        parse_brave(&body, max_results)
    }
}

fn parse_brave(body: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let response: BraveResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Payload {
            provider: BRAVE,
            reason: e.to_string(),
        })?;

    Ok(response
        .web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .take(max_results)
        .map(|item| SearchResult {
            title: item.title,
            url: item.url,
            snippet: item.description,
        })
        .collect())
}

pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyItem>,
}

#[derive(Debug, Deserialize)]
struct TavilyItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        TAVILY
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic",
        });

        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&body)
            .send()
            .await
            .map_err(|error| SearchError::Request {
                provider: TAVILY,
                error,
            })?;

        let body = read_body(TAVILY, response).await?;
        parse_tavily(&body, max_results)
    }
}

fn parse_tavily(body: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let response: TavilyResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Payload {
            provider: TAVILY,
            reason: e.to_string(),
        })?;

    Ok(response
        .results
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .take(max_results)
        .map(|item| SearchResult {
            title: item.title,
            url: item.url,
            snippet: item.content,
        })
        .collect())
}

async fn read_body(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<String, SearchError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| SearchError::Request { provider, error })?;

    if !status.is_success() {
        return Err(SearchError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
