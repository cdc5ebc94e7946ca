//! 搜索与页面抓取 - 调研流程依赖的两个外部协作方

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, SearchProviderKind};

pub mod api;
pub mod duckduckgo;
pub mod fetcher;

pub use api::{BraveSearchProvider, TavilyProvider};
pub use duckduckgo::DuckDuckGoProvider;
pub use fetcher::{HttpPageFetcher, PageFetcher};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// 搜索失败的原因
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{provider} requires an API key (set {env_var} or search.api_key)")]
    MissingApiKey {
        provider: SearchProviderKind,
        env_var: &'static str,
    },
    #[error("{provider} request failed: {error}")]
    Request {
        provider: &'static str,
        error: reqwest::Error,
    },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to parse {provider} response: {reason}")]
    Payload {
        provider: &'static str,
        reason: String,
    },
}

/// 可插拔的搜索服务
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 用于日志展示的名称
    fn name(&self) -> &str;

    /// 执行搜索，没有结果时返回空列表而不是错误
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// 根据配置创建搜索服务
pub fn build_search_provider(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(USER_AGENT)
        .build()?;

    let provider: Arc<dyn SearchProvider> = match config.provider {
        SearchProviderKind::DuckDuckGo => Arc::new(DuckDuckGoProvider::new(client)),
        SearchProviderKind::Brave => Arc::new(BraveSearchProvider::new(
            client,
            resolve_api_key(config)?,
        )),
        SearchProviderKind::Tavily => {
            Arc::new(TavilyProvider::new(client, resolve_api_key(config)?))
        }
    };

    tracing::debug!(provider = provider.name(), "search provider ready");
    Ok(provider)
}

fn resolve_api_key(config: &SearchConfig) -> Result<String, SearchError> {
    let env_var = config.provider.api_key_env().unwrap_or_default();
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
        .ok_or(SearchError::MissingApiKey {
            provider: config.provider,
            env_var,
        })
}

/// 把发现搜索的结果整理成规划器的上下文，每条一行
pub fn format_discovery_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("{} ({}): {}", r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}
