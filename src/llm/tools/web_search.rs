//! 网页搜索工具

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::tool::Tool;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::generator::research::progress::{ProgressEvent, ProgressSink};
use crate::search::{SearchError, SearchProvider, SearchResult};

/// 搜索工具，克隆后共享调用计数与收集到的结果
#[derive(Clone)]
pub struct AgentToolWebSearch {
    provider: Arc<dyn SearchProvider>,
    progress: ProgressSink,
    max_results: usize,
    calls: Arc<AtomicUsize>,
    collected: Arc<Mutex<Vec<SearchResult>>>,
}

/// 搜索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
    pub max_results: Option<usize>,
}

impl AgentToolWebSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, progress: ProgressSink, max_results: usize) -> Self {
        Self {
            provider,
            progress,
            max_results,
            calls: Arc::new(AtomicUsize::new(0)),
            collected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 到目前为止的调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 所有调用返回过的结果，按返回顺序
    pub async fn collected_results(&self) -> Vec<SearchResult> {
        self.collected.lock().await.clone()
    }
}

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = "web_search";

    type Error = SearchError;
    type Args = WebSearchArgs;
    type Output = Vec<SearchResult>;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web. Returns a list of results, each with a title, url and \
                          snippet. Only cite URLs that this tool actually returned."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    },
                    "max_results": {
                        "type": "integer",
                        "description": format!("Maximum number of results (default {}).", self.max_results)
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let ordinal = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.emit(ProgressEvent::ToolSearch {
            ordinal,
            query: args.query.clone(),
        });

        let max_results = args.max_results.unwrap_or(self.max_results).clamp(1, 10);
        let results = self.provider.search(&args.query, max_results).await?;
        tracing::debug!(ordinal, query = %args.query, results = results.len(), "web_search tool called");

        self.collected.lock().await.extend(results.iter().cloned());
        Ok(results)
    }
}
