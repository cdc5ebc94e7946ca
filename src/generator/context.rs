use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::llm::{LLMClient, LanguageModel};
use crate::search::{HttpPageFetcher, PageFetcher, SearchProvider, build_search_provider};

/// 一次调研共享的只读服务，克隆开销只是几个 `Arc`
pub struct GeneratorContext<M = LLMClient> {
    /// LLM调用器，用于与AI通信。
    pub llm_client: Arc<M>,
    /// 搜索服务
    pub search: Arc<dyn SearchProvider>,
    /// 页面抓取
    pub fetcher: Arc<dyn PageFetcher>,
    /// 配置
    pub config: Config,
    /// 限制同时进行的深挖网络/模型调用
    pub limiter: Arc<Semaphore>,
}

impl<M> Clone for GeneratorContext<M> {
    fn clone(&self) -> Self {
        Self {
            llm_client: Arc::clone(&self.llm_client),
            search: Arc::clone(&self.search),
            fetcher: Arc::clone(&self.fetcher),
            config: self.config.clone(),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl GeneratorContext<LLMClient> {
    /// 根据配置创建真实的LLM、搜索与抓取服务
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = Arc::new(LLMClient::new(&config.llm)?);
        let search = build_search_provider(&config.search)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(
            Duration::from_secs(config.research.fetch_timeout_seconds),
            config.research.max_page_chars,
        )?);

        Ok(Self::with_services(config, llm_client, search, fetcher))
    }
}

impl<M: LanguageModel> GeneratorContext<M> {
    pub fn with_services(
        config: Config,
        llm_client: Arc<M>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.llm.max_parallels.max(1)));
        Self {
            llm_client,
            search,
            fetcher,
            config,
            limiter,
        }
    }
}
