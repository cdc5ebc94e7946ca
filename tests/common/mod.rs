#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rig::tool::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use deep_research_rs::config::Config;
use deep_research_rs::generator::context::GeneratorContext;
use deep_research_rs::generator::research::ProgressEvent;
use deep_research_rs::llm::LanguageModel;
use deep_research_rs::llm::tools::web_search::{AgentToolWebSearch, WebSearchArgs};
use deep_research_rs::search::{PageFetcher, SearchError, SearchProvider, SearchResult};
use deep_research_rs::utils::text::slugify;

pub const DEFAULT_ANGLES: [&str; 4] = [
    "SWOT Analysis",
    "Stock Performance",
    "Competitive Landscape",
    "Latest Quarterly Results",
];

/// 按输出类型返回固定内容的模型，记录深挖调用的并发情况
pub struct ScriptedModel {
    angles: Vec<String>,
    delays: HashMap<String, Duration>,
    fail_on: Option<String>,
    foreign_citation_for: Option<String>,
    active_workers: AtomicUsize,
    max_active_workers: AtomicUsize,
    worker_calls: AtomicUsize,
    completed_workers: AtomicUsize,
    completed_at_synthesis: Mutex<Option<usize>>,
    saw_search_results: AtomicBool,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new(&DEFAULT_ANGLES)
    }
}

impl ScriptedModel {
    pub fn new(angles: &[&str]) -> Self {
        Self {
            angles: angles.iter().map(|a| a.to_string()).collect(),
            delays: HashMap::new(),
            fail_on: None,
            foreign_citation_for: None,
            active_workers: AtomicUsize::new(0),
            max_active_workers: AtomicUsize::new(0),
            worker_calls: AtomicUsize::new(0),
            completed_workers: AtomicUsize::new(0),
            completed_at_synthesis: Mutex::new(None),
            saw_search_results: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, angle: &str, delay: Duration) -> Self {
        self.delays.insert(angle.to_string(), delay);
        self
    }

    /// `QueryClassification`、`ResearchPlan`、`ReportSynthesis` 或 `SectionFindings:{angle}`
    pub fn failing_on(mut self, call: &str) -> Self {
        self.fail_on = Some(call.to_string());
        self
    }

    pub fn citing_foreign_url_for(mut self, angle: &str) -> Self {
        self.foreign_citation_for = Some(angle.to_string());
        self
    }

    pub fn worker_calls(&self) -> usize {
        self.worker_calls.load(Ordering::SeqCst)
    }

    pub fn max_active_workers(&self) -> usize {
        self.max_active_workers.load(Ordering::SeqCst)
    }

    pub fn completed_at_synthesis(&self) -> Option<usize> {
        *self.completed_at_synthesis.lock().unwrap()
    }

    pub fn saw_search_results(&self) -> bool {
        self.saw_search_results.load(Ordering::SeqCst)
    }

    fn check_failure(&self, call: &str) -> Result<()> {
        match &self.fail_on {
            Some(target) if target == call => Err(anyhow!("scripted failure in {}", call)),
            _ => Ok(()),
        }
    }

    fn mark_synthesis(&self) {
        *self.completed_at_synthesis.lock().unwrap() =
            Some(self.completed_workers.load(Ordering::SeqCst));
    }

    fn classification(&self, user_prompt: &str) -> Result<Value> {
        self.check_failure("QueryClassification")?;
        let query = user_prompt.lines().next().unwrap_or_default().trim();
        Ok(if query == "NVDA" {
            json!({
                "input_type": "ticker",
                "resolved_name": "NVIDIA Corporation",
                "context": "semiconductors, GPUs, AI"
            })
        } else {
            json!({
                "input_type": "general",
                "resolved_name": query,
                "context": "general research"
            })
        })
    }

    fn plan(&self) -> Result<Value> {
        self.check_failure("ResearchPlan")?;
        let angles: Vec<Value> = self
            .angles
            .iter()
            .map(|angle| {
                json!({
                    "angle": angle,
                    "keywords": [angle.to_lowercase()],
                    "description": format!("Investigate {}", angle)
                })
            })
            .collect();
        Ok(json!({ "angles": angles }))
    }

    async fn section(&self, user_prompt: &str) -> Result<Value> {
        self.worker_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_workers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_workers.fetch_max(active, Ordering::SeqCst);

        let angle = user_prompt
            .lines()
            .find_map(|l| l.strip_prefix("Angle: "))
            .unwrap_or_default()
            .to_string();
        if let Some(delay) = self.delays.get(&angle) {
            tokio::time::sleep(*delay).await;
        }
        self.active_workers.fetch_sub(1, Ordering::SeqCst);

        self.check_failure(&format!("SectionFindings:{}", angle))?;

        let urls: Vec<&str> = user_prompt
            .lines()
            .filter_map(|l| l.strip_prefix("URL: "))
            .collect();
        if !urls.is_empty() {
            self.saw_search_results.store(true, Ordering::SeqCst);
        }
        let findings: Vec<Value> = urls
            .iter()
            .take(2)
            .enumerate()
            .map(|(i, url)| {
                let url = if i == 0 && self.foreign_citation_for.as_deref() == Some(angle.as_str())
                {
                    "https://invented.example/report".to_string()
                } else {
                    url.to_string()
                };
                json!({
                    "claim": format!("{} fact #{}", angle, i + 1),
                    "source_title": format!("Source {}", i + 1),
                    "source_url": url,
                    "evidence": "quoted evidence"
                })
            })
            .collect();

        self.completed_workers.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            // 故意返回不同的标题，章节仍应以计划中的角度命名
            "angle": angle.to_uppercase(),
            "summary": format!("Summary for {}", angle),
            "findings": findings
        }))
    }

    fn synthesis(&self, user_prompt: &str) -> Result<Value> {
        self.mark_synthesis();
        self.check_failure("ReportSynthesis")?;
        let topic = user_prompt
            .lines()
            .find_map(|l| l.strip_prefix("Topic: "))
            .unwrap_or_default();
        Ok(json!({
            "title": format!("Deep research: {}", topic),
            "executive_summary": format!("{} angles were investigated.", user_prompt.matches("## Angle: ").count()),
            "risks_and_uncertainties": "Data may be incomplete.",
            "watch_list": ["Next earnings call"]
        }))
    }

    /// 单Agent模式的结构化：引用工具返回的第一个来源
    fn structured_report(&self, user_prompt: &str) -> Result<Value> {
        self.mark_synthesis();
        let url = user_prompt
            .lines()
            .filter(|l| l.starts_with("- "))
            .find_map(|l| {
                let start = l.rfind(" (")? + 2;
                l.get(start..l.len() - 1)
            })
            .unwrap_or("https://missing.example");
        Ok(json!({
            "title": "Single agent report",
            "executive_summary": "Summarized from tool searches.",
            "sections": [{
                "angle": "SWOT Analysis",
                "summary": "Strong position.",
                "findings": [{
                    "claim": "Leads the market",
                    "source_title": "Search result",
                    "source_url": url,
                    "evidence": "snippet"
                }]
            }],
            "risks_and_uncertainties": "Limited sources.",
            "watch_list": []
        }))
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn extract<T>(&self, _system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let value = if type_name.ends_with("::QueryClassification") {
            self.classification(user_prompt)?
        } else if type_name.ends_with("::ResearchPlan") {
            self.plan()?
        } else if type_name.ends_with("::SectionFindings") {
            self.section(user_prompt).await?
        } else if type_name.ends_with("::ReportSynthesis") {
            self.synthesis(user_prompt)?
        } else if type_name.ends_with("::DeepResearchReport") {
            self.structured_report(user_prompt)?
        } else {
            return Err(anyhow!("unexpected extraction type {}", type_name));
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn prompt(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.mark_synthesis();
        self.check_failure("ReportSynthesis")?;
        Ok(format!(
            "# Free-form report\n\nCovered {} angles.",
            user_prompt.matches("## Angle: ").count()
        ))
    }

    async fn prompt_with_tools(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        web_search: AgentToolWebSearch,
        _max_iterations: usize,
    ) -> Result<String> {
        let mut notes = String::from("## Notes\n");
        for query in [user_prompt.to_string(), format!("{} SWOT analysis", user_prompt)] {
            let results = web_search
                .call(WebSearchArgs {
                    query,
                    max_results: None,
                })
                .await?;
            for result in results {
                notes.push_str(&format!("- {} ({})\n", result.title, result.url));
            }
        }
        Ok(notes)
    }
}

/// 每个查询返回 `n` 条可预测的结果
#[derive(Default)]
pub struct MockSearch {
    pub queries: Mutex<Vec<String>>,
    pub fail: bool,
}

impl MockSearch {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(SearchError::Payload {
                provider: "mock",
                reason: "search backend unavailable".to_string(),
            });
        }
        Ok((0..max_results)
            .map(|i| SearchResult {
                title: format!("{} result {}", query, i),
                url: format!("https://example.com/{}/{}", slugify(query), i),
                snippet: format!("Snippet about {}", query),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MockFetcher {
    pub fail_all: bool,
    pub fetched: AtomicUsize,
}

impl MockFetcher {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> String {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            String::new()
        } else {
            format!("Page body of {}", url)
        }
    }
}

pub struct Harness {
    pub model: Arc<ScriptedModel>,
    pub search: Arc<MockSearch>,
    pub fetcher: Arc<MockFetcher>,
    pub context: GeneratorContext<ScriptedModel>,
}

pub fn harness(config: Config, model: ScriptedModel) -> Harness {
    harness_with(config, model, MockSearch::default(), MockFetcher::default())
}

pub fn harness_with(
    config: Config,
    model: ScriptedModel,
    search: MockSearch,
    fetcher: MockFetcher,
) -> Harness {
    let model = Arc::new(model);
    let search = Arc::new(search);
    let fetcher = Arc::new(fetcher);
    let context = GeneratorContext::with_services(
        config,
        Arc::clone(&model),
        search.clone(),
        fetcher.clone(),
    );
    Harness {
        model,
        search,
        fetcher,
        context,
    }
}

/// 取出通道里已有的全部事件
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
