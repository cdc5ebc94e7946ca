use anyhow::Result;
use futures::future::join_all;

use crate::config::ResearchConfig;
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::{
    AgentType, QueryClassification, ResearchAngle, SectionFindings,
};
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::llm::LanguageModel;
use crate::search::SearchResult;
use crate::utils::text::truncate_chars;

/// 搜索结果及其页面正文，正文抓取失败时为空
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub result: SearchResult,
    pub content: String,
}

pub struct WorkerInput {
    pub classification: QueryClassification,
    pub angle: ResearchAngle,
    pub sources: Vec<FetchedSource>,
}

/// 单个角度深挖的产出，sources用于引用溯源校验
#[derive(Debug, Clone)]
pub struct AngleOutcome {
    pub section: SectionFindings,
    pub sources: Vec<SearchResult>,
}

/// 角度研究员 - 针对一个调研角度搜索、阅读来源并整理带引用的发现
pub struct AngleWorker {
    max_source_chars: usize,
}

impl AngleWorker {
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            max_source_chars: config.max_source_chars,
        }
    }

    /// 搜索 → 抓取 → 一次结构化模型调用
    ///
    /// 页面抓取失败不影响结果；搜索或模型调用失败则整个任务失败。
    pub async fn investigate<M: LanguageModel>(
        &self,
        context: &GeneratorContext<M>,
        classification: &QueryClassification,
        angle: &ResearchAngle,
    ) -> Result<AngleOutcome> {
        let _permit = context.limiter.acquire().await?;

        let query = format!("{} {}", classification.resolved_name, angle.angle);
        let results = context
            .search
            .search(&query, context.config.search.angle_results)
            .await?;
        tracing::debug!(angle = %angle.angle, results = results.len(), "angle search finished");

        let contents = join_all(results.iter().map(|r| context.fetcher.fetch(&r.url))).await;
        let sources: Vec<FetchedSource> = results
            .iter()
            .cloned()
            .zip(contents)
            .map(|(result, content)| FetchedSource { result, content })
            .collect();

        let input = WorkerInput {
            classification: classification.clone(),
            angle: angle.clone(),
            sources,
        };
        let section = self.execute(context, &input).await?;

        Ok(AngleOutcome {
            section,
            sources: results,
        })
    }

    fn format_sources(&self, sources: &[FetchedSource]) -> String {
        sources
            .iter()
            .map(|s| {
                format!(
                    "Source: {}\nURL: {}\n\nContent:\n{}\n---\n",
                    s.result.title,
                    s.result.url,
                    truncate_chars(&s.content, self.max_source_chars)
                )
            })
            .collect()
    }
}

impl Default for AngleWorker {
    fn default() -> Self {
        Self::new(&ResearchConfig::default())
    }
}

impl StepForwardAgent for AngleWorker {
    type Input = WorkerInput;
    type Output = SectionFindings;

    fn agent_type(&self) -> AgentType {
        AgentType::AngleWorker
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a senior researcher. Your goal is to investigate a specific research angle deeply.
Use the provided angle and search results to extract key facts, numbers, and claims.
Always cite your sources with title and URL, and only cite URLs that appear in the search content.
Synthesize the findings into a concise section with citations.
Prefer primary sources for financials (earnings releases, filings, investor relations).
If the search content is empty or unusable, say so in the summary and return no findings."#
                .to_string(),
            opening_instruction: String::new(),
            closing_instruction: String::new(),
        }
    }

    fn provide_custom_prompt_content(&self, input: &WorkerInput) -> String {
        format!(
            "Topic: {}\nAngle: {}\nDescription: {}\n\nSearch Content:\n{}",
            input.classification.resolved_name,
            input.angle.angle,
            input.angle.description,
            self.format_sources(&input.sources)
        )
    }

    /// 章节必须与计划中的角度一一对应
    fn post_process(&self, mut output: SectionFindings, input: &WorkerInput) -> Result<SectionFindings> {
        if output.angle != input.angle.angle {
            tracing::debug!(
                returned = %output.angle,
                planned = %input.angle.angle,
                "restoring planned angle title"
            );
            output.angle = input.angle.angle.clone();
        }
        Ok(output)
    }
}
