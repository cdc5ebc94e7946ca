//! 单Agent调研：一个挂载web_search工具的Agent自主完成发现、深挖与综合

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::ReportFormat;
use crate::generator::agent_executor::{AgentExecuteParams, extract};
use crate::generator::context::GeneratorContext;
use crate::generator::research::ResearchOutcome;
use crate::generator::research::error::ResearchError;
use crate::generator::research::grounding::audit_section;
use crate::generator::research::progress::{ProgressEvent, ProgressSink};
use crate::generator::research::state::ResearchStage;
use crate::generator::research::types::{AgentType, DeepResearchReport, FinalReport};
use crate::llm::LanguageModel;
use crate::llm::tools::web_search::AgentToolWebSearch;
use crate::search::SearchResult;

const INSTRUCTIONS: &str = r#"You are a Deep Research Agent. You produce a single, detailed, well-sourced report from web research using the web_search tool.

## 1. Intent and entity detection
- If the user input looks like a stock ticker (1-5 uppercase letters, possibly with "stock" or similar), treat it as a ticker.
  - First, run a web search to resolve the ticker to company name and context (e.g. NVDA -> NVIDIA, semiconductors, GPUs, AI).
  - Use that resolved context for all later steps.
- Otherwise, treat the input as a free-text research query and use it as-is.

## 2. Initial discovery search
- Run exactly one web search with the (resolved) query or topic.
- From the top results and snippets, identify 3-4 non-overlapping research angles (keywords/themes).
- For a stock: typical angles include SWOT analysis, last 12 months stock performance, competition and market positioning, latest quarterly results and forward guidance.
- For a general topic: choose angles that cover different aspects (e.g. overview, recent news, risks, outlook).

## 3. Deep dives (one search per angle)
- For each research angle, run a separate web search with a focused query.
- Use only the returned results: title, url and snippet. Do not invent URLs or sources.
- Prefer primary sources for financials: earnings releases, filings, investor relations.
- Prefer reputable outlets for news when multiple options exist.
- Extract key facts, numbers, and claims. Track which source (title + URL) supports which claim.

## 4. Synthesis
- Write one report with:
  - **Executive summary**: 2-4 sentences summarizing the main findings.
  - **Sections**: one section per research angle with key findings and evidence (claim + source title + URL). Every factual claim must cite a real source URL and title.
  - **Risks/uncertainties**: conflicting information, caveats, or data limitations.
  - **What to watch next**: concrete follow-up items (e.g. next earnings date, key catalyst).
- Do not invent sources or URLs. Only cite results you actually received from the search tool."#;

const STRUCTURING_PROMPT: &str = r#"You convert a finished research write-up into a structured report.
Keep every claim and citation exactly as written; do not add new facts or URLs.
Each research angle becomes one section whose angle is the section title, whose summary condenses the key findings, and whose findings carry the cited evidence."#;

/// 单Agent调研员
#[derive(Default)]
pub struct SingleAgentResearcher;

impl SingleAgentResearcher {
    pub async fn run<M: LanguageModel>(
        &self,
        context: &GeneratorContext<M>,
        progress: &ProgressSink,
        query: &str,
    ) -> Result<ResearchOutcome, ResearchError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("research", %run_id, mode = "single_agent");

        async {
            progress.emit(ProgressEvent::Started {
                query: query.to_string(),
            });
            let result = self.research(context, progress, run_id, query).await;
            if let Err((stage, error)) = &result {
                tracing::warn!(stage = %stage, error = %error, "research run failed");
                progress.emit(ProgressEvent::Failed {
                    stage: *stage,
                    error: error.to_string(),
                });
            }
            result.map_err(|(_, error)| error)
        }
        .instrument(span)
        .await
    }

    async fn research<M: LanguageModel>(
        &self,
        context: &GeneratorContext<M>,
        progress: &ProgressSink,
        run_id: Uuid,
        query: &str,
    ) -> Result<ResearchOutcome, (ResearchStage, ResearchError)> {
        let config = &context.config;
        let web_search = AgentToolWebSearch::new(
            Arc::clone(&context.search),
            progress.clone(),
            config.search.discovery_results,
        );

        let system_prompt = format!(
            "{}\n\nToday's date is {}.\n\n{}",
            INSTRUCTIONS,
            chrono::Local::now().format("%Y-%m-%d"),
            config.target_language.prompt_instruction()
        );
        let notes = context
            .llm_client
            .prompt_with_tools(
                &system_prompt,
                query.trim(),
                web_search.clone(),
                config.research.max_iterations,
            )
            .await
            .map_err(|e| {
                let stage = ResearchStage::DeepDiving;
                (stage, ResearchError::stage_failed(stage, e))
            })?;
        tracing::info!(searches = web_search.call_count(), "agent finished researching");

        progress.emit(ProgressEvent::StageEntered(ResearchStage::Synthesizing));
        let sources = web_search.collected_results().await;
        let report = match config.research.report_format {
            ReportFormat::Markdown => FinalReport::Markdown(notes),
            ReportFormat::Structured => {
                let params = AgentExecuteParams {
                    prompt_sys: format!(
                        "{}\n\n{}",
                        STRUCTURING_PROMPT,
                        config.target_language.prompt_instruction()
                    ),
                    prompt_user: structuring_input(&notes, &sources),
                    log_tag: AgentType::SingleAgentResearcher.to_string(),
                };
                let report: DeepResearchReport = extract(context, params).await.map_err(|e| {
                    let stage = ResearchStage::Synthesizing;
                    (stage, ResearchError::stage_failed(stage, e))
                })?;
                FinalReport::Structured(report)
            }
        };

        let grounding = report
            .as_structured()
            .map(|report| {
                report
                    .sections
                    .iter()
                    .map(|section| audit_section(section, &sources))
                    .collect()
            })
            .unwrap_or_default();
        let angles = report
            .as_structured()
            .map(|report| report.sections.iter().map(|s| s.angle.clone()).collect())
            .unwrap_or_default();

        progress.emit(ProgressEvent::StageEntered(ResearchStage::Done));
        Ok(ResearchOutcome {
            run_id,
            classification: None,
            angles,
            report,
            grounding,
        })
    }
}

fn structuring_input(notes: &str, sources: &[SearchResult]) -> String {
    let mut input = format!("Research write-up:\n{}\n\nSources returned by web_search:\n", notes);
    for source in sources {
        input.push_str(&format!("- {} ({})\n", source.title, source.url));
    }
    input
}
