use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{CitationPolicy, WorkerFailurePolicy};
use crate::generator::context::GeneratorContext;
use crate::generator::research::ResearchOutcome;
use crate::generator::research::agents::angle_worker::{AngleOutcome, AngleWorker};
use crate::generator::research::agents::query_classifier::QueryClassifier;
use crate::generator::research::agents::report_writer::{ReportWriter, WriterInput};
use crate::generator::research::agents::research_planner::{PlannerInput, ResearchPlanner};
use crate::generator::research::error::ResearchError;
use crate::generator::research::grounding::{audit_section, retain_grounded};
use crate::generator::research::progress::{ProgressEvent, ProgressSink};
use crate::generator::research::state::{ResearchStage, RunState};
use crate::generator::research::types::{QueryClassification, ResearchPlan};
use crate::generator::step_forward_agent::StepForwardAgent;
use crate::llm::{LLMClient, LanguageModel};

/// 多智能体调研编排器
///
/// 分类 → 发现搜索 → 规划 → 并行深挖 → 综合，阶段严格前进，任何阶段失败即整体失败。
pub struct ResearchOrchestrator<M = LLMClient> {
    context: GeneratorContext<M>,
    progress: ProgressSink,
}

impl<M: LanguageModel + 'static> ResearchOrchestrator<M> {
    pub fn new(context: GeneratorContext<M>, progress: ProgressSink) -> Self {
        Self { context, progress }
    }

    /// 执行一次完整调研
    pub async fn run(&self, query: &str) -> Result<ResearchOutcome, ResearchError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("research", %run_id);

        async {
            self.progress.emit(ProgressEvent::Started {
                query: query.to_string(),
            });
            let mut state = RunState::new(self.progress.clone());

            match self.run_stages(&mut state, run_id, query).await {
                Ok(outcome) => {
                    tracing::info!("research finished\n{}", state.timing_report());
                    Ok(outcome)
                }
                Err(err) => {
                    state.fail(&err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        state: &mut RunState,
        run_id: Uuid,
        query: &str,
    ) -> Result<ResearchOutcome, ResearchError> {
        let config = &self.context.config;

        // 1. 意图识别
        state.advance(ResearchStage::Classifying)?;
        let classification = QueryClassifier
            .execute(&self.context, &query.to_string())
            .await
            .map_err(|e| ResearchError::stage_failed(ResearchStage::Classifying, e))?;
        tracing::info!(
            input_type = %classification.input_type,
            resolved_name = %classification.resolved_name,
            "query classified"
        );
        self.progress.emit(ProgressEvent::Classified {
            input_type: classification.input_type,
            resolved_name: classification.resolved_name.clone(),
        });

        // 2. 发现搜索
        state.advance(ResearchStage::Discovering)?;
        let discovery_query = format!("{} {}", classification.resolved_name, classification.context);
        let discovery = self
            .context
            .search
            .search(&discovery_query, config.search.discovery_results)
            .await
            .map_err(|e| ResearchError::stage_failed(ResearchStage::Discovering, e))?;
        for result in &discovery {
            tracing::debug!(title = %result.title, url = %result.url, "discovery result");
        }
        self.progress.emit(ProgressEvent::DiscoveryCompleted {
            results: discovery.len(),
        });

        // 3. 规划调研角度
        state.advance(ResearchStage::Planning)?;
        let plan = ResearchPlanner::new(&config.research)
            .execute(
                &self.context,
                &PlannerInput {
                    classification: classification.clone(),
                    discovery,
                },
            )
            .await
            .map_err(|e| ResearchError::stage_failed(ResearchStage::Planning, e))?;
        if plan.angles.is_empty() {
            return Err(ResearchError::NoAngles);
        }
        let angles: Vec<String> = plan.angles.iter().map(|a| a.angle.clone()).collect();
        tracing::info!(angles = ?angles, "research plan ready");
        self.progress.emit(ProgressEvent::PlanReady {
            angles: angles.clone(),
        });

        // 4. 并行深挖
        state.advance(ResearchStage::DeepDiving)?;
        let outcomes = self.deep_dive(&classification, &plan).await?;

        let mut grounding = Vec::with_capacity(outcomes.len());
        let mut sections = Vec::with_capacity(outcomes.len());
        for AngleOutcome {
            mut section,
            sources,
        } in outcomes
        {
            let report = audit_section(&section, &sources);
            if !report.is_clean() {
                tracing::warn!(
                    angle = %report.angle,
                    ungrounded = report.ungrounded.len(),
                    "findings cite URLs that were not among the search results"
                );
                if config.research.citation_policy == CitationPolicy::Strict {
                    retain_grounded(&mut section, &sources);
                }
            }
            grounding.push(report);
            sections.push(section);
        }

        // 5. 综合
        state.advance(ResearchStage::Synthesizing)?;
        let report = ReportWriter
            .write(
                &self.context,
                &WriterInput {
                    classification: classification.clone(),
                    sections,
                },
            )
            .await
            .map_err(|e| ResearchError::stage_failed(ResearchStage::Synthesizing, e))?;

        state.advance(ResearchStage::Done)?;
        Ok(ResearchOutcome {
            run_id,
            classification: Some(classification),
            angles,
            report,
            grounding,
        })
    }

    /// 每个角度一个tokio任务，全部完成后按计划顺序返回
    async fn deep_dive(
        &self,
        classification: &QueryClassification,
        plan: &ResearchPlan,
    ) -> Result<Vec<AngleOutcome>, ResearchError> {
        let worker = Arc::new(AngleWorker::new(&self.context.config.research));
        let mut tasks = JoinSet::new();

        for (index, angle) in plan.angles.iter().enumerate() {
            self.progress.emit(ProgressEvent::DeepDiveStarted {
                angle: angle.angle.clone(),
            });

            let context = self.context.clone();
            let worker = Arc::clone(&worker);
            let classification = classification.clone();
            let angle = angle.clone();
            let progress = self.progress.clone();
            tasks.spawn(
                async move {
                    let result = worker.investigate(&context, &classification, &angle).await;
                    if let Ok(outcome) = &result {
                        progress.emit(ProgressEvent::DeepDiveFinished {
                            angle: angle.angle.clone(),
                            findings: outcome.section.findings.len(),
                        });
                    }
                    (index, result)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<anyhow::Result<AngleOutcome>>> =
            plan.angles.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "deep dive task did not complete"),
            }
        }

        let policy = self.context.config.research.worker_failure_policy;
        let mut outcomes = Vec::with_capacity(slots.len());
        let mut first_error = None;
        for (angle, slot) in plan.angles.iter().zip(slots) {
            let error = match slot {
                Some(Ok(outcome)) => {
                    outcomes.push(outcome);
                    continue;
                }
                Some(Err(error)) => ResearchError::WorkerFailed {
                    angle: angle.angle.clone(),
                    error,
                },
                None => ResearchError::WorkerAborted {
                    angle: angle.angle.clone(),
                },
            };

            match policy {
                WorkerFailurePolicy::Abort => return Err(error),
                WorkerFailurePolicy::Skip => {
                    tracing::warn!(angle = %angle.angle, error = %error, "skipping failed angle");
                    self.progress.emit(ProgressEvent::AngleSkipped {
                        angle: angle.angle.clone(),
                        error: error.to_string(),
                    });
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) if outcomes.is_empty() => Err(error),
            _ => Ok(outcomes),
        }
    }
}
