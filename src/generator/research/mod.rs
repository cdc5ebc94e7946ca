// 深度调研流程
// A：QueryClassifier 判断输入是股票代码还是一般问题，解析出调研对象与背景
// B：发现搜索 "{调研对象} {背景}"，为规划提供素材
// C：ResearchPlanner 基于 A + B 拆分出3-4个互不重叠的调研角度
// D：AngleWorker 每个角度一个并行任务：搜索 → 抓取页面 → 带引用的发现
// E：ReportWriter 汇总所有 D 的结果写出最终报告

use serde::Serialize;
use uuid::Uuid;

use crate::config::ResearchMode;
use crate::generator::context::GeneratorContext;
use crate::llm::LanguageModel;

pub mod agents;
pub mod error;
pub mod grounding;
pub mod orchestrator;
pub mod progress;
pub mod single_agent;
pub mod state;
pub mod types;

pub use error::ResearchError;
pub use orchestrator::ResearchOrchestrator;
pub use progress::{ProgressEvent, ProgressSink};
pub use single_agent::SingleAgentResearcher;

use grounding::GroundingReport;
use types::{FinalReport, QueryClassification};

/// 一次调研的全部产出
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub run_id: Uuid,
    /// 单Agent模式下没有独立的分类阶段
    pub classification: Option<QueryClassification>,
    pub angles: Vec<String>,
    pub report: FinalReport,
    pub grounding: Vec<GroundingReport>,
}

impl ResearchOutcome {
    /// 未溯源引用的总数
    pub fn ungrounded_count(&self) -> usize {
        self.grounding.iter().map(|g| g.ungrounded.len()).sum()
    }
}

/// 按配置的模式执行调研
pub async fn execute<M: LanguageModel + 'static>(
    context: &GeneratorContext<M>,
    progress: ProgressSink,
    query: &str,
) -> Result<ResearchOutcome, ResearchError> {
    match context.config.research.mode {
        ResearchMode::Pipeline => {
            ResearchOrchestrator::new(context.clone(), progress)
                .run(query)
                .await
        }
        ResearchMode::SingleAgent => SingleAgentResearcher.run(context, &progress, query).await,
    }
}
