use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 调研角色类型，用于日志标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    QueryClassifier,
    ResearchPlanner,
    AngleWorker,
    ReportWriter,
    SingleAgentResearcher,
}

impl Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentType::QueryClassifier => "query_classifier",
            AgentType::ResearchPlanner => "research_planner",
            AgentType::AngleWorker => "angle_worker",
            AgentType::ReportWriter => "report_writer",
            AgentType::SingleAgentResearcher => "single_agent_researcher",
        };
        write!(f, "{}", str)
    }
}

/// 用户输入的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// 股票代码，如 NVDA
    Ticker,
    /// 自由文本调研问题
    General,
}

impl Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::Ticker => write!(f, "ticker"),
            InputType::General => write!(f, "general"),
        }
    }
}

/// 意图识别结果，每次调研只产生一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryClassification {
    /// Whether the input is a stock ticker or a general research query.
    pub input_type: InputType,
    /// Resolved company name if the input is a ticker, otherwise the cleaned query.
    pub resolved_name: String,
    /// Brief context for the subject, e.g. "semiconductors, GPUs, AI" for NVDA.
    pub context: String,
}

/// 一个独立的调研角度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchAngle {
    /// The research angle title, e.g. "SWOT Analysis" or "Recent Financial Performance".
    pub angle: String,
    /// Keywords to search for this angle.
    pub keywords: Vec<String>,
    /// Brief description of what to look for.
    pub description: String,
}

/// 研究计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchPlan {
    /// Three or four distinct, non-overlapping research angles.
    #[schemars(length(min = 3, max = 4))]
    pub angles: Vec<ResearchAngle>,
}

/// 带出处的单条发现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchFinding {
    /// The factual claim or number being cited.
    pub claim: String,
    /// Title of the source page the claim comes from.
    pub source_title: String,
    /// URL of the source; must be one of the URLs provided in the search content.
    pub source_url: String,
    /// Short supporting evidence quoted or paraphrased from the source.
    pub evidence: String,
}

/// 单个角度的深挖结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionFindings {
    /// The research angle this section covers, exactly as given.
    pub angle: String,
    /// Concise summary of what was found for this angle.
    pub summary: String,
    /// Individual findings, each citing a provided source.
    #[serde(default)]
    pub findings: Vec<ResearchFinding>,
}

/// 最终的结构化调研报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeepResearchReport {
    /// Report title.
    pub title: String,
    /// Brief executive summary (2-4 sentences) of the overall findings.
    pub executive_summary: String,
    /// One section per research angle.
    #[serde(default)]
    pub sections: Vec<SectionFindings>,
    /// Risks, uncertainties, conflicting information or data limitations.
    pub risks_and_uncertainties: String,
    /// Concrete items to monitor next, e.g. the next earnings date.
    #[serde(default)]
    pub watch_list: Vec<String>,
}

/// 结构化写作时向模型索取的部分，章节直接来自各深挖任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSynthesis {
    /// Report title.
    pub title: String,
    /// Brief executive summary (2-4 sentences) of the overall findings.
    pub executive_summary: String,
    /// Risks, uncertainties, conflicting information or data limitations across all angles.
    pub risks_and_uncertainties: String,
    /// Concrete items to monitor next, e.g. the next earnings date or a regulatory decision.
    #[serde(default)]
    pub watch_list: Vec<String>,
}

impl ReportSynthesis {
    /// 与各角度的章节组装成完整报告
    pub fn into_report(self, sections: Vec<SectionFindings>) -> DeepResearchReport {
        DeepResearchReport {
            title: self.title,
            executive_summary: self.executive_summary,
            sections,
            risks_and_uncertainties: self.risks_and_uncertainties,
            watch_list: self.watch_list,
        }
    }
}

/// 调研的最终产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "report", rename_all = "snake_case")]
pub enum FinalReport {
    Structured(DeepResearchReport),
    Markdown(String),
}

impl FinalReport {
    pub fn as_structured(&self) -> Option<&DeepResearchReport> {
        match self {
            FinalReport::Structured(report) => Some(report),
            FinalReport::Markdown(_) => None,
        }
    }
}
