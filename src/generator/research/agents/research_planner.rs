use std::collections::HashSet;

use anyhow::Result;

use crate::config::ResearchConfig;
use crate::generator::research::types::{AgentType, QueryClassification, ResearchPlan};
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::search::{SearchResult, format_discovery_context};

pub struct PlannerInput {
    pub classification: QueryClassification,
    pub discovery: Vec<SearchResult>,
}

/// 研究规划师 - 根据发现搜索的结果拆分出互不重叠的调研角度
pub struct ResearchPlanner {
    min_angles: usize,
    max_angles: usize,
}

impl ResearchPlanner {
    pub fn new(config: &ResearchConfig) -> Self {
        Self {
            min_angles: config.min_angles,
            max_angles: config.max_angles.max(1),
        }
    }
}

impl Default for ResearchPlanner {
    fn default() -> Self {
        Self::new(&ResearchConfig::default())
    }
}

impl StepForwardAgent for ResearchPlanner {
    type Input = PlannerInput;
    type Output = ResearchPlan;

    fn agent_type(&self) -> AgentType {
        AgentType::ResearchPlanner
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a research strategist.
Based on the initial discovery search results, generate 3-4 distinct research angles.
Angles should be relevant and non-overlapping and cover key aspects:
- for stocks: SWOT analysis, recent financial performance, competition and market positioning, latest quarterly results and forward guidance;
- for general topics: key trends, history, pros and cons, outlook.
For every angle give a short title, a few search keywords and a one-sentence description of what to look for."#
                .to_string(),
            opening_instruction: String::new(),
            closing_instruction: String::new(),
        }
    }

    fn provide_custom_prompt_content(&self, input: &PlannerInput) -> String {
        format!(
            "Topic: {}\nContext: {}",
            input.classification.resolved_name,
            format_discovery_context(&input.discovery)
        )
    }

    fn post_process(&self, output: ResearchPlan, _input: &PlannerInput) -> Result<ResearchPlan> {
        Ok(normalize_plan(output, self.min_angles, self.max_angles))
    }
}

/// 去掉空标题与重复标题（忽略大小写），超出上限的角度被截断
///
/// 角度不足下限时只告警；结果为空由调用方处理。
pub fn normalize_plan(plan: ResearchPlan, min_angles: usize, max_angles: usize) -> ResearchPlan {
    let mut seen = HashSet::new();
    let mut angles: Vec<_> = plan
        .angles
        .into_iter()
        .filter(|angle| {
            let key = angle.angle.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect();

    if angles.len() > max_angles {
        tracing::warn!(
            planned = angles.len(),
            kept = max_angles,
            "research plan has too many angles, truncating"
        );
        angles.truncate(max_angles);
    }
    if !angles.is_empty() && angles.len() < min_angles {
        tracing::warn!(
            planned = angles.len(),
            expected = min_angles,
            "research plan has fewer angles than expected, continuing"
        );
    }

    ResearchPlan { angles }
}
