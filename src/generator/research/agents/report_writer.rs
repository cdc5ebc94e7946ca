use anyhow::Result;

use crate::config::ReportFormat;
use crate::generator::agent_executor::{AgentExecuteParams, prompt};
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::{
    AgentType, FinalReport, QueryClassification, ReportSynthesis, SectionFindings,
};
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::llm::LanguageModel;

pub struct WriterInput {
    pub classification: QueryClassification,
    pub sections: Vec<SectionFindings>,
}

const MARKDOWN_SYSTEM_PROMPT: &str = r#"You are a professional report writer.
Synthesize all section findings into a final cohesive markdown report.
Include an Executive Summary, the main Sections, Risks, and What to Watch.
Ensure clear sections, evidence bullets with citations, risks/uncertainties, and a watch list.
For the sources, use the format: [Source Title](Source URL)"#;

/// 报告撰写 - 把各角度的发现综合成最终报告
#[derive(Default)]
pub struct ReportWriter;

impl ReportWriter {
    pub async fn write<M: LanguageModel>(
        &self,
        context: &GeneratorContext<M>,
        input: &WriterInput,
    ) -> Result<FinalReport> {
        match context.config.research.report_format {
            ReportFormat::Structured => {
                let synthesis = self.execute(context, input).await?;
                Ok(FinalReport::Structured(
                    synthesis.into_report(input.sections.clone()),
                ))
            }
            ReportFormat::Markdown => {
                let params = AgentExecuteParams {
                    prompt_sys: format!(
                        "{}\n\n{}",
                        MARKDOWN_SYSTEM_PROMPT,
                        context.config.target_language.prompt_instruction()
                    ),
                    prompt_user: self.provide_custom_prompt_content(input),
                    log_tag: self.agent_type().to_string(),
                };
                Ok(FinalReport::Markdown(prompt(context, params).await?))
            }
        }
    }
}

/// 综合阶段的输入文档，不做截断
pub fn build_synthesis_input(resolved_name: &str, sections: &[SectionFindings]) -> String {
    let mut document = format!("Topic: {}\n\n", resolved_name);
    for section in sections {
        document.push_str(&format!("## Angle: {}\n{}\n", section.angle, section.summary));
        for finding in &section.findings {
            document.push_str(&format!(
                "- {} (Source: {}, URL: {})\n",
                finding.claim, finding.source_title, finding.source_url
            ));
        }
        document.push('\n');
    }
    document
}

impl StepForwardAgent for ReportWriter {
    type Input = WriterInput;
    type Output = ReportSynthesis;

    fn agent_type(&self) -> AgentType {
        AgentType::ReportWriter
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a professional report writer.
You receive the findings of several research angles on one topic, each with cited sources.
Write the overall report frame:
- a short, specific title;
- an executive summary of 2-4 sentences covering the main findings across all angles;
- risks and uncertainties: conflicting information, caveats, data limitations;
- a watch list of concrete items to monitor next (e.g. the next earnings date, a regulatory decision).
Only rely on the findings provided. Do not invent sources, numbers or URLs."#
                .to_string(),
            opening_instruction: String::new(),
            closing_instruction: String::new(),
        }
    }

    fn provide_custom_prompt_content(&self, input: &WriterInput) -> String {
        build_synthesis_input(&input.classification.resolved_name, &input.sections)
    }
}
