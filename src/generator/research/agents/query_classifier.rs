use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::generator::research::types::{AgentType, InputType, QueryClassification};
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};

/// 1-5个大写字母，可带 `$` 前缀、`.B` 类后缀或 "stock"/"shares"
static TICKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?[A-Z]{1,5}(\.[A-Z])?(\s+(?i:stock|shares))?$")
        .expect("ticker pattern is a valid regex")
});

pub fn looks_like_ticker(input: &str) -> bool {
    TICKER_PATTERN.is_match(input.trim())
}

/// 意图识别 - 判断输入是股票代码还是一般调研问题，并解析出调研对象
#[derive(Default)]
pub struct QueryClassifier;

impl StepForwardAgent for QueryClassifier {
    type Input = String;
    type Output = QueryClassification;

    fn agent_type(&self) -> AgentType {
        AgentType::QueryClassifier
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are an intent detection expert.
Classify the user input as a 'ticker' or 'general' query.
- A ticker is a stock symbol such as NVDA or "TSLA stock". Resolve it to the full company name and give brief context (industry, main products).
- Anything else is a general research query. Use the cleaned query itself as the resolved name and summarise its domain as the context."#
                .to_string(),
            opening_instruction: String::new(),
            closing_instruction: String::new(),
        }
    }

    fn provide_custom_prompt_content(&self, input: &String) -> String {
        let query = input.trim();
        if looks_like_ticker(query) {
            format!("{}\n\n(Hint: this input matches the shape of a stock ticker.)", query)
        } else {
            query.to_string()
        }
    }

    fn post_process(&self, mut output: QueryClassification, input: &String) -> Result<QueryClassification> {
        if output.resolved_name.trim().is_empty() {
            output.resolved_name = input.trim().to_string();
        }
        if output.input_type == InputType::General && looks_like_ticker(input) {
            tracing::debug!(input = %input.trim(), "ticker-shaped input classified as general");
        }
        Ok(output)
    }
}
