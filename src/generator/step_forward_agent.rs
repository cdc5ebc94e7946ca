use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::agent_executor::{AgentExecuteParams, extract};
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::AgentType;
use crate::llm::LanguageModel;

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

impl PromptTemplate {
    /// 按 开头指令 / 调研材料 / 结尾指令 的顺序拼装用户提示词，空段落跳过
    pub fn build_user_prompt(&self, material: &str) -> String {
        [
            self.opening_instruction.as_str(),
            material,
            self.closing_instruction.as_str(),
        ]
        .iter()
        .map(|part| part.trim_end())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

/// 极简Agent trait：一次结构化模型调用完成一步调研
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// 调研材料
    type Input: Send + Sync;

    /// Agent的输出类型 - 必须支持JSON序列化
    type Output: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;

    /// Agent类型标识
    fn agent_type(&self) -> AgentType;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 把输入整理成插入到用户提示词中的调研材料
    fn provide_custom_prompt_content(&self, input: &Self::Input) -> String;

    /// 可选的后处理钩子
    fn post_process(&self, output: Self::Output, _input: &Self::Input) -> Result<Self::Output> {
        Ok(output)
    }

    /// 默认实现的execute方法
    async fn execute<M: LanguageModel>(
        &self,
        context: &GeneratorContext<M>,
        input: &Self::Input,
    ) -> Result<Self::Output> {
        let template = self.prompt_template();

        // 根据配置的目标语言添加语言指令
        let language_instruction = context.config.target_language.prompt_instruction();
        let system_prompt = format!("{}\n\n{}", template.system_prompt, language_instruction);
        let user_prompt = template.build_user_prompt(&self.provide_custom_prompt_content(input));

        let params = AgentExecuteParams {
            prompt_sys: system_prompt,
            prompt_user: user_prompt,
            log_tag: self.agent_type().to_string(),
        };

        let output: Self::Output = extract(context, params).await?;
        let output = self.post_process(output, input)?;
        tracing::debug!(agent = %self.agent_type(), "sub-agent finished");
        Ok(output)
    }
}
