//! LLM服务 - 调研流程只依赖 [`LanguageModel`]，具体实现为基于rig的 [`LLMClient`]

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod tools;

pub use client::LLMClient;

use tools::web_search::AgentToolWebSearch;

/// 调研流程对大模型的全部要求
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 按 `T` 的JSON Schema约束输出并解析
    async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;

    /// 单轮自由文本
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// 挂载web_search工具的多轮对话，最多 `max_iterations` 轮工具调用
    async fn prompt_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        web_search: AgentToolWebSearch,
        max_iterations: usize,
    ) -> Result<String>;
}
