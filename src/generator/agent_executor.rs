use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::context::GeneratorContext;
use crate::llm::LanguageModel;

pub struct AgentExecuteParams {
    pub prompt_sys: String,
    pub prompt_user: String,
    pub log_tag: String,
}

pub async fn extract<T, M>(context: &GeneratorContext<M>, params: AgentExecuteParams) -> Result<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    M: LanguageModel,
{
    tracing::debug!(
        tag = %params.log_tag,
        prompt_chars = params.prompt_user.chars().count(),
        "extract"
    );
    context
        .llm_client
        .extract::<T>(&params.prompt_sys, &params.prompt_user)
        .await
        .with_context(|| format!("[{}] structured model call failed", params.log_tag))
}

pub async fn prompt<M>(context: &GeneratorContext<M>, params: AgentExecuteParams) -> Result<String>
where
    M: LanguageModel,
{
    tracing::debug!(
        tag = %params.log_tag,
        prompt_chars = params.prompt_user.chars().count(),
        "prompt"
    );
    context
        .llm_client
        .prompt(&params.prompt_sys, &params.prompt_user)
        .await
        .with_context(|| format!("[{}] model call failed", params.log_tag))
}
