use crate::config::{
    CitationPolicy, Config, DEFAULT_CONFIG_FILE, LLMProvider, ModelSpec, ReportFormat,
    ResearchMode, SearchProviderKind, WorkerFailurePolicy,
};
use crate::i18n::TargetLanguage;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Deep Research - 由Rust与AI驱动的深度调研助手
#[derive(Parser, Debug)]
#[command(name = "deep-research-rs")]
#[command(
    about = "AI research agent: plans research angles for a ticker or question, investigates them in parallel with web search, and writes a cited report."
)]
#[command(version)]
pub struct Args {
    /// 调研问题或股票代码，为空时进入交互式对话
    pub query: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出路径（.md/.json文件或目录）
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 模型标识，`provider:model` 形式，如 openai:gpt-5-mini
    #[arg(short, long)]
    pub model: Option<String>,

    /// LLM Provider (openai, anthropic, deepseek, openrouter, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 同时进行的深挖调用上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 搜索服务 (duckduckgo, brave, tavily)
    #[arg(long)]
    pub search_provider: Option<String>,

    /// 搜索服务 API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 调研模式 (pipeline, single_agent)
    #[arg(long)]
    pub mode: Option<String>,

    /// 报告格式 (structured, markdown)
    #[arg(long)]
    pub report_format: Option<String>,

    /// 深挖任务失败策略 (abort, skip)
    #[arg(long)]
    pub worker_failure_policy: Option<String>,

    /// 引用校验策略 (advisory, strict)
    #[arg(long)]
    pub citation_policy: Option<String>,

    /// 目标语言 (en, zh, ja, de, fr, es)
    #[arg(long)]
    pub target_language: Option<String>,
}

/// 解析失败时警告并忽略该参数
fn parse_or_warn<T>(value: Option<&str>, what: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = value?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            // 日志尚未初始化，直接写stderr
            eprintln!("⚠️ Unknown {} '{}' ignored: {}", what, value, err);
            None
        }
    }
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            Config::from_file(config_path)?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        // 覆盖LLM配置
        if let Some(spec) = parse_or_warn::<ModelSpec>(self.model.as_deref(), "model") {
            config.llm.apply_model_spec(&spec);
        }
        if let Some(provider) = parse_or_warn::<LLMProvider>(self.llm_provider.as_deref(), "provider")
        {
            let spec = ModelSpec {
                provider,
                model: config.llm.model.clone(),
            };
            config.llm.apply_model_spec(&spec);
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = Some(llm_api_base_url);
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if self.temperature.is_some() {
            config.llm.temperature = self.temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 搜索配置
        if let Some(provider) =
            parse_or_warn::<SearchProviderKind>(self.search_provider.as_deref(), "search provider")
        {
            config.search.provider = provider;
        }
        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = Some(search_api_key);
        }

        // 调研流程配置
        if let Some(mode) = parse_or_warn::<ResearchMode>(self.mode.as_deref(), "mode") {
            config.research.mode = mode;
        }
        if let Some(format) =
            parse_or_warn::<ReportFormat>(self.report_format.as_deref(), "report format")
        {
            config.research.report_format = format;
        }
        if let Some(policy) = parse_or_warn::<WorkerFailurePolicy>(
            self.worker_failure_policy.as_deref(),
            "worker failure policy",
        ) {
            config.research.worker_failure_policy = policy;
        }
        if let Some(policy) =
            parse_or_warn::<CitationPolicy>(self.citation_policy.as_deref(), "citation policy")
        {
            config.research.citation_policy = policy;
        }

        // 目标语言配置
        if let Some(target_language) =
            parse_or_warn::<TargetLanguage>(self.target_language.as_deref(), "target language")
        {
            config.target_language = target_language;
        }

        if self.output_path.is_some() {
            config.output_path = self.output_path;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}
