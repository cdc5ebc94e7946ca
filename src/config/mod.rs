use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::i18n::TargetLanguage;

/// 未设置环境变量时使用的模型标识
pub const DEFAULT_MODEL: &str = "openai:gpt-5-mini";

/// 模型标识的环境变量，按优先级排列
pub const MODEL_ENV_VARS: [&str; 2] = ["MODEL_NAME", "OPENAI_MODEL"];

/// 通用API KEY环境变量，优先于各provider自己的环境变量
pub const API_KEY_ENV_VAR: &str = "DEEP_RESEARCH_API_KEY";

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "deep-research.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// provider专属的API KEY环境变量
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LLMProvider::OpenAI => Some("OPENAI_API_KEY"),
            LLMProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LLMProvider::DeepSeek => Some("DEEPSEEK_API_KEY"),
            LLMProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LLMProvider::Ollama => None,
        }
    }

    /// 未显式配置api_base_url时使用的地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Anthropic => "https://api.anthropic.com",
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LLMProvider::Ollama => "http://localhost:11434",
        }
    }
}

/// `provider:model` 形式的模型标识，例如 `openai:gpt-5-mini`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: LLMProvider,
    pub model: String,
}

impl std::str::FromStr for ModelSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Model identifier is empty".to_string());
        }

        // 前缀不是已知provider时（如 `llama3:8b`），整串视为模型名
        if let Some((prefix, model)) = s.split_once(':')
            && let Ok(provider) = prefix.parse::<LLMProvider>()
        {
            if model.trim().is_empty() {
                return Err(format!("Model identifier '{}' has no model name", s));
            }
            return Ok(ModelSpec {
                provider,
                model: model.trim().to_string(),
            });
        }

        Ok(ModelSpec {
            provider: LLMProvider::default(),
            model: s.to_string(),
        })
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// 搜索服务类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchProviderKind {
    #[serde(rename = "duckduckgo")]
    #[default]
    DuckDuckGo,
    #[serde(rename = "brave")]
    Brave,
    #[serde(rename = "tavily")]
    Tavily,
}

impl std::fmt::Display for SearchProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchProviderKind::DuckDuckGo => write!(f, "duckduckgo"),
            SearchProviderKind::Brave => write!(f, "brave"),
            SearchProviderKind::Tavily => write!(f, "tavily"),
        }
    }
}

impl std::str::FromStr for SearchProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(SearchProviderKind::DuckDuckGo),
            "brave" | "brave_search" => Ok(SearchProviderKind::Brave),
            "tavily" => Ok(SearchProviderKind::Tavily),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

impl SearchProviderKind {
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            SearchProviderKind::DuckDuckGo => None,
            SearchProviderKind::Brave => Some("BRAVE_API_KEY"),
            SearchProviderKind::Tavily => Some("TAVILY_API_KEY"),
        }
    }
}

/// 调研模式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    /// 分类 → 发现搜索 → 规划 → 并行深挖 → 综合
    #[default]
    Pipeline,
    /// 单个带web_search工具的Agent多轮自主调研
    SingleAgent,
}

/// 最终报告形式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Structured,
    Markdown,
}

/// 单个深挖任务失败时的处理策略
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkerFailurePolicy {
    /// 任一任务失败则整个调研失败
    #[default]
    Abort,
    /// 丢弃失败的角度，全部失败时才报错
    Skip,
}

/// 引用溯源校验策略
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CitationPolicy {
    /// 只记录未溯源的引用
    #[default]
    Advisory,
    /// 综合前移除未溯源的引用
    Strict,
}

macro_rules! impl_snake_case_enum {
    ($ty:ident, $($variant:ident => $name:literal),+ $(,)?) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $name),)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($ty), s)),
                }
            }
        }
    };
}

impl_snake_case_enum!(ResearchMode, Pipeline => "pipeline", SingleAgent => "single_agent");
impl_snake_case_enum!(ReportFormat, Structured => "structured", Markdown => "markdown");
impl_snake_case_enum!(WorkerFailurePolicy, Abort => "abort", Skip => "skip");
impl_snake_case_enum!(CitationPolicy, Advisory => "advisory", Strict => "strict");

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索配置
    pub search: SearchConfig,

    /// 调研流程配置
    pub research: ResearchConfig,

    /// 报告语言
    pub target_language: TargetLanguage,

    /// 报告输出路径（文件或目录），为空时只输出到终端
    pub output_path: Option<PathBuf>,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，为空时使用provider默认地址
    pub api_base_url: Option<String>,

    /// 所有调研角色共用的模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度，部分推理模型不支持自定义温度，默认不设置
    pub temperature: Option<f64>,

    /// 尝试次数，1表示失败即返回
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 同时进行的深挖任务上限
    pub max_parallels: usize,
}

/// 搜索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,

    /// Brave / Tavily 的API KEY，为空时读取对应环境变量
    pub api_key: Option<String>,

    /// 发现搜索的结果数
    pub discovery_results: usize,

    /// 每个调研角度的搜索结果数
    pub angle_results: usize,

    /// 搜索请求超时（秒）
    pub timeout_seconds: u64,
}

/// 调研流程配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResearchConfig {
    pub mode: ResearchMode,

    pub report_format: ReportFormat,

    /// 页面抓取超时（秒）
    pub fetch_timeout_seconds: u64,

    /// 单个页面提取文本的最大字符数
    pub max_page_chars: usize,

    /// 写入深挖prompt的单个来源最大字符数
    pub max_source_chars: usize,

    /// 研究计划的角度数量下限（低于时仅告警）
    pub min_angles: usize,

    /// 研究计划的角度数量上限（超出部分截断）
    pub max_angles: usize,

    pub worker_failure_policy: WorkerFailurePolicy,

    pub citation_policy: CitationPolicy,

    /// 单Agent模式下ReAct的最大轮数
    pub max_iterations: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&content).context("Failed to parse config file")?;
        config.llm.fill_api_key_from_env();
        Ok(config)
    }

    /// tracing的默认日志级别，`RUST_LOG` 优先
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

impl LLMConfig {
    /// 应用 `provider:model` 形式的模型标识
    pub fn apply_model_spec(&mut self, spec: &ModelSpec) {
        let provider_changed = self.provider != spec.provider;
        self.provider = spec.provider;
        self.model = spec.model.clone();
        if provider_changed {
            self.api_key.clear();
            self.fill_api_key_from_env();
        }
    }

    /// api_key为空时从环境变量补全
    pub fn fill_api_key_from_env(&mut self) {
        if !self.api_key.trim().is_empty() {
            return;
        }
        self.api_key = std::env::var(API_KEY_ENV_VAR)
            .ok()
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|name| std::env::var(name).ok())
            })
            .unwrap_or_default();
    }

    pub fn base_url(&self) -> &str {
        match self.api_base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => self.provider.default_base_url(),
        }
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            provider: self.provider,
            model: self.model.clone(),
        }
    }
}

/// 从环境变量读取模型标识，缺省为 [`DEFAULT_MODEL`]
pub fn model_spec_from_env() -> ModelSpec {
    model_spec_from(|name| std::env::var(name).ok())
}

/// 按 [`MODEL_ENV_VARS`] 的顺序取第一个可解析的模型标识，空值或无法解析的值被跳过
pub fn model_spec_from(lookup: impl Fn(&str) -> Option<String>) -> ModelSpec {
    MODEL_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find_map(|value| value.parse::<ModelSpec>().ok())
        .unwrap_or_else(default_model_spec)
}

fn default_model_spec() -> ModelSpec {
    DEFAULT_MODEL.parse().unwrap_or_else(|_| ModelSpec {
        provider: LLMProvider::default(),
        model: DEFAULT_MODEL.to_string(),
    })
}

impl Default for LLMConfig {
    fn default() -> Self {
        let spec = model_spec_from_env();
        let mut config = Self {
            provider: spec.provider,
            api_key: String::new(),
            api_base_url: None,
            model: spec.model,
            max_tokens: 8192,
            temperature: None,
            retry_attempts: 1,
            retry_delay_ms: 2000,
            max_parallels: 4,
        };
        config.fill_api_key_from_env();
        config
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::default(),
            api_key: None,
            discovery_results: 3,
            angle_results: 3,
            timeout_seconds: 15,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            mode: ResearchMode::default(),
            report_format: ReportFormat::default(),
            fetch_timeout_seconds: 10,
            max_page_chars: 5000,
            max_source_chars: 2000,
            min_angles: 3,
            max_angles: 4,
            worker_failure_policy: WorkerFailurePolicy::default(),
            citation_policy: CitationPolicy::default(),
            max_iterations: 12,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
