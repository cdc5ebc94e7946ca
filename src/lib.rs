pub mod cli;
pub mod config;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::context::GeneratorContext;
pub use generator::research::{ProgressEvent, ProgressSink, ResearchError, ResearchOutcome};
pub use generator::workflow::launch;
