use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::research::ResearchOutcome;
use crate::utils::text::slugify;

pub mod markdown;

pub use markdown::{grounding_notes, render_final_report, report_to_markdown};

/// 聊天模式下的一轮问答
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

#[allow(async_fn_in_trait)]
pub trait Outlet {
    async fn save(&self, query: &str, outcome: &ResearchOutcome) -> Result<PathBuf>;
}

/// 报告落盘
///
/// `output_path` 以 `.md` 或 `.json` 结尾时直接写入该文件，否则视为目录，
/// 文件名为 `{查询slug}-{时间戳}.md`。
pub struct DiskOutlet {
    output_path: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    fn is_file_target(&self) -> bool {
        matches!(
            self.output_path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("markdown") | Some("json")
        )
    }

    fn resolve_target(&self, stem: &str) -> Result<PathBuf> {
        if self.is_file_target() {
            if let Some(parent) = self.output_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            return Ok(self.output_path.clone());
        }

        fs::create_dir_all(&self.output_path).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_path.display()
            )
        })?;
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        Ok(self
            .output_path
            .join(format!("{}-{}.md", slugify(stem), timestamp)))
    }

    /// 保存聊天记录
    pub fn save_transcript(&self, turns: &[ChatTurn]) -> Result<PathBuf> {
        let target = if self.is_file_target() {
            let stem = self
                .output_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("chat");
            self.output_path.with_file_name(format!("{}-transcript.md", stem))
        } else {
            self.resolve_target("chat")?
        };
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        write_file(&target, &render_transcript(turns))?;
        Ok(target)
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, query: &str, outcome: &ResearchOutcome) -> Result<PathBuf> {
        let target = self.resolve_target(query)?;

        let content = if target.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::to_string_pretty(outcome)?
        } else {
            let mut document = render_final_report(&outcome.report);
            if let Some(notes) = grounding_notes(&outcome.grounding) {
                document.push_str("\n\n");
                document.push_str(&notes);
            }
            document.push('\n');
            document
        };

        write_file(&target, &content)?;
        tracing::info!(path = %target.display(), "report saved");
        Ok(target)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn render_transcript(turns: &[ChatTurn]) -> String {
    let mut document = String::from("# Deep research chat\n");
    for turn in turns {
        document.push_str(&format!(
            "\n## User\n\n{}\n\n## Assistant\n\n{}\n",
            turn.user.trim(),
            turn.assistant.trim()
        ));
    }
    document
}

// Include tests
#[cfg(test)]
mod tests;
