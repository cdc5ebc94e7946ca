//! 调研进度事件，通过无界channel推送给展示层

use std::fmt::Display;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::generator::research::state::ResearchStage;
use crate::generator::research::types::InputType;
use crate::utils::text::shorten_for_status;

/// 面向用户的进度事件，只用于展示，不参与流程控制
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        query: String,
    },
    StageEntered(ResearchStage),
    Classified {
        input_type: InputType,
        resolved_name: String,
    },
    DiscoveryCompleted {
        results: usize,
    },
    PlanReady {
        angles: Vec<String>,
    },
    DeepDiveStarted {
        angle: String,
    },
    DeepDiveFinished {
        angle: String,
        findings: usize,
    },
    AngleSkipped {
        angle: String,
        error: String,
    },
    /// 单Agent模式下的一次web_search工具调用，ordinal从1开始
    ToolSearch {
        ordinal: usize,
        query: String,
    },
    Failed {
        stage: ResearchStage,
        error: String,
    },
}

impl Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressEvent::Started { query } => write!(f, "🔎 Starting research for: {}", query),
            ProgressEvent::StageEntered(stage) => match stage {
                ResearchStage::Classifying => {
                    write!(f, "⏳ **Checking intent** and resolving query...")
                }
                ResearchStage::Discovering => {
                    write!(f, "⏳ **Initial discovery search:** identifying research angles")
                }
                ResearchStage::Planning => write!(f, "🤔 Generating research plan..."),
                ResearchStage::DeepDiving => write!(f, "🕵️ Deep diving into every angle..."),
                ResearchStage::Synthesizing => {
                    write!(f, "📝 Research completed. Synthesizing final report...")
                }
                ResearchStage::Done => write!(f, "✅ **Done**"),
                // 不会经由advance进入，失败走 ProgressEvent::Failed
                ResearchStage::Start | ResearchStage::Failed => write!(f, "{}", stage),
            },
            ProgressEvent::Classified {
                input_type,
                resolved_name,
            } => write!(f, "✅ Type: {}, Resolved: {}", input_type, resolved_name),
            ProgressEvent::DiscoveryCompleted { results } => {
                write!(f, "🌐 Discovery search returned {} results.", results)
            }
            ProgressEvent::PlanReady { angles } => {
                write!(f, "📋 Plan generated with {} research angles.", angles.len())
            }
            ProgressEvent::DeepDiveStarted { angle } => {
                write!(f, "🕵️ Starting deep dive for: {}", angle)
            }
            ProgressEvent::DeepDiveFinished { angle, findings } => {
                write!(f, "✓ Finished deep dive for: {} ({} findings)", angle, findings)
            }
            ProgressEvent::AngleSkipped { angle, error } => {
                write!(f, "⚠️ Skipping angle {}: {}", angle, error)
            }
            ProgressEvent::ToolSearch { ordinal, query } => {
                if *ordinal <= 1 {
                    write!(f, "⏳ **Initial discovery search:** identifying research angles")
                } else {
                    write!(
                        f,
                        "⏳ **Deep dive {}:** _{}_",
                        ordinal - 1,
                        shorten_for_status(query)
                    )
                }
            }
            ProgressEvent::Failed { stage, error } => {
                write!(f, "❌ Research failed while {}: {}", stage, error)
            }
        }
    }
}

/// 进度事件的发送端
///
/// 发送永不阻塞；接收端已关闭时事件被丢弃，调研照常进行。
#[derive(Debug, Clone, Default)]
pub struct ProgressSink(Option<UnboundedSender<ProgressEvent>>);

impl ProgressSink {
    /// 创建一对发送端与接收端
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self(Some(tx)), rx)
    }

    /// 不向任何地方发送的sink
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: ProgressEvent) {
        tracing::debug!(event = %event, "progress");
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_messages() {
        assert_eq!(
            ProgressEvent::Started {
                query: "NVDA".to_string()
            }
            .to_string(),
            "🔎 Starting research for: NVDA"
        );
        assert_eq!(
            ProgressEvent::Classified {
                input_type: InputType::Ticker,
                resolved_name: "NVIDIA Corporation".to_string()
            }
            .to_string(),
            "✅ Type: ticker, Resolved: NVIDIA Corporation"
        );
        assert_eq!(
            ProgressEvent::PlanReady {
                angles: vec!["a".into(), "b".into(), "c".into()]
            }
            .to_string(),
            "📋 Plan generated with 3 research angles."
        );
    }

    #[test]
    fn test_tool_search_messages() {
        let first = ProgressEvent::ToolSearch {
            ordinal: 1,
            query: "NVDA".to_string(),
        };
        assert_eq!(
            first.to_string(),
            "⏳ **Initial discovery search:** identifying research angles"
        );

        let long_query = "NVIDIA data center revenue growth and forward guidance for fiscal 2026";
        let third = ProgressEvent::ToolSearch {
            ordinal: 3,
            query: long_query.to_string(),
        };
        let text = third.to_string();
        assert!(text.starts_with("⏳ **Deep dive 2:** _"));
        assert!(text.ends_with("..._"));
    }

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.emit(ProgressEvent::Started {
            query: "q".to_string(),
        });
        sink.emit(ProgressEvent::StageEntered(ResearchStage::Classifying));
        drop(sink);

        assert!(matches!(rx.recv().await, Some(ProgressEvent::Started { .. })));
        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::StageEntered(ResearchStage::Classifying))
        );
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_sink_survives_closed_receiver() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.emit(ProgressEvent::DiscoveryCompleted { results: 3 });
        ProgressSink::disabled().emit(ProgressEvent::DiscoveryCompleted { results: 0 });
    }
}
