//! 调研流程的状态机：只能按固定顺序前进，终态为 done 或 failed

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::generator::research::error::ResearchError;
use crate::generator::research::progress::{ProgressEvent, ProgressSink};
use crate::generator::workflow::TimingScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStage {
    Start,
    Classifying,
    Discovering,
    Planning,
    DeepDiving,
    Synthesizing,
    Done,
    Failed,
}

impl Display for ResearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ResearchStage::Start => "start",
            ResearchStage::Classifying => "classifying",
            ResearchStage::Discovering => "discovering",
            ResearchStage::Planning => "planning",
            ResearchStage::DeepDiving => "deep_diving",
            ResearchStage::Synthesizing => "synthesizing",
            ResearchStage::Done => "done",
            ResearchStage::Failed => "failed",
        };
        write!(f, "{}", str)
    }
}

impl ResearchStage {
    /// 成功路径上的下一个阶段
    pub fn next(self) -> Option<ResearchStage> {
        match self {
            ResearchStage::Start => Some(ResearchStage::Classifying),
            ResearchStage::Classifying => Some(ResearchStage::Discovering),
            ResearchStage::Discovering => Some(ResearchStage::Planning),
            ResearchStage::Planning => Some(ResearchStage::DeepDiving),
            ResearchStage::DeepDiving => Some(ResearchStage::Synthesizing),
            ResearchStage::Synthesizing => Some(ResearchStage::Done),
            ResearchStage::Done | ResearchStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ResearchStage::Done | ResearchStage::Failed)
    }
}

/// 单次调研的运行状态，负责阶段推进、进度通知与阶段计时
pub struct RunState {
    stage: ResearchStage,
    progress: ProgressSink,
    timing: TimingScope,
}

impl RunState {
    pub fn new(progress: ProgressSink) -> Self {
        Self {
            stage: ResearchStage::Start,
            progress,
            timing: TimingScope::new(),
        }
    }

    pub fn stage(&self) -> ResearchStage {
        self.stage
    }

    /// 前进到下一个阶段，跳跃或回退都视为错误
    pub fn advance(&mut self, to: ResearchStage) -> Result<(), ResearchError> {
        if self.stage.next() != Some(to) {
            return Err(ResearchError::IllegalTransition {
                from: self.stage,
                to,
            });
        }

        self.timing.end_phase(&self.stage.to_string());
        if !to.is_terminal() {
            self.timing.start_phase(&to.to_string());
        }
        tracing::debug!(from = %self.stage, to = %to, "stage transition");
        self.stage = to;
        self.progress.emit(ProgressEvent::StageEntered(to));
        Ok(())
    }

    /// 进入failed终态并发出失败事件，已处于终态时不做任何事
    pub fn fail(&mut self, error: &ResearchError) {
        if self.stage.is_terminal() {
            return;
        }
        let stage = self.stage;
        self.timing.end_phase(&stage.to_string());
        self.stage = ResearchStage::Failed;
        tracing::warn!(stage = %stage, error = %error, "research run failed");
        self.progress.emit(ProgressEvent::Failed {
            stage,
            error: error.to_string(),
        });
    }

    pub fn timing_report(&self) -> String {
        self.timing.generate_timing_report()
    }
}
