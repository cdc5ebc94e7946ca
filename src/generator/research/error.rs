use crate::generator::research::state::ResearchStage;

/// 调研失败的原因，调用方据此决定如何展示
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("{stage} failed: {error:#}")]
    StageFailed {
        stage: ResearchStage,
        error: anyhow::Error,
    },

    #[error("deep dive for '{angle}' failed: {error:#}")]
    WorkerFailed { angle: String, error: anyhow::Error },

    #[error("deep dive for '{angle}' was aborted before it finished")]
    WorkerAborted { angle: String },

    #[error("the research plan contains no usable angles")]
    NoAngles,

    #[error("illegal stage transition from {from} to {to}")]
    IllegalTransition {
        from: ResearchStage,
        to: ResearchStage,
    },
}

impl ResearchError {
    pub fn stage_failed(stage: ResearchStage, error: impl Into<anyhow::Error>) -> Self {
        ResearchError::StageFailed {
            stage,
            error: error.into(),
        }
    }
}
