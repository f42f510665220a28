use thiserror::Error;

/// Failure taxonomy for one extraction request.
///
/// Input errors are rejected before any work is dispatched. Collaborator
/// failures (download, frame extraction) abort the whole request with no
/// partial transcript. Per-frame OCR failures never surface here; they
/// degrade to empty-text results inside the worker pool.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid source locator: {0}")]
    InvalidSource(String),

    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("failed to prepare working directory")]
    Workdir(#[source] anyhow::Error),

    #[error("failed to download source video")]
    Download(#[source] anyhow::Error),

    #[error("frame extraction failed")]
    FrameExtraction(#[source] anyhow::Error),
}

impl PipelineError {
    /// True for errors caused by the request itself rather than by the
    /// pipeline or its collaborators. The CLI maps these to exit code 2,
    /// everything else to 1.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidSource(_) | Self::InvalidLanguage(_))
    }
}
