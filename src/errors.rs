use thiserror::Error;

/// Failure classes for a single provider call. Only `RateLimited` is
/// retryable; everything else aborts the call immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    RateLimited,
    AuthFailed,
    Provider,
    Timeout,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate limited",
            Self::AuthFailed => "auth failed",
            Self::Provider => "provider error",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Error, Debug)]
#[error("{}: {message}", kind.as_str())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::RateLimited, message: message.into() }
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::AuthFailed, message: message.into() }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::Provider, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::Timeout, message: message.into() }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == TransportErrorKind::RateLimited
    }
}

/// The model response did not contain a parseable artifact.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no <svg>...</svg> span found in model response")]
    NoSvg,
    #[error("no parseable issue list in model response: {0}")]
    BadIssueList(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid svg: {0}")]
    InvalidSvg(String),
    #[error("pixmap allocation failed for {0}x{1}")]
    Allocation(u32, u32),
    #[error("png encoding failed: {0}")]
    Encode(String),
}

/// Anything a single pipeline stage can fail with.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("model returned empty content")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enhance,
    Describe,
    GenerateSvg,
    Render,
    Critique,
    Repair,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::Describe => "describe",
            Self::GenerateSvg => "generate_svg",
            Self::Render => "render",
            Self::Critique => "critique",
            Self::Repair => "repair",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("stage {stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn at(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }
}
