use thiserror::Error;

/// Errors raised while analysing audio or scoring transitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No samples to analyze")]
    EmptyInput,
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("Analysis failed: {0}")]
    Failed(String),
}
