use segue_analysis::AnalysisError;
use thiserror::Error;

/// Errors raised by the Auto-DJ engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Analyzer initialization failed: {0}")]
    AnalyzerInit(AnalysisError),
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Track {0} has no audio")]
    NoAudio(String),
}
