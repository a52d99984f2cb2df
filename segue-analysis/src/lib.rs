//! Audio analysis for Segue
//!
//! Provides tempo and key detection, spectral band statistics, energy
//! profiling and the transition scoring used by the Auto-DJ.

mod analyzer;
mod bands;
mod buffer;
mod camelot;
mod energy;
mod error;
mod features;
mod genre;
mod key;
mod suggest;
mod tempo;

pub use analyzer::{SpectralAnalyzer, TrackAnalyzer, DEFAULT_FFT_SIZE};
pub use bands::{BandAnalyzer, BandStats, SpectralSummary};
pub use buffer::AudioBuffer;
pub use camelot::{CamelotKey, MusicalKey};
pub use energy::{EnergyProfile, EnergyProfiler};
pub use error::AnalysisError;
pub use features::TrackAnalysis;
pub use genre::{classify_genre, GenreFeatures};
pub use key::{DetectedKey, KeyAnalyzer};
pub use suggest::{harmonically_compatible, score_transition, TransitionSuggestion, TransitionType};
pub use tempo::{TempoAnalyzer, TempoEstimate};
