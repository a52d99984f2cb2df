//! Track library for Segue - decoding and persistent analyses

mod loader;
mod store;

pub use loader::{LoadError, LoadedTrack, TrackLoader, TrackMetadata, DEFAULT_SAMPLE_RATE};
pub use store::{file_fingerprint, AnalysisStore, StoreError, StoredAnalysis};
