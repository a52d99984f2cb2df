//! Auto-DJ engine for Segue
//!
//! Caches per-track analyses, picks transitions between tracks with at
//! most one suggestion in flight, and keeps a bounded transition history
//! with a variety score.

mod autodj;
mod cache;
mod config;
mod error;
mod history;
mod selector;
mod slot;

pub use autodj::AutoDj;
pub use cache::{CachedAnalysis, FeatureCache, GenreInfo, TrackStructure};
pub use config::{AutoDjConfig, AutoDjConfigUpdate};
pub use error::EngineError;
pub use history::{HistoryStats, TransitionHistory, TransitionRecord, HISTORY_CAPACITY, VARIETY_WINDOW};
pub use selector::TransitionSelector;
pub use slot::{ActivityCounter, ActivityGuard, InFlightSlot, SlotGuard};
