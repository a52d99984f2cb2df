//! Transition selection with notch-filter post-processing
//!
//! Only one suggestion is computed at a time. A call that arrives while
//! another is running gets `None` straight away; nothing is queued.

use crate::cache::FeatureCache;
use crate::config::{AutoDjConfig, AutoDjConfigUpdate};
use crate::error::EngineError;
use crate::slot::InFlightSlot;
use parking_lot::{Mutex, RwLock};
use segue_analysis::{AudioBuffer, TrackAnalysis, TrackAnalyzer, TransitionSuggestion, TransitionType};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// Bass/mid ratio above which overlapping low ends start to clash
const BASS_CLASH_RATIO: f32 = 1.5;
const NOTCH_FX: &str = "Notch Filter";

pub struct TransitionSelector {
    analyzer: Arc<dyn TrackAnalyzer>,
    config: RwLock<AutoDjConfig>,
    slot: InFlightSlot,
    /// Tracks analyzed during this session
    seen: Mutex<HashSet<String>>,
    last_error: Mutex<Option<EngineError>>,
}

impl TransitionSelector {
    pub fn new(analyzer: Arc<dyn TrackAnalyzer>, config: AutoDjConfig) -> Self {
        Self {
            analyzer,
            config: RwLock::new(config),
            slot: InFlightSlot::new(),
            seen: Mutex::new(HashSet::new()),
            last_error: Mutex::new(None),
        }
    }

    /// Suggest a transition between two analyzed tracks
    ///
    /// Returns None if another suggestion is in flight or the analyzer
    /// failed; the failure is kept in `last_error`.
    pub fn suggest(
        &self,
        current: &TrackAnalysis,
        next: &TrackAnalysis,
    ) -> Option<TransitionSuggestion> {
        let Some(_guard) = self.slot.try_acquire() else {
            debug!("Transition suggestion already in flight");
            return None;
        };
        self.score(current, next)
    }

    /// Plan the transition from `current_id` into `next_id`
    ///
    /// The next track is analyzed through `cache` the first time it is
    /// seen this session; later requests reuse the cached analysis. A
    /// current track that was never analyzed is replaced by
    /// `TrackAnalysis::fallback()` rather than blocking on it.
    pub fn plan(
        &self,
        cache: &FeatureCache,
        current_id: &str,
        next_id: &str,
        next_buffer: &AudioBuffer,
    ) -> Option<TransitionSuggestion> {
        let Some(_guard) = self.slot.try_acquire() else {
            debug!(current_id, next_id, "Transition suggestion already in flight");
            return None;
        };

        let cached_next = if self.has_seen(next_id) {
            cache.get(next_id)
        } else {
            None
        };
        let next = match cached_next {
            Some(entry) => entry,
            None => match cache.analyze(next_id, next_buffer, false) {
                Ok(entry) => {
                    self.mark_seen(next_id);
                    entry
                }
                Err(e) => {
                    self.fail(e);
                    return None;
                }
            },
        };

        let current = match cache.get(current_id) {
            Some(entry) => entry.features.clone(),
            None => {
                debug!(current_id, "Current track not analyzed, using fallback analysis");
                TrackAnalysis::fallback()
            }
        };

        self.score(&current, &next.features)
    }

    /// Score and post-process; caller holds the slot
    fn score(&self, current: &TrackAnalysis, next: &TrackAnalysis) -> Option<TransitionSuggestion> {
        match self.analyzer.suggest_transition(current, next) {
            Ok(suggestion) => Some(self.adjust(suggestion, current, next)),
            Err(e) => {
                self.fail(e.into());
                None
            }
        }
    }

    /// Apply user preferences to a raw suggestion
    fn adjust(
        &self,
        mut suggestion: TransitionSuggestion,
        current: &TrackAnalysis,
        next: &TrackAnalysis,
    ) -> TransitionSuggestion {
        let config = self.config.read().clone();

        let demote = match suggestion.transition_type {
            TransitionType::HarmonicMix => !config.prefer_harmonic,
            TransitionType::EnergyMix => !config.prefer_energy_match,
            _ => false,
        };
        if demote {
            suggestion.transition_type = TransitionType::StandardCrossfade;
        }

        // The configured notch replaces whatever the analyzer proposed
        suggestion.remove_fx(NOTCH_FX);
        if config.use_notch_filter
            && (current.bass_mid_ratio > BASS_CLASH_RATIO || next.bass_mid_ratio > BASS_CLASH_RATIO)
        {
            suggestion.push_fx(&format!("{} {}Hz", NOTCH_FX, config.notch_frequency));
        }

        suggestion.crossfade_duration = config.clamp_crossfade(suggestion.crossfade_duration);
        suggestion
    }

    fn fail(&self, e: EngineError) {
        error!(error = %e, "Transition suggestion failed");
        *self.last_error.lock() = Some(e);
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.last_error.lock().clone()
    }

    pub fn mark_seen(&self, track_id: &str) {
        self.seen.lock().insert(track_id.to_string());
    }

    pub fn has_seen(&self, track_id: &str) -> bool {
        self.seen.lock().contains(track_id)
    }

    /// Forget which tracks were analyzed this session
    pub fn reset_session(&self) {
        self.seen.lock().clear();
    }

    pub fn config(&self) -> AutoDjConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: AutoDjConfig) {
        *self.config.write() = config;
    }

    /// Merge a partial update under a single write lock
    pub fn update_config(&self, update: &AutoDjConfigUpdate) -> AutoDjConfig {
        let mut config = self.config.write();
        config.apply(update);
        config.clone()
    }
}
