//! Auto-DJ facade tying the cache, selector and history together

use crate::cache::{CachedAnalysis, FeatureCache};
use crate::config::{AutoDjConfig, AutoDjConfigUpdate};
use crate::error::EngineError;
use crate::history::{HistoryStats, TransitionHistory, TransitionRecord};
use crate::selector::TransitionSelector;
use crate::slot::ActivityCounter;
use parking_lot::Mutex;
use segue_analysis::{AnalysisError, AudioBuffer, TrackAnalyzer, TransitionSuggestion};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Auto-DJ session
///
/// The analyzer is resolved once when the session is built and shared by
/// the cache and the selector for its whole lifetime.
pub struct AutoDj {
    cache: FeatureCache,
    selector: TransitionSelector,
    history: Mutex<TransitionHistory>,
    analyses: ActivityCounter,
}

impl AutoDj {
    pub fn new(analyzer: Arc<dyn TrackAnalyzer>, config: AutoDjConfig) -> Self {
        info!(analyzer = %analyzer.version(), "Auto-DJ ready");
        Self {
            cache: FeatureCache::new(Arc::clone(&analyzer)),
            selector: TransitionSelector::new(analyzer, config),
            history: Mutex::new(TransitionHistory::new()),
            analyses: ActivityCounter::new(),
        }
    }

    /// Build a session from a fallible analyzer loader
    ///
    /// A loader error is logged and returned; nothing is retried.
    pub fn init<F>(loader: F, config: AutoDjConfig) -> Result<Self, EngineError>
    where
        F: FnOnce() -> Result<Arc<dyn TrackAnalyzer>, AnalysisError>,
    {
        match loader() {
            Ok(analyzer) => Ok(Self::new(analyzer, config)),
            Err(e) => {
                error!(error = %e, "Failed to initialize analyzer");
                Err(EngineError::AnalyzerInit(e))
            }
        }
    }

    /// Analyze a track into the cache, reusing an earlier analysis
    pub fn analyze_track(
        &self,
        track_id: &str,
        buffer: &AudioBuffer,
    ) -> Result<Arc<CachedAnalysis>, EngineError> {
        let _active = self.analyses.enter();
        let entry = self.cache.analyze(track_id, buffer, false)?;
        self.selector.mark_seen(track_id);
        Ok(entry)
    }

    pub fn analysis(&self, track_id: &str) -> Option<Arc<CachedAnalysis>> {
        self.cache.get(track_id)
    }

    /// True while a track is being analyzed or a transition computed
    pub fn is_analyzing(&self) -> bool {
        self.analyses.is_active() || self.selector.is_busy()
    }

    /// Suggest how to mix from `current_id` into `next_id`
    ///
    /// Returns None while another transition is being computed or when
    /// the next track could not be analyzed.
    pub fn transition(
        &self,
        current_id: &str,
        next_id: &str,
        next_buffer: &AudioBuffer,
    ) -> Option<TransitionSuggestion> {
        self.selector
            .plan(&self.cache, current_id, next_id, next_buffer)
    }

    /// Log a transition that was actually played
    pub fn record_transition(&self, track_id: &str, suggestion: &TransitionSuggestion) -> TransitionRecord {
        let threshold = self.selector.config().variety_threshold;
        let mut history = self.history.lock();
        let record = history.record(track_id, suggestion).clone();

        info!(
            track_id,
            transition = %record.transition_type,
            score = record.compatibility_score,
            "Recorded transition"
        );
        if history.needs_variety(threshold) {
            warn!(
                variety = history.variety_score(),
                threshold, "Transitions are getting repetitive"
            );
        }
        record
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.history.lock().stats()
    }

    /// Copy of the retained history, oldest first
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.lock().records().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Merge a partial update into the current configuration
    pub fn update_config(&self, update: &AutoDjConfigUpdate) -> AutoDjConfig {
        let config = self.selector.update_config(update);
        info!(?config, "Auto-DJ config updated");
        config
    }

    pub fn config(&self) -> AutoDjConfig {
        self.selector.config()
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.selector.last_error()
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }
}
