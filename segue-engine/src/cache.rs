//! In-memory cache of track analyses
//!
//! Entries live for the whole session; only `clear` removes them.

use crate::error::EngineError;
use parking_lot::RwLock;
use segue_analysis::{AudioBuffer, TrackAnalysis, TrackAnalyzer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Seconds of lead-in before the intro's best start point
const INTRO_LEAD: f32 = 2.0;
/// Seconds of tail after the outro's best end point
const OUTRO_TAIL: f32 = 4.0;

/// Intro/outro layout derived from the features
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackStructure {
    pub intro_start: f32,
    pub intro_end: f32,
    pub outro_start: f32,
    pub outro_end: f32,
}

impl TrackStructure {
    fn from_features(features: &TrackAnalysis) -> Self {
        Self {
            intro_start: features.intro_best_start_point - INTRO_LEAD,
            intro_end: features.intro_best_start_point,
            outro_start: features.outro_best_end_point,
            outro_end: features.outro_best_end_point + OUTRO_TAIL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenreInfo {
    pub primary_genre: String,
    pub genre_confidence: f32,
}

/// One cached analysis, never mutated once stored
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnalysis {
    pub features: TrackAnalysis,
    pub structure: TrackStructure,
    pub genre: GenreInfo,
    pub analyzed_at: SystemTime,
    /// Track duration in seconds
    pub duration: f64,
}

impl CachedAnalysis {
    /// Wrap freshly computed features, stamped now
    pub fn new(features: TrackAnalysis, duration: f64) -> Self {
        Self::with_timestamp(features, duration, SystemTime::now())
    }

    /// Wrap features analyzed earlier, e.g. restored from disk
    pub fn with_timestamp(features: TrackAnalysis, duration: f64, analyzed_at: SystemTime) -> Self {
        Self {
            structure: TrackStructure::from_features(&features),
            genre: GenreInfo {
                primary_genre: features.primary_genre.clone(),
                genre_confidence: features.genre_confidence,
            },
            features,
            analyzed_at,
            duration,
        }
    }
}

/// Track id → analysis map backed by a shared analyzer
pub struct FeatureCache {
    analyzer: Arc<dyn TrackAnalyzer>,
    entries: RwLock<HashMap<String, Arc<CachedAnalysis>>>,
}

impl FeatureCache {
    pub fn new(analyzer: Arc<dyn TrackAnalyzer>) -> Self {
        Self {
            analyzer,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Analyze a track and cache the result
    ///
    /// Without `force`, a track that is already cached is returned as is
    /// (same `Arc`, same timestamp) and the analyzer is not called.
    pub fn analyze(
        &self,
        track_id: &str,
        buffer: &AudioBuffer,
        force: bool,
    ) -> Result<Arc<CachedAnalysis>, EngineError> {
        if !force {
            if let Some(hit) = self.get(track_id) {
                debug!(track_id, "Analysis cache hit");
                return Ok(hit);
            }
        }

        let entry = Arc::new(self.analyze_uncached(track_id, buffer)?);
        self.entries
            .write()
            .insert(track_id.to_string(), Arc::clone(&entry));
        debug!(track_id, "Saved analysis for track");
        Ok(entry)
    }

    /// Analyze a track without touching the cache
    pub fn analyze_uncached(
        &self,
        track_id: &str,
        buffer: &AudioBuffer,
    ) -> Result<CachedAnalysis, EngineError> {
        let samples = buffer.channel_data(0);
        if samples.is_empty() {
            return Err(EngineError::NoAudio(track_id.to_string()));
        }
        let features = self.analyzer.analyze_track(samples, buffer.sample_rate())?;
        Ok(CachedAnalysis::new(features, buffer.duration()))
    }

    pub fn get(&self, track_id: &str) -> Option<Arc<CachedAnalysis>> {
        self.entries.read().get(track_id).cloned()
    }

    /// Store an analysis obtained elsewhere, replacing any existing entry
    pub fn insert(&self, track_id: &str, analysis: CachedAnalysis) -> Arc<CachedAnalysis> {
        let entry = Arc::new(analysis);
        self.entries
            .write()
            .insert(track_id.to_string(), Arc::clone(&entry));
        entry
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.read().contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn analyzer(&self) -> &Arc<dyn TrackAnalyzer> {
        &self.analyzer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segue_analysis::{AnalysisError, TransitionSuggestion};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Analyzer that counts calls and reports the sample count as bpm
    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    impl TrackAnalyzer for CountingAnalyzer {
        fn analyze_track(
            &self,
            samples: &[f32],
            _sample_rate: u32,
        ) -> Result<TrackAnalysis, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TrackAnalysis {
                bpm: samples.len() as f32,
                ..TrackAnalysis::fallback()
            })
        }

        fn suggest_transition(
            &self,
            _current: &TrackAnalysis,
            _next: &TrackAnalysis,
        ) -> Result<TransitionSuggestion, AnalysisError> {
            Err(AnalysisError::Failed("not used".into()))
        }

        fn version(&self) -> String {
            "counting".into()
        }
    }

    fn setup() -> (Arc<CountingAnalyzer>, FeatureCache) {
        let analyzer = Arc::new(CountingAnalyzer::default());
        let cache = FeatureCache::new(analyzer.clone());
        (analyzer, cache)
    }

    #[test]
    fn test_second_analyze_is_a_cache_hit() {
        let (analyzer, cache) = setup();
        let buffer = AudioBuffer::mono(100, vec![0.1; 100]);

        let first = cache.analyze("track-1", &buffer, false).unwrap();
        let second = cache.analyze("track-1", &buffer, false).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.analyzed_at, second.analyzed_at);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_force_reanalyzes() {
        let (analyzer, cache) = setup();
        let first = cache
            .analyze("track-1", &AudioBuffer::mono(100, vec![0.1; 100]), false)
            .unwrap();
        let second = cache
            .analyze("track-1", &AudioBuffer::mono(100, vec![0.1; 150]), true)
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.features.bpm, 150.0);
        assert_eq!(cache.get("track-1").unwrap().features.bpm, 150.0);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_uncached_analysis_is_not_stored() {
        let (_, cache) = setup();
        let analysis = cache
            .analyze_uncached("track-1", &AudioBuffer::mono(100, vec![0.1; 200]))
            .unwrap();
        assert_eq!(analysis.duration, 2.0);
        assert!(cache.get("track-1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let (analyzer, cache) = setup();
        let result = cache.analyze("silent", &AudioBuffer::default(), false);
        assert_eq!(result.unwrap_err(), EngineError::NoAudio("silent".into()));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_structure_and_genre_derived() {
        let entry = CachedAnalysis::new(TrackAnalysis::fallback(), 180.0);
        assert_eq!(entry.structure.intro_start, 3.0);
        assert_eq!(entry.structure.intro_end, 5.0);
        assert_eq!(entry.structure.outro_start, 180.0);
        assert_eq!(entry.structure.outro_end, 184.0);
        assert_eq!(entry.genre.primary_genre, "House");
    }

    #[test]
    fn test_intro_lead_is_not_floored() {
        let features = TrackAnalysis {
            intro_best_start_point: 0.5,
            ..TrackAnalysis::fallback()
        };
        let entry = CachedAnalysis::new(features, 180.0);
        assert_eq!(entry.structure.intro_start, -1.5);
    }

    #[test]
    fn test_insert_and_clear() {
        let (_, cache) = setup();
        cache.insert("a", CachedAnalysis::new(TrackAnalysis::fallback(), 1.0));
        cache.insert("b", CachedAnalysis::new(TrackAnalysis::fallback(), 1.0));
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains("a"));
    }
}
