//! Bounded log of past transitions and the variety score

use segue_analysis::{TransitionSuggestion, TransitionType};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// Records kept before the oldest is dropped
pub const HISTORY_CAPACITY: usize = 100;
/// Most recent records considered for the variety score
pub const VARIETY_WINDOW: usize = 10;

/// One transition that was actually played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    /// Track the transition led into
    pub track_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub transition_type: TransitionType,
    pub compatibility_score: f32,
    pub fx_applied: Vec<String>,
}

impl TransitionRecord {
    pub fn from_suggestion(track_id: &str, suggestion: &TransitionSuggestion) -> Self {
        Self {
            track_id: track_id.to_string(),
            timestamp: now_millis(),
            transition_type: suggestion.transition_type,
            compatibility_score: suggestion.compatibility_score,
            fx_applied: suggestion.fx_list(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Aggregates over the retained history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_transitions: usize,
    pub harmonic_mix_count: usize,
    pub energy_mix_count: usize,
    pub tempo_change_count: usize,
    pub standard_mix_count: usize,
    pub average_compatibility: f32,
    /// Distinct types over the recent window (0.0 - 1.0)
    pub variety_score: f32,
    pub last_transition_type: Option<TransitionType>,
}

impl HistoryStats {
    /// Stats of an empty history
    pub fn empty() -> Self {
        Self {
            total_transitions: 0,
            harmonic_mix_count: 0,
            energy_mix_count: 0,
            tempo_change_count: 0,
            standard_mix_count: 0,
            average_compatibility: 0.0,
            variety_score: 1.0,
            last_transition_type: None,
        }
    }
}

/// Sliding window of the last `HISTORY_CAPACITY` transitions
///
/// Per-type counts and the compatibility sum cover exactly the retained
/// records, so they shrink as old records fall off.
#[derive(Debug, Clone)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    /// Indexed like `TransitionType::ALL`
    type_counts: [usize; 4],
    compatibility_sum: f64,
    variety_score: f32,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_CAPACITY),
            type_counts: [0; 4],
            compatibility_sum: 0.0,
            variety_score: 1.0,
        }
    }

    /// Record a transition into `track_id`
    pub fn record(&mut self, track_id: &str, suggestion: &TransitionSuggestion) -> &TransitionRecord {
        self.push(TransitionRecord::from_suggestion(track_id, suggestion))
    }

    /// Append a prepared record, evicting the oldest at capacity
    pub fn push(&mut self, record: TransitionRecord) -> &TransitionRecord {
        if self.records.len() == HISTORY_CAPACITY {
            if let Some(evicted) = self.records.pop_front() {
                self.type_counts[type_index(evicted.transition_type)] -= 1;
                self.compatibility_sum -= evicted.compatibility_score as f64;
            }
        }

        self.type_counts[type_index(record.transition_type)] += 1;
        self.compatibility_sum += record.compatibility_score as f64;
        self.records.push_back(record);
        self.variety_score = self.compute_variety();

        &self.records[self.records.len() - 1]
    }

    /// `distinct / min(VARIETY_WINDOW, count)` over the newest records
    fn compute_variety(&self) -> f32 {
        let window = self.records.len().min(VARIETY_WINDOW);
        if window == 0 {
            return 1.0;
        }
        let distinct: HashSet<TransitionType> = self
            .records
            .iter()
            .rev()
            .take(window)
            .map(|r| r.transition_type)
            .collect();
        distinct.len() as f32 / window as f32
    }

    pub fn stats(&self) -> HistoryStats {
        if self.records.is_empty() {
            return HistoryStats::empty();
        }

        HistoryStats {
            total_transitions: self.records.len(),
            harmonic_mix_count: self.count(TransitionType::HarmonicMix),
            energy_mix_count: self.count(TransitionType::EnergyMix),
            tempo_change_count: self.count(TransitionType::TempoChange),
            standard_mix_count: self.count(TransitionType::StandardCrossfade),
            average_compatibility: (self.compatibility_sum / self.records.len() as f64) as f32,
            variety_score: self.variety_score,
            last_transition_type: self.records.back().map(|r| r.transition_type),
        }
    }

    pub fn count(&self, transition_type: TransitionType) -> usize {
        self.type_counts[type_index(transition_type)]
    }

    pub fn variety_score(&self) -> f32 {
        self.variety_score
    }

    /// True once at least three transitions ran and variety fell below `threshold`
    pub fn needs_variety(&self, threshold: f32) -> bool {
        self.records.len() >= 3 && self.variety_score < threshold
    }

    /// Types of the newest records, oldest first
    pub fn recent_types(&self) -> Vec<TransitionType> {
        let skip = self.records.len().saturating_sub(VARIETY_WINDOW);
        self.records
            .iter()
            .skip(skip)
            .map(|r| r.transition_type)
            .collect()
    }

    /// Retained records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

fn type_index(transition_type: TransitionType) -> usize {
    match transition_type {
        TransitionType::HarmonicMix => 0,
        TransitionType::EnergyMix => 1,
        TransitionType::TempoChange => 2,
        TransitionType::StandardCrossfade => 3,
    }
}
