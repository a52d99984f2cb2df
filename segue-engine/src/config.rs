//! Auto-DJ tuning

use serde::{Deserialize, Serialize};

/// User-editable Auto-DJ preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDjConfig {
    /// Shortest crossfade the selector will suggest, seconds
    pub min_crossfade_duration: f32,
    /// Longest crossfade the selector will suggest, seconds
    pub max_crossfade_duration: f32,
    /// Variety score below which the mix is considered repetitive
    pub variety_threshold: f32,
    pub prefer_harmonic: bool,
    pub prefer_energy_match: bool,
    pub use_notch_filter: bool,
    /// Hz
    pub notch_frequency: f32,
}

impl Default for AutoDjConfig {
    fn default() -> Self {
        Self {
            min_crossfade_duration: 12.0,
            max_crossfade_duration: 24.0,
            variety_threshold: 0.7,
            prefer_harmonic: true,
            prefer_energy_match: true,
            use_notch_filter: true,
            notch_frequency: 60.0,
        }
    }
}

impl AutoDjConfig {
    /// Merge the fields set in `update`
    pub fn apply(&mut self, update: &AutoDjConfigUpdate) {
        if let Some(v) = update.min_crossfade_duration {
            self.min_crossfade_duration = v;
        }
        if let Some(v) = update.max_crossfade_duration {
            self.max_crossfade_duration = v;
        }
        if let Some(v) = update.variety_threshold {
            self.variety_threshold = v;
        }
        if let Some(v) = update.prefer_harmonic {
            self.prefer_harmonic = v;
        }
        if let Some(v) = update.prefer_energy_match {
            self.prefer_energy_match = v;
        }
        if let Some(v) = update.use_notch_filter {
            self.use_notch_filter = v;
        }
        if let Some(v) = update.notch_frequency {
            self.notch_frequency = v;
        }
    }

    /// Clamp a crossfade into the configured bounds
    ///
    /// Bounds given in the wrong order are swapped rather than panicking.
    pub fn clamp_crossfade(&self, seconds: f32) -> f32 {
        let lo = self.min_crossfade_duration.min(self.max_crossfade_duration);
        let hi = self.min_crossfade_duration.max(self.max_crossfade_duration);
        seconds.clamp(lo, hi)
    }
}

/// Partial update of an `AutoDjConfig`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDjConfigUpdate {
    pub min_crossfade_duration: Option<f32>,
    pub max_crossfade_duration: Option<f32>,
    pub variety_threshold: Option<f32>,
    pub prefer_harmonic: Option<bool>,
    pub prefer_energy_match: Option<bool>,
    pub use_notch_filter: Option<bool>,
    pub notch_frequency: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AutoDjConfig::default();
        assert_eq!(config.min_crossfade_duration, 12.0);
        assert_eq!(config.max_crossfade_duration, 24.0);
        assert_eq!(config.variety_threshold, 0.7);
        assert!(config.use_notch_filter);
        assert_eq!(config.notch_frequency, 60.0);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut config = AutoDjConfig::default();
        config.apply(&AutoDjConfigUpdate {
            notch_frequency: Some(80.0),
            use_notch_filter: Some(false),
            ..Default::default()
        });
        assert_eq!(config.notch_frequency, 80.0);
        assert!(!config.use_notch_filter);
        assert_eq!(config.min_crossfade_duration, 12.0);
        assert!(config.prefer_harmonic);
    }

    #[test]
    fn test_clamp_crossfade() {
        let mut config = AutoDjConfig::default();
        assert_eq!(config.clamp_crossfade(8.0), 12.0);
        assert_eq!(config.clamp_crossfade(16.0), 16.0);
        assert_eq!(config.clamp_crossfade(40.0), 24.0);

        config.min_crossfade_duration = 30.0;
        assert_eq!(config.clamp_crossfade(40.0), 30.0);
    }
}
