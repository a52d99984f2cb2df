//! Transition scoring between two analyzed tracks

use crate::camelot::CamelotKey;
use crate::features::TrackAnalysis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BPM gap above which the mix has to ride the pitch
const TEMPO_CHANGE_BPM: f32 = 10.0;
/// Energy match needed alongside compatible keys for a harmonic mix
const HARMONIC_ENERGY: f32 = 0.7;
/// Energy match needed for an energy mix
const ENERGY_MIX: f32 = 0.8;
/// Bass/mid ratio above which clashing keys get a notch on the low end
const BASS_CLASH_RATIO: f32 = 1.5;
/// Crossfade length before the engine clamps it, in seconds
const CROSSFADE_SECS: f32 = 24.0;
/// Seconds after the intro start where the next track comes in
const MIX_IN_OFFSET: f32 = 2.0;
/// Seconds before the outro end where the current track starts leaving
const MIX_OUT_OFFSET: f32 = 4.0;

/// Wheel positions treated as compatible whatever the letter
const CROSS_WHEEL_PAIRS: [(u8, u8); 12] = [
    (1, 8),
    (2, 9),
    (3, 10),
    (4, 11),
    (5, 12),
    (6, 7),
    (8, 1),
    (9, 2),
    (10, 3),
    (11, 4),
    (12, 5),
    (7, 6),
];

/// Minor (A) to major (B) moves that still mix
const MINOR_TO_MAJOR_PAIRS: [(u8, u8); 7] =
    [(5, 8), (12, 3), (7, 10), (2, 11), (9, 4), (4, 1), (11, 6)];

/// How the outgoing track hands over to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionType {
    #[serde(rename = "Harmonic Mix")]
    HarmonicMix,
    #[serde(rename = "Energy Mix")]
    EnergyMix,
    #[serde(rename = "Tempo Change")]
    TempoChange,
    #[serde(rename = "Standard Crossfade")]
    StandardCrossfade,
}

impl TransitionType {
    pub const ALL: [TransitionType; 4] = [
        TransitionType::HarmonicMix,
        TransitionType::EnergyMix,
        TransitionType::TempoChange,
        TransitionType::StandardCrossfade,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TransitionType::HarmonicMix => "Harmonic Mix",
            TransitionType::EnergyMix => "Energy Mix",
            TransitionType::TempoChange => "Tempo Change",
            TransitionType::StandardCrossfade => "Standard Crossfade",
        }
    }

    fn fx(&self) -> &'static [&'static str] {
        match self {
            TransitionType::HarmonicMix => &["Reverb - Hall", "Light Echo"],
            TransitionType::EnergyMix => &["Reverb - Plate", "Filter Sweep"],
            TransitionType::TempoChange => &["Short Reverb", "Transient Effect"],
            TransitionType::StandardCrossfade => &["Light Reverb"],
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Suggested transition from the current track to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSuggestion {
    pub transition_type: TransitionType,
    /// Overall fit (0.0 - 1.0)
    pub compatibility_score: f32,
    pub energy_match: f32,
    pub harmonic_compatibility: f32,
    /// Seconds into the next track where it enters
    pub mix_in_point: f32,
    /// Seconds into the current track where it starts leaving
    pub mix_out_point: f32,
    /// Seconds
    pub crossfade_duration: f32,
    /// Comma-separated effect chain, may be empty
    pub fx_recommendation: String,
}

impl TransitionSuggestion {
    /// Individual effects of `fx_recommendation`
    pub fn fx_list(&self) -> Vec<String> {
        self.fx_recommendation
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Append one effect to the chain
    pub fn push_fx(&mut self, fx: &str) {
        if !self.fx_recommendation.is_empty() {
            self.fx_recommendation.push_str(", ");
        }
        self.fx_recommendation.push_str(fx);
    }

    /// Drop every effect starting with `prefix`
    pub fn remove_fx(&mut self, prefix: &str) {
        self.fx_recommendation = self
            .fx_list()
            .into_iter()
            .filter(|fx| !fx.starts_with(prefix))
            .collect::<Vec<_>>()
            .join(", ");
    }
}

/// Score the hand-over from `current` to `next`
///
/// Compatible keys with a close energy level make a harmonic mix; failing
/// that a BPM gap over 10 forces a tempo change, and a very close energy
/// level still makes an energy mix.
pub fn score_transition(current: &TrackAnalysis, next: &TrackAnalysis) -> TransitionSuggestion {
    let harmonic = harmonically_compatible(&current.camelot_key, &next.camelot_key);
    let energy_match = 1.0 - (next.energy - current.energy).abs().min(1.0);
    let bpm_gap = (next.bpm - current.bpm).abs();

    let transition_type = if harmonic && energy_match > HARMONIC_ENERGY {
        TransitionType::HarmonicMix
    } else if bpm_gap > TEMPO_CHANGE_BPM {
        TransitionType::TempoChange
    } else if energy_match > ENERGY_MIX {
        TransitionType::EnergyMix
    } else {
        TransitionType::StandardCrossfade
    };

    let compatibility_score = if harmonic {
        0.8
    } else if energy_match > HARMONIC_ENERGY {
        0.6
    } else {
        0.4
    };

    let mut fx: Vec<&str> = Vec::new();
    if !harmonic
        && (current.bass_mid_ratio > BASS_CLASH_RATIO || next.bass_mid_ratio > BASS_CLASH_RATIO)
    {
        fx.push("Notch Filter 60Hz");
    }
    fx.extend_from_slice(transition_type.fx());

    TransitionSuggestion {
        transition_type,
        compatibility_score,
        energy_match,
        harmonic_compatibility: if harmonic { 1.0 } else { 0.0 },
        mix_in_point: next.intro_best_start_point + MIX_IN_OFFSET,
        mix_out_point: current.outro_best_end_point - MIX_OUT_OFFSET,
        crossfade_duration: CROSSFADE_SECS,
        fx_recommendation: fx.join(", "),
    }
}

/// Whether two Camelot keys can be mixed without a clash
///
/// Unknown or malformed keys never count as compatible.
pub fn harmonically_compatible(a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (CamelotKey::parse(a), CamelotKey::parse(b)) else {
        return false;
    };

    if a == b || CROSS_WHEEL_PAIRS.contains(&(a.number, b.number)) {
        return true;
    }
    !a.is_major && b.is_major && MINOR_TO_MAJOR_PAIRS.contains(&(a.number, b.number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(bpm: f32, camelot: &str, energy: f32) -> TrackAnalysis {
        TrackAnalysis {
            bpm,
            camelot_key: camelot.to_string(),
            energy,
            ..TrackAnalysis::fallback()
        }
    }

    #[test]
    fn test_same_key_close_energy_is_harmonic() {
        let s = score_transition(&track(128.0, "8A", 0.3), &track(128.0, "8A", 0.25));
        assert_eq!(s.transition_type, TransitionType::HarmonicMix);
        assert_eq!(s.harmonic_compatibility, 1.0);
        assert_eq!(s.compatibility_score, 0.8);
        assert_eq!(s.fx_recommendation, "Reverb - Hall, Light Echo");
    }

    #[test]
    fn test_compatible_keys_need_matching_energy() {
        // Energy match 0.3 rules out a harmonic mix even in the same key
        let s = score_transition(&track(128.0, "8A", 0.2), &track(128.0, "8A", 0.9));
        assert_eq!(s.transition_type, TransitionType::StandardCrossfade);
        assert!((s.energy_match - 0.3).abs() < 1e-6);
        assert_eq!(s.compatibility_score, 0.8);
    }

    #[test]
    fn test_bpm_gap_over_ten_is_tempo_change() {
        let s = score_transition(&track(120.0, "8A", 0.3), &track(131.0, "3B", 0.3));
        assert_eq!(s.transition_type, TransitionType::TempoChange);
        assert_eq!(s.fx_recommendation, "Short Reverb, Transient Effect");
        assert_eq!(s.compatibility_score, 0.6);

        // Harmonic mixes win over the tempo gap
        let s = score_transition(&track(120.0, "8A", 0.3), &track(140.0, "8A", 0.3));
        assert_eq!(s.transition_type, TransitionType::HarmonicMix);

        let s = score_transition(&track(120.0, "8A", 0.3), &track(130.0, "3B", 0.3));
        assert_eq!(s.transition_type, TransitionType::EnergyMix);
    }

    #[test]
    fn test_energy_mix_and_standard_fallback() {
        let s = score_transition(&track(128.0, "8A", 0.3), &track(128.0, "3B", 0.45));
        assert_eq!(s.transition_type, TransitionType::EnergyMix);
        assert_eq!(s.fx_recommendation, "Reverb - Plate, Filter Sweep");
        assert_eq!(s.compatibility_score, 0.6);

        let s = score_transition(&track(128.0, "8A", 0.3), &track(128.0, "3B", 0.55));
        assert_eq!(s.transition_type, TransitionType::StandardCrossfade);
        assert_eq!(s.fx_recommendation, "Light Reverb");
        assert_eq!(s.compatibility_score, 0.6);

        let s = score_transition(&track(128.0, "8A", 0.1), &track(128.0, "3B", 0.9));
        assert_eq!(s.compatibility_score, 0.4);
        assert_eq!(s.harmonic_compatibility, 0.0);
    }

    #[test]
    fn test_harmonic_compatibility_rules() {
        assert!(harmonically_compatible("8A", "8A"));
        assert!(harmonically_compatible("1A", "8B"));
        assert!(harmonically_compatible("7B", "6A"));
        assert!(harmonically_compatible("5A", "8B"));
        assert!(!harmonically_compatible("8B", "5A"));
        assert!(!harmonically_compatible("8A", "8B"));
        assert!(!harmonically_compatible("?", "8A"));
        assert!(!harmonically_compatible("8A", "13A"));
    }

    #[test]
    fn test_notch_only_for_clashing_bassy_tracks() {
        let mut bassy = track(128.0, "8A", 0.3);
        bassy.bass_mid_ratio = 1.8;

        let s = score_transition(&bassy, &track(128.0, "3B", 0.3));
        assert_eq!(s.fx_recommendation, "Notch Filter 60Hz, Reverb - Plate, Filter Sweep");

        let s = score_transition(&bassy, &track(128.0, "8A", 0.3));
        assert!(!s.fx_recommendation.contains("Notch"));
    }

    #[test]
    fn test_mix_points_come_from_intro_and_outro() {
        let mut current = track(128.0, "8A", 0.3);
        current.outro_best_end_point = 200.0;
        let mut next = track(128.0, "8A", 0.3);
        next.intro_best_start_point = 9.0;
        let s = score_transition(&current, &next);
        assert_eq!(s.mix_out_point, 196.0);
        assert_eq!(s.mix_in_point, 11.0);
        assert_eq!(s.crossfade_duration, 24.0);
    }

    #[test]
    fn test_fx_helpers() {
        let mut s = score_transition(&track(128.0, "8A", 0.3), &track(128.0, "8A", 0.3));
        s.push_fx("Notch Filter 60Hz");
        assert_eq!(
            s.fx_list(),
            vec!["Reverb - Hall", "Light Echo", "Notch Filter 60Hz"]
        );

        s.remove_fx("Notch Filter");
        assert_eq!(s.fx_recommendation, "Reverb - Hall, Light Echo");

        s.fx_recommendation.clear();
        s.push_fx("Notch Filter 80Hz");
        assert_eq!(s.fx_recommendation, "Notch Filter 80Hz");
    }

    #[test]
    fn test_type_serializes_as_label() {
        let json = serde_json::to_string(&TransitionType::StandardCrossfade).unwrap();
        assert_eq!(json, "\"Standard Crossfade\"");
        for t in TransitionType::ALL {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t));
        }
    }
}
