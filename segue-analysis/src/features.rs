//! Per-track feature snapshot

use crate::camelot::CamelotKey;
use serde::{Deserialize, Serialize};

/// Everything the Auto-DJ knows about one track
///
/// Field names serialize in camelCase so stored analyses stay readable
/// by other clients of the same media server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    pub bpm: f32,
    pub bpm_confidence: f32,
    /// Long key name, e.g. "C Major"
    pub key: String,
    pub key_confidence: f32,
    /// Camelot notation, e.g. "8B"
    pub camelot_key: String,

    pub energy: f32,
    /// dBFS
    pub loudness: f32,
    pub spectral_centroid: f32,
    pub spectral_rolloff: f32,
    pub spectral_flux: f32,
    pub zero_crossing_rate: f32,
    pub rms_energy: f32,
    pub peak_frequency: f32,
    /// dB between peak and noise floor
    pub dynamic_range: f32,
    pub brightness: f32,
    pub warmth: f32,
    pub roughness: f32,

    pub bass_mean: f32,
    pub bass_peak: f32,
    pub bass_energy: f32,
    pub mid_mean: f32,
    pub mid_peak: f32,
    pub mid_energy: f32,
    pub high_mean: f32,
    pub high_peak: f32,
    pub high_energy: f32,
    pub bass_mid_ratio: f32,
    pub mid_high_ratio: f32,
    pub overall_balance: f32,

    // Seconds from the start of the track
    pub intro_best_start_point: f32,
    pub intro_confidence: f32,
    pub intro_has_silence: bool,
    pub intro_energy_buildup: f32,
    pub outro_best_end_point: f32,
    pub outro_confidence: f32,
    pub outro_energy_decay: f32,

    pub overall_momentum: f32,
    pub average_energy: f32,
    pub peak_energy: f32,
    pub valley_energy: f32,
    pub energy_variance: f32,

    pub mix_in_point: f32,
    pub mix_out_point: f32,
    pub mix_in_confidence: f32,
    pub mix_out_confidence: f32,
    pub energy_match_in: f32,
    pub energy_match_out: f32,
    /// Seconds
    pub crossfade_duration: f32,

    pub primary_genre: String,
    pub genre_confidence: f32,
}

impl TrackAnalysis {
    /// Stand-in for a current track that was never analyzed
    ///
    /// A mid-energy 128 BPM house track in C major with a three-minute
    /// layout, so a transition can still be planned without waiting on
    /// analysis of the outgoing track.
    pub fn fallback() -> Self {
        Self {
            bpm: 128.0,
            bpm_confidence: 0.5,
            key: "C Major".to_string(),
            key_confidence: 0.5,
            camelot_key: "8B".to_string(),
            energy: 0.3,
            loudness: -20.0,
            spectral_centroid: 2000.0,
            spectral_rolloff: 8000.0,
            spectral_flux: 0.1,
            zero_crossing_rate: 0.05,
            rms_energy: 0.3,
            peak_frequency: 440.0,
            dynamic_range: 20.0,
            brightness: 0.2,
            warmth: 0.5,
            roughness: 0.3,
            bass_mean: 0.3,
            bass_peak: 0.5,
            bass_energy: 1000.0,
            mid_mean: 0.25,
            mid_peak: 0.4,
            mid_energy: 800.0,
            high_mean: 0.2,
            high_peak: 0.35,
            high_energy: 500.0,
            bass_mid_ratio: 1.2,
            mid_high_ratio: 1.25,
            overall_balance: 0.25,
            intro_best_start_point: 5.0,
            intro_confidence: 0.6,
            intro_has_silence: false,
            intro_energy_buildup: 0.05,
            outro_best_end_point: 180.0,
            outro_confidence: 0.5,
            outro_energy_decay: 0.05,
            overall_momentum: 0.3,
            average_energy: 0.3,
            peak_energy: 0.6,
            valley_energy: 0.1,
            energy_variance: 0.05,
            mix_in_point: 7.0,
            mix_out_point: 176.0,
            mix_in_confidence: 0.6,
            mix_out_confidence: 0.5,
            energy_match_in: 0.7,
            energy_match_out: 0.7,
            crossfade_duration: 16.0,
            primary_genre: "House".to_string(),
            genre_confidence: 0.5,
        }
    }

    /// Parsed Camelot key, None if the stored notation is malformed
    pub fn camelot(&self) -> Option<CamelotKey> {
        CamelotKey::parse(&self.camelot_key)
    }
}
