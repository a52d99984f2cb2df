//! Analyzer interface and the built-in spectral implementation

use crate::bands::BandAnalyzer;
use crate::camelot::{CamelotKey, MusicalKey};
use crate::energy::EnergyProfiler;
use crate::error::AnalysisError;
use crate::features::TrackAnalysis;
use crate::genre::{classify_genre, GenreFeatures};
use crate::key::KeyAnalyzer;
use crate::suggest::{score_transition, TransitionSuggestion};
use crate::tempo::TempoAnalyzer;
use tracing::debug;

/// FFT size used for band analysis unless configured otherwise
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Tempo assumed when no beat could be found
const DEFAULT_BPM: f32 = 128.0;
/// Floor used for dB conversions
const DB_FLOOR: f32 = 0.0001;

/// Backend that turns samples into features and scores transitions
///
/// The engine resolves one of these at startup and shares it across
/// threads, so implementations must be `Send + Sync`.
pub trait TrackAnalyzer: Send + Sync {
    /// Analyze mono samples of a whole track
    fn analyze_track(&self, samples: &[f32], sample_rate: u32)
        -> Result<TrackAnalysis, AnalysisError>;

    /// Suggest how to go from `current` to `next`
    fn suggest_transition(
        &self,
        current: &TrackAnalysis,
        next: &TrackAnalysis,
    ) -> Result<TransitionSuggestion, AnalysisError>;

    /// Name and version, for logging
    fn version(&self) -> String;
}

/// Native analyzer built on FFT band statistics, onset tempo tracking
/// and chromagram key detection
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    fft_size: usize,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

impl SpectralAnalyzer {
    pub fn new(fft_size: usize) -> Self {
        Self { fft_size }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
}

impl TrackAnalyzer for SpectralAnalyzer {
    fn analyze_track(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<TrackAnalysis, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if samples.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let stats = SampleStats::measure(samples);
        let spectrum = BandAnalyzer::new(sample_rate, self.fft_size).analyze(samples);
        let profile = EnergyProfiler::new(sample_rate).analyze(samples);
        let tempo = TempoAnalyzer::new(sample_rate).analyze(samples);
        let key = KeyAnalyzer::new(sample_rate).analyze(samples);

        let (bpm, bpm_confidence) = tempo.map_or((DEFAULT_BPM, 0.0), |t| (t.bpm, t.confidence));
        let (musical_key, key_confidence) =
            key.map_or((MusicalKey::CMajor, 0.0), |k| (k.key, k.confidence));
        let camelot = CamelotKey::from_musical_key(musical_key);
        let dynamic_range = 20.0 * (stats.peak.max(DB_FLOOR) / DB_FLOOR).log10();
        let (primary_genre, genre_confidence) = classify_genre(&GenreFeatures {
            bpm,
            energy: stats.mean_square,
            spectral_centroid: spectrum.centroid,
            dynamic_range,
            zero_crossing_rate: stats.zero_crossing_rate,
        });

        debug!(
            bpm,
            key = %camelot,
            rms = stats.rms,
            "Analyzed {} samples",
            samples.len()
        );

        Ok(TrackAnalysis {
            bpm,
            bpm_confidence,
            key: musical_key.name(),
            key_confidence,
            camelot_key: camelot.display(),
            energy: stats.mean_square,
            loudness: 20.0 * (stats.rms + DB_FLOOR).log10(),
            spectral_centroid: spectrum.centroid,
            spectral_rolloff: spectrum.rolloff,
            spectral_flux: spectrum.flux,
            zero_crossing_rate: stats.zero_crossing_rate,
            rms_energy: stats.rms,
            peak_frequency: spectrum.peak_frequency,
            dynamic_range,
            brightness: spectrum.brightness,
            warmth: spectrum.warmth,
            roughness: spectrum.roughness,
            bass_mean: spectrum.bass.mean,
            bass_peak: spectrum.bass.peak,
            bass_energy: spectrum.bass.energy,
            mid_mean: spectrum.mid.mean,
            mid_peak: spectrum.mid.peak,
            mid_energy: spectrum.mid.energy,
            high_mean: spectrum.high.mean,
            high_peak: spectrum.high.peak,
            high_energy: spectrum.high.energy,
            bass_mid_ratio: spectrum.bass_mid_ratio(),
            mid_high_ratio: spectrum.mid_high_ratio(),
            overall_balance: spectrum.overall_balance(),
            intro_best_start_point: profile.intro_start,
            intro_confidence: profile.intro_confidence,
            intro_has_silence: profile.intro_has_silence,
            intro_energy_buildup: profile.intro_buildup,
            outro_best_end_point: profile.outro_end,
            outro_confidence: profile.outro_confidence,
            outro_energy_decay: profile.outro_decay,
            overall_momentum: profile.momentum,
            average_energy: profile.average,
            peak_energy: profile.peak,
            valley_energy: profile.valley,
            energy_variance: profile.variance,
            mix_in_point: profile.mix_in,
            mix_out_point: profile.mix_out,
            mix_in_confidence: profile.intro_confidence,
            mix_out_confidence: profile.outro_confidence,
            energy_match_in: profile.energy_match_in,
            energy_match_out: profile.energy_match_out,
            // Eight bars at the track's tempo
            crossfade_duration: 32.0 * 60.0 / bpm,
            primary_genre: primary_genre.to_string(),
            genre_confidence,
        })
    }

    fn suggest_transition(
        &self,
        current: &TrackAnalysis,
        next: &TrackAnalysis,
    ) -> Result<TransitionSuggestion, AnalysisError> {
        Ok(score_transition(current, next))
    }

    fn version(&self) -> String {
        format!("segue-analysis v{}", env!("CARGO_PKG_VERSION"))
    }
}

/// Time-domain statistics
struct SampleStats {
    mean_square: f32,
    rms: f32,
    peak: f32,
    zero_crossing_rate: f32,
}

impl SampleStats {
    fn measure(samples: &[f32]) -> Self {
        let mut sum_sq = 0.0f32;
        let mut peak = 0.0f32;
        let mut crossings = 0usize;

        for (i, &s) in samples.iter().enumerate() {
            sum_sq += s * s;
            peak = peak.max(s.abs());
            if i > 0 && (s >= 0.0) != (samples[i - 1] >= 0.0) {
                crossings += 1;
            }
        }

        let n = samples.len() as f32;
        let mean_square = sum_sq / n;
        Self {
            mean_square,
            rms: mean_square.sqrt(),
            peak,
            zero_crossing_rate: crossings as f32 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// 120 BPM kick-like bursts over a sustained A minor triad
    fn synthetic_track(sample_rate: u32, seconds: f32) -> Vec<f32> {
        let beat = sample_rate as usize / 2;
        let burst = sample_rate as usize / 50;
        (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let pad = ((2.0 * PI * 220.0 * t).sin()
                    + (2.0 * PI * 261.63 * t).sin()
                    + (2.0 * PI * 329.63 * t).sin())
                    * 0.05;
                let kick = if i % beat < burst {
                    0.8 * (2.0 * PI * 60.0 * t).sin()
                } else {
                    0.0
                };
                pad + kick
            })
            .collect()
    }

    #[test]
    fn test_rejects_bad_input() {
        let analyzer = SpectralAnalyzer::default();
        assert_eq!(
            analyzer.analyze_track(&[], 44100),
            Err(AnalysisError::EmptyInput)
        );
        assert_eq!(
            analyzer.analyze_track(&[0.1; 100], 0),
            Err(AnalysisError::InvalidSampleRate(0))
        );
    }

    #[test]
    fn test_analyzes_synthetic_track() {
        let analyzer = SpectralAnalyzer::default();
        let analysis = analyzer
            .analyze_track(&synthetic_track(22050, 12.0), 22050)
            .unwrap();

        assert!((analysis.bpm - 120.0).abs() < 3.0, "bpm {}", analysis.bpm);
        assert!(analysis.camelot().is_some());
        assert!(analysis.bass_mean > 0.0);
        assert!(analysis.mix_out_point >= analysis.mix_in_point);
        assert!(analysis.outro_best_end_point <= 12.0);
        assert!(analysis.rms_energy > 0.0);
        assert!((analysis.crossfade_duration - 32.0 * 60.0 / analysis.bpm).abs() < 1e-3);
    }

    #[test]
    fn test_silence_uses_defaults() {
        let analyzer = SpectralAnalyzer::default();
        let analysis = analyzer.analyze_track(&vec![0.0; 44100 * 3], 44100).unwrap();
        assert_eq!(analysis.bpm, DEFAULT_BPM);
        assert_eq!(analysis.bpm_confidence, 0.0);
        assert_eq!(analysis.key, "C Major");
        assert_eq!(analysis.camelot_key, "8B");
        assert_eq!(analysis.key_confidence, 0.0);
        assert_eq!(analysis.primary_genre, "Ambient");
    }

    #[test]
    fn test_sample_stats() {
        let stats = SampleStats::measure(&[0.5, -0.5, 0.5, -0.5]);
        assert!((stats.rms - 0.5).abs() < 1e-6);
        assert_eq!(stats.peak, 0.5);
        assert_eq!(stats.zero_crossing_rate, 0.75);
    }

    #[test]
    fn test_suggest_delegates_to_scoring() {
        let analyzer = SpectralAnalyzer::default();
        let a = TrackAnalysis::fallback();
        let suggestion = analyzer.suggest_transition(&a, &a).unwrap();
        assert_eq!(suggestion, score_transition(&a, &a));
        assert!(analyzer.version().starts_with("segue-analysis"));
    }
}
