//! Key detection using chromagram analysis
//!
//! 1. Fold STFT magnitudes into a 12-bin pitch class distribution
//! 2. Correlate against Sha'ath (2011) key profiles, which suit electronic music
//! 3. Keep the best of the 24 candidate keys

use crate::camelot::{CamelotKey, MusicalKey};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Detected key with confidence score
#[derive(Debug, Clone, Copy)]
pub struct DetectedKey {
    pub key: MusicalKey,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
}

impl DetectedKey {
    pub fn camelot(&self) -> CamelotKey {
        CamelotKey::from_musical_key(self.key)
    }
}

/// Sha'ath major profile, index 0 = tonic
const MAJOR_PROFILE: [f32; 12] = [6.6, 2.0, 3.5, 2.3, 4.6, 4.0, 2.5, 5.2, 2.4, 3.7, 2.3, 3.4];

/// Sha'ath minor profile, index 0 = tonic
const MINOR_PROFILE: [f32; 12] = [6.5, 2.8, 3.5, 5.4, 2.7, 3.5, 2.5, 5.2, 4.0, 2.7, 4.3, 3.2];

const A4_FREQ: f32 = 440.0;

/// Lowest and highest frequency folded into the chromagram (A1 .. ~B7)
const MIN_FREQ: f32 = 55.0;
const MAX_FREQ: f32 = 4000.0;

/// Seconds of audio needed before a key is reported
const MIN_SECONDS: usize = 2;

/// Chromagram-based key analyzer for mono audio
pub struct KeyAnalyzer {
    sample_rate: u32,
    fft_size: usize,
    hop_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Pitch class per FFT bin, None outside the musical range
    bin_pitch_class: Vec<Option<u8>>,
    /// Detune weight times octave decay per bin
    bin_weights: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
}

impl KeyAnalyzer {
    /// Create a key analyzer with a 4096-point FFT and 50% overlap
    pub fn new(sample_rate: u32) -> Self {
        let fft_size = 4096;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);

        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        let (bin_pitch_class, bin_weights) = Self::pitch_class_mapping(fft_size, sample_rate);

        Self {
            sample_rate,
            fft_size,
            hop_size: fft_size / 2,
            fft,
            window,
            bin_pitch_class,
            bin_weights,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    /// Map every FFT bin below Nyquist to its nearest pitch class
    ///
    /// Bins close to an equal-tempered pitch weigh more, and anything above
    /// 500 Hz decays by ~6 dB per octave so upper harmonics don't dominate.
    fn pitch_class_mapping(fft_size: usize, sample_rate: u32) -> (Vec<Option<u8>>, Vec<f32>) {
        let nyquist = sample_rate as f32 / 2.0;
        let bins = fft_size / 2;
        let mut mapping = Vec::with_capacity(bins);
        let mut weights = Vec::with_capacity(bins);

        for bin in 0..bins {
            let freq = bin as f32 * sample_rate as f32 / fft_size as f32;
            if !(MIN_FREQ..=MAX_FREQ).contains(&freq) || freq >= nyquist {
                mapping.push(None);
                weights.push(0.0);
                continue;
            }

            let midi_note = 12.0 * (freq / A4_FREQ).log2() + 69.0;
            let nearest = midi_note.round();
            let pitch_class = (nearest as i32).rem_euclid(12) as u8;

            let detune = (midi_note - nearest).abs();
            let pitch_weight = (1.0 - detune.min(0.5) * 2.0).max(0.0);
            let octave_decay = (500.0 / freq.max(500.0)).sqrt();

            mapping.push(Some(pitch_class));
            weights.push(pitch_weight * octave_decay);
        }

        (mapping, weights)
    }

    /// Detect the key of mono samples
    ///
    /// Returns None for less than two seconds of audio or when no key
    /// correlates convincingly.
    pub fn analyze(&mut self, samples: &[f32]) -> Option<DetectedKey> {
        if samples.len() < self.sample_rate as usize * MIN_SECONDS {
            return None;
        }

        let chroma = self.chromagram(samples);
        if chroma.iter().all(|&v| v == 0.0) {
            return None;
        }

        let (key, confidence) = Self::match_key_profile(&chroma);
        (confidence > 0.5).then_some(DetectedKey { key, confidence })
    }

    /// Average chroma over overlapping frames, normalised to unit sum
    fn chromagram(&mut self, samples: &[f32]) -> [f32; 12] {
        let mut chroma = [0.0f32; 12];

        let mut pos = 0;
        while pos + self.fft_size <= samples.len() {
            for (i, (s, w)) in samples[pos..pos + self.fft_size]
                .iter()
                .zip(&self.window)
                .enumerate()
            {
                self.fft_buffer[i] = Complex::new(s * w, 0.0);
            }
            self.fft.process(&mut self.fft_buffer);

            for (bin, value) in self.fft_buffer[..self.fft_size / 2].iter().enumerate() {
                if let Some(pc) = self.bin_pitch_class[bin] {
                    // Squared magnitude is enough, only relative energy matters
                    chroma[pc as usize] += value.norm_sqr() * self.bin_weights[bin];
                }
            }
            pos += self.hop_size;
        }

        let sum: f32 = chroma.iter().sum();
        if sum > 0.0 {
            for v in &mut chroma {
                *v /= sum;
            }
        }
        chroma
    }

    /// Best of the 24 keys, with Pearson correlation mapped onto 0..=1
    fn match_key_profile(chroma: &[f32; 12]) -> (MusicalKey, f32) {
        let mut best_key = MusicalKey::CMajor;
        let mut best_correlation = f32::MIN;

        for root in 0..12u8 {
            let rotated = rotate_chroma(chroma, root);

            let major = correlate(&rotated, &MAJOR_PROFILE);
            if major > best_correlation {
                best_correlation = major;
                best_key = MusicalKey::major_from_pitch_class(root);
            }

            let minor = correlate(&rotated, &MINOR_PROFILE);
            if minor > best_correlation {
                best_correlation = minor;
                best_key = MusicalKey::minor_from_pitch_class(root);
            }
        }

        let confidence = ((best_correlation + 1.0) / 2.0).clamp(0.0, 1.0);
        (best_key, confidence)
    }
}

/// Rotate so that `root` lands on index 0
fn rotate_chroma(chroma: &[f32; 12], root: u8) -> [f32; 12] {
    let mut rotated = [0.0f32; 12];
    for (i, slot) in rotated.iter_mut().enumerate() {
        *slot = chroma[(i + root as usize) % 12];
    }
    rotated
}

/// Pearson correlation between two 12-element vectors
fn correlate(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;

    let mut numerator = 0.0f32;
    let mut denom_a = 0.0f32;
    let mut denom_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        numerator += da * db;
        denom_a += da * da;
        denom_b += db * db;
    }

    let denom = (denom_a * denom_b).sqrt();
    if denom > 0.0 {
        numerator / denom
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_mapping_has_musical_bins() {
        let analyzer = KeyAnalyzer::new(44100);
        assert!(analyzer.bin_pitch_class.iter().any(Option::is_some));
        assert!(analyzer.bin_pitch_class[0].is_none());
    }

    #[test]
    fn test_rotate_chroma() {
        let chroma = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        assert_eq!(rotate_chroma(&chroma, 0), chroma);

        let rotated = rotate_chroma(&chroma, 1);
        assert_eq!(rotated[0], 2.0);
        assert_eq!(rotated[11], 1.0);
    }

    #[test]
    fn test_correlate() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut b = a;
        b.reverse();
        assert!((correlate(&a, &a) - 1.0).abs() < 0.001);
        assert!(correlate(&a, &b) < 0.0);
        assert_eq!(correlate(&[1.0; 12], &a), 0.0);
    }

    #[test]
    fn test_insufficient_audio() {
        let mut analyzer = KeyAnalyzer::new(44100);
        assert!(analyzer.analyze(&[0.0; 1000]).is_none());
    }

    #[test]
    fn test_silence_has_no_key() {
        let mut analyzer = KeyAnalyzer::new(44100);
        assert!(analyzer.analyze(&vec![0.0; 44100 * 3]).is_none());
    }

    #[test]
    fn test_detect_c_major_chord() {
        let sample_rate = 44100;
        let mut analyzer = KeyAnalyzer::new(sample_rate);

        let samples: Vec<f32> = (0..sample_rate as usize * 3)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((2.0 * PI * 261.63 * t).sin()
                    + (2.0 * PI * 329.63 * t).sin()
                    + (2.0 * PI * 392.00 * t).sin())
                    / 3.0
            })
            .collect();

        let detected = analyzer.analyze(&samples).expect("C major chord should give a key");
        // Synthetic chords don't fit real-music profiles exactly, so accept
        // the C/Am region and its neighbours on the wheel
        let camelot = detected.camelot();
        assert!(
            [7, 8, 9].contains(&camelot.number),
            "expected key near 8, got {}",
            camelot
        );
    }
}
