//! FFT band statistics over a whole track
//!
//! Splits every frame into bass (< 250 Hz), mid (250 Hz - 4 kHz) and
//! high (> 4 kHz) bands and accumulates the spectral descriptors the
//! transition scoring needs.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

const BASS_MAX_HZ: f32 = 250.0;
const MID_MAX_HZ: f32 = 4000.0;
const WARMTH_MAX_HZ: f32 = 500.0;
/// Share of spectral energy below the rolloff frequency
const ROLLOFF_SHARE: f32 = 0.85;
/// Ratios are capped so silence in one band can't blow them up
const MAX_RATIO: f32 = 10.0;

/// Level statistics for one frequency band
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandStats {
    /// Mean band level across frames
    pub mean: f32,
    /// Loudest frame level
    pub peak: f32,
    /// Summed band power
    pub energy: f32,
}

/// Spectral description of a track
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralSummary {
    pub bass: BandStats,
    pub mid: BandStats,
    pub high: BandStats,
    /// Mean spectral centroid in Hz
    pub centroid: f32,
    /// Mean 85% rolloff frequency in Hz
    pub rolloff: f32,
    /// Mean positive spectral change between frames (0.0 - 1.0)
    pub flux: f32,
    /// Frequency of the strongest bin over the track in Hz
    pub peak_frequency: f32,
    /// Share of power above 4 kHz
    pub brightness: f32,
    /// Share of power below 500 Hz
    pub warmth: f32,
    /// Spectral change restricted to the mid and high bands
    pub roughness: f32,
}

impl SpectralSummary {
    pub fn bass_mid_ratio(&self) -> f32 {
        ratio(self.bass.mean, self.mid.mean)
    }

    pub fn mid_high_ratio(&self) -> f32 {
        ratio(self.mid.mean, self.high.mean)
    }

    /// Average level of the three bands
    pub fn overall_balance(&self) -> f32 {
        (self.bass.mean + self.mid.mean + self.high.mean) / 3.0
    }
}

fn ratio(a: f32, b: f32) -> f32 {
    if a <= 0.0 && b <= 0.0 {
        1.0
    } else if b <= 0.0 {
        MAX_RATIO
    } else {
        (a / b).min(MAX_RATIO)
    }
}

/// Band analyzer with a reusable FFT plan
pub struct BandAnalyzer {
    sample_rate: u32,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
}

impl BandAnalyzer {
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        let fft_size = fft_size.max(64);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);

        // Hann window
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    /// Summarise mono `samples`, one non-overlapping frame at a time
    pub fn analyze(&mut self, samples: &[f32]) -> SpectralSummary {
        let bins = self.fft_size / 2;
        let bin_width = self.sample_rate as f32 / self.fft_size as f32;
        let bass_end = ((BASS_MAX_HZ / bin_width) as usize).clamp(1, bins);
        let mid_end = ((MID_MAX_HZ / bin_width) as usize).clamp(bass_end, bins);
        let warm_end = ((WARMTH_MAX_HZ / bin_width) as usize).clamp(1, bins);
        // Scale so a full-scale sine reads roughly 0.5 in its bin
        let scale = 2.0 / self.fft_size as f32;

        let mut summary = SpectralSummary::default();
        let mut level_sums = [0.0f32; 3];
        let mut total_power = 0.0f32;
        let mut high_power = 0.0f32;
        let mut warm_power = 0.0f32;
        let mut magnitude_totals = vec![0.0f32; bins];
        let mut previous: Option<Vec<f32>> = None;
        let mut magnitudes = vec![0.0f32; bins];
        let mut flux_sum = 0.0f32;
        let mut rough_sum = 0.0f32;
        let mut frames = 0usize;

        for frame in samples.chunks(self.fft_size) {
            for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
                let s = frame.get(i).copied().unwrap_or(0.0);
                *slot = Complex::new(s * self.window[i], 0.0);
            }
            self.fft.process(&mut self.fft_buffer);

            for (mag, value) in magnitudes.iter_mut().zip(&self.fft_buffer[..bins]) {
                *mag = value.norm() * scale;
            }

            let bands = [
                &magnitudes[..bass_end],
                &magnitudes[bass_end..mid_end],
                &magnitudes[mid_end..],
            ];
            let stats = [&mut summary.bass, &mut summary.mid, &mut summary.high];
            for (i, (band, stat)) in bands.iter().zip(stats).enumerate() {
                let power: f32 = band.iter().map(|m| m * m).sum();
                let level = if band.is_empty() {
                    0.0
                } else {
                    (power / band.len() as f32).sqrt()
                };
                level_sums[i] += level;
                stat.peak = stat.peak.max(level);
                stat.energy += power;
            }

            let frame_power: f32 = magnitudes.iter().map(|m| m * m).sum();
            total_power += frame_power;
            high_power += magnitudes[mid_end..].iter().map(|m| m * m).sum::<f32>();
            warm_power += magnitudes[..warm_end].iter().map(|m| m * m).sum::<f32>();

            let magnitude_sum: f32 = magnitudes.iter().sum();
            if magnitude_sum > 0.0 {
                let weighted: f32 = magnitudes
                    .iter()
                    .enumerate()
                    .map(|(bin, m)| bin as f32 * bin_width * m)
                    .sum();
                summary.centroid += weighted / magnitude_sum;
                summary.rolloff += rolloff_bin(&magnitudes, frame_power) as f32 * bin_width;
            }

            for (total, m) in magnitude_totals.iter_mut().zip(&magnitudes) {
                *total += m;
            }

            // Flux on unit-sum spectra so loudness changes don't count
            let normalized: Vec<f32> = if magnitude_sum > 0.0 {
                magnitudes.iter().map(|m| m / magnitude_sum).collect()
            } else {
                vec![0.0; bins]
            };
            if let Some(prev) = &previous {
                let rise = |range: std::ops::Range<usize>| -> f32 {
                    normalized[range.clone()]
                        .iter()
                        .zip(&prev[range])
                        .map(|(now, before)| (now - before).max(0.0))
                        .sum()
                };
                flux_sum += rise(0..bins);
                rough_sum += rise(bass_end..bins);
            }
            previous = Some(normalized);
            frames += 1;
        }

        if frames == 0 {
            return summary;
        }

        let n = frames as f32;
        summary.bass.mean = level_sums[0] / n;
        summary.mid.mean = level_sums[1] / n;
        summary.high.mean = level_sums[2] / n;
        summary.centroid /= n;
        summary.rolloff /= n;
        if frames > 1 {
            summary.flux = (flux_sum / (n - 1.0)).clamp(0.0, 1.0);
            summary.roughness = (rough_sum / (n - 1.0)).clamp(0.0, 1.0);
        }
        if total_power > 0.0 {
            summary.brightness = high_power / total_power;
            summary.warmth = warm_power / total_power;
        }
        summary.peak_frequency = magnitude_totals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0.0, |(bin, _)| bin as f32 * bin_width);

        summary
    }
}

/// First bin at which cumulative power reaches the rolloff share
fn rolloff_bin(magnitudes: &[f32], total_power: f32) -> usize {
    let target = total_power * ROLLOFF_SHARE;
    let mut cumulative = 0.0f32;
    for (bin, m) in magnitudes.iter().enumerate() {
        cumulative += m * m;
        if cumulative >= target {
            return bin;
        }
    }
    magnitudes.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| 0.8 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_bass_tone_is_bass_heavy() {
        let mut analyzer = BandAnalyzer::new(44100, 2048);
        let summary = analyzer.analyze(&sine(80.0, 44100, 2.0));
        assert!(summary.bass.mean > summary.mid.mean);
        assert!(summary.bass_mid_ratio() > 1.5);
        assert!(summary.warmth > 0.9);
        assert!(summary.peak_frequency < 120.0);
    }

    #[test]
    fn test_mid_tone_centroid() {
        let mut analyzer = BandAnalyzer::new(44100, 2048);
        let summary = analyzer.analyze(&sine(1000.0, 44100, 2.0));
        assert!(summary.mid.mean > summary.bass.mean);
        assert!(summary.mid.mean > summary.high.mean);
        assert!((summary.centroid - 1000.0).abs() < 300.0, "centroid {}", summary.centroid);
        assert!((summary.peak_frequency - 1000.0).abs() < 30.0);
        assert!(summary.brightness < 0.1);
    }

    #[test]
    fn test_steady_tone_has_low_flux() {
        let mut analyzer = BandAnalyzer::new(44100, 2048);
        let summary = analyzer.analyze(&sine(440.0, 44100, 2.0));
        assert!(summary.flux < 0.2, "flux {}", summary.flux);
    }

    #[test]
    fn test_silence() {
        let mut analyzer = BandAnalyzer::new(44100, 2048);
        let summary = analyzer.analyze(&vec![0.0; 8192]);
        assert_eq!(summary.bass.mean, 0.0);
        assert_eq!(summary.bass_mid_ratio(), 1.0);
        assert_eq!(summary.brightness, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let mut analyzer = BandAnalyzer::new(44100, 2048);
        assert_eq!(analyzer.analyze(&[]), SpectralSummary::default());
    }
}
