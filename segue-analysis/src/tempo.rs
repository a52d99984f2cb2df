//! Tempo estimation using energy onsets and an interval histogram

use std::collections::VecDeque;

/// Onset energy must exceed the local average by this factor
const ONSET_RATIO: f32 = 1.5;
/// Absolute floor below which a frame never counts as an onset
const ONSET_FLOOR: f32 = 0.01;
/// Minimum seconds between two onsets
const DEBOUNCE_SECS: f32 = 0.1;
/// Frames in the rolling energy average
const HISTORY_FRAMES: usize = 50;
/// Onsets needed before a tempo is reported
const MIN_ONSETS: usize = 8;

/// Estimated tempo of a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f32,
    /// Share of beat intervals agreeing with the winning period (0.0 - 1.0)
    pub confidence: f32,
}

/// Offline tempo analyzer over a whole mono signal
pub struct TempoAnalyzer {
    sample_rate: u32,
    /// Samples per analysis frame (10 ms)
    hop: usize,
}

impl TempoAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            hop: (sample_rate as usize / 100).max(1),
        }
    }

    /// Estimate the tempo of `samples`
    ///
    /// Returns None when too few onsets are found (silence, ambient
    /// material, very short clips).
    pub fn analyze(&self, samples: &[f32]) -> Option<TempoEstimate> {
        let onsets = self.onset_times(samples);
        if onsets.len() < MIN_ONSETS {
            return None;
        }

        let intervals: Vec<f32> = onsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&i| i > 0.2 && i < 2.0)
            .collect();
        if intervals.is_empty() {
            return None;
        }

        // Histogram of intervals quantised to 10 ms (0.0 - 2.0 s)
        let mut histogram = [0u32; 200];
        for &interval in &intervals {
            let idx = ((interval * 100.0).round() as usize).min(199);
            histogram[idx] += 1;
        }

        let (peak_idx, _) = histogram
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)?;
        let peak = peak_idx as f32 / 100.0;

        // Refine with the mean of intervals close to the peak bin
        let near: Vec<f32> = intervals
            .iter()
            .copied()
            .filter(|i| (i - peak).abs() <= 0.02)
            .collect();
        if near.is_empty() {
            return None;
        }
        let period = near.iter().sum::<f32>() / near.len() as f32;

        Some(TempoEstimate {
            bpm: normalize_bpm(60.0 / period),
            confidence: near.len() as f32 / intervals.len() as f32,
        })
    }

    /// Times (seconds) where frame RMS jumps above the rolling average
    fn onset_times(&self, samples: &[f32]) -> Vec<f32> {
        let frame_secs = self.hop as f32 / self.sample_rate as f32;
        let mut history: VecDeque<f32> = VecDeque::with_capacity(HISTORY_FRAMES + 1);
        let mut onsets: Vec<f32> = Vec::new();

        for (frame_idx, frame) in samples.chunks(self.hop).enumerate() {
            let energy = (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt();

            history.push_back(energy);
            if history.len() > HISTORY_FRAMES {
                history.pop_front();
            }
            let average = history.iter().sum::<f32>() / history.len() as f32;

            let time = frame_idx as f32 * frame_secs;
            if energy > average * ONSET_RATIO && energy > ONSET_FLOOR {
                let last = onsets.last().copied().unwrap_or(f32::MIN);
                if time - last > DEBOUNCE_SECS {
                    onsets.push(time);
                }
            }
        }

        onsets
    }
}

/// Fold a raw tempo into the 70-180 BPM range DJs work in
fn normalize_bpm(bpm: f32) -> f32 {
    let mut bpm = bpm;
    while bpm < 70.0 {
        bpm *= 2.0;
    }
    while bpm > 180.0 {
        bpm /= 2.0;
    }
    bpm
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Short 1 kHz bursts every `period` seconds
    fn click_track(sample_rate: u32, period: f32, seconds: f32) -> Vec<f32> {
        let total = (sample_rate as f32 * seconds) as usize;
        let period_samples = (sample_rate as f32 * period) as usize;
        let burst = sample_rate as usize / 50;
        (0..total)
            .map(|i| {
                if i % period_samples < burst {
                    let t = i as f32 / sample_rate as f32;
                    0.8 * (2.0 * PI * 1000.0 * t).sin()
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn test_detects_120_bpm() {
        let analyzer = TempoAnalyzer::new(44100);
        let estimate = analyzer
            .analyze(&click_track(44100, 0.5, 12.0))
            .expect("click track should have a tempo");
        assert!((estimate.bpm - 120.0).abs() < 2.0, "got {}", estimate.bpm);
        assert!(estimate.confidence > 0.8);
    }

    #[test]
    fn test_slow_pulse_is_doubled() {
        let analyzer = TempoAnalyzer::new(44100);
        let estimate = analyzer
            .analyze(&click_track(44100, 1.0, 20.0))
            .expect("slow click track should have a tempo");
        assert!((estimate.bpm - 120.0).abs() < 2.0, "got {}", estimate.bpm);
    }

    #[test]
    fn test_silence_has_no_tempo() {
        let analyzer = TempoAnalyzer::new(44100);
        assert!(analyzer.analyze(&vec![0.0; 44100 * 5]).is_none());
    }

    #[test]
    fn test_normalize_bpm() {
        assert_eq!(normalize_bpm(64.0), 128.0);
        assert_eq!(normalize_bpm(256.0), 128.0);
        assert_eq!(normalize_bpm(174.0), 174.0);
    }
}
