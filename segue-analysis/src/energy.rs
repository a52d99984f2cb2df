//! Energy profile and mix point detection
//!
//! Tracks RMS level per second to find where a track really starts and
//! ends, how it builds and decays, and where a DJ would mix in and out.

/// A one-second window quieter than this is treated as silence
const SILENCE_FLOOR: f32 = 0.01;
/// Windows above this share of the average level count as "playing"
const ACTIVE_SHARE: f32 = 0.5;
/// Seconds after the intro start where the mix-in lands
const MIX_IN_OFFSET: f32 = 2.0;
/// Seconds before the outro end where the mix-out lands
const MIX_OUT_OFFSET: f32 = 4.0;
/// Windows inspected for intro build-up and outro decay
const PHRASE_WINDOWS: usize = 16;

/// Energy over time for one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyProfile {
    /// RMS level per window
    pub levels: Vec<f32>,
    pub average: f32,
    pub peak: f32,
    pub valley: f32,
    pub variance: f32,
    /// Second half against first half, -1.0 (fading) to 1.0 (building)
    pub momentum: f32,
    /// Seconds
    pub intro_start: f32,
    pub intro_confidence: f32,
    pub intro_has_silence: bool,
    pub intro_buildup: f32,
    /// Seconds
    pub outro_end: f32,
    pub outro_confidence: f32,
    pub outro_decay: f32,
    /// Seconds
    pub mix_in: f32,
    /// Seconds
    pub mix_out: f32,
    /// How close the level at the mix-in point is to the track average
    pub energy_match_in: f32,
    /// How close the level at the mix-out point is to the track average
    pub energy_match_out: f32,
}

/// Builds an `EnergyProfile` from mono samples
pub struct EnergyProfiler {
    window: usize,
    window_secs: f32,
}

impl EnergyProfiler {
    /// One-second windows
    pub fn new(sample_rate: u32) -> Self {
        Self::with_window(sample_rate, 1.0)
    }

    pub fn with_window(sample_rate: u32, window_secs: f32) -> Self {
        Self {
            window: ((sample_rate as f32 * window_secs) as usize).max(1),
            window_secs,
        }
    }

    pub fn analyze(&self, samples: &[f32]) -> EnergyProfile {
        let levels: Vec<f32> = samples
            .chunks(self.window)
            .map(|w| (w.iter().map(|s| s * s).sum::<f32>() / w.len() as f32).sqrt())
            .collect();
        if levels.is_empty() {
            return EnergyProfile::default();
        }

        let n = levels.len() as f32;
        let duration = samples.len() as f32 / self.window as f32 * self.window_secs;
        let average = levels.iter().sum::<f32>() / n;
        let peak = levels.iter().copied().fold(0.0f32, f32::max);
        let valley = levels.iter().copied().fold(f32::MAX, f32::min);
        let variance = levels.iter().map(|l| (l - average).powi(2)).sum::<f32>() / n;

        let half = levels.len() / 2;
        let momentum = if half > 0 && average > 0.0 {
            let first = mean(&levels[..half]);
            let second = mean(&levels[half..]);
            ((second - first) / average).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let threshold = average * ACTIVE_SHARE;
        let first_active = levels.iter().position(|&l| l >= threshold && l > 0.0);
        let last_active = levels.iter().rposition(|&l| l >= threshold && l > 0.0);

        let (start_idx, end_idx) = match (first_active, last_active) {
            (Some(s), Some(e)) => (s, e),
            // Silent track: nothing to anchor on
            _ => (0, levels.len() - 1),
        };

        let intro_start = start_idx as f32 * self.window_secs;
        let outro_end = ((end_idx + 1) as f32 * self.window_secs).min(duration);

        let intro_window = &levels[start_idx..(start_idx + PHRASE_WINDOWS).min(levels.len())];
        let outro_window = &levels[(end_idx + 1).saturating_sub(PHRASE_WINDOWS)..=end_idx];

        let mix_in = (intro_start + MIX_IN_OFFSET).min(duration);
        let mix_out = (outro_end - MIX_OUT_OFFSET).max(mix_in);

        EnergyProfile {
            average,
            peak,
            valley,
            variance,
            momentum,
            intro_start,
            intro_confidence: share_of(levels[start_idx], average),
            intro_has_silence: levels[0] < SILENCE_FLOOR,
            intro_buildup: slope(intro_window, peak),
            outro_end,
            outro_confidence: share_of(levels[end_idx], average),
            outro_decay: -slope(outro_window, peak),
            mix_in,
            mix_out,
            energy_match_in: closeness(self.level_at(&levels, mix_in), average, peak),
            energy_match_out: closeness(self.level_at(&levels, mix_out), average, peak),
            levels,
        }
    }

    fn level_at(&self, levels: &[f32], secs: f32) -> f32 {
        let idx = ((secs / self.window_secs) as usize).min(levels.len() - 1);
        levels[idx]
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn share_of(level: f32, average: f32) -> f32 {
    if average > 0.0 {
        (level / average).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Level change from the first to the last quarter of `window`, relative to `peak`
fn slope(window: &[f32], peak: f32) -> f32 {
    if window.len() < 2 || peak <= 0.0 {
        return 0.0;
    }
    let quarter = (window.len() / 4).max(1);
    let head = mean(&window[..quarter]);
    let tail = mean(&window[window.len() - quarter..]);
    ((tail - head) / peak).clamp(-1.0, 1.0)
}

fn closeness(level: f32, average: f32, peak: f32) -> f32 {
    if peak <= 0.0 {
        return 0.0;
    }
    (1.0 - (level - average).abs() / peak).clamp(0.0, 1.0)
}
