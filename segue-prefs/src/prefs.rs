//! Preference categories with their defaults and clamping setters

use segue_engine::{AutoDjConfigUpdate, TransitionRecord};
use serde::{Deserialize, Serialize};

/// Transition records kept in the Auto-DJ preferences
pub const TRANSITION_HISTORY_LIMIT: usize = 100;

/// Playback rates offered to the user
pub const PLAYBACK_RATES: [f32; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Complete preference state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub audio: AudioPreferences,
    pub visualizer: VisualizerPreferences,
    pub playback: PlaybackPreferences,
    pub crossfade: CrossfadePreferences,
    #[serde(rename = "autoDJ")]
    pub auto_dj: AutoDjPreferences,
    pub ui: UiPreferences,
    /// Live crossfade flags, never persisted
    #[serde(skip)]
    pub runtime: CrossfadeRuntime,
}

impl Preferences {
    /// Reset every category, including runtime flags
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

// Audio

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioPreferences {
    /// 0 - 100
    pub volume: f32,
    pub muted: bool,
    /// 0.5 - 2.0
    pub makeup_gain: f32,
    pub enable_normalization: bool,
    /// 70 - 100
    pub normalization_percent: f32,
}

impl Default for AudioPreferences {
    fn default() -> Self {
        Self {
            volume: 100.0,
            muted: false,
            makeup_gain: 1.0,
            enable_normalization: true,
            normalization_percent: 95.0,
        }
    }
}

impl AudioPreferences {
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 100.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_makeup_gain(&mut self, gain: f32) {
        self.makeup_gain = gain.clamp(0.5, 2.0);
    }

    pub fn set_enable_normalization(&mut self, enabled: bool) {
        self.enable_normalization = enabled;
    }

    pub fn set_normalization_percent(&mut self, percent: f32) {
        self.normalization_percent = percent.clamp(70.0, 100.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// Visualizer

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizerType {
    Waveform,
    Frequency,
    Butterchurn,
    Threed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrequencyColorScheme {
    Spectrum,
    Solid,
    AlbumArt,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaveColorScheme {
    AlbumArt,
    Monochrome,
    Stereo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreeDRenderer {
    Sphere,
    Particles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrequencyAnalyzerPreferences {
    pub opacity: f32,
    pub color_scheme: FrequencyColorScheme,
}

impl Default for FrequencyAnalyzerPreferences {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color_scheme: FrequencyColorScheme::Spectrum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveSurferPreferences {
    pub opacity: f32,
    pub color_scheme: WaveColorScheme,
}

impl Default for WaveSurferPreferences {
    fn default() -> Self {
        Self {
            opacity: 0.7,
            color_scheme: WaveColorScheme::AlbumArt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButterchurnPreferences {
    pub opacity: f32,
    /// Seconds between preset changes
    pub preset_interval: f32,
    pub transition_speed: f32,
    pub preset: String,
}

impl Default for ButterchurnPreferences {
    fn default() -> Self {
        Self {
            opacity: 0.6,
            preset_interval: 60.0,
            transition_speed: 2.7,
            preset: "Good".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreeJsPreferences {
    pub renderer: ThreeDRenderer,
}

impl Default for ThreeJsPreferences {
    fn default() -> Self {
        Self {
            renderer: ThreeDRenderer::Sphere,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SitbackPreferences {
    pub track_info_duration: f32,
    pub auto_hide_timer: f32,
}

impl Default for SitbackPreferences {
    fn default() -> Self {
        Self {
            track_info_duration: 5.0,
            auto_hide_timer: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedVisualizerPreferences {
    pub fft_size: u32,
    /// dBFS
    pub limiter_threshold: f32,
}

impl Default for AdvancedVisualizerPreferences {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            limiter_threshold: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizerPreferences {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: VisualizerType,
    /// 1 - 100
    pub sensitivity: f32,
    /// 8 - 256
    pub bar_count: u32,
    /// 0.0 - 1.0
    pub smoothing: f32,
    pub frequency_analyzer: FrequencyAnalyzerPreferences,
    pub wave_surfer: WaveSurferPreferences,
    pub butterchurn: ButterchurnPreferences,
    pub three_js: ThreeJsPreferences,
    pub sitback: SitbackPreferences,
    pub advanced: AdvancedVisualizerPreferences,
}

impl Default for VisualizerPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: VisualizerType::Butterchurn,
            sensitivity: 50.0,
            bar_count: 64,
            smoothing: 0.8,
            frequency_analyzer: FrequencyAnalyzerPreferences::default(),
            wave_surfer: WaveSurferPreferences::default(),
            butterchurn: ButterchurnPreferences::default(),
            three_js: ThreeJsPreferences::default(),
            sitback: SitbackPreferences::default(),
            advanced: AdvancedVisualizerPreferences::default(),
        }
    }
}

impl VisualizerPreferences {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_kind(&mut self, kind: VisualizerType) {
        self.kind = kind;
    }

    pub fn set_butterchurn_preset(&mut self, preset: &str) {
        self.butterchurn.preset = preset.to_string();
    }

    /// Set the color scheme of the active visualizer
    ///
    /// Only the frequency and waveform visualizers have color schemes.
    /// Returns false when the active one has none or `scheme` is not one
    /// of its schemes.
    pub fn set_color_scheme(&mut self, scheme: &str) -> bool {
        let value = serde_json::Value::String(scheme.to_string());
        match self.kind {
            VisualizerType::Frequency => match serde_json::from_value(value) {
                Ok(s) => {
                    self.frequency_analyzer.color_scheme = s;
                    true
                }
                Err(_) => false,
            },
            VisualizerType::Waveform => match serde_json::from_value(value) {
                Ok(s) => {
                    self.wave_surfer.color_scheme = s;
                    true
                }
                Err(_) => false,
            },
            _ => false,
        }
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.clamp(1.0, 100.0);
    }

    pub fn set_bar_count(&mut self, count: u32) {
        self.bar_count = count.clamp(8, 256);
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }

    /// Set the opacity of the active visualizer (0.1 - 1.0)
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.1, 1.0);
        match self.kind {
            VisualizerType::Frequency => self.frequency_analyzer.opacity = opacity,
            VisualizerType::Waveform => self.wave_surfer.opacity = opacity,
            VisualizerType::Butterchurn => self.butterchurn.opacity = opacity,
            VisualizerType::Threed => {}
        }
    }

    pub fn set_fft_size(&mut self, fft_size: u32) {
        self.advanced.fft_size = fft_size;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// Playback

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackPreferences {
    pub default_playback_rate: f32,
    pub auto_play: bool,
    pub remember_playback_position: bool,
    /// 5 - 120
    pub skip_forward_seconds: f32,
    /// 5 - 60
    pub skip_back_seconds: f32,
    pub gapless_playback: bool,
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            default_playback_rate: 1.0,
            auto_play: false,
            remember_playback_position: true,
            skip_forward_seconds: 10.0,
            skip_back_seconds: 10.0,
            gapless_playback: true,
        }
    }
}

impl PlaybackPreferences {
    /// Snap to the nearest offered rate, ties going to the slower one
    pub fn set_default_playback_rate(&mut self, rate: f32) {
        self.default_playback_rate = PLAYBACK_RATES
            .iter()
            .copied()
            .fold(1.0, |best, r| {
                if (r - rate).abs() < (best - rate).abs() {
                    r
                } else {
                    best
                }
            });
    }

    pub fn set_auto_play(&mut self, auto_play: bool) {
        self.auto_play = auto_play;
    }

    pub fn set_remember_playback_position(&mut self, remember: bool) {
        self.remember_playback_position = remember;
    }

    pub fn set_skip_forward_seconds(&mut self, seconds: f32) {
        self.skip_forward_seconds = seconds.clamp(5.0, 120.0);
    }

    pub fn set_skip_back_seconds(&mut self, seconds: f32) {
        self.skip_back_seconds = seconds.clamp(5.0, 60.0);
    }

    pub fn set_gapless_playback(&mut self, enabled: bool) {
        self.gapless_playback = enabled;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// Crossfade

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrossfadePreferences {
    /// Seconds, 0 - 30
    pub crossfade_duration: f32,
    pub crossfade_enabled: bool,
    /// Seconds, 0 - 10
    pub network_latency_compensation: f32,
    pub network_latency_mode: LatencyMode,
    /// Seconds, 0 - 5
    pub manual_latency_offset: f32,
}

impl Default for CrossfadePreferences {
    fn default() -> Self {
        Self {
            crossfade_duration: 5.0,
            crossfade_enabled: true,
            network_latency_compensation: 1.0,
            network_latency_mode: LatencyMode::Auto,
            manual_latency_offset: 0.0,
        }
    }
}

impl CrossfadePreferences {
    /// Set the duration; anything under 10 ms disables crossfading
    pub fn set_duration(&mut self, seconds: f32) {
        self.crossfade_duration = seconds.clamp(0.0, 30.0);
        self.crossfade_enabled = self.crossfade_duration >= 0.01;
    }

    /// Toggle crossfading; re-enabling restores at least one second
    pub fn set_enabled(&mut self, enabled: bool) {
        self.crossfade_enabled = enabled;
        self.crossfade_duration = if enabled {
            self.crossfade_duration.max(1.0)
        } else {
            0.0
        };
    }

    pub fn set_network_latency_compensation(&mut self, seconds: f32) {
        self.network_latency_compensation = seconds.clamp(0.0, 10.0);
    }

    pub fn set_network_latency_mode(&mut self, mode: LatencyMode) {
        self.network_latency_mode = mode;
    }

    pub fn set_manual_latency_offset(&mut self, seconds: f32) {
        self.manual_latency_offset = seconds.clamp(0.0, 5.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Latency added on top of the crossfade for the active mode
    pub fn effective_latency(&self) -> f32 {
        match self.network_latency_mode {
            LatencyMode::Manual => self.manual_latency_offset,
            LatencyMode::Auto => self.network_latency_compensation,
        }
    }

    pub fn effective_duration(&self) -> f32 {
        self.crossfade_duration + self.effective_latency()
    }

    /// Time both tracks play at full level
    pub fn sustain(&self) -> f32 {
        match self.crossfade_duration {
            d if d < 0.01 => 0.0,
            d if d < 0.51 => d / 2.0,
            d => d / 12.0,
        }
    }

    /// Fade-out time of the outgoing track
    pub fn fade_out(&self) -> f32 {
        match self.crossfade_duration {
            d if d < 0.01 => 0.0,
            d if d < 0.51 => d,
            d => d * 2.0,
        }
    }
}

/// Flags of the crossfade that is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrossfadeRuntime {
    pub busy: bool,
    pub triggered: bool,
    pub manual_trigger: bool,
}

impl CrossfadeRuntime {
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

// Auto-DJ

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoDjPreferences {
    pub enabled: bool,
    /// Transition length in seconds, 4 - 60
    pub duration: f32,
    pub prefer_harmonic: bool,
    pub prefer_energy_match: bool,
    pub use_notch_filter: bool,
    /// Hz, 20 - 200
    pub notch_frequency: f32,
    /// Newest first
    pub transition_history: Vec<TransitionRecord>,
}

impl Default for AutoDjPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            duration: 16.0,
            prefer_harmonic: true,
            prefer_energy_match: true,
            use_notch_filter: true,
            notch_frequency: 60.0,
            transition_history: Vec::new(),
        }
    }
}

impl AutoDjPreferences {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_duration(&mut self, seconds: f32) {
        self.duration = seconds.clamp(4.0, 60.0);
    }

    pub fn set_prefer_harmonic(&mut self, prefer: bool) {
        self.prefer_harmonic = prefer;
    }

    pub fn set_prefer_energy_match(&mut self, prefer: bool) {
        self.prefer_energy_match = prefer;
    }

    pub fn set_use_notch_filter(&mut self, enabled: bool) {
        self.use_notch_filter = enabled;
    }

    pub fn set_notch_frequency(&mut self, hz: f32) {
        self.notch_frequency = hz.clamp(20.0, 200.0);
    }

    /// Prepend a record, dropping the oldest past the limit
    pub fn record_transition(&mut self, record: TransitionRecord) {
        self.transition_history.insert(0, record);
        self.transition_history.truncate(TRANSITION_HISTORY_LIMIT);
    }

    pub fn clear_transition_history(&mut self) {
        self.transition_history.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Engine settings these preferences control
    pub fn to_config_update(&self) -> AutoDjConfigUpdate {
        AutoDjConfigUpdate {
            prefer_harmonic: Some(self.prefer_harmonic),
            prefer_energy_match: Some(self.prefer_energy_match),
            use_notch_filter: Some(self.use_notch_filter),
            notch_frequency: Some(self.notch_frequency),
            ..Default::default()
        }
    }
}

// UI

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiPreferences {
    pub theme: Theme,
    pub compact_mode: bool,
    pub show_visualizer: bool,
    pub show_now_playing: bool,
    pub animations_enabled: bool,
    pub high_contrast_mode: bool,
    pub reduced_motion: bool,
    /// 0 - 100
    pub brightness: f32,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            compact_mode: false,
            show_visualizer: true,
            show_now_playing: true,
            animations_enabled: true,
            high_contrast_mode: false,
            reduced_motion: false,
            brightness: 50.0,
        }
    }
}

impl UiPreferences {
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_compact_mode(&mut self, compact: bool) {
        self.compact_mode = compact;
    }

    pub fn set_show_visualizer(&mut self, show: bool) {
        self.show_visualizer = show;
    }

    pub fn set_show_now_playing(&mut self, show: bool) {
        self.show_now_playing = show;
    }

    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.animations_enabled = enabled;
    }

    pub fn set_high_contrast_mode(&mut self, enabled: bool) {
        self.high_contrast_mode = enabled;
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 100.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segue_analysis::TransitionType;

    fn record(track_id: &str) -> TransitionRecord {
        TransitionRecord {
            track_id: track_id.to_string(),
            timestamp: 1,
            transition_type: TransitionType::EnergyMix,
            compatibility_score: 0.8,
            fx_applied: vec!["Delay Throw".to_string()],
        }
    }

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.audio.volume, 100.0);
        assert_eq!(prefs.visualizer.kind, VisualizerType::Butterchurn);
        assert_eq!(prefs.crossfade.crossfade_duration, 5.0);
        assert_eq!(prefs.auto_dj.notch_frequency, 60.0);
        assert!(!prefs.auto_dj.enabled);
        assert_eq!(prefs.ui.theme, Theme::Dark);
    }

    #[test]
    fn test_setters_clamp() {
        let mut prefs = Preferences::default();
        prefs.audio.set_volume(150.0);
        prefs.audio.set_makeup_gain(0.1);
        prefs.audio.set_normalization_percent(10.0);
        prefs.visualizer.set_bar_count(1000);
        prefs.visualizer.set_sensitivity(0.0);
        prefs.playback.set_skip_back_seconds(90.0);
        prefs.auto_dj.set_notch_frequency(500.0);
        prefs.auto_dj.set_duration(1.0);
        prefs.ui.set_brightness(-5.0);

        assert_eq!(prefs.audio.volume, 100.0);
        assert_eq!(prefs.audio.makeup_gain, 0.5);
        assert_eq!(prefs.audio.normalization_percent, 70.0);
        assert_eq!(prefs.visualizer.bar_count, 256);
        assert_eq!(prefs.visualizer.sensitivity, 1.0);
        assert_eq!(prefs.playback.skip_back_seconds, 60.0);
        assert_eq!(prefs.auto_dj.notch_frequency, 200.0);
        assert_eq!(prefs.auto_dj.duration, 4.0);
        assert_eq!(prefs.ui.brightness, 0.0);
    }

    #[test]
    fn test_playback_rate_snaps() {
        let mut playback = PlaybackPreferences::default();
        playback.set_default_playback_rate(1.3);
        assert_eq!(playback.default_playback_rate, 1.25);
        playback.set_default_playback_rate(5.0);
        assert_eq!(playback.default_playback_rate, 2.0);
        playback.set_default_playback_rate(0.0);
        assert_eq!(playback.default_playback_rate, 0.25);
    }

    #[test]
    fn test_crossfade_duration_and_enabled_are_coupled() {
        let mut crossfade = CrossfadePreferences::default();
        crossfade.set_duration(0.0);
        assert!(!crossfade.crossfade_enabled);

        crossfade.set_enabled(true);
        assert_eq!(crossfade.crossfade_duration, 1.0);

        crossfade.set_duration(45.0);
        assert_eq!(crossfade.crossfade_duration, 30.0);
        assert!(crossfade.crossfade_enabled);

        crossfade.set_enabled(false);
        assert_eq!(crossfade.crossfade_duration, 0.0);
    }

    #[test]
    fn test_crossfade_timing_helpers() {
        let mut crossfade = CrossfadePreferences::default();
        assert_eq!(crossfade.effective_duration(), 6.0);
        crossfade.set_network_latency_mode(LatencyMode::Manual);
        crossfade.set_manual_latency_offset(2.0);
        assert_eq!(crossfade.effective_latency(), 2.0);

        crossfade.set_duration(0.4);
        assert_eq!(crossfade.sustain(), 0.2);
        assert_eq!(crossfade.fade_out(), 0.4);
        crossfade.set_duration(12.0);
        assert_eq!(crossfade.sustain(), 1.0);
        assert_eq!(crossfade.fade_out(), 24.0);
    }

    #[test]
    fn test_color_scheme_targets_active_visualizer() {
        let mut visualizer = VisualizerPreferences::default();
        assert!(!visualizer.set_color_scheme("solid"));

        visualizer.set_kind(VisualizerType::Frequency);
        assert!(visualizer.set_color_scheme("albumArt"));
        assert_eq!(
            visualizer.frequency_analyzer.color_scheme,
            FrequencyColorScheme::AlbumArt
        );
        assert!(!visualizer.set_color_scheme("stereo"));

        visualizer.set_kind(VisualizerType::Waveform);
        assert!(visualizer.set_color_scheme("stereo"));
        assert_eq!(visualizer.wave_surfer.color_scheme, WaveColorScheme::Stereo);

        visualizer.set_opacity(0.0);
        assert_eq!(visualizer.wave_surfer.opacity, 0.1);
        assert_eq!(visualizer.butterchurn.opacity, 0.6);
    }

    #[test]
    fn test_transition_history_newest_first_and_capped() {
        let mut auto_dj = AutoDjPreferences::default();
        for i in 0..(TRANSITION_HISTORY_LIMIT + 5) {
            auto_dj.record_transition(record(&format!("t{}", i)));
        }
        assert_eq!(auto_dj.transition_history.len(), TRANSITION_HISTORY_LIMIT);
        assert_eq!(auto_dj.transition_history[0].track_id, "t104");

        auto_dj.clear_transition_history();
        assert!(auto_dj.transition_history.is_empty());
    }

    #[test]
    fn test_config_update_mapping() {
        let mut auto_dj = AutoDjPreferences::default();
        auto_dj.set_use_notch_filter(false);
        auto_dj.set_notch_frequency(80.0);
        let update = auto_dj.to_config_update();
        assert_eq!(update.use_notch_filter, Some(false));
        assert_eq!(update.notch_frequency, Some(80.0));
        assert_eq!(update.min_crossfade_duration, None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["autoDJ"]["notchFrequency"], 60.0);
        assert_eq!(json["visualizer"]["type"], "butterchurn");
        assert_eq!(json["crossfade"]["networkLatencyMode"], "auto");
        assert!(json.get("runtime").is_none());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"audio":{"volume":40},"ui":{"theme":"light"}}"#).unwrap();
        assert_eq!(prefs.audio.volume, 40.0);
        assert!(prefs.audio.enable_normalization);
        assert_eq!(prefs.ui.theme, Theme::Light);
        assert_eq!(prefs.crossfade, CrossfadePreferences::default());
    }

    #[test]
    fn test_reset_all() {
        let mut prefs = Preferences::default();
        prefs.audio.set_muted(true);
        prefs.runtime.busy = true;
        prefs.reset_all();
        assert_eq!(prefs, Preferences::default());
    }
}
