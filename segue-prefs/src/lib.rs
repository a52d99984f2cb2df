//! Preferences for Segue
//!
//! Holds the user's audio, visualizer, playback, crossfade, Auto-DJ and
//! UI settings, persists them as JSON and republishes changes as named
//! events.

mod bridge;
mod bus;
mod error;
mod persist;
mod prefs;
mod store;

pub use bridge::SettingsBridge;
pub use bus::{
    AudioEventDetail, AutoDjEventDetail, ButterchurnDetail, CrossfadeEventDetail, EventBus,
    PreferenceEvent, VisualizerEventDetail, VisualizerLayerDetail, AUDIO_EVENT, AUTODJ_EVENT,
    CROSSFADE_EVENT, FULL_EVENT, PLAYBACK_EVENT, UI_EVENT, VISUALIZER_EVENT,
};
pub use error::PrefsError;
pub use persist::PERSISTED_HISTORY_LIMIT;
pub use prefs::{
    AdvancedVisualizerPreferences, AudioPreferences, AutoDjPreferences, ButterchurnPreferences,
    CrossfadePreferences, CrossfadeRuntime, FrequencyAnalyzerPreferences, FrequencyColorScheme,
    LatencyMode, PlaybackPreferences, Preferences, SitbackPreferences, Theme, ThreeDRenderer,
    ThreeJsPreferences, UiPreferences, VisualizerPreferences, VisualizerType, WaveColorScheme,
    WaveSurferPreferences, PLAYBACK_RATES, TRANSITION_HISTORY_LIMIT,
};
pub use store::{PreferencesStore, SubscriptionId};
