//! Named preference event channels

use crate::prefs::{
    AudioPreferences, AutoDjPreferences, CrossfadePreferences, PlaybackPreferences, Preferences,
    UiPreferences, VisualizerPreferences, VisualizerType,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

pub const CROSSFADE_EVENT: &str = "preferences:crossfade";
pub const VISUALIZER_EVENT: &str = "preferences:visualizer";
pub const AUTODJ_EVENT: &str = "preferences:autoDJ";
pub const AUDIO_EVENT: &str = "preferences:audio";
pub const PLAYBACK_EVENT: &str = "preferences:playback";
pub const UI_EVENT: &str = "preferences:ui";
pub const FULL_EVENT: &str = "preferences:full";

/// Events queued per subscriber before new ones are dropped
const CHANNEL_CAPACITY: usize = 1024;

/// Crossfade settings carried by `preferences:crossfade`
pub type CrossfadeEventDetail = CrossfadePreferences;
/// Audio settings carried by `preferences:audio`
pub type AudioEventDetail = AudioPreferences;

/// Opacity and color scheme of one visualizer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerLayerDetail {
    pub opacity: f32,
    pub color_scheme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButterchurnDetail {
    pub preset: String,
    pub opacity: f32,
}

/// Visualizer settings carried by `preferences:visualizer`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerEventDetail {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: VisualizerType,
    pub sensitivity: f32,
    pub bar_count: u32,
    pub smoothing: f32,
    pub butterchurn: ButterchurnDetail,
    pub frequency_analyzer: VisualizerLayerDetail,
    pub wave_surfer: VisualizerLayerDetail,
}

impl From<&VisualizerPreferences> for VisualizerEventDetail {
    fn from(v: &VisualizerPreferences) -> Self {
        Self {
            enabled: v.enabled,
            kind: v.kind,
            sensitivity: v.sensitivity,
            bar_count: v.bar_count,
            smoothing: v.smoothing,
            butterchurn: ButterchurnDetail {
                preset: v.butterchurn.preset.clone(),
                opacity: v.butterchurn.opacity,
            },
            frequency_analyzer: VisualizerLayerDetail {
                opacity: v.frequency_analyzer.opacity,
                color_scheme: scheme_name(&v.frequency_analyzer.color_scheme),
            },
            wave_surfer: VisualizerLayerDetail {
                opacity: v.wave_surfer.opacity,
                color_scheme: scheme_name(&v.wave_surfer.color_scheme),
            },
        }
    }
}

/// Serialized name of a unit enum variant
fn scheme_name<T: Serialize>(scheme: &T) -> String {
    match serde_json::to_value(scheme) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Auto-DJ settings carried by `preferences:autoDJ`, without the history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDjEventDetail {
    pub enabled: bool,
    pub duration: f32,
    pub prefer_harmonic: bool,
    pub prefer_energy_match: bool,
    pub use_notch_filter: bool,
    pub notch_frequency: f32,
}

impl From<&AutoDjPreferences> for AutoDjEventDetail {
    fn from(a: &AutoDjPreferences) -> Self {
        Self {
            enabled: a.enabled,
            duration: a.duration,
            prefer_harmonic: a.prefer_harmonic,
            prefer_energy_match: a.prefer_energy_match,
            use_notch_filter: a.use_notch_filter,
            notch_frequency: a.notch_frequency,
        }
    }
}

/// A preference change broadcast to interested components
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceEvent {
    Crossfade(CrossfadeEventDetail),
    Visualizer(VisualizerEventDetail),
    AutoDj(AutoDjEventDetail),
    Audio(AudioEventDetail),
    Playback(PlaybackPreferences),
    Ui(UiPreferences),
    Full(Box<Preferences>),
}

impl PreferenceEvent {
    /// Channel this event is published on
    pub fn name(&self) -> &'static str {
        match self {
            PreferenceEvent::Crossfade(_) => CROSSFADE_EVENT,
            PreferenceEvent::Visualizer(_) => VISUALIZER_EVENT,
            PreferenceEvent::AutoDj(_) => AUTODJ_EVENT,
            PreferenceEvent::Audio(_) => AUDIO_EVENT,
            PreferenceEvent::Playback(_) => PLAYBACK_EVENT,
            PreferenceEvent::Ui(_) => UI_EVENT,
            PreferenceEvent::Full(_) => FULL_EVENT,
        }
    }
}

/// Fan-out of preference events by channel name
///
/// Delivery is fire-and-forget: a full subscriber misses the event and
/// a dropped receiver is forgotten on the next dispatch.
#[derive(Default)]
pub struct EventBus {
    channels: Mutex<HashMap<&'static str, Vec<Sender<PreferenceEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on one channel, e.g. `CROSSFADE_EVENT`
    pub fn subscribe(&self, name: &'static str) -> Receiver<PreferenceEvent> {
        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        self.channels.lock().entry(name).or_default().push(tx);
        rx
    }

    /// Publish an event, returning how many subscribers received it
    pub fn dispatch(&self, event: PreferenceEvent) -> usize {
        let name = event.name();
        let mut channels = self.channels.lock();
        let Some(senders) = channels.get_mut(name) else {
            return 0;
        };

        let mut delivered = 0;
        senders.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(event = name, "Subscriber queue full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        delivered
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channels.lock().get(name).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_only_named_channel() {
        let bus = EventBus::new();
        let crossfade = bus.subscribe(CROSSFADE_EVENT);
        let ui = bus.subscribe(UI_EVENT);

        let delivered = bus.dispatch(PreferenceEvent::Crossfade(CrossfadePreferences::default()));
        assert_eq!(delivered, 1);
        assert_eq!(
            crossfade.try_recv().unwrap(),
            PreferenceEvent::Crossfade(CrossfadePreferences::default())
        );
        assert!(ui.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe(AUDIO_EVENT);
        drop(bus.subscribe(AUDIO_EVENT));
        assert_eq!(bus.subscriber_count(AUDIO_EVENT), 2);

        assert_eq!(bus.dispatch(PreferenceEvent::Audio(AudioPreferences::default())), 1);
        assert_eq!(bus.subscriber_count(AUDIO_EVENT), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.dispatch(PreferenceEvent::Ui(UiPreferences::default())), 0);
    }

    #[test]
    fn test_visualizer_detail() {
        let detail = VisualizerEventDetail::from(&VisualizerPreferences::default());
        assert_eq!(detail.butterchurn.preset, "Good");
        assert_eq!(detail.frequency_analyzer.color_scheme, "spectrum");
        assert_eq!(detail.wave_surfer.color_scheme, "albumArt");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["type"], "butterchurn");
        assert_eq!(json["barCount"], 64);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            PreferenceEvent::AutoDj(AutoDjEventDetail::from(&AutoDjPreferences::default())).name(),
            "preferences:autoDJ"
        );
        assert_eq!(
            PreferenceEvent::Full(Box::default()).name(),
            "preferences:full"
        );
    }
}
