//! Turns preference store updates into per-category bus events

use crate::bus::{AutoDjEventDetail, CrossfadeEventDetail, EventBus, PreferenceEvent, VisualizerEventDetail};
use crate::prefs::Preferences;
use crate::store::{PreferencesStore, SubscriptionId};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Watches the store and publishes one event per changed category
pub struct SettingsBridge {
    store: Arc<PreferencesStore>,
    bus: Arc<EventBus>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl SettingsBridge {
    pub fn new(store: Arc<PreferencesStore>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            subscription: Mutex::new(None),
        }
    }

    /// Start watching the store
    ///
    /// The current state is taken as the baseline, so the very first
    /// update is compared against it. Returns false if already running.
    pub fn init(&self) -> bool {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            warn!("Settings bridge already initialized");
            return false;
        }

        info!("Initializing settings event delegation");
        let previous = Arc::new(Mutex::new(self.store.snapshot()));
        let bus = Arc::clone(&self.bus);
        let id = self.store.subscribe(move |state| {
            let mut previous = previous.lock();
            publish_changes(&bus, &previous, state);
            *previous = state.clone();
        });
        *subscription = Some(id);
        true
    }

    /// Stop watching; `init` may be called again afterwards
    pub fn teardown(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.store.unsubscribe(id);
            debug!("Settings bridge torn down");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Publish the complete current state on `preferences:full`
    pub fn dispatch_full(&self) -> usize {
        let delivered = self
            .bus
            .dispatch(PreferenceEvent::Full(Box::new(self.store.snapshot())));
        debug!(delivered, "Dispatched full preferences state");
        delivered
    }

    pub fn current_preferences(&self) -> Preferences {
        self.store.snapshot()
    }

    pub fn crossfade_preferences(&self) -> CrossfadeEventDetail {
        self.store.snapshot().crossfade
    }

    pub fn visualizer_preferences(&self) -> VisualizerEventDetail {
        VisualizerEventDetail::from(&self.store.snapshot().visualizer)
    }

    pub fn autodj_preferences(&self) -> AutoDjEventDetail {
        AutoDjEventDetail::from(&self.store.snapshot().auto_dj)
    }
}

impl Drop for SettingsBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Categories compare by their serialized form
fn changed<T: Serialize>(current: &T, previous: &T) -> bool {
    match (serde_json::to_value(current), serde_json::to_value(previous)) {
        (Ok(a), Ok(b)) => a != b,
        _ => true,
    }
}

fn publish_changes(bus: &EventBus, previous: &Preferences, state: &Preferences) {
    if changed(&state.crossfade, &previous.crossfade) {
        bus.dispatch(PreferenceEvent::Crossfade(state.crossfade.clone()));
        debug!(detail = ?state.crossfade, "Dispatched crossfade preferences change");
    }
    if changed(&state.visualizer, &previous.visualizer) {
        let detail = VisualizerEventDetail::from(&state.visualizer);
        debug!(?detail, "Dispatched visualizer preferences change");
        bus.dispatch(PreferenceEvent::Visualizer(detail));
    }
    if changed(&state.auto_dj, &previous.auto_dj) {
        let detail = AutoDjEventDetail::from(&state.auto_dj);
        debug!(?detail, "Dispatched autoDJ preferences change");
        bus.dispatch(PreferenceEvent::AutoDj(detail));
    }
    if changed(&state.audio, &previous.audio) {
        bus.dispatch(PreferenceEvent::Audio(state.audio.clone()));
        debug!("Dispatched audio preferences change");
    }
    if changed(&state.playback, &previous.playback) {
        bus.dispatch(PreferenceEvent::Playback(state.playback.clone()));
        debug!("Dispatched playback preferences change");
    }
    if changed(&state.ui, &previous.ui) {
        bus.dispatch(PreferenceEvent::Ui(state.ui.clone()));
        debug!("Dispatched UI preferences change");
    }
}
