//! Shared preference state with synchronous change notification

use crate::prefs::Preferences;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Preferences) + Send + Sync>;

/// Preference state that notifies listeners after every update
///
/// Listeners run on the updating thread, after the write lock is
/// released, so they may read the store or unsubscribe themselves.
/// Updates publish one at a time, so listeners see snapshots in the
/// order the writes happened.
pub struct PreferencesStore {
    state: RwLock<Preferences>,
    /// Held from the write until every listener has run
    publish: ReentrantMutex<()>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl Default for PreferencesStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl PreferencesStore {
    pub fn new(initial: Preferences) -> Self {
        Self {
            state: RwLock::new(initial),
            publish: ReentrantMutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn snapshot(&self) -> Preferences {
        self.state.read().clone()
    }

    /// Mutate the state and publish the result
    pub fn update<F>(&self, f: F) -> Preferences
    where
        F: FnOnce(&mut Preferences),
    {
        let _publishing = self.publish.lock();
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };
        self.notify(&snapshot);
        snapshot
    }

    /// Swap in a whole new state, e.g. after loading from disk
    pub fn replace(&self, prefs: Preferences) {
        self.update(|state| *state = prefs);
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Preferences) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn notify(&self, snapshot: &Preferences) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}
