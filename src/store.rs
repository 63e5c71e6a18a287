//! The hash state store.

use crate::config::HashStateConfig;
use crate::error::Result;
use crate::fragment::{self, StateMap};
use crate::host::{ListenerId, NavigationHistory, NavigationNotifier, Scheduler};
use crate::subscriptions::{
    SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

struct Inner {
    config: HashStateConfig,

    /// In-memory state. Source of truth for application writes.
    state: RwLock<StateMap>,

    /// Outstanding self-initiated pushes. Notifications are ignored while
    /// this is non-zero; each push releases its token on a later turn.
    suppress: AtomicUsize,

    /// Held from a write's mutation until its fragment reaches history, so
    /// concurrent writers land in history in the order they changed state.
    push_lock: Mutex<()>,

    history: Arc<dyn NavigationHistory>,
    notifier: Arc<dyn NavigationNotifier>,
    listener: ListenerId,
    scheduler: Arc<dyn Scheduler>,
    subscriptions: SubscriptionManager,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.notifier.unsubscribe(self.listener);
    }
}

/// Key-value state mirrored into the navigable URL fragment.
///
/// Writes go to the in-memory state first and are then pushed to history as
/// one new entry. Navigation the store did not cause (back/forward, address
/// bar edits) replaces the in-memory state with the parsed fragment.
///
/// Cloning gives another handle to the same store.
#[derive(Clone)]
pub struct HashStateStore {
    inner: Arc<Inner>,
}

impl HashStateStore {
    /// Attach a store to a host implementing all three contracts.
    pub fn attach<H>(host: Arc<H>, config: HashStateConfig) -> Self
    where
        H: NavigationHistory + NavigationNotifier + Scheduler + 'static,
    {
        let history: Arc<dyn NavigationHistory> = host.clone();
        let notifier: Arc<dyn NavigationNotifier> = host.clone();
        let scheduler: Arc<dyn Scheduler> = host;
        Self::new(history, notifier, scheduler, config)
    }

    /// Create a store and register its change listener with `notifier`.
    ///
    /// The listener is removed when the last handle is dropped.
    pub fn new(
        history: Arc<dyn NavigationHistory>,
        notifier: Arc<dyn NavigationNotifier>,
        scheduler: Arc<dyn Scheduler>,
        config: HashStateConfig,
    ) -> Self {
        let initial = if config.restore_on_attach {
            fragment::parse(&history.read())
        } else {
            StateMap::new()
        };

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            // Weak so the host's listener list does not keep the store alive.
            let weak = weak.clone();
            let listener = notifier.subscribe(Arc::new(move |text: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_navigation(text);
                }
            }));

            Inner {
                config,
                state: RwLock::new(initial),
                suppress: AtomicUsize::new(0),
                push_lock: Mutex::new(()),
                history,
                notifier,
                listener,
                scheduler,
                subscriptions: SubscriptionManager::new(),
            }
        });

        Self { inner }
    }

    // --- Writes ---

    /// Set one key and push a history entry.
    pub fn set_value(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.update(|state| {
            state.insert(key, value);
        });
    }

    /// Merge several pairs and push a single history entry.
    pub fn set_values<I, K, V>(&self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values: Vec<(String, String)> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.update(|state| state.extend(values));
    }

    /// Remove a key if present and push a history entry.
    pub fn unset_value(&self, key: &str) {
        self.update(|state| {
            state.remove(key);
        });
    }

    /// Replace the whole state and push a history entry.
    ///
    /// The store keeps its own copy; the caller's map stays independent.
    pub fn replace_state(&self, state: &StateMap) {
        let replacement = state.clone();
        self.update(|current| *current = replacement);
    }

    // --- Reads ---

    /// Value of `key` in the live fragment.
    ///
    /// The fragment is read and parsed on every call, so this reflects what
    /// the address bar shows rather than the cached state.
    pub fn get_value(&self, key: &str) -> Option<String> {
        fragment::lookup(&self.inner.history.read(), key)
    }

    /// Whole state parsed from the live fragment.
    pub fn get_state(&self) -> StateMap {
        fragment::parse(&self.inner.history.read())
    }

    /// Full current location, verbatim.
    pub fn current_location(&self) -> String {
        self.inner.history.location()
    }

    /// Copy of the in-memory state.
    pub fn cached_state(&self) -> StateMap {
        self.inner.state.read().clone()
    }

    /// In-memory state serialized as fragment text.
    pub fn fragment(&self) -> String {
        fragment::serialize(&self.inner.state.read())
    }

    /// Whether a self-initiated push is still inside its suppression window.
    pub fn is_suppressing(&self) -> bool {
        self.inner.suppress.load(Ordering::SeqCst) > 0
    }

    pub fn config(&self) -> &HashStateConfig {
        &self.inner.config
    }

    // --- Subscriptions ---

    /// Subscribe to state events.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.inner.subscriptions.subscribe(config)
    }

    /// Subscribe to all events with the configured buffer size.
    pub fn subscribe_all(&self) -> SubscriptionHandle {
        self.subscribe(SubscriptionConfig {
            buffer_size: self.inner.config.subscription_buffer,
            ..Default::default()
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.inner.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.subscription_count()
    }

    // --- Internal ---

    /// Mutate the in-memory state, then push it to history.
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut StateMap),
    {
        let _push = self.inner.push_lock.lock();

        let (text, changed) = {
            let mut state = self.inner.state.write();
            let before = state.clone();
            mutate(&mut *state);
            (
                fragment::serialize(&state),
                fragment::changed_keys(&before, &state),
            )
        };

        Inner::push(&self.inner, &text);
        self.inner.subscriptions.broadcast_pushed(&text, changed);
    }
}

impl Inner {
    /// Write `text` to history with notifications suppressed until a later
    /// event-loop turn. No state lock may be held here: synchronous hosts
    /// call back into `on_navigation` from inside `write`. Callers hold
    /// `push_lock`, so a listener must not write to the store synchronously.
    fn push(this: &Arc<Self>, text: &str) {
        this.suppress.fetch_add(1, Ordering::SeqCst);
        debug!(fragment = %text, "pushing state to history");
        this.history.write(text);

        let weak: Weak<Self> = Arc::downgrade(this);
        this.scheduler.defer(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.suppress.fetch_sub(1, Ordering::SeqCst);
            }
        }));
    }

    fn on_navigation(&self, text: &str) {
        if self.suppress.load(Ordering::SeqCst) > 0 {
            return;
        }

        let restored = fragment::parse(text);
        let changed = {
            let mut state = self.state.write();
            let changed = fragment::changed_keys(&state, &restored);
            *state = restored.clone();
            changed
        };

        debug!(fragment = %text, changed = changed.len(), "state restored from navigation");
        self.subscriptions.broadcast_restored(text, restored, changed);
    }
}
