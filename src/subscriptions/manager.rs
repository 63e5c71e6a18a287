//! Subscription manager for broadcasting state events.

use crate::error::{HashStateError, Result};
use crate::fragment::StateMap;
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::types::{
    DropReason, StateEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<StateEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: StateEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn matches(&self, event: &StateEvent) -> bool {
        let filter = &self.config.filter;
        let changed = match event {
            StateEvent::Pushed { changed, .. } if filter.include_pushes => changed,
            StateEvent::Restored { changed, .. } if filter.include_restores => changed,
            _ => return false,
        };

        match filter.keys {
            Some(ref keys) => changed.iter().any(|k| keys.contains(k)),
            None => true,
        }
    }
}

/// Manages subscriptions and broadcasts events.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription. Events after this call are delivered.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let sub = self
            .subscriptions
            .write()
            .remove(&id)
            .ok_or(HashStateError::SubscriptionNotFound(id))?;

        // Best effort
        let _ = sub.sender.try_send(StateEvent::Dropped {
            reason: DropReason::Unsubscribed,
        });
        Ok(())
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Broadcast an application write.
    pub fn broadcast_pushed(&self, fragment: &str, changed: Vec<String>) {
        self.broadcast(StateEvent::Pushed {
            fragment: fragment.to_string(),
            changed,
        });
    }

    /// Broadcast state restored from navigation.
    pub fn broadcast_restored(&self, fragment: &str, state: StateMap, changed: Vec<String>) {
        self.broadcast(StateEvent::Restored {
            fragment: fragment.to_string(),
            state,
            changed,
        });
    }

    /// Drops subscribers that fail to receive.
    ///
    /// The `BufferOverflow` notice goes into the same full channel and is
    /// normally lost; a dropped subscriber sees its channel disconnect once
    /// the buffered events are drained.
    fn broadcast(&self, event: StateEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if sub.matches(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    warn!(subscription = id.0, "dropping slow subscriber");
                    let _ = sub.sender.try_send(StateEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
