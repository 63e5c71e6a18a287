//! Subscription types for state change events.

use crate::fragment::StateMap;
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: SubscriptionFilter::all(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionFilter {
    /// Only events touching one of these keys (None = any key).
    pub keys: Option<Vec<String>>,

    /// Include application writes.
    pub include_pushes: bool,

    /// Include state restored from back/forward navigation.
    pub include_restores: bool,
}

impl SubscriptionFilter {
    /// Everything.
    pub fn all() -> Self {
        Self {
            keys: None,
            include_pushes: true,
            include_restores: true,
        }
    }

    /// Only navigation restores, which is what views usually re-render on.
    pub fn restores() -> Self {
        Self {
            include_restores: true,
            ..Default::default()
        }
    }

    /// Pushes and restores that change one of `keys`.
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            keys: Some(keys),
            ..Self::all()
        }
    }
}

/// Events emitted to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// The application wrote state and a history entry was pushed.
    Pushed {
        fragment: String,
        /// Keys added, removed or changed by the write.
        changed: Vec<String>,
    },

    /// Navigation replaced the in-memory state.
    Restored {
        fragment: String,
        state: StateMap,
        changed: Vec<String>,
    },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StateEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StateEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StateEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StateEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered.
    pub fn drain(&self) -> Vec<StateEvent> {
        self.receiver.try_iter().collect()
    }
}
