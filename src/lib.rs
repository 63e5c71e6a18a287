//! # Hash State
//!
//! Application state kept as `key=value` pairs in the URL fragment, so views
//! are bookmarkable and follow the browser's back/forward buttons.
//!
//! ## Core Concepts
//!
//! - **Store**: the in-memory state plus the history wiring
//! - **Fragment**: `key=value&key=value` text, unescaped
//! - **Host**: history, change notification and scheduling contracts
//! - **Subscriptions**: events for views that render from the state
//!
//! ## Example
//!
//! ```ignore
//! use hash_state::{HashStateConfig, HashStateStore, MemoryHost};
//! use std::sync::Arc;
//!
//! let host = Arc::new(MemoryHost::new("http://localhost/app"));
//! let store = HashStateStore::attach(host.clone(), HashStateConfig::default());
//!
//! store.set_values([("file", "main.rs"), ("line", "42")]);
//! assert_eq!(store.current_location(), "http://localhost/app#file=main.rs&line=42");
//!
//! host.run_until_idle();
//! host.back();
//! assert!(store.cached_state().is_empty());
//! ```

pub mod config;
pub mod error;
pub mod fragment;
pub mod host;
pub mod store;
pub mod subscriptions;

// Re-exports
pub use config::{DispatchMode, HashStateConfig};
pub use error::{HashStateError, Result};
pub use fragment::StateMap;
pub use host::{
    EventLoop, ListenerId, MemoryHost, NavigationHandler, NavigationHistory, NavigationNotifier,
    Scheduler, Task,
};
pub use store::HashStateStore;
pub use subscriptions::{
    DropReason, StateEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
