//! Subscriptions to state changes.
//!
//! UI components that render from the store subscribe here to learn when
//! the state moved underneath them:
//! - application writes (`Pushed`)
//! - back/forward navigation (`Restored`)
//!
//! Each subscriber gets a bounded buffer; one that falls behind is dropped.
//!
//! # Example
//!
//! ```ignore
//! let handle = store.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::restores(),
//!     ..Default::default()
//! });
//!
//! for event in handle.drain() {
//!     if let StateEvent::Restored { state, .. } = event {
//!         view.render(&state);
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StateEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
