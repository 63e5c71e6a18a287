//! Host environment contracts.
//!
//! The store never touches a browser directly. It talks to three
//! collaborators:
//! - a navigable history holding the current fragment text,
//! - a notifier reporting every fragment change (back/forward, address bar
//!   edits, and the store's own writes),
//! - a scheduler running deferred work on a later event-loop turn.
//!
//! [`MemoryHost`] implements all three in-process.

mod memory;

pub use memory::{EventLoop, MemoryHost};

use std::sync::Arc;

/// Callback receiving the new fragment text (without `#`).
pub type NavigationHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Registration returned by [`NavigationNotifier::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// The navigable fragment and the document location.
pub trait NavigationHistory: Send + Sync {
    /// Current fragment text, without the `#`.
    fn read(&self) -> String;

    /// Replace the fragment, appending a history entry.
    fn write(&self, fragment: &str);

    /// Full current location, verbatim.
    fn location(&self) -> String;
}

/// Source of fragment change notifications.
pub trait NavigationNotifier: Send + Sync {
    fn subscribe(&self, handler: NavigationHandler) -> ListenerId;

    /// Remove a handler. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);
}

/// Task scheduling primitive of the host event loop.
pub trait Scheduler: Send + Sync {
    /// Run `task` on a later turn, never inside the current call.
    fn defer(&self, task: Task);
}
