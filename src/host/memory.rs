//! In-process host: history stack, change listeners and a cooperative
//! event loop.

use super::{
    ListenerId, NavigationHandler, NavigationHistory, NavigationNotifier, Scheduler, Task,
};
use crate::config::{DispatchMode, HashStateConfig};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Cooperative event loop with a task queue and a microtask queue.
///
/// Microtasks queued while running are drained before the next task, the
/// way browsers order promise callbacks against timers.
#[derive(Default)]
pub struct EventLoop {
    microtasks: Mutex<VecDeque<Task>>,
    tasks: Mutex<VecDeque<Task>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_task(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    pub fn queue_microtask(&self, task: Task) {
        self.microtasks.lock().push_back(task);
    }

    /// Number of queued tasks and microtasks.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len() + self.microtasks.lock().len()
    }

    fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            // Guard released before the callback runs; it may queue more.
            let next = self.microtasks.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Run one turn: pending microtasks, one task, then its microtasks.
    ///
    /// Returns the number of callbacks run.
    pub fn turn(&self) -> usize {
        let mut ran = self.drain_microtasks();
        let next = self.tasks.lock().pop_front();
        if let Some(task) = next {
            task();
            ran += 1;
            ran += self.drain_microtasks();
        }
        ran
    }

    /// Run turns until both queues are empty.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.turn();
            if ran == 0 {
                trace!(callbacks = total, "event loop idle");
                return total;
            }
            total += ran;
        }
    }
}

struct HistoryStack {
    entries: Vec<String>,
    cursor: usize,
}

impl HistoryStack {
    fn current(&self) -> &str {
        &self.entries[self.cursor]
    }
}

/// Browser-like host kept entirely in memory.
///
/// Writing the fragment that is already current is ignored: no entry, no
/// notification. Writing a new one drops any forward entries, the same as
/// following a link after going back.
pub struct MemoryHost {
    base_url: String,
    history: RwLock<HistoryStack>,
    listeners: RwLock<Vec<(ListenerId, NavigationHandler)>>,
    next_listener: AtomicU64,
    event_loop: EventLoop,
    dispatch: DispatchMode,
}

impl MemoryHost {
    /// Create a host at `base_url` with an empty fragment.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_fragment(base_url, "")
    }

    /// Create a host whose first history entry carries `fragment`, as when
    /// a bookmarked URL is opened.
    pub fn with_fragment(base_url: impl Into<String>, fragment: &str) -> Self {
        let mut base_url = base_url.into();
        if let Some(pos) = base_url.find('#') {
            base_url.truncate(pos);
        }
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

        Self {
            base_url,
            history: RwLock::new(HistoryStack {
                entries: vec![fragment.to_string()],
                cursor: 0,
            }),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            event_loop: EventLoop::new(),
            dispatch: DispatchMode::default(),
        }
    }

    /// Create a host at `base_url` using the dispatch mode of `config`.
    pub fn from_config(base_url: impl Into<String>, config: &HashStateConfig) -> Self {
        Self::new(base_url).with_dispatch(config.dispatch)
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn dispatch(&self) -> DispatchMode {
        self.dispatch
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Shorthand for `event_loop().run_until_idle()`.
    pub fn run_until_idle(&self) -> usize {
        self.event_loop.run_until_idle()
    }

    /// Number of history entries, including the initial one.
    pub fn history_len(&self) -> usize {
        self.history.read().entries.len()
    }

    /// Index of the current entry.
    pub fn cursor(&self) -> usize {
        self.history.read().cursor
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.history.read().entries.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Browser back button. Returns false at the first entry.
    pub fn back(&self) -> bool {
        let fragment = {
            let mut history = self.history.write();
            if history.cursor == 0 {
                return false;
            }
            history.cursor -= 1;
            history.current().to_string()
        };
        trace!(fragment = %fragment, "back");
        self.notify(fragment);
        true
    }

    /// Browser forward button. Returns false at the last entry.
    pub fn forward(&self) -> bool {
        let fragment = {
            let mut history = self.history.write();
            if history.cursor + 1 >= history.entries.len() {
                return false;
            }
            history.cursor += 1;
            history.current().to_string()
        };
        trace!(fragment = %fragment, "forward");
        self.notify(fragment);
        true
    }

    /// A fragment change not made through [`NavigationHistory::write`],
    /// e.g. the user editing the address bar.
    pub fn navigate_external(&self, fragment: &str) {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if self.push(fragment) {
            self.notify(fragment.to_string());
        }
    }

    /// Append an entry unless `fragment` is already current.
    fn push(&self, fragment: &str) -> bool {
        let mut history = self.history.write();
        if history.current() == fragment {
            return false;
        }
        let keep = history.cursor + 1;
        history.entries.truncate(keep);
        history.entries.push(fragment.to_string());
        history.cursor = keep;
        true
    }

    fn notify(&self, fragment: String) {
        let listeners: Vec<NavigationHandler> = self
            .listeners
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        match self.dispatch {
            DispatchMode::Synchronous => {
                for listener in &listeners {
                    listener(&fragment);
                }
            }
            DispatchMode::Microtask => {
                self.event_loop.queue_microtask(Box::new(move || {
                    for listener in &listeners {
                        listener(&fragment);
                    }
                }));
            }
        }
    }
}

impl NavigationHistory for MemoryHost {
    fn read(&self) -> String {
        self.history.read().current().to_string()
    }

    fn write(&self, fragment: &str) {
        if self.push(fragment) {
            trace!(fragment = %fragment, "fragment written");
            self.notify(fragment.to_string());
        }
    }

    fn location(&self) -> String {
        let history = self.history.read();
        if history.current().is_empty() {
            self.base_url.clone()
        } else {
            format!("{}#{}", self.base_url, history.current())
        }
    }
}

impl NavigationNotifier for MemoryHost {
    fn subscribe(&self, handler: NavigationHandler) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.write().retain(|(listener, _)| *listener != id);
    }
}

impl Scheduler for MemoryHost {
    fn defer(&self, task: Task) {
        self.event_loop.queue_task(task);
    }
}
