// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Observer slots with typed subscription handles
//!
//! A [`Signal`] keeps a list of handlers. Every `connect` returns a
//! [`Subscription`] that removes exactly that handler when passed to
//! `disconnect`, leaving other subscribers in place.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle identifying one connected handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A broadcast event slot
pub struct Signal<T> {
    next_id: AtomicU64,
    slots: Mutex<Vec<(Subscription, Slot<T>)>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(Vec::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Vec<(Subscription, Slot<T>)>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connects a handler and returns the handle that disconnects it
    pub fn connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots().push((subscription, Arc::new(handler)));
        subscription
    }

    /// Disconnects one handler; returns false if it was not connected
    pub fn disconnect(&self, subscription: Subscription) -> bool {
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|(s, _)| *s != subscription);
        slots.len() != before
    }

    /// Disconnects every handler
    pub fn disconnect_all(&self) {
        self.slots().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots().len()
    }

    pub fn is_connected(&self, subscription: Subscription) -> bool {
        self.slots().iter().any(|(s, _)| *s == subscription)
    }

    /// Invokes every connected handler in connection order
    ///
    /// Handlers run outside the internal lock, so a handler may connect or
    /// disconnect on the same signal.
    pub fn emit(&self, value: &T) {
        let handlers: Vec<Slot<T>> = self.slots().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(value);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
