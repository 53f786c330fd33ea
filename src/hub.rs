//! Observer registry with unsubscribe handles.
//!
//! Callbacks run synchronously on the emitting thread, in registration
//! order. The registry lock is released before callbacks run, so a callback
//! may subscribe, unsubscribe or emit again.
//!
//! Once `unsubscribe` returns the callback is never invoked again: an
//! unsubscribe from another thread waits for an in-flight call to finish.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

/// A registered callback and its liveness flag.
///
/// The flag's lock is held for the duration of every call. It is reentrant
/// so a callback can unsubscribe itself.
struct Subscriber<T> {
    live: ReentrantMutex<Cell<bool>>,
    callback: Box<dyn Fn(&T) + Send + Sync>,
}

impl<T> Subscriber<T> {
    fn invoke(&self, value: &T) {
        let live = self.live.lock();
        if live.get() {
            (self.callback)(value);
        }
    }

    fn retire(&self) {
        self.live.lock().set(false);
    }
}

struct Registry<T> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Arc<Subscriber<T>>)>>,
}

/// Fan-out of `T` values to registered callbacks.
pub struct EventHub<T> {
    registry: Arc<Registry<T>>,
}

impl<T: 'static> EventHub<T> {
    /// Create a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            live: ReentrantMutex::new(Cell::new(true)),
            callback: Box::new(callback),
        });
        self.registry
            .subscribers
            .lock()
            .push((id, Arc::clone(&subscriber)));

        let registry: Weak<Registry<T>> = Arc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.subscribers.lock().retain(|(sid, _)| *sid != id);
                }
                subscriber.retire();
            })),
        }
    }

    /// Deliver `value` to every subscriber.
    pub fn emit(&self, value: &T) {
        let subscribers: Vec<Arc<Subscriber<T>>> = self
            .registry
            .subscribers
            .lock()
            .iter()
            .map(|(_, sub)| Arc::clone(sub))
            .collect();

        for subscriber in subscribers {
            subscriber.invoke(value);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.lock().len()
    }
}

impl<T: 'static> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> std::fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.registry.subscribers.lock().len())
            .finish()
    }
}

/// Handle to a registered callback; unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the callback now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
