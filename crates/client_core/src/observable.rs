//! Local reactive cell with synchronous change listeners.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    value: T,
    listeners: BTreeMap<u64, Listener<T>>,
    next_listener_id: u64,
}

/// A value plus the listeners interested in it. Clones share the same slot.
///
/// Listeners run on the thread that changed the value, after the lock is
/// released, so a listener may read (or write) the cell it observes.
pub struct Observable<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value,
                listeners: BTreeMap::new(),
                next_listener_id: 1,
            })),
        }
    }

    pub fn get(&self) -> T {
        lock(&self.slot).value.clone()
    }

    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&lock(&self.slot).value)
    }

    /// Stores `value` and notifies listeners if it differs from the cached
    /// value. Returns whether a change happened.
    ///
    /// Each listener receives the value cached at the moment it is called, so
    /// a listener that writes the cell never leaves a later listener holding
    /// a superseded value.
    pub fn replace(&self, value: T) -> bool {
        let listeners: Vec<Listener<T>> = {
            let mut slot = lock(&self.slot);
            if slot.value == value {
                return false;
            }
            slot.value = value;
            slot.listeners.values().cloned().collect()
        };
        for listener in listeners {
            let current = self.get();
            listener(&current);
        }
        true
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_boxed(Box::new(listener))
    }

    pub fn subscribe_boxed(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        let id = {
            let mut slot = lock(&self.slot);
            let id = slot.next_listener_id;
            slot.next_listener_id = slot.next_listener_id.saturating_add(1);
            slot.listeners.insert(id, Arc::from(listener));
            id
        };
        let weak: Weak<Mutex<Slot<T>>> = Arc::downgrade(&self.slot);
        Subscription::new(move || {
            if let Some(slot) = weak.upgrade() {
                lock(&slot).listeners.remove(&id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.slot).listeners.len()
    }
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by every `subscribe`. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keeps the listener registered for as long as the observed cell lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Read side shared by remote cells, path orders and derived views.
pub trait Readable<T> {
    fn get(&self) -> T;
    fn subscribe_boxed(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription;
}

impl<T> Readable<T> for Observable<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        Observable::get(self)
    }

    fn subscribe_boxed(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        Observable::subscribe_boxed(self, listener)
    }
}

#[cfg(test)]
#[path = "tests/observable_tests.rs"]
mod tests;
