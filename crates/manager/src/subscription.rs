//! Table subscriptions with scoped release.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use domain::FlagRecord;

type Callback = Box<dyn FnMut(Vec<FlagRecord>) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Callbacks that receive each freshly loaded table.
///
/// Callbacks run in registration order while the registry is locked, so a
/// callback must not subscribe or drop a [`Subscription`] itself.
#[derive(Clone, Default)]
pub struct Subscribers {
    registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` and returns the guard that keeps it registered.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(Vec<FlagRecord>) + Send + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.callbacks.push((id, Box::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Hands every subscriber its own copy of `rows`.
    pub fn publish(&self, rows: &[FlagRecord]) {
        let mut registry = lock(&self.registry);
        for (_, callback) in registry.callbacks.iter_mut() {
            callback(rows.to_vec());
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every callback. Outstanding guards become inert.
    pub fn clear(&self) {
        lock(&self.registry).callbacks.clear();
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

/// Keeps a callback registered until dropped.
#[derive(Debug)]
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true while the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            lock(&registry)
                .callbacks
                .iter()
                .any(|(id, _)| *id == self.id)
        })
    }

    /// Unregisters the callback now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}
