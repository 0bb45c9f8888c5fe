use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::trace;

use super::Session;

pub type Listener = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// Holds the current session and fans changes out to listeners in the order
/// they happen.
#[derive(Clone, Default)]
pub struct SessionHub {
    inner: Arc<Mutex<Inner>>,
    delivery: Arc<Mutex<()>>,
}

#[derive(Default)]
struct Inner {
    current: Option<Session>,
    listeners: Vec<(u64, Arc<Listener>)>,
    next_id: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.inner).current.clone()
    }

    pub fn observe(&self, listener: Listener) -> Subscription {
        // Held so a concurrent publish cannot slip in between registration
        // and the initial call.
        let _delivery = lock(&self.delivery);
        let listener = Arc::new(listener);
        let (id, current) = {
            let mut inner = lock(&self.inner);
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, Arc::clone(&listener)));
            (id, inner.current.clone())
        };
        trace!(listener = id, "Session listener registered");
        listener(current.as_ref());

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Replace the current session and notify every listener. Listeners must
    /// not publish from inside their callback.
    pub fn publish(&self, session: Option<Session>) {
        let _delivery = lock(&self.delivery);
        let listeners: Vec<Arc<Listener>> = {
            let mut inner = lock(&self.inner);
            inner.current = session.clone();
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        trace!(listeners = listeners.len(), signed_in = session.is_some(), "Publishing session change");
        for listener in listeners {
            listener(session.as_ref());
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Stops delivery to its listener when dropped.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
            trace!(listener = self.id, "Session listener removed");
        }
    }
}
