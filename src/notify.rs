use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned by `subscribe`, used to drop the subscription again.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered list of callbacks, invoked synchronously on `emit`.
pub struct Subscribers<T> {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Subscribers<T> {
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns false when `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|(other, _)| *other != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every subscriber in subscription order.
    ///
    /// The list is copied first, so callbacks may subscribe or unsubscribe.
    pub fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_in_subscription_order() {
        let subscribers = Subscribers::<u32>::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = seen.clone();
            subscribers.subscribe(move |value: &u32| seen.lock().unwrap().push((tag, *value)));
        }

        subscribers.emit(&3);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 3), ("second", 3)]);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let subscribers = Subscribers::<()>::default();
        let count = Arc::new(AtomicU64::new(0));

        let counter = count.clone();
        let id = subscribers.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscribers.emit(&());
        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        subscribers.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(subscribers.is_empty());
    }
}
