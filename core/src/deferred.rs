use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Deferred<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Deferred<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Cancel whatever is pending and schedule `payload` to fire `delay` after `now`.
    pub fn schedule(&mut self, payload: T, now: Instant) {
        self.pending = Some((now + self.delay, payload));
    }

    /// Drop the pending task, returning its payload.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn payload(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, payload)| payload)
    }

    /// Take the payload if its quiet period has elapsed by `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((deadline, _)) if now >= *deadline);
        if due {
            self.cancel()
        } else {
            None
        }
    }
}

/// One [`Deferred`] slot per key, e.g. per folder being hovered.
#[derive(Debug, Clone)]
pub struct DeferredSet<K> {
    delay: Duration,
    slots: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> DeferredSet<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slots: HashMap::new(),
        }
    }

    /// Cancel-and-reschedule the slot for `key`.
    pub fn schedule(&mut self, key: K, now: Instant) {
        self.slots.insert(key, now + self.delay);
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Remove and return every key whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .slots
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.slots.remove(key);
        }
        due
    }
}
