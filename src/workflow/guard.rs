use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of keys with a request outstanding.
///
/// A key is held from `try_acquire` until its token drops, independent of
/// when any view state is updated.
#[derive(Debug)]
pub struct InFlight<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

fn lock<K>(set: &Mutex<HashSet<K>>) -> MutexGuard<'_, HashSet<K>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if `key` is already held.
    pub fn try_acquire(&self, key: K) -> Option<InFlightToken<K>> {
        let mut active = lock(&self.active);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightToken {
            key,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, key: &K) -> bool {
        lock(&self.active).contains(key)
    }
}

/// Releases its key on drop.
#[derive(Debug)]
#[must_use = "the key is released as soon as the token is dropped"]
pub struct InFlightToken<K: Eq + Hash> {
    key: K,
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> InFlightToken<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for InFlightToken<K> {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let guard = InFlight::new();
        let token = guard.try_acquire("meal-1").expect("first acquire");
        assert!(guard.try_acquire("meal-1").is_none());
        assert!(guard.is_active(&"meal-1"));

        let other = guard.try_acquire("meal-2");
        assert!(other.is_some());

        drop(token);
        assert!(!guard.is_active(&"meal-1"));
        assert!(guard.try_acquire("meal-1").is_some());
    }
}
