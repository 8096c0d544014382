use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Per-key in-flight lock for state-changing requests (spin, claim, reroll).
///
/// Clones share the same in-flight set, so one guard can be handed to every
/// control that needs it. Single-threaded by construction.
#[derive(Debug)]
pub struct SubmitGuard<K: Eq + Hash> {
    in_flight: Rc<RefCell<HashSet<K>>>,
}

impl<K: Eq + Hash> Clone for SubmitGuard<K> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Rc::clone(&self.in_flight),
        }
    }
}

impl<K: Eq + Hash> Default for SubmitGuard<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> SubmitGuard<K> {
    pub fn new() -> Self {
        Self {
            in_flight: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.borrow().contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }
}

impl<K: Eq + Hash + Clone + Debug> SubmitGuard<K> {
    /// Returns `false` if `key` already has a request outstanding.
    pub fn try_acquire(&self, key: &K) -> bool {
        let acquired = self.in_flight.borrow_mut().insert(key.clone());
        if !acquired {
            log::warn!("Refusing duplicate submit for {:?}", key);
        }
        acquired
    }

    pub fn release(&self, key: &K) {
        if !self.in_flight.borrow_mut().remove(key) {
            log::debug!("Release for {:?} without a matching acquire", key);
        }
    }

    /// Scoped variant of [`try_acquire`](Self::try_acquire): the key is
    /// released when the permit drops, whichever way the request ends.
    pub fn acquire(&self, key: K) -> Option<SubmitPermit<K>> {
        if self.try_acquire(&key) {
            Some(SubmitPermit {
                guard: self.clone(),
                key,
            })
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct SubmitPermit<K: Eq + Hash + Clone + Debug> {
    guard: SubmitGuard<K>,
    key: K,
}

impl<K: Eq + Hash + Clone + Debug> SubmitPermit<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash + Clone + Debug> Drop for SubmitPermit<K> {
    fn drop(&mut self) {
        self.guard.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let guard = SubmitGuard::new();
        let key = "spin:bronze".to_string();
        assert!(guard.try_acquire(&key));
        assert!(!guard.try_acquire(&key));
        guard.release(&key);
        assert!(guard.try_acquire(&key));
    }

    #[test]
    fn test_keys_are_independent() {
        let guard = SubmitGuard::new();
        assert!(guard.try_acquire(&1u32));
        assert!(guard.try_acquire(&2u32));
        assert_eq!(guard.in_flight_count(), 2);
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let guard = SubmitGuard::new();
        {
            let permit = guard.acquire("claim:42").unwrap();
            assert_eq!(*permit.key(), "claim:42");
            assert!(guard.is_in_flight(&"claim:42"));
            assert!(guard.acquire("claim:42").is_none());
        }
        assert!(!guard.is_in_flight(&"claim:42"));
    }

    #[test]
    fn test_permit_releases_on_error_path() {
        fn failing_claim(guard: &SubmitGuard<u64>) -> Result<(), String> {
            let _permit = guard.acquire(9).ok_or("busy")?;
            Err("network down".to_string())
        }

        let guard = SubmitGuard::new();
        assert_eq!(failing_claim(&guard), Err("network down".to_string()));
        assert_eq!(guard.in_flight_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let guard = SubmitGuard::new();
        let other = guard.clone();
        assert!(guard.try_acquire(&"reroll:7"));
        assert!(!other.try_acquire(&"reroll:7"));
        other.release(&"reroll:7");
        assert!(!guard.is_in_flight(&"reroll:7"));
    }
}
