use std::sync::Arc;

use dashmap::DashSet;

/// Process-global per-address mutual exclusion (§5, §7, §9).
///
/// Backed by a `DashSet` so `try_acquire` is lock-free on the fast (no
/// contention) path, as §5 requires of both the round mutex and this
/// registry. No nested locks: a guard only ever releases its own address.
#[derive(Debug, Default, Clone)]
pub struct AddressLockRegistry {
    inner: Arc<DashSet<String>>,
}

/// RAII guard releasing the held address lock on drop.
#[derive(Debug)]
pub struct AddressLockGuard {
    registry: Arc<DashSet<String>>,
    address: String,
}

impl Drop for AddressLockGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.address);
    }
}

impl AddressLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the lock for `address`. Returns `None` if
    /// another worker already holds it — the caller skips this round
    /// rather than blocking (§4.7, §5, §8 P12).
    pub fn try_acquire(&self, address: &str) -> Option<AddressLockGuard> {
        if self.inner.insert(address.to_string()) {
            Some(AddressLockGuard { registry: self.inner.clone(), address: address.to_string() })
        } else {
            None
        }
    }

    pub fn is_locked(&self, address: &str) -> bool {
        self.inner.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_guard_lives() {
        let registry = AddressLockRegistry::new();
        let first = registry.try_acquire("pool-a");
        assert!(first.is_some());

        let second = registry.try_acquire("pool-a");
        assert!(second.is_none());
    }

    #[test]
    fn dropping_the_guard_releases_the_address() {
        let registry = AddressLockRegistry::new();
        {
            let _guard = registry.try_acquire("pool-a").unwrap();
            assert!(registry.is_locked("pool-a"));
        }
        assert!(!registry.is_locked("pool-a"));

        assert!(registry.try_acquire("pool-a").is_some());
    }

    #[test]
    fn distinct_addresses_do_not_contend() {
        let registry = AddressLockRegistry::new();
        let _a = registry.try_acquire("pool-a").unwrap();
        let _b = registry.try_acquire("pool-b").unwrap();
    }
}
