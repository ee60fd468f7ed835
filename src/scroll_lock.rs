//! Reference-counted page scroll lock.
//!
//! While any [`ScrollLockGuard`] is alive the page refuses to scroll. Guards
//! release on drop, so every exit path of a modal (explicit close, Escape,
//! backdrop click, teardown) gives the lock back exactly once.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

#[derive(Default)]
struct Counters {
    holders: Cell<usize>,
    acquisitions: Cell<u64>,
    releases: Cell<u64>,
}

/// Shared handle to the page's scroll lock. Cloning yields another handle to
/// the same lock.
#[derive(Clone, Default)]
pub struct ScrollLock {
    inner: Rc<Counters>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one hold on the lock.
    pub fn acquire(&self) -> ScrollLockGuard {
        let holders = self.inner.holders.get() + 1;
        self.inner.holders.set(holders);
        self.inner.acquisitions.set(self.inner.acquisitions.get() + 1);
        debug!(holders, "scroll lock acquired");
        ScrollLockGuard {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.holders.get() > 0
    }

    /// Number of guards currently alive.
    pub fn holders(&self) -> usize {
        self.inner.holders.get()
    }

    /// Total guards ever handed out.
    pub fn acquisitions(&self) -> u64 {
        self.inner.acquisitions.get()
    }

    /// Total guards ever dropped.
    pub fn releases(&self) -> u64 {
        self.inner.releases.get()
    }
}

/// One hold on a [`ScrollLock`]; released when dropped.
pub struct ScrollLockGuard {
    inner: Rc<Counters>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        let holders = self.inner.holders.get().saturating_sub(1);
        self.inner.holders.set(holders);
        self.inner.releases.set(self.inner.releases.get() + 1);
        debug!(holders, "scroll lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = ScrollLock::new();
        assert!(!lock.is_locked());

        let guard = lock.acquire();
        assert!(lock.is_locked());
        assert_eq!(lock.holders(), 1);

        drop(guard);
        assert!(!lock.is_locked());
        assert_eq!(lock.acquisitions(), 1);
        assert_eq!(lock.releases(), 1);
    }

    #[test]
    fn test_nested_holders() {
        let lock = ScrollLock::new();
        let a = lock.acquire();
        let b = lock.clone().acquire();
        assert_eq!(lock.holders(), 2);

        drop(a);
        assert!(lock.is_locked());
        drop(b);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_repeated_cycles_balance() {
        let lock = ScrollLock::new();
        for _ in 0..10 {
            let _guard = lock.acquire();
        }
        assert_eq!(lock.acquisitions(), 10);
        assert_eq!(lock.releases(), 10);
        assert_eq!(lock.holders(), 0);
    }
}
