//! Condition variable paired with a [`SpinLock`].
//!
//! A sequence counter stands in for the wait channel: `notify_all` bumps it,
//! `wait` snapshots it while still holding the spinlock and asks the
//! scheduler to park until it changes. A notification that lands between
//! releasing the lock and parking is never lost, because the scheduler only
//! sleeps while the word still holds the snapshot.

use core::sync::atomic::{AtomicU32, Ordering};

use super::spinlock::{SpinLock, SpinLockGuard};
use crate::sched::Scheduler;

pub struct CondVar {
    seq: AtomicU32,
}

impl CondVar {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
        }
    }

    /// Release `guard`, suspend until notified (or spuriously woken, or the
    /// current process is killed), then re-acquire the same lock.
    ///
    /// Callers loop on their condition and check for termination themselves.
    pub fn wait<'a, T>(
        &self,
        guard: SpinLockGuard<'a, T>,
        sched: &dyn Scheduler,
    ) -> SpinLockGuard<'a, T> {
        let seen = self.seq.load(Ordering::Acquire);
        let lock: &'a SpinLock<T> = SpinLockGuard::unlock(guard);
        sched.park(&self.seq, seen);
        lock.lock()
    }

    /// Wake every waiter. Normally called with the associated lock held.
    pub fn notify_all(&self, sched: &dyn Scheduler) {
        self.seq.fetch_add(1, Ordering::Release);
        sched.unpark_all(&self.seq);
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}
