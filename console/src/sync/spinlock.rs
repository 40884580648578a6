// =============================================================================
// kconsole — Ticket Spinlock
// =============================================================================
//
// The console has two independent lock domains:
//   - the INPUT lock: ring buffer + all line-editing state. Taken by the
//     interrupt-context line editor and by process-context readers.
//   - the OUTPUT lock: the character sink and the formatter. Taken per
//     logical write (one formatted call, one raw write call).
//
// Lock ordering: INPUT may be held while OUTPUT is taken (the editor echoes
// under the input lock). OUTPUT is never held while INPUT is taken.
//
// HOW IT WORKS:
//   - Two counters: `next_ticket` and `now_serving`
//   - To lock: atomically increment `next_ticket`, get your ticket number.
//     Spin until `now_serving` equals your ticket.
//   - To unlock: increment `now_serving`, which lets the next waiter proceed.
//
// IRQ SAFETY:
//   The line editor runs from the UART/keyboard interrupt. If a reader on the
//   same core held the input lock with interrupts enabled, the handler would
//   spin forever. Interrupts are therefore masked while any SpinLock is held
//   and the previous state is restored on unlock.
//
//   On hosted targets (unit tests) there is no interrupt flag to touch, so the
//   masking helpers compile to nothing.
//
// =============================================================================

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

/// A ticket-based spinlock that disables interrupts while held.
///
/// Waiters are served in FIFO order. The `name` is only used for
/// diagnostics (panic messages about lock misuse, debug dumps).
pub struct SpinLock<T> {
    name: &'static str,

    /// The next ticket to be dispensed (atomically incremented by each locker).
    next_ticket: AtomicU32,

    /// The ticket number currently being served (incremented on unlock).
    now_serving: AtomicU32,

    data: UnsafeCell<T>,
}

// SAFETY: the lock ensures only one core accesses T at a time.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new, unlocked spinlock.
    pub const fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
            data: UnsafeCell::new(value),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquires the lock, disabling interrupts on the current core.
    ///
    /// The lock is released (and the interrupt state restored) when the
    /// returned guard is dropped.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let irq_was_enabled = interrupts_enabled();
        disable_interrupts();

        // Relaxed is enough for the ticket itself; the Acquire load in the
        // spin loop orders our accesses after the previous holder's.
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        while self.now_serving.load(Ordering::Acquire) != my_ticket {
            core::hint::spin_loop();
        }

        SpinLockGuard {
            lock: self,
            irq_was_enabled,
        }
    }

    /// Attempts to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        let irq_was_enabled = interrupts_enabled();
        disable_interrupts();

        let current = self.now_serving.load(Ordering::Relaxed);
        let result = self.next_ticket.compare_exchange(
            current,
            current.wrapping_add(1),
            Ordering::Acquire,
            Ordering::Relaxed,
        );

        match result {
            Ok(_) => Some(SpinLockGuard {
                lock: self,
                irq_was_enabled,
            }),
            Err(_) => {
                if irq_was_enabled {
                    enable_interrupts();
                }
                None
            }
        }
    }

    /// Returns `true` if some context currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.next_ticket.load(Ordering::Relaxed) != self.now_serving.load(Ordering::Relaxed)
    }

    /// Exclusive access without locking; `&mut self` proves no one else can
    /// observe the data. Used during single-threaded boot.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// RAII guard for a held spinlock.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
    irq_was_enabled: bool,
}

impl<'a, T> SpinLockGuard<'a, T> {
    /// Releases the guard and hands back the lock it came from.
    ///
    /// Used by [`CondVar::wait`](super::CondVar::wait) to drop the lock around
    /// a suspension and re-acquire it afterwards.
    pub fn unlock(guard: Self) -> &'a SpinLock<T> {
        let lock = guard.lock;
        drop(guard);
        lock
    }
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: we hold the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: we hold the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Release makes our writes visible before the next holder's Acquire.
        self.lock.now_serving.fetch_add(1, Ordering::Release);

        if self.irq_was_enabled {
            enable_interrupts();
        }
    }
}

// =============================================================================
// Interrupt state management
// =============================================================================

/// Checks whether interrupts are currently enabled on this core (RFLAGS.IF).
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
fn interrupts_enabled() -> bool {
    let rflags: u64;
    // SAFETY: reading RFLAGS has no side effects.
    unsafe {
        core::arch::asm!(
            "pushfq",
            "pop {}",
            out(reg) rflags,
            options(nomem, preserves_flags)
        );
    }
    rflags & (1 << 9) != 0
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
fn disable_interrupts() {
    // SAFETY: always paired with a restore in SpinLockGuard::drop.
    unsafe {
        core::arch::asm!("cli", options(nomem, nostack));
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
fn enable_interrupts() {
    // SAFETY: only restores a state that was enabled before we locked.
    unsafe {
        core::arch::asm!("sti", options(nomem, nostack));
    }
}

// Hosted builds (unit tests, tooling) run in user mode: no interrupt flag.
#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
#[inline(always)]
fn interrupts_enabled() -> bool {
    false
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
#[inline(always)]
fn disable_interrupts() {}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
#[inline(always)]
fn enable_interrupts() {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_serializes_increments() {
        let lock = Arc::new(SpinLock::new("counter", 0u64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *lock.lock() += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), 4000);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new("t", ());
        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn unlock_returns_reusable_lock() {
        let lock = SpinLock::new("t", 7u8);
        let guard = lock.lock();
        let same = SpinLockGuard::unlock(guard);
        assert!(!same.is_locked());
        assert_eq!(*same.lock(), 7);
        assert_eq!(same.name(), "t");
    }
}
