//! Scheduler seam consumed by the blocking reader.
//!
//! The console never reimplements sleep/wakeup. It parks the current process
//! on an atomic word the same way a futex does:
//!
//!   - `park(word, seen)` — if `*word == seen`, suspend the calling process
//!     until another context calls `unpark_all(word)`.
//!   - `unpark_all(word)` — make every process parked on `word` runnable.
//!
//! The compare-then-sleep must be atomic with respect to `unpark_all`, which
//! is what closes the missed-wakeup window. `park` may return spuriously;
//! callers always re-check their condition.

use core::sync::atomic::AtomicU32;

pub trait Scheduler: Sync {
    /// Suspend the current process while `*word == seen`.
    ///
    /// Must also return once the current process has been marked killed.
    fn park(&self, word: &AtomicU32, seen: u32);

    /// Wake every process parked on `word`.
    fn unpark_all(&self, word: &AtomicU32);

    /// Whether the process on whose behalf we are running is being killed.
    fn current_killed(&self) -> bool;

    /// Print the process table (Ctrl-P). Opaque diagnostics capability.
    fn dump_processes(&self) {}
}
