// =============================================================================
// kconsole — Synchronization Primitives
// =============================================================================
//
// There is no std::sync in the kernel. The console needs exactly two things:
//
//   spinlock.rs — FIFO ticket lock, interrupts masked while held. Used for
//                 the input lock (ring + editor state) and the output lock.
//   condvar.rs  — wait/notify on top of a SpinLock, parking through the
//                 scheduler seam. Only the blocking reader ever waits.
//
// Lock ordering: INPUT before OUTPUT. Never the reverse.
// =============================================================================

pub mod condvar;
pub mod spinlock;

pub use condvar::CondVar;
pub use spinlock::{SpinLock, SpinLockGuard};
