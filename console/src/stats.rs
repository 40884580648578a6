//! Diagnostic counters for the console's fail-soft paths.
//!
//! Nothing here changes behaviour: a full ring still drops the byte, a bad
//! command name is still skipped. The counters only make it observable.

use core::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Stats {
    bytes_dropped: AtomicU64,
    controls_ignored: AtomicU64,
    commands_skipped: AtomicU64,
    trie_exhausted: AtomicU64,
    reads_cancelled: AtomicU64,
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub bytes_dropped: u64,
    pub controls_ignored: u64,
    pub commands_skipped: u64,
    pub trie_exhausted: u64,
    pub reads_cancelled: u64,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            bytes_dropped: AtomicU64::new(0),
            controls_ignored: AtomicU64::new(0),
            commands_skipped: AtomicU64::new(0),
            trie_exhausted: AtomicU64::new(0),
            reads_cancelled: AtomicU64::new(0),
        }
    }

    pub fn byte_dropped(&self) {
        self.bytes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn control_ignored(&self) {
        self.controls_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_skipped(&self) {
        self.commands_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn trie_exhausted(&self) {
        self.trie_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_cancelled(&self) {
        self.reads_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            controls_ignored: self.controls_ignored.load(Ordering::Relaxed),
            commands_skipped: self.commands_skipped.load(Ordering::Relaxed),
            trie_exhausted: self.trie_exhausted.load(Ordering::Relaxed),
            reads_cancelled: self.reads_cancelled.load(Ordering::Relaxed),
        }
    }
}
