//! Host-side stand-ins for the console's collaborators.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::device::InodeLock;
use crate::platform::{CharSink, Cpu};
use crate::registry::{DirEntry, DirInode, FileSystem};
use crate::sched::Scheduler;

/// Captures every byte the console emits.
#[derive(Default)]
pub struct RecordingSink {
    bytes: Mutex<Vec<u8>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().unwrap().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().unwrap().clear();
    }
}

impl CharSink for RecordingSink {
    fn put(&self, byte: u8) {
        self.bytes.lock().unwrap().push(byte);
    }
}

/// Unwind payload used by [`TestCpu::halt`].
pub struct Halted;

pub struct TestCpu {
    id: usize,
    pcs: Vec<usize>,
    interrupts_disabled: AtomicUsize,
}

impl TestCpu {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            pcs: Vec::new(),
            interrupts_disabled: AtomicUsize::new(0),
        }
    }

    pub fn with_backtrace(mut self, pcs: &[usize]) -> Self {
        self.pcs = pcs.to_vec();
        self
    }

    /// How many times `disable_interrupts` was called.
    pub fn interrupts_disabled(&self) -> usize {
        self.interrupts_disabled.load(Ordering::SeqCst)
    }
}

impl Cpu for TestCpu {
    fn id(&self) -> usize {
        self.id
    }

    fn disable_interrupts(&self) {
        self.interrupts_disabled.fetch_add(1, Ordering::SeqCst);
    }

    fn halt(&self) -> ! {
        panic::panic_any(Halted)
    }

    fn backtrace(&self, pcs: &mut [usize]) -> usize {
        let n = self.pcs.len().min(pcs.len());
        pcs[..n].copy_from_slice(&self.pcs[..n]);
        n
    }
}

/// Run `f`, reporting whether it ended by halting the (test) CPU.
pub fn halted(f: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => false,
        Err(payload) if payload.is::<Halted>() => true,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Futex-style parking on top of `std::sync`.
#[derive(Default)]
pub struct TestScheduler {
    mutex: Mutex<()>,
    cv: Condvar,
    killed: AtomicBool,
    parks: AtomicUsize,
    dumps: AtomicUsize,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the current process killed and wake anything parked.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
        let _g = self.mutex.lock().unwrap();
        self.cv.notify_all();
    }

    pub fn parks(&self) -> usize {
        self.parks.load(Ordering::SeqCst)
    }

    pub fn dumps(&self) -> usize {
        self.dumps.load(Ordering::SeqCst)
    }
}

impl Scheduler for TestScheduler {
    fn park(&self, word: &AtomicU32, seen: u32) {
        self.parks.fetch_add(1, Ordering::SeqCst);
        let mut g = self.mutex.lock().unwrap();
        while word.load(Ordering::SeqCst) == seen && !self.killed.load(Ordering::SeqCst) {
            g = self.cv.wait(g).unwrap();
        }
    }

    fn unpark_all(&self, _word: &AtomicU32) {
        let _g = self.mutex.lock().unwrap();
        self.cv.notify_all();
    }

    fn current_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    fn dump_processes(&self) {
        self.dumps.fetch_add(1, Ordering::SeqCst);
    }
}

/// A filesystem with a single, in-memory root directory.
pub struct MemFs {
    root: Option<Vec<DirEntry>>,
    padding: usize,
    released: Cell<bool>,
}

impl MemFs {
    pub fn root(entries: &[(u16, &str)]) -> Self {
        Self {
            root: Some(entries.iter().map(|&(inum, name)| DirEntry::new(inum, name)).collect()),
            padding: 0,
            released: Cell::new(false),
        }
    }

    pub fn missing() -> Self {
        Self {
            root: None,
            padding: 0,
            released: Cell::new(false),
        }
    }

    /// Report a directory size `extra` bytes past the last whole record.
    pub fn with_size_padding(mut self, extra: usize) -> Self {
        self.padding = extra;
        self
    }

    /// The root inode was unlocked and put back.
    pub fn released(&self) -> bool {
        self.released.get()
    }
}

impl FileSystem for MemFs {
    fn namei<'f>(&'f self, path: &str) -> Option<Box<dyn DirInode + 'f>> {
        if path != "/" {
            return None;
        }
        let entries = self.root.as_ref()?;
        Some(Box::new(MemDir {
            fs: self,
            entries,
            locked: false,
        }))
    }
}

struct MemDir<'f> {
    fs: &'f MemFs,
    entries: &'f [DirEntry],
    locked: bool,
}

impl DirInode for MemDir<'_> {
    fn lock(&mut self) {
        self.locked = true;
    }

    fn size(&self) -> usize {
        self.entries.len() * DirEntry::SIZE + self.fs.padding
    }

    fn read_entry(&mut self, off: usize) -> Option<DirEntry> {
        assert!(self.locked, "directory read without the inode lock");
        if off % DirEntry::SIZE != 0 {
            return None;
        }
        self.entries.get(off / DirEntry::SIZE).copied()
    }

    fn unlock_put(self: Box<Self>) {
        assert!(self.locked);
        self.fs.released.set(true);
    }
}

/// Inode lock that records how the device layer drives it.
pub struct TestInode {
    held: AtomicBool,
    unlocks: AtomicUsize,
}

impl TestInode {
    /// A locked inode, as handed to a device entry point.
    pub fn locked() -> Self {
        Self {
            held: AtomicBool::new(true),
            unlocks: AtomicUsize::new(0),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    pub fn unlocks(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }
}

impl InodeLock for TestInode {
    fn lock(&self) {
        assert!(!self.held.swap(true, Ordering::SeqCst), "inode locked twice");
    }

    fn unlock(&self) {
        assert!(self.held.swap(false, Ordering::SeqCst), "inode not locked");
        self.unlocks.fetch_add(1, Ordering::SeqCst);
    }
}
