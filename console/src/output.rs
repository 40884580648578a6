// =============================================================================
// kconsole — Console Output Path
// =============================================================================
//
// Every byte the console emits goes through here: echo from the line editor,
// autocomplete listings, cprintf(), kprint!(), device writes, panic banners.
//
// LOCKING:
//   The output lock is taken once per logical write (a full formatted call,
//   a full device write), so concurrent writers interleave at call
//   granularity, never mid-call. The line editor's echo takes it per byte
//   (it already holds the input lock and must stay short).
//
//   Locking only happens while `locking` is set. It starts clear (early boot
//   is single-threaded), is set by `Console::init`, and is cleared again by
//   the panic path so that a panic raised while the lock is held can still
//   print.
//
// FAIL-STOP:
//   Once any core has panicked, the next byte any core tries to print makes
//   that core disable interrupts and halt. Nothing else gets written.
//
// =============================================================================

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::platform::{CharSink, Cpu};
use crate::sync::{SpinLock, SpinLockGuard};

/// Backspace as sent to the terminal when erasing one character.
const BS: u8 = 0x08;

pub struct Output<'a> {
    lock: SpinLock<()>,
    locking: AtomicBool,
    panicked: AtomicBool,
    pub(crate) sink: &'a dyn CharSink,
    pub(crate) cpu: &'a dyn Cpu,
}

impl<'a> Output<'a> {
    pub fn new(sink: &'a dyn CharSink, cpu: &'a dyn Cpu) -> Self {
        Self {
            lock: SpinLock::new("console", ()),
            locking: AtomicBool::new(false),
            panicked: AtomicBool::new(false),
            sink,
            cpu,
        }
    }

    pub fn set_locking(&self, on: bool) {
        self.locking.store(on, Ordering::SeqCst);
    }

    pub fn is_locking(&self) -> bool {
        self.locking.load(Ordering::SeqCst)
    }

    pub fn is_panicked(&self) -> bool {
        self.panicked.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_panicked(&self) {
        self.panicked.store(true, Ordering::SeqCst);
    }

    /// Take the output lock if locking is currently enabled.
    ///
    /// The flag is sampled once, so a call that started unlocked finishes
    /// unlocked even if another core flips it meanwhile.
    pub(crate) fn acquire(&self) -> Option<SpinLockGuard<'_, ()>> {
        if self.is_locking() {
            Some(self.lock.lock())
        } else {
            None
        }
    }

    /// Emit one byte, no locking. Halts forever if the system has panicked.
    pub(crate) fn putc(&self, c: u8) {
        if self.is_panicked() {
            self.cpu.disable_interrupts();
            self.cpu.halt();
        }
        self.sink.put(c);
    }

    /// Visually erase one character: backspace, space, backspace.
    pub(crate) fn put_backspace(&self) {
        self.putc(BS);
        self.putc(b' ');
        self.putc(BS);
    }

    pub(crate) fn put_bytes(&self, bytes: &[u8]) {
        for &b in bytes {
            self.putc(b);
        }
    }

    /// Echo a single input byte from the line editor.
    pub fn echo(&self, c: u8) {
        let _guard = self.acquire();
        self.putc(c);
    }

    /// Erase one echoed character from the line editor.
    pub fn erase(&self) {
        let _guard = self.acquire();
        self.put_backspace();
    }

    /// Raw device write: every byte, under the output lock for the whole call.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let _guard = self.lock.lock();
        self.put_bytes(bytes);
        bytes.len()
    }

    /// `core::fmt` entry point behind `kprint!`/`kprintln!`.
    pub fn print(&self, args: fmt::Arguments<'_>) {
        let _guard = self.acquire();
        let _ = fmt::Write::write_fmt(&mut Raw(self), args);
    }
}

/// Unlocked `fmt::Write` adapter; the caller decides about locking.
pub(crate) struct Raw<'o, 'a>(pub(crate) &'o Output<'a>);

impl fmt::Write for Raw<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_bytes(s.as_bytes());
        Ok(())
    }
}

/// Prints formatted text to the console.
///
/// ```ignore
/// kprint!(console, "Loading");
/// kprintln!(console, " done ({} commands)", n);
/// ```
#[macro_export]
macro_rules! kprint {
    ($out:expr, $($arg:tt)*) => {
        $out.print(format_args!($($arg)*))
    };
}

/// Prints formatted text followed by a newline to the console.
#[macro_export]
macro_rules! kprintln {
    ($out:expr) => {
        $crate::kprint!($out, "\n")
    };
    ($out:expr, $($arg:tt)*) => {
        $crate::kprint!($out, "{}\n", format_args!($($arg)*))
    };
}
