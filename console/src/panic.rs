// =============================================================================
// kconsole — Kernel Panic Path
// =============================================================================
//
// A kernel panic means an invariant is broken. The console's job is to get
// the message out and stop the machine:
//
//   1. Mask interrupts on this core
//   2. Turn off output locking: the faulting context may already hold the
//      output lock, and waiting on it would hide the message forever
//   3. Print "cpuN: panic: " + the message + the caller PCs
//   4. Set the panicked flag; every other core halts at its next putc
//   5. Halt this core
//
// There is no way back. Panic is the only path that disables output locking.
// =============================================================================

use core::fmt::{self, Write};
use core::panic::PanicInfo;

use crate::cprintf;
use crate::output::{Output, Raw};

/// How many caller program counters the dump shows.
const CALLSTACK_DEPTH: usize = 10;

impl Output<'_> {
    pub fn panic(&self, msg: fmt::Arguments<'_>) -> ! {
        self.cpu.disable_interrupts();
        self.set_locking(false);

        cprintf!(self, "cpu%d: panic: ", self.cpu.id());
        self.show_callstack(msg);

        // Freeze the other cores.
        self.mark_panicked();

        self.cpu.halt()
    }

    /// Bridge for the kernel's `#[panic_handler]`.
    pub fn on_panic(&self, info: &PanicInfo<'_>) -> ! {
        self.panic(format_args!("{}", info))
    }

    fn show_callstack(&self, msg: fmt::Arguments<'_>) {
        let _ = Raw(self).write_fmt(msg);
        self.putc(b'\n');

        let mut pcs = [0usize; CALLSTACK_DEPTH];
        let n = self.cpu.backtrace(&mut pcs).min(CALLSTACK_DEPTH);
        if n == 0 {
            return;
        }
        for &pc in &pcs[..n] {
            cprintf!(self, " %p", pc);
        }
        self.putc(b'\n');
    }
}
