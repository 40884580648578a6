//! Per-core control for the console panic path.

use core::arch::x86_64::__cpuid;

use kconsole::Cpu;
use x86_64::instructions::{hlt, interrupts};

/// Return addresses below this are not kernel text; the frame walk stops.
const KERNEL_BASE: usize = 0xFFFF_8000_0000_0000;

/// The running x86_64 core.
#[derive(Debug, Default, Clone, Copy)]
pub struct X86Cpu;

impl X86Cpu {
    pub const fn new() -> Self {
        Self
    }
}

impl Cpu for X86Cpu {
    /// Initial local APIC id (CPUID.01h:EBX[31:24]).
    fn id(&self) -> usize {
        // SAFETY: CPUID leaf 1 exists on every x86_64 processor.
        let leaf = unsafe { __cpuid(1) };
        (leaf.ebx >> 24) as usize
    }

    fn disable_interrupts(&self) {
        interrupts::disable();
    }

    fn halt(&self) -> ! {
        loop {
            interrupts::disable();
            hlt();
        }
    }

    /// Walk the saved-rbp chain. Needs the kernel built with frame pointers
    /// (`-C force-frame-pointers=yes`); stops at the first frame that does
    /// not look like a kernel stack frame.
    fn backtrace(&self, pcs: &mut [usize]) -> usize {
        let mut rbp: usize;
        // SAFETY: reading rbp has no side effects.
        unsafe {
            core::arch::asm!("mov {}, rbp", out(reg) rbp, options(nomem, nostack, preserves_flags));
        }

        let mut n = 0;
        while n < pcs.len() && rbp >= KERNEL_BASE && rbp % 8 == 0 {
            // SAFETY: with frame pointers on, [rbp] is the caller's rbp and
            // [rbp + 8] the return address. Both lie in the current kernel
            // stack, which is mapped.
            let (next, ret) = unsafe {
                let frame = rbp as *const usize;
                (*frame, *frame.add(1))
            };
            if ret == 0 {
                break;
            }
            pcs[n] = ret;
            n += 1;
            if next <= rbp {
                break;
            }
            rbp = next;
        }
        n
    }
}
