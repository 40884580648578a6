//! Hardware seams: the character transport and the CPU.
//!
//! Implemented for real hardware in `khal`, and by test doubles on the host.

/// Byte-at-a-time output transport (UART, display).
///
/// `put` must not block on anything the console might be holding; it is
/// called with the output lock held and from interrupt context.
pub trait CharSink: Sync {
    fn put(&self, byte: u8);
}

/// Pollable input transport. `get` returns `None` when no byte is pending.
pub trait CharSource {
    fn get(&mut self) -> Option<u8>;
}

impl<F: FnMut() -> Option<u8>> CharSource for F {
    fn get(&mut self) -> Option<u8> {
        self()
    }
}

/// Per-core control needed by the panic path.
pub trait Cpu: Sync {
    /// Identifier of the processor executing the caller.
    fn id(&self) -> usize;

    /// Mask maskable interrupts on the current core.
    fn disable_interrupts(&self);

    /// Stop this core for good.
    fn halt(&self) -> !;

    /// Fill `pcs` with the caller chain's return addresses, innermost first.
    /// Returns how many entries were written.
    fn backtrace(&self, pcs: &mut [usize]) -> usize {
        let _ = pcs;
        0
    }
}
