//! COM1 (16550 UART) console transport.
//!
//! Output is polled: `put` waits for the transmit holding register to drain.
//! Input is interrupt-driven: the UART raises IRQ4 when a byte arrives and
//! the handler drains it into the console with
//! `console.intr(&mut COM1.rx())`.

use kconsole::{CharSink, CharSource};
use spin::Once;
use x86_64::instructions::port::Port;

/// COM1 base port address.
pub const COM1_PORT: u16 = 0x3F8;

/// IRQ line of COM1 on the legacy PIC / I/O APIC.
pub const COM1_IRQ: u8 = 4;

// Register offsets from the base port.
const DATA: u16 = 0; // RBR (read) / THR (write); divisor low with DLAB
const IER: u16 = 1; // interrupt enable; divisor high with DLAB
const FCR: u16 = 2;
const LCR: u16 = 3;
const MCR: u16 = 4;
const LSR: u16 = 5;

const LCR_DLAB: u8 = 0x80;
const LCR_8N1: u8 = 0x03;
const IER_RX_READY: u8 = 0x01;
const LSR_RX_READY: u8 = 0x01;
const LSR_TX_IDLE: u8 = 0x20;

/// How long `put` waits for the transmitter before giving up on a byte.
const TX_SPIN_LIMIT: usize = 100_000;

pub struct Com1 {
    base: u16,
    present: Once<bool>,
}

impl Com1 {
    pub const fn new() -> Self {
        Self {
            base: COM1_PORT,
            present: Once::new(),
        }
    }

    fn read_reg(&self, reg: u16) -> u8 {
        let mut port = Port::<u8>::new(self.base + reg);
        // SAFETY: reading a UART register only consumes a received byte,
        // which is the intent when reading DATA.
        unsafe { port.read() }
    }

    fn write_reg(&self, reg: u16, value: u8) {
        let mut port = Port::<u8>::new(self.base + reg);
        // SAFETY: the base address is the UART's; every caller writes a
        // value valid for that register.
        unsafe { port.write(value) }
    }

    /// Program 115200 baud 8N1, check the chip with a loopback byte, and
    /// enable receive interrupts. Returns whether a UART answered.
    ///
    /// Safe to call more than once; only the first call touches the chip.
    pub fn init(&self) -> bool {
        *self.present.call_once(|| {
            self.write_reg(IER, 0x00);

            // Divisor 1 = 115200 baud.
            self.write_reg(LCR, LCR_DLAB);
            self.write_reg(DATA, 0x01);
            self.write_reg(IER, 0x00);
            self.write_reg(LCR, LCR_8N1);

            // FIFO on, cleared, 14-byte threshold.
            self.write_reg(FCR, 0xC7);

            // Loopback self-test.
            self.write_reg(MCR, 0x1E);
            self.write_reg(DATA, 0xAE);
            if self.read_reg(DATA) != 0xAE {
                return false;
            }

            // Normal operation with OUT2 so IRQ4 reaches the interrupt
            // controller.
            self.write_reg(MCR, 0x0F);
            self.write_reg(IER, IER_RX_READY);

            // Drop anything that arrived before we were ready.
            while self.read_reg(LSR) & LSR_RX_READY != 0 {
                self.read_reg(DATA);
            }
            true
        })
    }

    pub fn is_present(&self) -> bool {
        self.present.get().copied().unwrap_or(false)
    }

    /// Next received byte, if any.
    pub fn getc(&self) -> Option<u8> {
        if !self.is_present() || self.read_reg(LSR) & LSR_RX_READY == 0 {
            return None;
        }
        Some(self.read_reg(DATA))
    }

    /// Input side, as handed to `Console::intr`.
    pub fn rx(&self) -> impl CharSource + '_ {
        move || self.getc()
    }
}

impl Default for Com1 {
    fn default() -> Self {
        Self::new()
    }
}

impl CharSink for Com1 {
    fn put(&self, byte: u8) {
        if !self.is_present() {
            return;
        }
        for _ in 0..TX_SPIN_LIMIT {
            if self.read_reg(LSR) & LSR_TX_IDLE != 0 {
                break;
            }
            core::hint::spin_loop();
        }
        self.write_reg(DATA, byte);
    }
}
