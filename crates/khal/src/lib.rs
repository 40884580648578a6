//! Hardware Abstraction Layer for the console.
//!
//! Implements the `kconsole` platform traits on x86_64:
//! [`serial::Com1`] is a [`kconsole::CharSink`] and feeds the line editor
//! from the UART interrupt, [`keyboard`] turns PS/2 scancodes into console
//! bytes, and [`cpu::X86Cpu`] is the [`kconsole::Cpu`] used by the panic
//! path.
#![cfg_attr(not(test), no_std)]

pub mod cpu;
pub mod keyboard;
pub mod serial;

pub use cpu::X86Cpu;
pub use keyboard::{KeyboardDecoder, Ps2Keyboard};
pub use serial::Com1;
