//! PS/2 keyboard as a console input source.
//!
//! Uses the `pc-keyboard` crate for scancode decoding via a three-layer
//! state machine: scancode decoder → modifier tracker → layout mapper.
//! Control+letter is mapped to the matching ASCII control code, so the line
//! editor sees Ctrl-U as 0x15, Ctrl-D as 0x04 and Ctrl-P as 0x10, exactly as
//! it would from a serial terminal.

use kconsole::CharSource;
use pc_keyboard::{layouts, DecodedKey, HandleControl, Keyboard, ScancodeSet1};
use x86_64::instructions::port::Port;

// ── PS/2 controller ports ─────────────────────────────────────────

/// Data port (scancodes).
const PS2_DATA: u16 = 0x60;
/// Status port.
const PS2_STATUS: u16 = 0x64;
/// Status bit 0: output buffer full (a byte is waiting in PS2_DATA).
const STATUS_OUTPUT_FULL: u8 = 0x01;

/// IRQ line of the keyboard.
pub const KEYBOARD_IRQ: u8 = 1;

/// Scancode → console byte.
pub struct KeyboardDecoder {
    kb: Keyboard<layouts::Us104Key, ScancodeSet1>,
}

impl KeyboardDecoder {
    pub fn new() -> Self {
        Self {
            kb: Keyboard::new(
                ScancodeSet1::new(),
                layouts::Us104Key,
                HandleControl::MapLettersToUnicode,
            ),
        }
    }

    /// Feed one raw scancode. Returns a byte only for key presses that map
    /// to 7-bit ASCII; releases, modifiers, arrows and the like yield
    /// nothing.
    pub fn decode(&mut self, scancode: u8) -> Option<u8> {
        let event = self.kb.add_byte(scancode).ok()??;
        match self.kb.process_keyevent(event)? {
            DecodedKey::Unicode(ch) if ch.is_ascii() => Some(ch as u8),
            DecodedKey::Unicode(_) | DecodedKey::RawKey(_) => None,
        }
    }
}

impl Default for KeyboardDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// The i8042 controller's keyboard channel.
pub struct Ps2Keyboard {
    decoder: KeyboardDecoder,
}

impl Ps2Keyboard {
    pub fn new() -> Self {
        Self {
            decoder: KeyboardDecoder::new(),
        }
    }

    fn read_scancode() -> Option<u8> {
        let mut status = Port::<u8>::new(PS2_STATUS);
        let mut data = Port::<u8>::new(PS2_DATA);
        // SAFETY: standard i8042 ports; reading DATA only after the status
        // register reports a byte consumes exactly that byte.
        unsafe {
            if status.read() & STATUS_OUTPUT_FULL == 0 {
                return None;
            }
            Some(data.read())
        }
    }
}

impl Default for Ps2Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl CharSource for Ps2Keyboard {
    /// Drain scancodes until one produces a byte or the controller is empty.
    fn get(&mut self) -> Option<u8> {
        while let Some(sc) = Self::read_scancode() {
            if let Some(c) = self.decoder.decode(sc) {
                return Some(c);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LCTRL: u8 = 0x1D;
    const LSHIFT: u8 = 0x2A;
    const RELEASE: u8 = 0x80;

    fn typed(dec: &mut KeyboardDecoder, scancodes: &[u8]) -> Vec<u8> {
        scancodes.iter().filter_map(|&sc| dec.decode(sc)).collect()
    }

    #[test]
    fn letters_and_enter() {
        let mut dec = KeyboardDecoder::new();
        // l, s, Enter (press + release each)
        let out = typed(&mut dec, &[0x26, 0x26 | RELEASE, 0x1F, 0x1F | RELEASE, 0x1C, 0x1C | RELEASE]);
        assert_eq!(out, b"ls\n");
    }

    #[test]
    fn shift_gives_upper_case() {
        let mut dec = KeyboardDecoder::new();
        let out = typed(&mut dec, &[LSHIFT, 0x1E, 0x1E | RELEASE, LSHIFT | RELEASE, 0x1E]);
        assert_eq!(out, b"Aa");
    }

    #[test]
    fn control_letters_become_control_codes() {
        let mut dec = KeyboardDecoder::new();
        // Ctrl held: U, D, P
        let out = typed(&mut dec, &[LCTRL, 0x16, 0x16 | RELEASE, 0x20, 0x20 | RELEASE, 0x19, LCTRL | RELEASE]);
        assert_eq!(out, [0x15, 0x04, 0x10]);
    }

    #[test]
    fn backspace_and_tab_pass_through() {
        let mut dec = KeyboardDecoder::new();
        assert_eq!(dec.decode(0x0E), Some(0x08));
        dec.decode(0x0E | RELEASE);
        assert_eq!(dec.decode(0x0F), Some(b'\t'));
    }
}
