//! Console error types.

use core::fmt;

/// Errors surfaced by the device entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// The waiting process was killed before any input arrived.
    Killed,
    /// No device is registered under this major number, or it is out of range.
    BadDevice(usize),
    /// A device is already registered under this major number.
    DeviceTaken(usize),
}

impl ConsoleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Killed => "EINTR",
            Self::BadDevice(_) => "ENODEV",
            Self::DeviceTaken(_) => "EBUSY",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Killed => "process killed while waiting for input",
            Self::BadDevice(_) => "no such device",
            Self::DeviceTaken(_) => "device slot already registered",
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Killed => write!(f, "{}: {}", self.code(), self.message()),
            Self::BadDevice(major) | Self::DeviceTaken(major) => {
                write!(f, "{}: {} (major {})", self.code(), self.message(), major)
            }
        }
    }
}

/// Why a trie insertion stopped short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieError {
    /// The node arena is out of budget or memory.
    Exhausted,
    /// Byte outside the 7-bit alphabet the trie indexes.
    NotAscii(u8),
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("trie node arena exhausted"),
            Self::NotAscii(b) => write!(f, "byte {:#04x} is not ASCII", b),
        }
    }
}

/// Why a directory entry was not registered as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Dot-file (`.`, `..`, `.profile`, ...).
    Hidden,
    /// Empty name.
    Empty,
    /// Name is not shorter than the configured limit.
    TooLong,
    /// The command table is at capacity.
    TableFull,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hidden => "hidden entry",
            Self::Empty => "empty name",
            Self::TooLong => "name too long",
            Self::TableFull => "command table full",
        })
    }
}
