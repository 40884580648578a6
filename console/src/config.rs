//! Console tunables.
//!
//! The ring capacity is a compile-time constant because the ring is a fixed
//! array embedded in the console; everything else is a boot-time value.

/// Capacity of the input ring buffer, in bytes.
pub const INPUT_BUF: usize = 512;

/// Hard cap on command name length (exclusive), matching the command table's
/// fixed-size name slots.
pub const MAX_COMMAND_LENGTH: usize = 32;

// A completed command must always fit in the ring.
const _: () = assert!(MAX_COMMAND_LENGTH < INPUT_BUF);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Prompt reprinted after an autocomplete listing or a failed completion.
    pub prompt: &'static str,
    /// Maximum number of commands kept in the command table.
    pub max_commands: usize,
    /// Names must be strictly shorter than this. Clamped to
    /// [`MAX_COMMAND_LENGTH`].
    pub max_command_len: usize,
    /// Maximum number of trie nodes the boot arena may hold.
    pub trie_node_budget: usize,
    /// Directory scanned for command names.
    pub root_path: &'static str,
}

impl ConsoleConfig {
    pub const DEFAULT: Self = Self {
        prompt: "$ ",
        max_commands: 100,
        max_command_len: MAX_COMMAND_LENGTH,
        trie_node_budget: 4096,
        root_path: "/",
    };

    /// Effective exclusive name-length bound.
    pub fn name_limit(&self) -> usize {
        self.max_command_len.min(MAX_COMMAND_LENGTH)
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
