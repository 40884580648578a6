//! Console I/O subsystem for a small teaching kernel.
//!
//! Raw keystrokes from an interrupt handler go through an interrupt-safe line
//! editor into a fixed-size input ring; blocked readers are woken when a line
//! is committed. Tab completes command names against a trie built from the
//! root directory at boot. Output is serialized per call, and a panic freezes
//! every core at its next byte of output.
//!
//! Hardware and kernel collaborators are traits ([`CharSink`],
//! [`CharSource`], [`Cpu`], [`Scheduler`], [`FileSystem`], [`InodeLock`]),
//! so everything here runs under `cargo test` on the host.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod console;
pub mod device;
pub mod editor;
pub mod error;
pub mod output;
pub mod panic;
pub mod platform;
pub mod printf;
pub mod registry;
pub mod ring;
pub mod sched;
pub mod stats;
pub mod sync;
pub mod tarfs;
pub mod trie;

pub use config::{ConsoleConfig, INPUT_BUF, MAX_COMMAND_LENGTH};
pub use console::Console;
pub use device::{CONSOLE, Device, DeviceTable, InodeLock, NDEV};
pub use error::{ConsoleError, SkipReason, TrieError};
pub use output::Output;
pub use platform::{CharSink, CharSource, Cpu};
pub use printf::Arg;
pub use registry::{CommandRegistry, DIRSIZ, DirEntry, DirInode, FileSystem};
pub use sched::Scheduler;
pub use stats::StatsSnapshot;
pub use tarfs::TarFs;

#[cfg(test)]
mod mock;
