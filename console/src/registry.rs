//! Boot-time command registry.
//!
//! Walks the root directory of the filesystem once, and every eligible entry
//! name becomes a known command: appended to the flat [`CommandTable`]
//! (registration order, used to list ambiguous completions) and inserted
//! into the [`CommandTrie`] (used to find unique completions).
//!
//! Everything here degrades silently: names that are hidden, too long, or
//! arrive after the table is full are skipped; a trie allocation failure
//! leaves the name in the table but unmatchable by completion. Each case is
//! counted in [`Stats`] and logged at boot.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::config::ConsoleConfig;
use crate::error::SkipReason;
use crate::stats::Stats;
use crate::trie::{CommandTrie, Matches};

/// Maximum directory entry name length.
pub const DIRSIZ: usize = 14;

/// One fixed-size on-disk directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DirEntry {
    /// Inode number; 0 marks a free slot.
    pub inum: u16,
    /// NUL-padded name.
    pub name: [u8; DIRSIZ],
}

// Records are packed back to back in the directory file.
const _: () = assert!(core::mem::size_of::<DirEntry>() == 16);

impl DirEntry {
    pub const SIZE: usize = core::mem::size_of::<DirEntry>();

    /// Build a record, truncating `name` to [`DIRSIZ`] bytes.
    pub fn new(inum: u16, name: &str) -> Self {
        let mut buf = [0u8; DIRSIZ];
        let n = name.len().min(DIRSIZ);
        buf[..n].copy_from_slice(&name.as_bytes()[..n]);
        Self { inum, name: buf }
    }

    /// The name up to its first NUL.
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(DIRSIZ);
        &self.name[..end]
    }
}

/// A directory inode, as handed out by [`FileSystem::namei`].
pub trait DirInode {
    fn lock(&mut self);

    /// Directory file size in bytes.
    fn size(&self) -> usize;

    /// Read the record at byte offset `off`; `None` on a short read.
    fn read_entry(&mut self, off: usize) -> Option<DirEntry>;

    /// Unlock and release the inode.
    fn unlock_put(self: Box<Self>);
}

/// The directory-walk capability the registry consumes.
pub trait FileSystem {
    fn namei<'f>(&'f self, path: &str) -> Option<Box<dyn DirInode + 'f>>;
}

/// Flat, insertion-ordered list of known command names.
#[derive(Debug, Default)]
pub struct CommandTable {
    names: Vec<String>,
    capacity: usize,
}

impl CommandTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.names.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Every name starting with `prefix`, in registration order.
    pub fn matching<'t>(&'t self, prefix: &'t [u8]) -> impl Iterator<Item = &'t str> + 't {
        self.iter().filter(move |name| name.as_bytes().starts_with(prefix))
    }

    fn push(&mut self, name: &str) {
        self.names.push(String::from(name));
    }
}

/// Command table plus trie, built together and read-only afterwards.
pub struct CommandRegistry {
    table: CommandTable,
    trie: CommandTrie,
    name_limit: usize,
}

impl CommandRegistry {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            table: CommandTable::with_capacity(config.max_commands),
            trie: CommandTrie::new(config.trie_node_budget),
            name_limit: config.name_limit(),
        }
    }

    /// Scan `config.root_path` on `fs` and register every eligible entry.
    ///
    /// A missing root directory yields an empty registry.
    pub fn scan(fs: &dyn FileSystem, config: &ConsoleConfig, stats: &Stats) -> Self {
        let mut registry = Self::new(config);

        let Some(mut dir) = fs.namei(config.root_path) else {
            log::warn!("console: {} not found, no commands registered", config.root_path);
            return registry;
        };

        dir.lock();
        let size = dir.size();
        let mut off = 0;
        while off < size && !registry.table.is_full() {
            let Some(de) = dir.read_entry(off) else {
                break;
            };
            off += DirEntry::SIZE;

            if de.inum == 0 {
                continue;
            }
            let Ok(name) = core::str::from_utf8(de.name()) else {
                stats.command_skipped();
                continue;
            };
            if let Err(reason) = registry.register(name, stats) {
                log::debug!("console: skipping {:?}: {}", name, reason);
            }
        }
        dir.unlock_put();

        log::info!(
            "console: {} commands registered ({} trie nodes)",
            registry.table.len(),
            registry.trie.node_count()
        );
        registry
    }

    /// Register one command name.
    ///
    /// The name goes into the table even if the trie runs out of nodes; it
    /// then shows up in ambiguous listings but never completes on its own.
    pub fn register(&mut self, name: &str, stats: &Stats) -> Result<(), SkipReason> {
        let reason = if name.is_empty() {
            Some(SkipReason::Empty)
        } else if name.starts_with('.') {
            Some(SkipReason::Hidden)
        } else if name.len() >= self.name_limit {
            Some(SkipReason::TooLong)
        } else if self.table.is_full() {
            Some(SkipReason::TableFull)
        } else {
            None
        };
        if let Some(reason) = reason {
            stats.command_skipped();
            return Err(reason);
        }

        self.table.push(name);
        if let Err(err) = self.trie.insert(name) {
            stats.trie_exhausted();
            log::warn!("console: {:?} not completable: {}", name, err);
        }
        Ok(())
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn trie(&self) -> &CommandTrie {
        &self.trie
    }

    /// Longest prefix that can still match a registered name.
    pub fn name_limit(&self) -> usize {
        self.name_limit
    }

    pub fn complete(&self, prefix: &[u8]) -> Matches<'_> {
        if prefix.len() >= self.name_limit {
            return Matches::None;
        }
        self.trie.complete(prefix)
    }
}
