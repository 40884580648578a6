//! Command-name prefix trie for tab completion.
//!
//! Built once at boot, read-only afterwards, so lookups from the line editor
//! need no lock. Nodes live in an arena owned by the trie and refer to each
//! other by index; nothing is ever freed.
//!
//! Children are keyed by byte in an ordered map: lookup is an exact byte
//! match and depth-first traversal visits children in ascending byte order,
//! exactly like scanning a dense 128-slot child array.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::TrieError;

/// Size of the alphabet a node can branch on (7-bit ASCII).
pub const TRIE_CHILDREN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct TrieNode {
    children: BTreeMap<u8, NodeId>,
    /// Set only on terminal nodes: the full command name.
    command: Option<String>,
}

impl TrieNode {
    pub fn is_terminal(&self) -> bool {
        self.command.is_some()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

/// Outcome of collecting the commands below a trie node.
///
/// Collection stops descending once a second match is seen, so only the
/// single-match case carries a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matches<'t> {
    None,
    One(&'t str),
    Many,
}

pub struct CommandTrie {
    nodes: Vec<TrieNode>,
    budget: usize,
}

impl CommandTrie {
    /// An empty trie whose arena may hold at most `budget` nodes (root
    /// included).
    pub fn new(budget: usize) -> Self {
        let mut nodes = Vec::new();
        nodes.push(TrieNode::default());
        Self {
            nodes,
            budget: budget.max(1),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    fn alloc(&mut self) -> Result<NodeId, TrieError> {
        if self.nodes.len() >= self.budget || self.nodes.len() >= u32::MAX as usize {
            return Err(TrieError::Exhausted);
        }
        self.nodes
            .try_reserve(1)
            .map_err(|_| TrieError::Exhausted)?;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TrieNode::default());
        Ok(id)
    }

    /// Insert `name`, creating nodes as needed, and mark its last node
    /// terminal.
    ///
    /// On failure the nodes created so far stay in place but nothing is
    /// marked terminal, so the name simply never matches.
    pub fn insert(&mut self, name: &str) -> Result<(), TrieError> {
        let mut node = NodeId::ROOT;
        for &b in name.as_bytes() {
            if b as usize >= TRIE_CHILDREN {
                return Err(TrieError::NotAscii(b));
            }
            node = match self.nodes[node.index()].children.get(&b) {
                Some(&child) => child,
                None => {
                    let child = self.alloc()?;
                    self.nodes[node.index()].children.insert(b, child);
                    child
                }
            };
        }
        self.nodes[node.index()].command = Some(String::from(name));
        Ok(())
    }

    /// Walk `prefix` byte by byte from the root.
    pub fn find(&self, prefix: &[u8]) -> Option<NodeId> {
        prefix.iter().try_fold(NodeId::ROOT, |node, b| {
            self.nodes[node.index()].children.get(b).copied()
        })
    }

    /// Depth-first collection of the commands at or below `node`.
    pub fn collect(&self, node: NodeId) -> Matches<'_> {
        let mut found = 0usize;
        let mut first = None;
        self.collect_into(node, &mut first, &mut found);
        match (found, first) {
            (0, _) | (_, None) => Matches::None,
            (1, Some(name)) => Matches::One(name),
            _ => Matches::Many,
        }
    }

    fn collect_into<'t>(&'t self, node: NodeId, first: &mut Option<&'t str>, found: &mut usize) {
        if *found > 1 {
            return;
        }
        let n = &self.nodes[node.index()];
        if let Some(cmd) = n.command() {
            first.get_or_insert(cmd);
            *found += 1;
        }
        for &child in n.children.values() {
            self.collect_into(child, first, found);
        }
    }

    /// `find` followed by `collect`; an unknown prefix yields no matches.
    pub fn complete(&self, prefix: &[u8]) -> Matches<'_> {
        match self.find(prefix) {
            Some(node) => self.collect(node),
            None => Matches::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(names: &[&str]) -> CommandTrie {
        let mut t = CommandTrie::new(1024);
        for n in names {
            t.insert(n).unwrap();
        }
        t
    }

    #[test]
    fn inserted_name_is_terminal_with_its_name() {
        let t = trie(&["cat", "ls"]);
        let node = t.find(b"cat").unwrap();
        assert!(t.node(node).is_terminal());
        assert_eq!(t.node(node).command(), Some("cat"));
        assert!(!t.node(t.find(b"ca").unwrap()).is_terminal());
    }

    #[test]
    fn extension_past_a_leaf_is_not_found() {
        let t = trie(&["ls"]);
        assert!(t.find(b"lsx").is_none());
        assert!(t.find(b"z").is_none());
    }

    #[test]
    fn empty_prefix_is_the_root() {
        let t = trie(&["ls"]);
        assert_eq!(t.find(b""), Some(NodeId::ROOT));
    }

    #[test]
    fn collect_distinguishes_zero_one_many() {
        let t = trie(&["ls", "list", "cat"]);
        assert_eq!(t.complete(b"c"), Matches::One("cat"));
        assert_eq!(t.complete(b"l"), Matches::Many);
        assert_eq!(t.complete(b"li"), Matches::One("list"));
        assert_eq!(t.complete(b"q"), Matches::None);
    }

    #[test]
    fn prefix_that_is_itself_a_command_with_extensions_is_ambiguous() {
        let t = trie(&["sh", "shutdown"]);
        assert_eq!(t.complete(b"sh"), Matches::Many);
        assert_eq!(t.complete(b"shu"), Matches::One("shutdown"));
    }

    #[test]
    fn exhausted_arena_leaves_name_unterminated() {
        // Root + 2 nodes: "ab" fits, "abc" needs a third.
        let mut t = CommandTrie::new(3);
        t.insert("ab").unwrap();
        assert_eq!(t.insert("xyz"), Err(TrieError::Exhausted));
        assert_eq!(t.insert("abc"), Err(TrieError::Exhausted));
        assert_eq!(t.complete(b"x"), Matches::None);
        assert_eq!(t.complete(b"a"), Matches::One("ab"));
        assert_eq!(t.node_count(), 3);
    }

    #[test]
    fn non_ascii_bytes_are_rejected() {
        let mut t = CommandTrie::new(16);
        assert_eq!(t.insert("é"), Err(TrieError::NotAscii(0xc3)));
    }
}
