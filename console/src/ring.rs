//! Console input ring buffer.
//!
//! Fixed-size circular storage addressed by three free-running cursors:
//!
//! ```text
//!   r ──────────── w ──────────── e
//!   │  committed   │ in progress  │
//!   │ (readable)   │  (editable)  │
//! ```
//!
//! `r <= w <= e` always holds, and `e - r <= INPUT_BUF`. The cursors are never
//! reduced modulo the capacity; they wrap at `usize::MAX`, which
//! `INPUT_BUF` divides evenly, so all arithmetic is wrapping.

use crate::config::INPUT_BUF;

pub struct InputRing {
    buf: [u8; INPUT_BUF],
    /// Read index.
    r: usize,
    /// Write (commit) index.
    w: usize,
    /// Edit index.
    e: usize,
}

impl InputRing {
    pub const fn new() -> Self {
        Self {
            buf: [0; INPUT_BUF],
            r: 0,
            w: 0,
            e: 0,
        }
    }

    pub fn r(&self) -> usize {
        self.r
    }

    pub fn w(&self) -> usize {
        self.w
    }

    pub fn e(&self) -> usize {
        self.e
    }

    /// Byte stored at free-running position `pos`.
    pub fn at(&self, pos: usize) -> u8 {
        self.buf[pos % INPUT_BUF]
    }

    /// Nothing may be added until the reader catches up.
    pub fn is_full(&self) -> bool {
        self.e.wrapping_sub(self.r) >= INPUT_BUF
    }

    /// Committed bytes are waiting for a reader.
    pub fn has_committed(&self) -> bool {
        self.r != self.w
    }

    /// Something has been typed since the last commit.
    pub fn has_pending(&self) -> bool {
        self.e != self.w
    }

    /// Append at `e`. Returns `false` (and stores nothing) when full.
    pub fn push(&mut self, c: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.e % INPUT_BUF] = c;
        self.e = self.e.wrapping_add(1);
        true
    }

    /// The byte just before `e`, if it is still editable.
    pub fn last_pending(&self) -> Option<u8> {
        self.has_pending().then(|| self.at(self.e.wrapping_sub(1)))
    }

    /// Drop the last editable byte. Never crosses the commit point.
    pub fn unpush(&mut self) -> Option<u8> {
        let c = self.last_pending()?;
        self.e = self.e.wrapping_sub(1);
        Some(c)
    }

    /// Make everything typed so far visible to readers.
    pub fn commit(&mut self) {
        self.w = self.e;
    }

    /// Take the next committed byte.
    pub fn pop(&mut self) -> Option<u8> {
        if !self.has_committed() {
            return None;
        }
        let c = self.at(self.r);
        self.r = self.r.wrapping_add(1);
        Some(c)
    }

    /// Give back the byte the last `pop` returned.
    pub fn unpop(&mut self) {
        self.r = self.r.wrapping_sub(1);
    }

    /// The in-progress region `[w, e)`, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = u8> + '_ {
        self.span(self.w, self.e)
    }

    /// The committed region `[r, w)`, oldest first.
    pub fn committed(&self) -> impl Iterator<Item = u8> + '_ {
        self.span(self.r, self.w)
    }

    fn span(&self, from: usize, to: usize) -> impl Iterator<Item = u8> + '_ {
        (0..to.wrapping_sub(from)).map(move |i| self.at(from.wrapping_add(i)))
    }
}

impl Default for InputRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(ring: &InputRing) -> Vec<u8> {
        ring.pending().collect()
    }

    #[test]
    fn push_commit_pop() {
        let mut ring = InputRing::new();
        for &c in b"ls\n" {
            assert!(ring.push(c));
        }
        assert!(!ring.has_committed());
        ring.commit();
        assert_eq!(ring.committed().collect::<Vec<_>>(), b"ls\n");
        assert_eq!(ring.pop(), Some(b'l'));
        assert_eq!(ring.pop(), Some(b's'));
        assert_eq!(ring.pop(), Some(b'\n'));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn unpush_stops_at_commit_point() {
        let mut ring = InputRing::new();
        ring.push(b'a');
        ring.commit();
        ring.push(b'b');
        assert_eq!(ring.unpush(), Some(b'b'));
        assert_eq!(ring.unpush(), None);
        assert_eq!(ring.e(), ring.w());
    }

    #[test]
    fn full_ring_refuses_bytes() {
        let mut ring = InputRing::new();
        for _ in 0..INPUT_BUF {
            assert!(ring.push(b'x'));
        }
        assert!(ring.is_full());
        assert!(!ring.push(b'y'));
        assert_eq!(ring.e() - ring.r(), INPUT_BUF);
    }

    #[test]
    fn cursors_wrap_around_storage() {
        let mut ring = InputRing::new();
        // Walk the cursors well past one lap of the storage.
        for lap in 0..3 {
            for i in 0..INPUT_BUF - 1 {
                ring.push(b'a' + ((lap + i) % 26) as u8);
            }
            ring.commit();
            while ring.pop().is_some() {}
        }
        ring.push(b'q');
        ring.push(b'z');
        assert_eq!(pending(&ring), b"qz");
        assert!(ring.e() > INPUT_BUF);
    }

    #[test]
    fn cursors_survive_counter_overflow() {
        let mut ring = InputRing::new();
        ring.r = usize::MAX - 1;
        ring.w = usize::MAX - 1;
        ring.e = usize::MAX - 1;
        for &c in b"abcd" {
            ring.push(c);
        }
        assert_eq!(pending(&ring), b"abcd");
        ring.commit();
        assert_eq!(ring.pop(), Some(b'a'));
        ring.unpop();
        assert_eq!(ring.committed().collect::<Vec<_>>(), b"abcd");
    }
}
