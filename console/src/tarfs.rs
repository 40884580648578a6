//! Read-only root directory over a USTAR boot archive.
//!
//! Lets the command registry be populated from the boot ramdisk. The root
//! directory is synthesized as fixed-size [`DirEntry`] records: `.` and `..`
//! first, then every top-level regular file in archive order. Nested paths
//! are not part of the root and are left out.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::registry::{DirEntry, DirInode, FileSystem};

/// Size of a single tar block (header or data padding unit).
const BLOCK: usize = 512;

/// Offset and size of the `magic` field in a USTAR header.
const MAGIC_OFFSET: usize = 257;
const MAGIC_LEN: usize = 5;

const NAME_LEN: usize = 100;
const SIZE_FIELD: core::ops::Range<usize> = 124..136;
const TYPEFLAG_OFFSET: usize = 156;

/// Inode number of the root directory.
const ROOT_INUM: u16 = 1;

/// A parsed header.
#[derive(Debug, Clone, Copy)]
pub struct TarEntry<'a> {
    pub name: &'a str,
    pub size: usize,
    pub typeflag: u8,
}

impl TarEntry<'_> {
    pub fn is_file(&self) -> bool {
        self.typeflag == b'0' || self.typeflag == 0
    }
}

/// Walks the headers of an in-memory archive.
pub struct TarIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> TarIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }
}

impl<'a> Iterator for TarIter<'a> {
    type Item = TarEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let header = self.buf.get(self.offset..self.offset + BLOCK)?;

            // A zero block marks the end of the archive.
            if header.iter().all(|&b| b == 0) {
                return None;
            }

            if &header[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC_LEN] != b"ustar" {
                self.offset += BLOCK;
                continue;
            }

            let name_bytes = &header[..NAME_LEN];
            let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
            let size = parse_octal(&header[SIZE_FIELD]);
            let typeflag = header[TYPEFLAG_OFFSET];

            self.offset += BLOCK + size.div_ceil(BLOCK) * BLOCK;

            // Unreadable names cannot become commands; skip the entry.
            let Ok(name) = core::str::from_utf8(&name_bytes[..name_end]) else {
                continue;
            };
            return Some(TarEntry {
                name,
                size,
                typeflag,
            });
        }
    }
}

/// Parse an octal ASCII field (NUL/space terminated).
fn parse_octal(field: &[u8]) -> usize {
    field
        .iter()
        .take_while(|&&b| b != 0 && b != b' ')
        .filter(|b| (b'0'..=b'7').contains(b))
        .fold(0usize, |acc, &b| acc.wrapping_mul(8).wrapping_add((b - b'0') as usize))
}

pub struct TarFs<'a> {
    image: &'a [u8],
}

impl<'a> TarFs<'a> {
    pub fn new(image: &'a [u8]) -> Self {
        Self { image }
    }

    pub fn entries(&self) -> TarIter<'a> {
        TarIter::new(self.image)
    }

    fn root_records(&self) -> Vec<DirEntry> {
        let mut records = Vec::new();
        records.push(DirEntry::new(ROOT_INUM, "."));
        records.push(DirEntry::new(ROOT_INUM, ".."));

        for (index, entry) in self.entries().enumerate() {
            let name = entry.name.strip_prefix("./").unwrap_or(entry.name);
            if !entry.is_file() || name.is_empty() || name.contains('/') {
                continue;
            }
            let inum = u16::try_from(index + 2).unwrap_or(u16::MAX);
            records.push(DirEntry::new(inum, name));
        }
        records
    }
}

impl FileSystem for TarFs<'_> {
    fn namei<'f>(&'f self, path: &str) -> Option<Box<dyn DirInode + 'f>> {
        if path != "/" {
            return None;
        }
        Some(Box::new(TarRoot {
            records: self.root_records(),
        }))
    }
}

struct TarRoot {
    records: Vec<DirEntry>,
}

impl DirInode for TarRoot {
    // The archive is immutable; there is nothing to lock.
    fn lock(&mut self) {}

    fn size(&self) -> usize {
        self.records.len() * DirEntry::SIZE
    }

    fn read_entry(&mut self, off: usize) -> Option<DirEntry> {
        if off % DirEntry::SIZE != 0 {
            return None;
        }
        self.records.get(off / DirEntry::SIZE).copied()
    }

    fn unlock_put(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use crate::registry::CommandRegistry;
    use crate::stats::Stats;

    fn header(name: &str, size: usize, typeflag: u8) -> [u8; BLOCK] {
        let mut h = [0u8; BLOCK];
        h[..name.len()].copy_from_slice(name.as_bytes());
        let octal = format!("{:011o}", size);
        h[SIZE_FIELD.start..SIZE_FIELD.start + 11].copy_from_slice(octal.as_bytes());
        h[TYPEFLAG_OFFSET] = typeflag;
        h[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC_LEN].copy_from_slice(b"ustar");
        h
    }

    fn archive(files: &[(&str, &[u8], u8)]) -> Vec<u8> {
        let mut out = Vec::new();
        for &(name, data, typeflag) in files {
            out.extend_from_slice(&header(name, data.len(), typeflag));
            out.extend_from_slice(data);
            out.resize(out.len().next_multiple_of(BLOCK), 0);
        }
        out.extend_from_slice(&[0u8; 2 * BLOCK]);
        out
    }

    #[test]
    fn iterates_headers_and_skips_data_blocks() {
        let image = archive(&[("./cat", &[7u8; 600], b'0'), ("./ls", b"elf", b'0')]);
        let names: Vec<_> = TarIter::new(&image).map(|e| (e.name, e.size)).collect();
        assert_eq!(names, [("./cat", 600), ("./ls", 3)]);
    }

    #[test]
    fn root_lists_top_level_files_after_dot_entries() {
        let image = archive(&[
            ("./", b"", b'5'),
            ("./sh", b"x", b'0'),
            ("./bin/", b"", b'5'),
            ("./bin/nested", b"y", b'0'),
            ("echo", b"z", b'0'),
        ]);
        let fs = TarFs::new(&image);
        let mut dir = fs.namei("/").unwrap();
        dir.lock();
        let names: Vec<Vec<u8>> = (0..dir.size())
            .step_by(DirEntry::SIZE)
            .filter_map(|off| dir.read_entry(off))
            .map(|de| de.name().to_vec())
            .collect();
        dir.unlock_put();
        assert_eq!(names, [&b"."[..], b"..", b"sh", b"echo"]);
    }

    #[test]
    fn only_the_root_resolves() {
        let image = archive(&[]);
        assert!(TarFs::new(&image).namei("/bin").is_none());
    }

    #[test]
    fn registry_scans_a_boot_archive() {
        let image = archive(&[("./ls", b"", b'0'), ("./cat", b"", b'0'), ("./.profile", b"", b'0')]);
        let reg = CommandRegistry::scan(&TarFs::new(&image), &ConsoleConfig::DEFAULT, &Stats::new());
        assert_eq!(reg.table().iter().collect::<Vec<_>>(), ["ls", "cat"]);
    }

    #[test]
    fn parses_padded_octal() {
        assert_eq!(parse_octal(b"00000001750\0"), 1000);
        assert_eq!(parse_octal(b"17 "), 15);
    }
}
