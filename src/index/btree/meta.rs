//! Index metadata stored in page 0.
//!
//! # Layout (20 bytes, rest of the page zero)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     root_pid (PageId, INVALID when empty)
//! 4       4     tree_height (u32)
//! 8       4     magic "RIDX"
//! 12      4     page_size (u32)
//! 16      4     checksum (CRC32 of bytes 0..16)
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Page id of the metadata page.
pub const META_PAGE_ID: PageId = PageId(0);

/// Root pointer and height of a tree, plus the file's page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMeta {
    pub root_pid: PageId,
    /// 0 = empty, 1 = root is a leaf, n = n levels from root to leaf.
    pub tree_height: u32,
    pub page_size: usize,
}

impl IndexMeta {
    /// Size of the encoded record.
    pub const SIZE: usize = 20;

    pub const MAGIC: [u8; 4] = *b"RIDX";

    const OFFSET_ROOT: usize = 0;
    const OFFSET_HEIGHT: usize = 4;
    const OFFSET_MAGIC: usize = 8;
    const OFFSET_PAGE_SIZE: usize = 12;
    const OFFSET_CHECKSUM: usize = 16;

    /// Metadata of a tree with no entries.
    pub fn empty(page_size: usize) -> Self {
        Self {
            root_pid: PageId::INVALID,
            tree_height: 0,
            page_size,
        }
    }

    /// Encode into a full page image.
    pub fn to_page(&self) -> Result<Page> {
        let mut page = Page::new(self.page_size);
        page.put_page_id(Self::OFFSET_ROOT, self.root_pid)?;
        page.put_u32(Self::OFFSET_HEIGHT, self.tree_height)?;
        page.as_mut_slice()[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4]
            .copy_from_slice(&Self::MAGIC);
        page.put_u32(Self::OFFSET_PAGE_SIZE, self.page_size as u32)?;

        let checksum = Self::compute_checksum(page.as_slice());
        page.put_u32(Self::OFFSET_CHECKSUM, checksum)?;
        Ok(page)
    }

    /// Decode and validate page 0.
    ///
    /// # Errors
    /// - `Error::Corrupted` on a bad magic, checksum, or root/height pair
    /// - `Error::PageSizeMismatch` if the recorded page size differs from
    ///   the size of `page`
    pub fn from_page(page: &Page) -> Result<Self> {
        let data = page.as_slice();
        if data.len() < Self::SIZE {
            return Err(Error::Corrupted(format!(
                "metadata page of {} bytes",
                data.len()
            )));
        }
        if data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4] != Self::MAGIC {
            return Err(Error::Corrupted("bad magic in metadata page".to_string()));
        }
        let stored = page.get_u32(Self::OFFSET_CHECKSUM)?;
        if stored != Self::compute_checksum(data) {
            return Err(Error::Corrupted(
                "metadata checksum mismatch".to_string(),
            ));
        }

        let page_size = page.get_u32(Self::OFFSET_PAGE_SIZE)? as usize;
        if page_size != data.len() {
            return Err(Error::PageSizeMismatch {
                expected: data.len(),
                actual: page_size,
            });
        }

        let meta = Self {
            root_pid: page.get_page_id(Self::OFFSET_ROOT)?,
            tree_height: page.get_u32(Self::OFFSET_HEIGHT)?,
            page_size,
        };
        if (meta.tree_height == 0) == meta.root_pid.is_valid() {
            return Err(Error::Corrupted(format!(
                "root {} inconsistent with height {}",
                meta.root_pid, meta.tree_height
            )));
        }
        Ok(meta)
    }

    /// Read the page size recorded in an existing index file.
    ///
    /// Returns `None` for an empty file.
    pub fn probe_page_size<P: AsRef<Path>>(path: P) -> Result<Option<usize>> {
        let mut file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }

        let mut header = [0u8; Self::SIZE];
        file.read_exact(&mut header)?;
        if header[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4] != Self::MAGIC {
            return Err(Error::Corrupted("bad magic in metadata page".to_string()));
        }
        let mut size = [0u8; 4];
        size.copy_from_slice(&header[Self::OFFSET_PAGE_SIZE..Self::OFFSET_PAGE_SIZE + 4]);
        Ok(Some(u32::from_le_bytes(size) as usize))
    }

    /// CRC32 of the fields before the checksum.
    fn compute_checksum(data: &[u8]) -> u32 {
        crc32fast::hash(&data[..Self::OFFSET_CHECKSUM])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip() {
        let meta = IndexMeta {
            root_pid: PageId::new(12),
            tree_height: 3,
            page_size: 64,
        };
        let page = meta.to_page().unwrap();
        assert_eq!(IndexMeta::from_page(&page).unwrap(), meta);
    }

    #[test]
    fn test_empty_roundtrip() {
        let meta = IndexMeta::empty(1024);
        let page = meta.to_page().unwrap();
        let decoded = IndexMeta::from_page(&page).unwrap();
        assert_eq!(decoded.tree_height, 0);
        assert_eq!(decoded.root_pid, PageId::INVALID);
    }

    #[test]
    fn test_byte_layout() {
        let page = IndexMeta::empty(64).to_page().unwrap();
        let bytes = page.as_slice();
        assert_eq!(&bytes[0..4], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[4..8], &0u32.to_le_bytes());
        assert_eq!(&bytes[8..12], b"RIDX");
        assert_eq!(&bytes[12..16], &64u32.to_le_bytes());
        assert!(bytes[IndexMeta::SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_detects_corruption() {
        let mut page = IndexMeta::empty(64).to_page().unwrap();
        page.as_mut_slice()[4] = 9;
        assert!(matches!(
            IndexMeta::from_page(&page),
            Err(Error::Corrupted(_))
        ));

        let zeroed = Page::new(64);
        assert!(matches!(
            IndexMeta::from_page(&zeroed),
            Err(Error::Corrupted(_))
        ));
    }

    #[test]
    fn test_inconsistent_root_and_height() {
        let meta = IndexMeta {
            root_pid: PageId::INVALID,
            tree_height: 2,
            page_size: 64,
        };
        let page = meta.to_page().unwrap();
        assert!(matches!(
            IndexMeta::from_page(&page),
            Err(Error::Corrupted(_))
        ));
    }

    #[test]
    fn test_probe_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.idx");

        File::create(&path).unwrap();
        assert_eq!(IndexMeta::probe_page_size(&path).unwrap(), None);

        let page = IndexMeta::empty(128).to_page().unwrap();
        File::create(&path)
            .unwrap()
            .write_all(page.as_slice())
            .unwrap();
        assert_eq!(IndexMeta::probe_page_size(&path).unwrap(), Some(128));
    }
}
