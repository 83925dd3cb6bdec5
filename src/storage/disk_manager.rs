//! Disk Manager - low-level file I/O for index pages.
//!
//! The [`DiskManager`] is the paged store underneath the index:
//! - Reading and writing whole pages
//! - Appending new pages at [`DiskManager::end_pid`]
//! - Managing the index file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// How an index file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, no writes allowed.
    Read,
    /// Read-write; the file is created if it does not exist.
    Write,
}

/// Manages disk I/O for a single index file.
///
/// # File Layout
/// Pages are laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0   page_size  2×page_size ...  N×page_size
/// ```
///
/// # Allocation
/// There is no free list. "Allocate a page" means "write at
/// [`end_pid`](Self::end_pid)", which appends to the file.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. Every method that touches the file
/// takes `&mut self`.
///
/// # Durability
/// Writes go straight to the file; `fsync()` happens in [`sync`](Self::sync)
/// and [`close`](Self::close).
pub struct DiskManager {
    file: File,
    mode: OpenMode,
    page_size: usize,
    /// Number of pages in the file.
    page_count: u32,
}

impl DiskManager {
    /// Create a new index file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        debug!("created {} (page size {})", path.as_ref().display(), page_size);
        Ok(Self {
            file,
            mode: OpenMode::Write,
            page_size,
            page_count: 0,
        })
    }

    /// Open an index file.
    ///
    /// In [`OpenMode::Read`] the file must exist. In [`OpenMode::Write`] it is
    /// created when absent.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, or
    /// `Error::Corrupted` if its length is not a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode, page_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if mode == OpenMode::Write && !path.exists() {
            return Self::create(path, page_size);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(mode == OpenMode::Write)
            .open(path)?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        if file_size % page_size as u64 != 0 {
            return Err(Error::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                file_size, page_size
            )));
        }
        let page_count = u32::try_from(file_size / page_size as u64)
            .map_err(|_| Error::Corrupted(format!("file size {} too large", file_size)))?;

        debug!(
            "opened {} in {:?} mode with {} pages",
            path.display(),
            mode,
            page_count
        );
        Ok(Self {
            file,
            mode,
            page_size,
            page_count,
        })
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if !page_id.is_valid() || page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id));
        }

        self.file.seek(SeekFrom::Start(self.offset_of(page_id)))?;

        let mut page = Page::new(self.page_size);
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// Writing at [`end_pid`](Self::end_pid) appends a new page; writing at a
    /// smaller id overwrites it.
    ///
    /// # Errors
    /// - `Error::ReadOnly` if the file was opened in read mode
    /// - `Error::InvalidArgument` if the page has the wrong size
    /// - `Error::PageNotFound` if `page_id` is past the end of the file
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Err(Error::ReadOnly);
        }
        if page.size() != self.page_size {
            return Err(Error::InvalidArgument(format!(
                "page of {} bytes written to file with page size {}",
                page.size(),
                self.page_size
            )));
        }
        if !page_id.is_valid() || page_id.0 > self.page_count {
            return Err(Error::PageNotFound(page_id));
        }

        self.file.seek(SeekFrom::Start(self.offset_of(page_id)))?;
        self.file.write_all(page.as_slice())?;

        if page_id.0 == self.page_count {
            self.page_count += 1;
        }
        Ok(())
    }

    /// Id the next appended page will get.
    #[inline]
    pub fn end_pid(&self) -> PageId {
        PageId::new(self.page_count)
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the page size of the file.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Mode the file was opened in.
    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (self.page_size as u64)
    }

    /// Flush written pages to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        if self.mode == OpenMode::Write {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Sync and release the file.
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    #[inline]
    fn offset_of(&self, page_id: PageId) -> u64 {
        (page_id.0 as u64) * (self.page_size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PS: usize = 64;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let dm = DiskManager::create(&path, PS).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.end_pid(), PageId::new(0));
        assert_eq!(dm.file_size(), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        DiskManager::create(&path, PS).unwrap();
        assert!(DiskManager::create(&path, PS).is_err());
    }

    #[test]
    fn test_open_nonexistent_read_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.idx");

        assert!(matches!(
            DiskManager::open(&path, OpenMode::Read, PS),
            Err(Error::Io(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_write_creates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.idx");

        let dm = DiskManager::open(&path, OpenMode::Write, PS).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_append_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut dm = DiskManager::create(&path, PS).unwrap();

        let mut page = Page::new(PS);
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[PS - 1] = 0xEF;

        let pid = dm.end_pid();
        dm.write_page(pid, &page).unwrap();
        assert_eq!(dm.page_count(), 1);
        assert_eq!(dm.end_pid(), PageId::new(1));

        let read = dm.read_page(pid).unwrap();
        assert_eq!(read.as_slice()[0], 0xAB);
        assert_eq!(read.as_slice()[PS - 1], 0xEF);
    }

    #[test]
    fn test_overwrite_keeps_page_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut dm = DiskManager::create(&path, PS).unwrap();

        dm.write_page(PageId::new(0), &Page::new(PS)).unwrap();
        let mut page = Page::new(PS);
        page.as_mut_slice()[3] = 7;
        dm.write_page(PageId::new(0), &page).unwrap();

        assert_eq!(dm.page_count(), 1);
        assert_eq!(dm.read_page(PageId::new(0)).unwrap().as_slice()[3], 7);
    }

    #[test]
    fn test_write_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut dm = DiskManager::create(&path, PS).unwrap();

        let result = dm.write_page(PageId::new(1), &Page::new(PS));
        assert!(matches!(result, Err(Error::PageNotFound(_))));
    }

    #[test]
    fn test_write_wrong_size_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut dm = DiskManager::create(&path, PS).unwrap();

        let result = dm.write_page(PageId::new(0), &Page::new(PS * 2));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut dm = DiskManager::create(&path, PS).unwrap();
        dm.write_page(PageId::new(0), &Page::new(PS)).unwrap();

        assert!(matches!(
            dm.read_page(PageId::new(1)),
            Err(Error::PageNotFound(_))
        ));
        assert!(matches!(
            dm.read_page(PageId::INVALID),
            Err(Error::PageNotFound(_))
        ));
    }

    #[test]
    fn test_persistence_and_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        {
            let mut dm = DiskManager::create(&path, PS).unwrap();
            for i in 0..3u8 {
                let mut page = Page::new(PS);
                page.as_mut_slice()[0] = i;
                dm.write_page(dm.end_pid(), &page).unwrap();
            }
            dm.close().unwrap();
        }

        let mut dm = DiskManager::open(&path, OpenMode::Read, PS).unwrap();
        assert_eq!(dm.page_count(), 3);
        for i in 0..3u8 {
            let page = dm.read_page(PageId::new(i as u32)).unwrap();
            assert_eq!(page.as_slice()[0], i);
        }
        assert!(matches!(
            dm.write_page(PageId::new(0), &Page::new(PS)),
            Err(Error::ReadOnly)
        ));
    }

    #[test]
    fn test_open_with_wrong_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        {
            let mut dm = DiskManager::create(&path, PS).unwrap();
            dm.write_page(PageId::new(0), &Page::new(PS)).unwrap();
        }

        assert!(matches!(
            DiskManager::open(&path, OpenMode::Read, 48),
            Err(Error::Corrupted(_))
        ));
    }
}
