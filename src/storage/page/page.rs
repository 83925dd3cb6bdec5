//! Page - the fixed-size unit of storage.
//!
//! A [`Page`] is an owned byte buffer of the index file's page size. It is
//! the unit of I/O between the [`DiskManager`](crate::storage::DiskManager)
//! and the node types, which decode it through the bounds-checked accessors
//! below instead of raw pointer arithmetic.

use crate::common::{Error, PageId, Result};

/// A page of data.
///
/// # Memory Layout
/// - Size: chosen per index file (see [`IndexConfig`](crate::IndexConfig))
/// - All multi-byte fields are little-endian
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code; copying a page
/// should be explicit. A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use rangeindex::storage::page::Page;
///
/// let mut page = Page::new(64);
/// page.put_i32(0, -7).unwrap();
/// assert_eq!(page.get_i32(0).unwrap(), -7);
/// assert!(page.get_i32(62).is_err());
/// ```
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    /// Create a new zeroed page.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Create a page with every byte set to `byte`.
    ///
    /// Node pages start out `0xFF`-filled so unused slots decode as
    /// [`PageId::INVALID`].
    pub fn filled(size: usize, byte: u8) -> Self {
        Self {
            data: vec![byte; size].into_boxed_slice(),
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of this page.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Read 4 bytes at `offset`.
    fn get_4(&self, offset: usize) -> Result<[u8; 4]> {
        offset
            .checked_add(4)
            .and_then(|end| self.data.get(offset..end))
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                Error::Corrupted(format!(
                    "read of 4 bytes at offset {} past page of {} bytes",
                    offset,
                    self.data.len()
                ))
            })
    }

    /// Write 4 bytes at `offset`.
    fn put_4(&mut self, offset: usize, bytes: [u8; 4]) -> Result<()> {
        let len = self.data.len();
        let slot = offset
            .checked_add(4)
            .and_then(|end| self.data.get_mut(offset..end))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "write of 4 bytes at offset {} past page of {} bytes",
                    offset, len
                ))
            })?;
        slot.copy_from_slice(&bytes);
        Ok(())
    }

    /// Read a little-endian `u32`.
    pub fn get_u32(&self, offset: usize) -> Result<u32> {
        self.get_4(offset).map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn get_i32(&self, offset: usize) -> Result<i32> {
        self.get_4(offset).map(i32::from_le_bytes)
    }

    /// Read a [`PageId`].
    pub fn get_page_id(&self, offset: usize) -> Result<PageId> {
        self.get_4(offset).map(PageId::from_le_bytes)
    }

    /// Write a little-endian `u32`.
    pub fn put_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        self.put_4(offset, value.to_le_bytes())
    }

    /// Write a little-endian `i32`.
    pub fn put_i32(&mut self, offset: usize, value: i32) -> Result<()> {
        self.put_4(offset, value.to_le_bytes())
    }

    /// Write a [`PageId`].
    pub fn put_page_id(&mut self, offset: usize, page_id: PageId) -> Result<()> {
        self.put_4(offset, page_id.to_le_bytes())
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
