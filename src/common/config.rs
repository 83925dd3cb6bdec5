//! Configuration for index files.
//!
//! Unlike a fixed compile-time page size, the page size of an index file is
//! chosen when the file is created and recorded in its metadata page. Small
//! page sizes are useful for exercising splits with only a handful of keys.

use crate::common::{Error, Result};

/// Default page size in bytes (1KB).
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// Smallest supported page size.
///
/// At 32 bytes a leaf holds 2 entries and an internal node 3 keys, which is
/// the minimum for a split to leave both halves non-empty. The metadata
/// record (20 bytes) also fits.
pub const MIN_PAGE_SIZE: usize = 32;

/// Largest supported page size (64KB).
pub const MAX_PAGE_SIZE: usize = 64 * 1024;

/// Size of an on-disk `PageId`.
pub const PAGE_ID_SIZE: usize = 4;

/// Size of an on-disk key (`i32`).
pub const KEY_SIZE: usize = 4;

/// Size of an on-disk `RecordId` (page id + slot).
pub const RECORD_ID_SIZE: usize = 8;

/// Size of one leaf entry: key + record id.
pub const LEAF_ENTRY_SIZE: usize = KEY_SIZE + RECORD_ID_SIZE;

/// Size of one internal entry: key + child page id.
pub const INTERNAL_ENTRY_SIZE: usize = KEY_SIZE + PAGE_ID_SIZE;

/// Maximum number of entries in a leaf page.
///
/// The last `PAGE_ID_SIZE` bytes of a leaf hold the next-leaf pointer, so
/// `capacity * 12 + 4 <= page_size`.
#[inline]
pub const fn leaf_capacity(page_size: usize) -> usize {
    page_size.saturating_sub(PAGE_ID_SIZE) / LEAF_ENTRY_SIZE
}

/// Maximum number of keys in an internal page.
///
/// One leading child pointer precedes the entries, so
/// `4 + capacity * 8 <= page_size`.
#[inline]
pub const fn internal_capacity(page_size: usize) -> usize {
    page_size.saturating_sub(PAGE_ID_SIZE) / INTERNAL_ENTRY_SIZE
}

/// Settings for creating or opening an index file.
///
/// # Example
/// ```
/// use rangeindex::IndexConfig;
///
/// let config = IndexConfig::default().with_page_size(256);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.leaf_capacity(), 21);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Size of every page in the file, in bytes.
    pub page_size: usize,
}

impl IndexConfig {
    /// Return a copy with a different page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Check that the settings describe a usable index file.
    pub fn validate(&self) -> Result<()> {
        if self.page_size < MIN_PAGE_SIZE || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidConfig(format!(
                "page size {} outside [{}, {}]",
                self.page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Leaf capacity for this page size.
    #[inline]
    pub fn leaf_capacity(&self) -> usize {
        leaf_capacity(self.page_size)
    }

    /// Internal node capacity for this page size.
    #[inline]
    pub fn internal_capacity(&self) -> usize {
        internal_capacity(self.page_size)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        assert_eq!(leaf_capacity(DEFAULT_PAGE_SIZE), 85);
        assert_eq!(internal_capacity(DEFAULT_PAGE_SIZE), 127);
    }

    #[test]
    fn test_capacity_fits_page() {
        for page_size in [MIN_PAGE_SIZE, 52, 100, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE] {
            assert!(leaf_capacity(page_size) * LEAF_ENTRY_SIZE + PAGE_ID_SIZE <= page_size);
            assert!(PAGE_ID_SIZE + internal_capacity(page_size) * INTERNAL_ENTRY_SIZE <= page_size);
        }
    }

    #[test]
    fn test_min_page_size_can_split() {
        assert_eq!(leaf_capacity(MIN_PAGE_SIZE), 2);
        assert_eq!(internal_capacity(MIN_PAGE_SIZE), 3);
    }

    #[test]
    fn test_validate() {
        assert!(IndexConfig::default().validate().is_ok());
        assert!(IndexConfig::default().with_page_size(16).validate().is_err());
        assert!(IndexConfig::default()
            .with_page_size(MAX_PAGE_SIZE + 1)
            .validate()
            .is_err());
    }
}
