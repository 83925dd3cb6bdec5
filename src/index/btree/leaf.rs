//! B+tree leaf node.
//!
//! # Page Layout
//! ```text
//! ┌───────────────┬───────────────┬─────┬──────────────┬──────────────┐
//! │ entry 0 (12B) │ entry 1 (12B) │ ... │ unused (0xFF)│ next (4B)    │
//! └───────────────┴───────────────┴─────┴──────────────┴──────────────┘
//! entry = key: i32 | rid.page: u32 | rid.slot: u32   (all little-endian)
//! ```
//!
//! There is no header. The live entry count is the number of leading slots
//! whose `rid.page` is not [`PageId::INVALID`]; unused slots are `0xFF`-filled.
//! Capacity is `floor((page_size - 4) / 12)`.

use crate::common::config::{leaf_capacity, KEY_SIZE, LEAF_ENTRY_SIZE, PAGE_ID_SIZE};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// One `(key, rid)` pair stored in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEntry {
    pub key: i32,
    pub rid: RecordId,
}

impl LeafEntry {
    pub fn new(key: i32, rid: RecordId) -> Self {
        Self { key, rid }
    }
}

/// A decoded leaf page.
///
/// A `LeafNode` is a transient view: it is decoded from one page read,
/// modified in memory, and encoded back with one page write. Entries are
/// kept sorted by key; equal keys keep insertion order.
#[derive(Debug, Clone)]
pub struct LeafNode {
    entries: Vec<LeafEntry>,
    next_leaf: PageId,
    page_size: usize,
}

impl LeafNode {
    /// Create an empty leaf that is the last in the chain.
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::with_capacity(leaf_capacity(page_size) + 1),
            next_leaf: PageId::INVALID,
            page_size,
        }
    }

    /// Decode a leaf from a page image.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if a field lies outside the page.
    pub fn from_page(page: &Page) -> Result<Self> {
        let page_size = page.size();
        let mut node = Self::new(page_size);

        for slot in 0..leaf_capacity(page_size) {
            let offset = slot * LEAF_ENTRY_SIZE;
            let rid_page = page.get_page_id(offset + KEY_SIZE)?;
            if !rid_page.is_valid() {
                break;
            }
            let key = page.get_i32(offset)?;
            let rid_slot = page.get_u32(offset + KEY_SIZE + PAGE_ID_SIZE)?;
            node.entries
                .push(LeafEntry::new(key, RecordId::new(rid_page, rid_slot)));
        }
        node.next_leaf = page.get_page_id(Self::next_offset(page_size))?;

        Ok(node)
    }

    /// Encode this leaf into a full page image.
    pub fn to_page(&self) -> Result<Page> {
        let mut page = Page::filled(self.page_size, 0xFF);

        for (slot, entry) in self.entries.iter().enumerate() {
            let offset = slot * LEAF_ENTRY_SIZE;
            page.put_i32(offset, entry.key)?;
            page.put_page_id(offset + KEY_SIZE, entry.rid.page_id)?;
            page.put_u32(offset + KEY_SIZE + PAGE_ID_SIZE, entry.rid.slot)?;
        }
        page.put_page_id(Self::next_offset(self.page_size), self.next_leaf)?;

        Ok(page)
    }

    /// Load the leaf stored at `page_id`.
    pub fn read(disk: &mut DiskManager, page_id: PageId) -> Result<Self> {
        let page = disk.read_page(page_id)?;
        Self::from_page(&page)
    }

    /// Persist the full page image at `page_id`.
    pub fn write(&self, disk: &mut DiskManager, page_id: PageId) -> Result<()> {
        disk.write_page(page_id, &self.to_page()?)
    }

    /// Number of live entries.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of entries this leaf can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        leaf_capacity(self.page_size)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity()
    }

    /// Live entries in key order.
    pub fn entries(&self) -> &[LeafEntry] {
        &self.entries
    }

    /// Insert `(key, rid)` keeping the entries sorted.
    ///
    /// The new entry goes after any existing entries with the same key.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the leaf is at capacity (the leaf is unchanged)
    /// - `Error::InvalidArgument` if `rid` is on [`PageId::INVALID`]
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        check_rid(rid)?;
        if self.is_full() {
            return Err(Error::NodeFull);
        }

        let pos = self.upper_bound(key);
        self.entries.insert(pos, LeafEntry::new(key, rid));
        Ok(())
    }

    /// Insert `(key, rid)` into a full leaf and move the upper half of the
    /// entries to `sibling`.
    ///
    /// Of the `n + 1` entries, the lower `ceil((n + 1) / 2)` stay here. The
    /// first key of the sibling is returned as the separator for the parent.
    /// Chaining `next_leaf` is left to the caller, who must do it before
    /// either node is written.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `sibling` is not empty, if `rid` is on
    /// [`PageId::INVALID`], or if there would be fewer than two entries.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        rid: RecordId,
        sibling: &mut LeafNode,
    ) -> Result<i32> {
        check_rid(rid)?;
        if !sibling.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "split sibling holds {} entries",
                sibling.key_count()
            )));
        }
        if self.entries.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot split a leaf with no entries".to_string(),
            ));
        }

        let pos = self.upper_bound(key);
        self.entries.insert(pos, LeafEntry::new(key, rid));

        let keep = self.entries.len().div_ceil(2);
        sibling.entries = self.entries.split_off(keep);

        Ok(sibling.entries[0].key)
    }

    /// Index of the first entry whose key is `>= search_key`.
    ///
    /// # Errors
    /// `Error::NotFound` if every key in this leaf is smaller.
    pub fn locate(&self, search_key: i32) -> Result<usize> {
        let pos = self.entries.partition_point(|e| e.key < search_key);
        if pos == self.entries.len() {
            return Err(Error::NotFound);
        }
        Ok(pos)
    }

    /// Entry at `index`.
    ///
    /// # Errors
    /// `Error::NotFound` if `index >= key_count()`.
    pub fn read_entry(&self, index: usize) -> Result<LeafEntry> {
        self.entries.get(index).copied().ok_or(Error::NotFound)
    }

    /// Key at `index`.
    pub fn read_key(&self, index: usize) -> Result<i32> {
        self.read_entry(index).map(|e| e.key)
    }

    /// Next leaf in key order, or [`PageId::INVALID`] for the last leaf.
    #[inline]
    pub fn next_leaf(&self) -> PageId {
        self.next_leaf
    }

    #[inline]
    pub fn set_next_leaf(&mut self, page_id: PageId) {
        self.next_leaf = page_id;
    }

    fn upper_bound(&self, key: i32) -> usize {
        self.entries.partition_point(|e| e.key <= key)
    }

    #[inline]
    fn next_offset(page_size: usize) -> usize {
        page_size - PAGE_ID_SIZE
    }
}

fn check_rid(rid: RecordId) -> Result<()> {
    if !rid.page_id.is_valid() {
        return Err(Error::InvalidArgument(format!(
            "record id {} is on the invalid page",
            rid
        )));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
