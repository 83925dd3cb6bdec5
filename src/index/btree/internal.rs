//! B+tree internal (non-leaf) node.
//!
//! # Page Layout
//! ```text
//! ┌────────────┬──────────────────┬──────────────────┬─────┬───────────────┐
//! │ child0 (4B)│ key0 | child1    │ key1 | child2    │ ... │ unused (0xFF) │
//! └────────────┴──────────────────┴──────────────────┴─────┴───────────────┘
//! ```
//!
//! `n` keys route to `n + 1` children. Child `i` holds keys in the closed
//! range `[key[i-1], key[i]]`: a run of duplicates can straddle a leaf split,
//! so a key equal to a separator may live on either side of it.
//!
//! The live key count is the number of leading pairs whose child is not
//! [`PageId::INVALID`]. Capacity is `floor((page_size - 4) / 8)`.

use crate::common::config::{internal_capacity, INTERNAL_ENTRY_SIZE, KEY_SIZE, PAGE_ID_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// A separator key and the child to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalEntry {
    pub key: i32,
    pub child: PageId,
}

/// A decoded internal page.
#[derive(Debug, Clone)]
pub struct InternalNode {
    first_child: PageId,
    entries: Vec<InternalEntry>,
    page_size: usize,
}

impl InternalNode {
    /// Create an empty node with no children.
    pub fn new(page_size: usize) -> Self {
        Self {
            first_child: PageId::INVALID,
            entries: Vec::with_capacity(internal_capacity(page_size) + 1),
            page_size,
        }
    }

    /// Decode a node from a page image.
    pub fn from_page(page: &Page) -> Result<Self> {
        let page_size = page.size();
        let mut node = Self::new(page_size);
        node.first_child = page.get_page_id(0)?;

        for slot in 0..internal_capacity(page_size) {
            let offset = Self::entry_offset(slot);
            let child = page.get_page_id(offset + KEY_SIZE)?;
            if !child.is_valid() {
                break;
            }
            let key = page.get_i32(offset)?;
            node.entries.push(InternalEntry { key, child });
        }

        Ok(node)
    }

    /// Encode this node into a full page image.
    pub fn to_page(&self) -> Result<Page> {
        let mut page = Page::filled(self.page_size, 0xFF);
        page.put_page_id(0, self.first_child)?;

        for (slot, entry) in self.entries.iter().enumerate() {
            let offset = Self::entry_offset(slot);
            page.put_i32(offset, entry.key)?;
            page.put_page_id(offset + KEY_SIZE, entry.child)?;
        }

        Ok(page)
    }

    /// Load the node stored at `page_id`.
    pub fn read(disk: &mut DiskManager, page_id: PageId) -> Result<Self> {
        let page = disk.read_page(page_id)?;
        Self::from_page(&page)
    }

    /// Persist the full page image at `page_id`.
    pub fn write(&self, disk: &mut DiskManager, page_id: PageId) -> Result<()> {
        disk.write_page(page_id, &self.to_page()?)
    }

    /// Number of keys (one less than the number of children).
    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        internal_capacity(self.page_size)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity()
    }

    /// True if the node has neither keys nor a leading child.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.first_child.is_valid() && self.entries.is_empty()
    }

    pub fn entries(&self) -> &[InternalEntry] {
        &self.entries
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        if self.first_child.is_valid() {
            self.entries.len() + 1
        } else {
            0
        }
    }

    /// Child pointer at `slot` (0 is the leading child).
    ///
    /// # Errors
    /// `Error::NotFound` if the slot does not hold a child.
    pub fn child_at(&self, slot: usize) -> Result<PageId> {
        let child = match slot {
            0 => self.first_child,
            n => self.entries.get(n - 1).map_or(PageId::INVALID, |e| e.child),
        };
        if child.is_valid() {
            Ok(child)
        } else {
            Err(Error::NotFound)
        }
    }

    /// Key at `index`.
    pub fn read_key(&self, index: usize) -> Result<i32> {
        self.entries.get(index).map(|e| e.key).ok_or(Error::NotFound)
    }

    /// Slot of the child an insert of `key` descends into: the child right
    /// of the greatest key `<= key`, or the leading child.
    pub fn child_slot(&self, key: i32) -> usize {
        self.entries.partition_point(|e| e.key <= key)
    }

    /// Slot of the child a scan starting at `key` descends into: the child
    /// left of the first key `>= key`.
    ///
    /// Entries equal to `key` can sit left of an equal separator, so a scan
    /// must not skip past it.
    pub fn scan_child_slot(&self, key: i32) -> usize {
        self.entries.partition_point(|e| e.key < key)
    }

    /// Child responsible for `search_key` under insert routing.
    ///
    /// # Errors
    /// `Error::NotFound` if the node has no children (malformed).
    pub fn locate_child_ptr(&self, search_key: i32) -> Result<PageId> {
        self.child_at(self.child_slot(search_key))
    }

    /// Child where entries `>= search_key` begin.
    pub fn locate_scan_child(&self, search_key: i32) -> Result<PageId> {
        self.child_at(self.scan_child_slot(search_key))
    }

    /// Insert `(key, child)` with `child` directly right of `key`.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the node is at capacity (unchanged)
    /// - `Error::InvalidArgument` if `child` is invalid
    pub fn insert(&mut self, key: i32, child: PageId) -> Result<()> {
        let slot = self.child_slot(key);
        self.insert_at(slot, key, child)
    }

    /// Insert `(key, child)` so that `child` becomes the child right after
    /// the one at `slot`.
    ///
    /// This is how a split child's new sibling is hooked in next to it even
    /// when other separators equal `key`.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the node is at capacity (unchanged)
    /// - `Error::InvalidArgument` if `slot` has no child, `child` is invalid,
    ///   or `key` would break the key order
    pub fn insert_at(&mut self, slot: usize, key: i32, child: PageId) -> Result<()> {
        self.check_insert(slot, key, child)?;
        if self.is_full() {
            return Err(Error::NodeFull);
        }
        self.entries.insert(slot, InternalEntry { key, child });
        Ok(())
    }

    /// Insert `(key, child)` into a full node and split it with `sibling`.
    ///
    /// Returns the promoted middle key. See [`insert_at_and_split`](Self::insert_at_and_split).
    pub fn insert_and_split(
        &mut self,
        key: i32,
        child: PageId,
        sibling: &mut InternalNode,
    ) -> Result<i32> {
        let slot = self.child_slot(key);
        self.insert_at_and_split(slot, key, child, sibling)
    }

    /// Positional insert followed by a split.
    ///
    /// With `n + 1` keys after the insert and `m = (n + 1) / 2`, keys
    /// `[0, m)` stay here, key `m` is promoted and removed from both halves,
    /// its child becomes the sibling's leading child, and keys `(m, n]` move
    /// to the sibling.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `sibling` is not empty, the insert itself
    /// is invalid, or fewer than three keys would be split.
    pub fn insert_at_and_split(
        &mut self,
        slot: usize,
        key: i32,
        child: PageId,
        sibling: &mut InternalNode,
    ) -> Result<i32> {
        if !sibling.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "split sibling holds {} children",
                sibling.child_count()
            )));
        }
        self.check_insert(slot, key, child)?;
        if self.entries.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "cannot split an internal node with {} keys",
                self.entries.len()
            )));
        }

        self.entries.insert(slot, InternalEntry { key, child });

        let mid = self.entries.len() / 2;
        let mut upper = self.entries.split_off(mid);
        let promoted = upper.remove(0);

        sibling.first_child = promoted.child;
        sibling.entries = upper;

        Ok(promoted.key)
    }

    /// Reset this node to a root with two children split by `key`.
    pub fn initialize_root(&mut self, left: PageId, key: i32, right: PageId) -> Result<()> {
        if !left.is_valid() || !right.is_valid() {
            return Err(Error::InvalidArgument(format!(
                "root children must be valid, got {} and {}",
                left, right
            )));
        }
        self.first_child = left;
        self.entries.clear();
        self.entries.push(InternalEntry { key, child: right });
        Ok(())
    }

    fn check_insert(&self, slot: usize, key: i32, child: PageId) -> Result<()> {
        if !child.is_valid() {
            return Err(Error::InvalidArgument(
                "cannot insert the invalid page as a child".to_string(),
            ));
        }
        if !self.first_child.is_valid() || slot > self.entries.len() {
            return Err(Error::InvalidArgument(format!(
                "no child at slot {} in a node with {} children",
                slot,
                self.child_count()
            )));
        }
        let after_left = slot == 0 || self.entries[slot - 1].key <= key;
        let before_right = slot == self.entries.len() || key <= self.entries[slot].key;
        if !(after_left && before_right) {
            return Err(Error::InvalidArgument(format!(
                "key {} out of order at slot {}",
                key, slot
            )));
        }
        Ok(())
    }

    #[inline]
    fn entry_offset(slot: usize) -> usize {
        PAGE_ID_SIZE + slot * INTERNAL_ENTRY_SIZE
    }
}

// ============================================================================
// TESTS
// ============================================================================
