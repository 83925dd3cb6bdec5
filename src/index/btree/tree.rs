//! The B+tree controller.

use std::path::Path;

use log::{debug, trace, warn};

use crate::common::config::IndexConfig;
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::{DiskManager, OpenMode};

use super::cursor::{IndexCursor, IndexScan};
use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::meta::{IndexMeta, META_PAGE_ID};

/// Result of inserting into a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertOutcome {
    /// The subtree absorbed the entry.
    Done,
    /// The subtree's top node split; the parent must add
    /// `(separator, sibling)` right of the child it descended into.
    Overflowed { separator: i32, sibling: PageId },
}

/// An on-disk B+tree over `i32` keys mapping to [`RecordId`]s.
///
/// # States
/// ```text
///  height 0 (empty) ──insert──▶ height 1 (root is a leaf)
///                                   │ root split
///                                   ▼
///                          height n ≥ 2 (root is internal) ──root split──▶ n + 1
/// ```
///
/// # Persistence
/// Node pages are written as soon as an insert modifies them. The root
/// pointer and height live in memory and reach page 0 only on
/// [`close`](Self::close) or [`flush`](Self::flush); dropping an index
/// without closing it loses them.
///
/// # Thread Safety
/// Single writer, no concurrent readers. Every operation takes `&mut self`
/// because even reads move the file cursor of the underlying store.
///
/// # Example
/// ```no_run
/// use rangeindex::{BTreeIndex, IndexConfig, OpenMode, PageId, RecordId};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::Write, IndexConfig::default())?;
/// index.insert(42, RecordId::new(PageId::new(0), 3))?;
///
/// let mut cursor = index.locate(40)?;
/// let (key, rid) = index.read_forward(&mut cursor)?;
/// assert_eq!((key, rid.slot), (42, 3));
///
/// index.close()?;
/// # Ok::<(), rangeindex::Error>(())
/// ```
pub struct BTreeIndex {
    pub(super) disk: DiskManager,
    pub(super) config: IndexConfig,
    pub(super) root_pid: PageId,
    pub(super) tree_height: u32,
}

impl BTreeIndex {
    /// Open an index file.
    ///
    /// With [`OpenMode::Write`] a missing file is created and its metadata
    /// page written immediately, so even an index with no entries is a
    /// well-formed file. An existing file must have been created with
    /// `config.page_size`.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` for an unusable configuration
    /// - `Error::PageSizeMismatch` if the file uses another page size
    /// - `Error::Corrupted` if the metadata page fails validation
    /// - `Error::Io` if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        if path.exists() {
            if let Some(actual) = IndexMeta::probe_page_size(path)? {
                if actual != config.page_size {
                    return Err(Error::PageSizeMismatch {
                        expected: config.page_size,
                        actual,
                    });
                }
            }
        }

        let mut disk = DiskManager::open(path, mode, config.page_size)?;

        let meta = if disk.page_count() == 0 {
            let meta = IndexMeta::empty(config.page_size);
            disk.write_page(META_PAGE_ID, &meta.to_page()?)?;
            meta
        } else {
            let page = disk.read_page(META_PAGE_ID)?;
            IndexMeta::from_page(&page).inspect_err(|e| {
                warn!("invalid metadata in {}: {}", path.display(), e);
            })?
        };

        debug!(
            "opened index {} root={} height={}",
            path.display(),
            meta.root_pid,
            meta.tree_height
        );
        Ok(Self {
            disk,
            config,
            root_pid: meta.root_pid,
            tree_height: meta.tree_height,
        })
    }

    /// Persist the root pointer and height, then release the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        debug!(
            "closing index root={} height={}",
            self.root_pid, self.tree_height
        );
        self.disk.close()
    }

    /// Persist the root pointer and height without closing.
    ///
    /// A no-op for indexes opened in read mode.
    pub fn flush(&mut self) -> Result<()> {
        if self.disk.mode() == OpenMode::Read {
            return Ok(());
        }
        let meta = IndexMeta {
            root_pid: self.root_pid,
            tree_height: self.tree_height,
            page_size: self.config.page_size,
        };
        self.disk.write_page(META_PAGE_ID, &meta.to_page()?)?;
        self.disk.sync()?;
        debug!(
            "flushed metadata root={} height={}",
            self.root_pid, self.tree_height
        );
        Ok(())
    }

    /// Root page, or [`PageId::INVALID`] when empty.
    #[inline]
    pub fn root_pid(&self) -> PageId {
        self.root_pid
    }

    /// Levels from root to leaf inclusive; 0 when empty.
    #[inline]
    pub fn tree_height(&self) -> u32 {
        self.tree_height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree_height == 0
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Pages in the file, metadata page included.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.disk.page_count()
    }

    /// Insert `(key, rid)`. Duplicate keys are allowed.
    ///
    /// # Errors
    /// - `Error::ReadOnly` in read mode
    /// - `Error::InvalidArgument` if `rid` is on [`PageId::INVALID`]
    /// - `Error::Io` on store failure; the tree is only guaranteed intact
    ///   when the insert succeeds
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if self.disk.mode() == OpenMode::Read {
            return Err(Error::ReadOnly);
        }
        trace!("insert key={} rid={}", key, rid);

        if self.tree_height == 0 {
            let mut leaf = LeafNode::new(self.config.page_size);
            leaf.insert(key, rid)?;
            let root = self.disk.end_pid();
            leaf.write(&mut self.disk, root)?;
            self.root_pid = root;
            self.tree_height = 1;
            debug!("created root leaf {}", root);
            return Ok(());
        }

        if let InsertOutcome::Overflowed { separator, sibling } =
            self.insert_into(self.root_pid, 1, key, rid)?
        {
            let mut root = InternalNode::new(self.config.page_size);
            root.initialize_root(self.root_pid, separator, sibling)?;
            let new_root = self.disk.end_pid();
            root.write(&mut self.disk, new_root)?;

            debug!(
                "root split: new root {} over {} | {} | {}, height {}",
                new_root,
                self.root_pid,
                separator,
                sibling,
                self.tree_height + 1
            );
            self.root_pid = new_root;
            self.tree_height += 1;
        }
        Ok(())
    }

    /// Insert into the subtree at `page_id`, which sits at `depth` (root = 1).
    fn insert_into(
        &mut self,
        page_id: PageId,
        depth: u32,
        key: i32,
        rid: RecordId,
    ) -> Result<InsertOutcome> {
        if depth == self.tree_height {
            return self.insert_into_leaf(page_id, key, rid);
        }

        let mut node = InternalNode::read(&mut self.disk, page_id)?;
        let slot = node.child_slot(key);
        let child = node.child_at(slot).map_err(|_| {
            Error::Corrupted(format!("internal node {} has no child at slot {}", page_id, slot))
        })?;

        let (separator, sibling) = match self.insert_into(child, depth + 1, key, rid)? {
            InsertOutcome::Done => return Ok(InsertOutcome::Done),
            InsertOutcome::Overflowed { separator, sibling } => (separator, sibling),
        };

        match node.insert_at(slot, separator, sibling) {
            Ok(()) => {
                node.write(&mut self.disk, page_id)?;
                Ok(InsertOutcome::Done)
            }
            Err(Error::NodeFull) => {
                let mut new_node = InternalNode::new(self.config.page_size);
                let mid = node.insert_at_and_split(slot, separator, sibling, &mut new_node)?;

                let new_pid = self.disk.end_pid();
                new_node.write(&mut self.disk, new_pid)?;
                node.write(&mut self.disk, page_id)?;

                debug!(
                    "split internal {} at depth {}: promoted {} to new sibling {}",
                    page_id, depth, mid, new_pid
                );
                Ok(InsertOutcome::Overflowed {
                    separator: mid,
                    sibling: new_pid,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn insert_into_leaf(&mut self, page_id: PageId, key: i32, rid: RecordId) -> Result<InsertOutcome> {
        let mut leaf = LeafNode::read(&mut self.disk, page_id)?;

        match leaf.insert(key, rid) {
            Ok(()) => {
                leaf.write(&mut self.disk, page_id)?;
                Ok(InsertOutcome::Done)
            }
            Err(Error::NodeFull) => {
                let mut sibling = LeafNode::new(self.config.page_size);
                let separator = leaf.insert_and_split(key, rid, &mut sibling)?;

                let sibling_pid = self.disk.end_pid();
                sibling.set_next_leaf(leaf.next_leaf());
                leaf.set_next_leaf(sibling_pid);

                sibling.write(&mut self.disk, sibling_pid)?;
                leaf.write(&mut self.disk, page_id)?;

                debug!(
                    "split leaf {}: {} entries stay, {} move to {} (separator {})",
                    page_id,
                    leaf.key_count(),
                    sibling.key_count(),
                    sibling_pid,
                    separator
                );
                Ok(InsertOutcome::Overflowed {
                    separator,
                    sibling: sibling_pid,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Find the first entry with key `>= search_key`.
    ///
    /// Descends `tree_height - 1` internal levels, then moves to the next
    /// leaf if the one reached holds only smaller keys.
    ///
    /// # Errors
    /// `Error::NotFound` if the index is empty or every key is smaller.
    pub fn locate(&mut self, search_key: i32) -> Result<IndexCursor> {
        if self.tree_height == 0 {
            return Err(Error::NotFound);
        }

        let mut page_id = self.root_pid;
        for _ in 1..self.tree_height {
            let node = InternalNode::read(&mut self.disk, page_id)?;
            page_id = node.locate_scan_child(search_key).map_err(|_| {
                Error::Corrupted(format!("internal node {} has no children", page_id))
            })?;
        }

        loop {
            let leaf = LeafNode::read(&mut self.disk, page_id)?;
            match leaf.locate(search_key) {
                Ok(entry) => {
                    trace!("locate {} -> {} entry {}", search_key, page_id, entry);
                    return Ok(IndexCursor::new(page_id, entry));
                }
                Err(Error::NotFound) if leaf.next_leaf().is_valid() => {
                    page_id = leaf.next_leaf();
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the entry under `cursor` and advance it.
    ///
    /// After the last entry of a leaf the cursor moves to entry 0 of the
    /// next leaf, without going back through the root.
    ///
    /// # Errors
    /// `Error::EndOfIndex` once the cursor has passed the last leaf.
    pub fn read_forward(&mut self, cursor: &mut IndexCursor) -> Result<(i32, RecordId)> {
        loop {
            if cursor.is_exhausted() {
                return Err(Error::EndOfIndex);
            }

            let leaf = LeafNode::read(&mut self.disk, cursor.page_id)?;
            if cursor.entry >= leaf.key_count() {
                *cursor = IndexCursor::new(leaf.next_leaf(), 0);
                continue;
            }

            let entry = leaf.read_entry(cursor.entry)?;
            if cursor.entry + 1 >= leaf.key_count() {
                *cursor = IndexCursor::new(leaf.next_leaf(), 0);
            } else {
                cursor.entry += 1;
            }
            return Ok((entry.key, entry.rid));
        }
    }

    /// Iterate over entries with key `>= search_key` in key order.
    ///
    /// Yields nothing if no such entry exists.
    pub fn scan_from(&mut self, search_key: i32) -> Result<IndexScan<'_>> {
        let cursor = match self.locate(search_key) {
            Ok(cursor) => Some(cursor),
            Err(Error::NotFound) => None,
            Err(e) => return Err(e),
        };
        Ok(IndexScan::new(self, cursor))
    }
}
