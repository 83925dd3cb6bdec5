//! Scan cursor and iterator.

use crate::common::{Error, PageId, RecordId, Result};

use super::tree::BTreeIndex;

/// Position of the next entry to read: a leaf page and an entry index.
///
/// A cursor is only valid until the next insert, which may split the leaf
/// it points into. Re-derive it with [`BTreeIndex::locate`] after inserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCursor {
    pub page_id: PageId,
    pub entry: usize,
}

impl IndexCursor {
    pub fn new(page_id: PageId, entry: usize) -> Self {
        Self { page_id, entry }
    }

    /// True once the cursor has moved past the last leaf.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        !self.page_id.is_valid()
    }
}

/// Forward scan over `(key, rid)` pairs, starting at a search key.
///
/// Created by [`BTreeIndex::scan_from`]. Ends after the last leaf; the
/// caller decides when a key no longer matches and stops early.
///
/// # Example
/// ```no_run
/// use rangeindex::{BTreeIndex, IndexConfig, OpenMode};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::Read, IndexConfig::default())?;
/// for entry in index.scan_from(100)? {
///     let (key, rid) = entry?;
///     if key > 200 {
///         break;
///     }
///     println!("{} -> {}", key, rid);
/// }
/// # Ok::<(), rangeindex::Error>(())
/// ```
pub struct IndexScan<'a> {
    index: &'a mut BTreeIndex,
    /// `None` once the scan is finished.
    cursor: Option<IndexCursor>,
}

impl<'a> IndexScan<'a> {
    pub(super) fn new(index: &'a mut BTreeIndex, cursor: Option<IndexCursor>) -> Self {
        Self { index, cursor }
    }

    /// Position of the next entry, if any.
    pub fn cursor(&self) -> Option<IndexCursor> {
        self.cursor
    }
}

impl Iterator for IndexScan<'_> {
    type Item = Result<(i32, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match self.index.read_forward(cursor) {
            Ok(entry) => Some(Ok(entry)),
            Err(Error::EndOfIndex) => {
                self.cursor = None;
                None
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}
