//! rangeindex - an on-disk B+tree secondary index with cursor range scans.
//!
//! The index maps `i32` keys to [`RecordId`]s that point into a separate
//! table file. A query layer finds the start of a range with
//! [`BTreeIndex::locate`] and streams entries with
//! [`BTreeIndex::read_forward`] until its predicate stops matching.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Query layer (external)                      │
//! │          picks a start key, applies predicates per row          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Index Layer (index/btree/)                      │
//! │   BTreeIndex: insert + split propagation, locate, read_forward  │
//! │   LeafNode │ InternalNode │ IndexMeta │ IndexCursor / IndexScan  │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Storage Layer (storage/)                       │
//! │          DiskManager (append-only paged file) + Page            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Disk I/O and the page buffer
//! - [`index`] - The B+tree
//!
//! # Usage constraints
//! One process, one thread, one open handle per index file. Nothing is
//! locked; the `&mut self` receivers are the only guard.
//!
//! # Quick Start
//! ```no_run
//! use rangeindex::{BTreeIndex, IndexConfig, OpenMode, PageId, RecordId};
//!
//! let mut index = BTreeIndex::open("movies.idx", OpenMode::Write, IndexConfig::default())?;
//! for (slot, key) in [272, 2342, 40].into_iter().enumerate() {
//!     index.insert(key, RecordId::new(PageId::new(0), slot as u32))?;
//! }
//!
//! let keys: Vec<i32> = index
//!     .scan_from(100)?
//!     .map(|entry| entry.map(|(key, _)| key))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(keys, vec![272, 2342]);
//!
//! index.close()?;
//! # Ok::<(), rangeindex::Error>(())
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{IndexConfig, DEFAULT_PAGE_SIZE};
pub use common::{Error, PageId, RecordId, Result};

pub use index::btree::{BTreeIndex, IndexCursor, IndexScan, IndexStats};
pub use storage::page::Page;
pub use storage::{DiskManager, OpenMode};
