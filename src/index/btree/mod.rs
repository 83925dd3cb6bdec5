//! B+tree index over `i32` keys.
//!
//! # Structure
//! ```text
//!                      page 0: IndexMeta (root, height)
//!                               │
//!                       ┌───────▼───────┐
//!                       │ InternalNode  │  height ≥ 2
//!                       └──┬────────┬───┘
//!                ┌─────────▼──┐  ┌──▼─────────┐
//!                │  LeafNode  │─▶│  LeafNode  │─▶ INVALID
//!                └────────────┘  └────────────┘
//! ```
//!
//! - [`LeafNode`] - sorted `(key, rid)` entries and a next-leaf pointer
//! - [`InternalNode`] - separator keys routing to child pages
//! - [`BTreeIndex`] - root/height bookkeeping, insert with split
//!   propagation, root-to-leaf search
//! - [`IndexCursor`] / [`IndexScan`] - sideways scans along the leaf chain
//!
//! Pages do not record whether they are leaves or internal nodes; the
//! depth reached during a traversal decides.

mod cursor;
mod integrity;
mod internal;
mod leaf;
mod meta;
mod tree;

pub use cursor::{IndexCursor, IndexScan};
pub use integrity::IndexStats;
pub use internal::{InternalEntry, InternalNode};
pub use leaf::{LeafEntry, LeafNode};
pub use meta::{IndexMeta, META_PAGE_ID};
pub use tree::BTreeIndex;
