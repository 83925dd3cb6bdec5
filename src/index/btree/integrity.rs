//! Offline structural verification.
//!
//! Node pages carry no kind tag, so the checker relies on the same rule as
//! every traversal: pages at depth `tree_height` are leaves, everything
//! above is internal.

use std::collections::HashSet;

use log::debug;

use crate::common::{Error, PageId, Result};

use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::meta::META_PAGE_ID;
use super::tree::BTreeIndex;

/// Counts gathered by [`BTreeIndex::check_integrity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub tree_height: u32,
    pub internal_nodes: usize,
    pub leaves: usize,
    pub entries: usize,
}

/// Key range a subtree must stay within (both ends inclusive).
#[derive(Debug, Clone, Copy)]
struct Bounds {
    lower: Option<i32>,
    upper: Option<i32>,
}

impl Bounds {
    const ALL: Bounds = Bounds {
        lower: None,
        upper: None,
    };

    fn contains(&self, key: i32) -> bool {
        self.lower.is_none_or(|l| key >= l) && self.upper.is_none_or(|u| key <= u)
    }
}

struct Walk {
    stats: IndexStats,
    visited: HashSet<PageId>,
    leaves: Vec<PageId>,
}

impl BTreeIndex {
    /// Walk the whole tree and verify its invariants.
    ///
    /// Checks that keys are sorted and within their parent's routing range,
    /// that no node is empty, that every page is reached exactly once, and
    /// that the leaf chain links the leaves left to right and ends with
    /// [`PageId::INVALID`].
    ///
    /// # Errors
    /// `Error::Corrupted` describing the first violation found, or an I/O
    /// error from reading pages.
    pub fn check_integrity(&mut self) -> Result<IndexStats> {
        let mut walk = Walk {
            stats: IndexStats {
                tree_height: self.tree_height,
                ..IndexStats::default()
            },
            visited: HashSet::new(),
            leaves: Vec::new(),
        };

        if self.tree_height == 0 {
            if self.root_pid.is_valid() {
                return Err(corrupted(format!(
                    "empty tree with root {}",
                    self.root_pid
                )));
            }
            return Ok(walk.stats);
        }

        self.check_subtree(self.root_pid, 1, Bounds::ALL, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        debug!("integrity ok: {:?}", walk.stats);
        Ok(walk.stats)
    }

    fn check_subtree(
        &mut self,
        page_id: PageId,
        depth: u32,
        bounds: Bounds,
        walk: &mut Walk,
    ) -> Result<()> {
        if page_id == META_PAGE_ID || page_id.0 >= self.disk.page_count() {
            return Err(corrupted(format!("child pointer to {}", page_id)));
        }
        if !walk.visited.insert(page_id) {
            return Err(corrupted(format!("{} reached twice", page_id)));
        }

        if depth == self.tree_height {
            let leaf = LeafNode::read(&mut self.disk, page_id)?;
            check_keys(page_id, leaf.entries().iter().map(|e| e.key), bounds)?;
            if leaf.is_empty() {
                return Err(corrupted(format!("leaf {} is empty", page_id)));
            }
            walk.stats.leaves += 1;
            walk.stats.entries += leaf.key_count();
            walk.leaves.push(page_id);
            return Ok(());
        }

        let node = InternalNode::read(&mut self.disk, page_id)?;
        if node.key_count() == 0 || node.child_count() == 0 {
            return Err(corrupted(format!(
                "internal node {} has {} keys",
                page_id,
                node.key_count()
            )));
        }
        check_keys(page_id, node.entries().iter().map(|e| e.key), bounds)?;
        walk.stats.internal_nodes += 1;

        for slot in 0..node.child_count() {
            let child = node.child_at(slot)?;
            let child_bounds = Bounds {
                lower: if slot == 0 {
                    bounds.lower
                } else {
                    Some(node.read_key(slot - 1)?)
                },
                upper: if slot == node.key_count() {
                    bounds.upper
                } else {
                    Some(node.read_key(slot)?)
                },
            };
            self.check_subtree(child, depth + 1, child_bounds, walk)?;
        }
        Ok(())
    }

    fn check_leaf_chain(&mut self, leaves: &[PageId]) -> Result<()> {
        for (i, &page_id) in leaves.iter().enumerate() {
            let expected = leaves.get(i + 1).copied().unwrap_or(PageId::INVALID);
            let next = LeafNode::read(&mut self.disk, page_id)?.next_leaf();
            if next != expected {
                return Err(corrupted(format!(
                    "leaf {} links to {}, expected {}",
                    page_id, next, expected
                )));
            }
        }
        Ok(())
    }
}

fn check_keys(page_id: PageId, keys: impl Iterator<Item = i32>, bounds: Bounds) -> Result<()> {
    let mut prev: Option<i32> = None;
    for key in keys {
        if prev.is_some_and(|p| p > key) {
            return Err(corrupted(format!("keys out of order in {}", page_id)));
        }
        if !bounds.contains(key) {
            return Err(corrupted(format!(
                "key {} in {} outside routing range {:?}..={:?}",
                key, page_id, bounds.lower, bounds.upper
            )));
        }
        prev = Some(key);
    }
    Ok(())
}

fn corrupted(msg: String) -> Error {
    Error::Corrupted(msg)
}
