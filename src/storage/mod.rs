//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level paged file I/O
//! - [`page`] - The page buffer type

mod disk_manager;
pub mod page;

pub use disk_manager::{DiskManager, OpenMode};
