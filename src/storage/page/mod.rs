//! Page type and layout.
//!
//! This module contains:
//! - [`Page`] - The raw fixed-size data container with typed accessors
//!
//! Node layouts built on top of [`Page`] live in
//! [`index::btree`](crate::index::btree).

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
