//! Record locator type.

use std::fmt;

use crate::common::PageId;

/// Locates a tuple in the external table file: `(page, slot)`.
///
/// The index never interprets a `RecordId`; it only stores it next to the
/// key it was inserted with. A record id on [`PageId::INVALID`] cannot be
/// stored, because that value marks an unused slot in a leaf page.
///
/// # Example
/// ```
/// use rangeindex::{PageId, RecordId};
///
/// let rid = RecordId::new(PageId::new(3), 7);
/// assert_eq!(rid.page_id, PageId::new(3));
/// assert_eq!(rid.slot, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Page of the table file holding the tuple.
    pub page_id: PageId,
    /// Slot within that page.
    pub slot: u32,
}

impl RecordId {
    /// Size of the on-disk encoding.
    pub const SIZE: usize = 8;

    /// Create a new RecordId.
    #[inline]
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    /// Decode from 8 little-endian bytes: page id then slot.
    pub fn from_le_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let [p0, p1, p2, p3, s0, s1, s2, s3] = bytes;
        Self {
            page_id: PageId::from_le_bytes([p0, p1, p2, p3]),
            slot: u32::from_le_bytes([s0, s1, s2, s3]),
        }
    }

    /// Encode to 8 little-endian bytes: page id then slot.
    pub fn to_le_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.page_id.to_le_bytes());
        bytes[4..].copy_from_slice(&self.slot.to_le_bytes());
        bytes
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, {})", self.page_id.0, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_layout() {
        let rid = RecordId::new(PageId::new(0x04030201), 0x08070605);
        assert_eq!(rid.to_le_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(RecordId::from_le_bytes([1, 2, 3, 4, 5, 6, 7, 8]), rid);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RecordId::new(PageId::new(2), 9)), "Rid(2, 9)");
    }
}
