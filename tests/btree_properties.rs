//! Property tests: the index against an in-memory model.

use proptest::prelude::*;
use rangeindex::{BTreeIndex, IndexConfig, OpenMode, PageId, RecordId};
use tempfile::tempdir;

fn rid_for(i: usize) -> RecordId {
    RecordId::new(PageId::new(i as u32), (i % 13) as u32)
}

fn open(path: &std::path::Path, mode: OpenMode, page_size: usize) -> BTreeIndex {
    let config = IndexConfig::default().with_page_size(page_size);
    BTreeIndex::open(path, mode, config).unwrap()
}

fn scan(index: &mut BTreeIndex, from: i32) -> Vec<(i32, RecordId)> {
    index
        .scan_from(from)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Model entries with key `>= from`, sorted the way a scan may return them:
/// by key, with duplicates in any order.
fn expected_from(model: &[(i32, RecordId)], from: i32) -> Vec<(i32, RecordId)> {
    let mut entries: Vec<_> = model.iter().copied().filter(|&(k, _)| k >= from).collect();
    entries.sort_by_key(|&(k, rid)| (k, rid.page_id.0, rid.slot));
    entries
}

fn sorted_by_rid(mut entries: Vec<(i32, RecordId)>) -> Vec<(i32, RecordId)> {
    entries.sort_by_key(|&(k, rid)| (k, rid.page_id.0, rid.slot));
    entries
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any scan returns exactly the inserted entries with key >= start,
    /// in non-decreasing key order.
    #[test]
    fn prop_scan_matches_model(
        // narrow key range forces long duplicate runs
        keys in prop::collection::vec(-40i32..40, 0..300),
        from in -50i32..50,
        page_size in prop::sample::select(vec![32usize, 52, 100]),
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.idx");
        let mut index = open(&path, OpenMode::Write, page_size);

        let mut model = Vec::new();
        for (i, &key) in keys.iter().enumerate() {
            index.insert(key, rid_for(i)).unwrap();
            model.push((key, rid_for(i)));
        }

        let scanned = scan(&mut index, from);
        for pair in scanned.windows(2) {
            prop_assert!(pair[0].0 <= pair[1].0);
        }
        prop_assert_eq!(sorted_by_rid(scanned), expected_from(&model, from));

        let stats = index.check_integrity().unwrap();
        prop_assert_eq!(stats.entries, model.len());
        prop_assert_eq!(stats.tree_height, index.tree_height());
    }

    /// Closing and reopening changes nothing observable.
    #[test]
    fn prop_reopen_preserves_entries(
        keys in prop::collection::vec(any::<i32>(), 1..200),
        from in any::<i32>(),
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.idx");

        let before = {
            let mut index = open(&path, OpenMode::Write, 52);
            for (i, &key) in keys.iter().enumerate() {
                index.insert(key, rid_for(i)).unwrap();
            }
            let entries = scan(&mut index, from);
            index.close().unwrap();
            entries
        };

        let mut index = open(&path, OpenMode::Read, 52);
        prop_assert_eq!(scan(&mut index, from), before);
        index.check_integrity().unwrap();
    }

    /// Every inserted key can be located, and the cursor lands on it.
    #[test]
    fn prop_locate_finds_inserted_keys(
        keys in prop::collection::vec(-1000i32..1000, 1..150),
    ) {
        let dir = tempdir().unwrap();
        let mut index = open(&dir.path().join("prop.idx"), OpenMode::Write, 32);
        for (i, &key) in keys.iter().enumerate() {
            index.insert(key, rid_for(i)).unwrap();
        }

        for &key in &keys {
            let mut cursor = index.locate(key).unwrap();
            prop_assert_eq!(index.read_forward(&mut cursor).unwrap().0, key);
        }

        let max = keys.iter().copied().max().unwrap_or_default();
        if max < i32::MAX {
            prop_assert!(index.locate(max + 1).is_err());
        }
    }
}
