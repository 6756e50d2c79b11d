//! Property tests for the codec

use godot_pck::{Archive, ArchiveBuilder, HeaderTemplate, PackVersion};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeMap;
use std::io::Cursor;

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_]{1,8}", 1..4).prop_map(|parts| parts.join("/"))
}

fn file_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(relative_path(), prop::collection::vec(any::<u8>(), 0..256), 0..20)
}

fn template() -> impl Strategy<Value = HeaderTemplate> {
    (any::<[u32; 4]>(), prop::collection::vec(any::<u8>(), 64)).prop_map(|(version, reserved)| {
        HeaderTemplate::new(PackVersion(version), &reserved).unwrap()
    })
}

fn build(files: &BTreeMap<String, Vec<u8>>, template: &HeaderTemplate) -> Vec<u8> {
    let mut builder = ArchiveBuilder::new().template(template.clone());
    for (name, data) in files {
        builder = builder.add_file_data(data.clone(), format!("res://{name}"));
    }
    let mut buf = Vec::new();
    builder.write_to(&mut buf).unwrap();
    buf
}

proptest! {
    #[test]
    fn archive_round_trip(files in file_set(), template in template()) {
        let buf = build(&files, &template);
        let mut archive = Archive::from_reader(Cursor::new(buf))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(archive.header().template(), template);
        prop_assert_eq!(archive.list().len(), files.len());
        for (name, data) in &files {
            let read = archive
                .read_file(&format!("res://{name}"))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(&read, data);
        }
    }

    #[test]
    fn archive_layout_is_contiguous(files in file_set()) {
        let buf = build(&files, &HeaderTemplate::default());
        let total = buf.len() as u64;
        let archive = Archive::from_reader(Cursor::new(buf))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut expected_offset = None;
        for entry in archive.list() {
            if let Some(offset) = expected_offset {
                prop_assert_eq!(entry.offset, offset);
            }
            expected_offset = Some(entry.offset + entry.size);
        }
        if let Some(end) = expected_offset {
            prop_assert_eq!(end as u64, total);
        }
    }

    #[test]
    fn build_is_deterministic(files in file_set(), template in template()) {
        prop_assert_eq!(build(&files, &template), build(&files, &template));
    }
}
