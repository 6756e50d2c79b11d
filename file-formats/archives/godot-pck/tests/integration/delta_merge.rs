//! Delta computation and override merging on real trees

use crate::common::{read_tree, temp_dir, write_tree};
use godot_pck::{DeltaKind, DeltaOptions, Error, FileTree, compute_delta, merge_overrides};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn test_delta_selects_new_and_changed_files() {
    let temp = temp_dir();
    let base = temp.path().join("base");
    let revised = temp.path().join("revised");
    write_tree(&base, &[("a", b"1"), ("b", b"2")]);
    write_tree(&revised, &[("a", b"1"), ("b", b"3"), ("c", b"4")]);

    let delta = compute_delta(
        &FileTree::scan(&base).unwrap(),
        &FileTree::scan(&revised).unwrap(),
        &DeltaOptions::default(),
    )
    .unwrap();

    let out = temp.path().join("patch");
    delta.materialize(&out).unwrap();
    let expected: BTreeMap<String, Vec<u8>> = [
        ("b".to_string(), b"3".to_vec()),
        ("c".to_string(), b"4".to_vec()),
    ]
    .into_iter()
    .collect();
    assert_eq!(read_tree(&out), expected);
    assert_eq!(delta.count(DeltaKind::Added), 1);
    assert_eq!(delta.count(DeltaKind::Modified), 1);
}

#[test]
fn test_identical_trees_give_empty_delta() {
    let temp = temp_dir();
    let files: &[(&str, &[u8])] = &[("x/y.bin", b"same"), ("z", b"")];
    write_tree(&temp.path().join("one"), files);
    write_tree(&temp.path().join("two"), files);

    let delta = compute_delta(
        &FileTree::scan(temp.path().join("one")).unwrap(),
        &FileTree::scan(temp.path().join("two")).unwrap(),
        &DeltaOptions::default(),
    )
    .unwrap();
    assert!(delta.is_empty());
}

#[test]
fn test_merge_precedence() {
    let temp = temp_dir();
    let extracted = temp.path().join("extracted");
    let patch = temp.path().join("patch");
    write_tree(&extracted, &[("a", b"orig"), ("b", b"keep")]);
    write_tree(&patch, &[("a", b"X")]);

    merge_overrides(&extracted, &patch).unwrap();

    let tree = read_tree(&extracted);
    assert_eq!(tree["a"], b"X");
    assert_eq!(tree["b"], b"keep");
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_delta_then_merge_reproduces_revised() {
    let temp = temp_dir();
    let base = temp.path().join("base");
    let revised = temp.path().join("revised");
    write_tree(&base, &[("a", b"1"), ("dir/b", b"2")]);
    write_tree(&revised, &[("a", b"1"), ("dir/b", b"22"), ("dir/sub/c", b"3")]);

    let delta = compute_delta(
        &FileTree::scan(&base).unwrap(),
        &FileTree::scan(&revised).unwrap(),
        &DeltaOptions::default(),
    )
    .unwrap();
    let patch = temp.path().join("patch");
    delta.materialize(&patch).unwrap();
    merge_overrides(&base, &patch).unwrap();

    assert_eq!(read_tree(&base), read_tree(&revised));
}

#[test]
fn test_scan_missing_root() {
    let temp = temp_dir();
    let err = FileTree::scan(temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::MissingPath(_)));
}
