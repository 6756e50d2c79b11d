//! Extraction against archives on disk

use crate::common::{as_files, build_pck, read_tree, sample_project, temp_dir};
use godot_pck::{Archive, CancellationToken, Error, ExtractOptions, extract_all};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_extract_reproduces_every_entry() {
    let temp = temp_dir();
    let project = sample_project();
    let pck = build_pck(temp.path(), "game.pck", &as_files(&project));

    let out = temp.path().join("extracted");
    let summary = extract_all(&pck, &out, &ExtractOptions::default()).unwrap();
    assert_eq!(summary.extracted, project.len());

    let tree = read_tree(&out);
    for (name, data) in &project {
        assert_eq!(tree.get(*name), Some(data), "{name}");
    }
}

#[test]
fn test_entry_ranges_match_payloads() {
    let temp = temp_dir();
    let project = sample_project();
    let pck = build_pck(temp.path(), "game.pck", &as_files(&project));

    let raw = fs::read(&pck).unwrap();
    let archive = Archive::open(&pck).unwrap();
    let mut ranges = Vec::new();
    for entry in archive.list() {
        let (offset, size) = entry.range().unwrap();
        let bytes = &raw[offset as usize..(offset + size) as usize];
        let name = entry.path.trim_start_matches("res://");
        let expected = &project.iter().find(|(n, _)| *n == name).unwrap().1;
        assert_eq!(bytes, expected.as_slice());
        ranges.push((offset, offset + size));
    }

    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping ranges {pair:?}");
    }
}

#[test]
fn test_extract_missing_archive() {
    let temp = temp_dir();
    let err = extract_all(
        temp.path().join("missing.pck"),
        temp.path().join("out"),
        &ExtractOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_cancelled_parallel_extraction() {
    let temp = temp_dir();
    let project = sample_project();
    let pck = build_pck(temp.path(), "game.pck", &as_files(&project));
    let token = CancellationToken::new();
    token.cancel();

    let options = ExtractOptions {
        parallel: true,
        cancel: Some(token),
    };
    let err = extract_all(&pck, temp.path().join("out"), &options).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
