//! Opt-in verification of stored checksums

use crate::common::{as_files, build_pck, sample_project, temp_dir};
use godot_pck::{Archive, VerifyIssue, VerifyOptions, verify_archive};
use std::fs;

#[test]
fn test_built_archive_verifies() {
    let temp = temp_dir();
    let pck = build_pck(temp.path(), "game.pck", &as_files(&sample_project()));

    let report = verify_archive(
        &pck,
        &VerifyOptions {
            check_checksums: true,
        },
    )
    .unwrap();
    assert!(report.is_ok(), "{:?}", report.issues);
    assert_eq!(report.checked, sample_project().len());
}

#[test]
fn test_corrupt_payload_reported_not_rejected() {
    let temp = temp_dir();
    let pck = build_pck(temp.path(), "game.pck", &as_files(&sample_project()));

    let archive = Archive::open(&pck).unwrap();
    let entry = archive
        .index()
        .get("res://icon.png")
        .cloned()
        .unwrap();
    drop(archive);

    let mut raw = fs::read(&pck).unwrap();
    raw[entry.offset as usize] ^= 0xFF;
    fs::write(&pck, &raw).unwrap();

    // Reads still succeed
    let mut archive = Archive::open(&pck).unwrap();
    assert_eq!(archive.read_file("icon.png").unwrap().len(), 1024);

    let report = verify_archive(
        &pck,
        &VerifyOptions {
            check_checksums: true,
        },
    )
    .unwrap();
    assert_eq!(report.issues.len(), 1);
    assert!(matches!(
        &report.issues[0],
        VerifyIssue::ChecksumMismatch { path, .. } if path == "res://icon.png"
    ));

    let without_checksums = verify_archive(&pck, &VerifyOptions::default()).unwrap();
    assert!(without_checksums.is_ok());
}
