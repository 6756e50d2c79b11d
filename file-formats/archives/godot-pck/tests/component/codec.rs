//! Header and index codec against hand-written archives

use byteorder::{LittleEndian, WriteBytesExt};
use godot_pck::{
    Archive, ArchiveBuilder, Error, HEADER_SIZE, HeaderTemplate, IndexEntry, PCK_MAGIC,
    PackVersion, parse_header_index, serialize_header_index,
};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};

fn header_bytes(count: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_all(&PCK_MAGIC).unwrap();
    for v in [1u32, 3, 5, 1] {
        buf.write_u32::<LittleEndian>(v).unwrap();
    }
    buf.write_all(&[0xAA; 64]).unwrap();
    buf.write_i32::<LittleEndian>(count).unwrap();
    buf
}

fn record(buf: &mut Vec<u8>, path: &[u8], offset: i64, size: i64) {
    buf.write_i32::<LittleEndian>(path.len() as i32).unwrap();
    buf.write_all(path).unwrap();
    buf.write_i64::<LittleEndian>(offset).unwrap();
    buf.write_i64::<LittleEndian>(size).unwrap();
    buf.write_all(&[0u8; 16]).unwrap();
}

#[test]
fn test_parse_hand_written_archive() {
    let mut buf = header_bytes(2);
    // NUL-padded path as Godot writes it
    let base = HEADER_SIZE + (36 + 12) + (36 + 8);
    record(&mut buf, b"res://a.txt\0", base as i64, 3);
    record(&mut buf, b"res://bb", base as i64 + 3, 2);
    buf.extend_from_slice(b"abcxy");

    let mut archive = Archive::from_reader(Cursor::new(buf)).unwrap();
    assert_eq!(archive.header().version, PackVersion::new(1, 3, 5, 1));
    assert_eq!(archive.header().reserved, [0xAA; 64]);
    assert_eq!(archive.header().file_count, 2);

    let paths: Vec<&str> = archive.list().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["res://a.txt", "res://bb"]);
    assert_eq!(archive.read_file("res://a.txt").unwrap(), b"abc");
    assert_eq!(archive.read_file("bb").unwrap(), b"xy");
}

#[test]
fn test_magic_rejected_before_entries() {
    let mut buf = header_bytes(1);
    buf[..4].copy_from_slice(b"GDPD");
    // Index is garbage; the magic check must fail first
    buf.extend_from_slice(&[0xFF; 8]);

    let err = parse_header_index(&mut Cursor::new(buf)).unwrap_err();
    assert!(matches!(err, Error::Format(_)), "{err}");
}

#[test]
fn test_truncated_index_is_an_error() {
    let mut buf = header_bytes(5);
    record(&mut buf, b"res://one", 0, 0);
    record(&mut buf, b"res://two", 0, 0);

    match parse_header_index(&mut Cursor::new(buf)) {
        Err(Error::Truncated { entry, .. }) => assert_eq!(entry, 2),
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn test_truncated_path_bytes() {
    let mut buf = header_bytes(1);
    buf.write_i32::<LittleEndian>(100).unwrap();
    buf.write_all(b"res://short").unwrap();

    let err = parse_header_index(&mut Cursor::new(buf)).unwrap_err();
    assert!(err.is_corruption());
    assert!(matches!(err, Error::Truncated { .. }));
}

#[test]
fn test_duplicate_paths_last_write_wins() {
    let mut buf = header_bytes(3);
    record(&mut buf, b"res://a", 200, 1);
    record(&mut buf, b"res://b", 201, 1);
    record(&mut buf, b"res://a", 202, 7);

    let (header, index) = parse_header_index(&mut Cursor::new(buf)).unwrap();
    assert_eq!(header.file_count, 3);
    assert_eq!(index.len(), 2);
    assert_eq!(index.range_of("res://a"), Some((202, 7)));
    let paths: Vec<&str> = index.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["res://a", "res://b"]);
}

#[test]
fn test_builder_matches_serialized_layout() {
    let mut built = Vec::new();
    let summary = ArchiveBuilder::new()
        .template(HeaderTemplate {
            version: PackVersion::new(1, 3, 0, 0),
            reserved: [7; 64],
        })
        .add_file_data(b"one".to_vec(), "res://1")
        .add_file_data(b"twenty".to_vec(), "res://20")
        .write_to(&mut built)
        .unwrap();

    let mut manual = Vec::new();
    let template = HeaderTemplate {
        version: PackVersion::new(1, 3, 0, 0),
        reserved: [7; 64],
    };
    serialize_header_index(&mut manual, &template, &summary.entries).unwrap();
    manual.extend_from_slice(b"onetwenty");

    assert_eq!(built, manual);
    let first: &IndexEntry = &summary.entries[0];
    assert_eq!(first.offset as u64, HEADER_SIZE + 36 + 7 + 36 + 8);
}
