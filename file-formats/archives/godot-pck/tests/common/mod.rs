//! Common test utilities and fixtures

#![allow(dead_code)]

use godot_pck::{ArchiveBuilder, HeaderTemplate, PackVersion};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Create a temporary directory for tests
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Generate test data of a specific size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Header metadata resembling a Godot 3.5 export
pub fn godot_template() -> HeaderTemplate {
    let mut reserved = [0u8; 64];
    reserved[..4].copy_from_slice(b"rsvd");
    HeaderTemplate {
        version: PackVersion::new(1, 3, 5, 1),
        reserved,
    }
}

/// Write `files` below `root`, creating parent directories
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
        fs::write(path, content).expect("Failed to write test file");
    }
}

/// Read every file below `root`, keyed by `/`-separated relative path
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .expect("below root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (rel, fs::read(e.path()).expect("read file"))
        })
        .collect()
}

/// Build an archive at `dir/name` holding `files` under `res://`
pub fn build_pck(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut builder = ArchiveBuilder::new().template(godot_template());
    for (rel, content) in files {
        builder = builder.add_file_data(content.to_vec(), format!("res://{rel}"));
    }
    builder.build(&path).expect("Failed to build archive");
    path
}

/// Files of a small exported project
pub fn sample_project() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("project.binary", b"ECFG\x01\x00\x00\x00".to_vec()),
        ("icon.png", generate_test_data(1024)),
        ("scenes/main.tscn", b"[gd_scene load_steps=2 format=2]".to_vec()),
        ("scenes/player.tscn", b"[gd_scene format=2]".to_vec()),
        (".import/icon.png-487276ed.stex", generate_test_data(300)),
        ("empty.txt", Vec::new()),
    ]
}

/// Borrow a sample project as the slice form the helpers take
pub fn as_files<'a>(files: &'a [(&'static str, Vec<u8>)]) -> Vec<(&'static str, &'a [u8])> {
    files.iter().map(|(n, d)| (*n, d.as_slice())).collect()
}
