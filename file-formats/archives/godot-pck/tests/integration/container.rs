//! Distribution container layout

use crate::common::{as_files, build_pck, sample_project, temp_dir, write_tree};
use godot_pck::{ContainerOptions, Error, build_container};
use std::fs::{self, File};
use std::io::Read;
use zip::{CompressionMethod, ZipArchive};

#[test]
fn test_container_entries_are_stored_with_full_permissions() {
    let temp = temp_dir();
    let pck = build_pck(temp.path(), "game_patched.pck", &as_files(&sample_project()));
    let template = temp.path().join("vpk_template");
    write_tree(
        &template,
        &[
            ("eboot.bin", b"\x7fELF"),
            ("sce_sys/param.sfo", b"\0PSF"),
            ("sce_sys/icon0.png", b"png"),
            ("game_data/game.pck", b"old"),
        ],
    );
    let out = temp.path().join("game.vpk");

    build_container(&pck, &template, &out, &ContainerOptions::default()).unwrap();

    let mut zip = ZipArchive::new(File::open(&out).unwrap()).unwrap();
    let mut names = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o777);
        assert_eq!(entry.is_dir(), entry.name().ends_with('/'));
        names.push(entry.name().to_string());
    }
    assert_eq!(
        names,
        vec![
            "eboot.bin",
            "game_data/",
            "game_data/game.pck",
            "sce_sys/",
            "sce_sys/icon0.png",
            "sce_sys/param.sfo",
        ]
    );

    let mut packed = Vec::new();
    zip.by_name("game_data/game.pck")
        .unwrap()
        .read_to_end(&mut packed)
        .unwrap();
    assert_eq!(packed, fs::read(&pck).unwrap());
}

#[test]
fn test_failed_container_keeps_previous_output() {
    let temp = temp_dir();
    let out = temp.path().join("game.vpk");
    fs::write(&out, b"previous").unwrap();
    let template = temp.path().join("vpk_template");
    write_tree(&template, &[("eboot.bin", b"ELF")]);

    let err = build_container(
        temp.path().join("missing.pck"),
        &template,
        &out,
        &ContainerOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingPath(_)));
    assert_eq!(fs::read(&out).unwrap(), b"previous");
}
