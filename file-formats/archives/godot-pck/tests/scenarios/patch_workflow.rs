//! Creating a patch folder from two builds and applying it

use crate::common::{as_files, build_pck, read_tree, temp_dir};
use godot_pck::{
    Archive, CancellationToken, ContainerOptions, ContainerTarget, Error, ExtractOptions,
    PatchOptions, Stage, apply_patch, create_patch, extract_all,
};
use pretty_assertions::assert_eq;
use std::fs;

fn builds(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let base = build_pck(
        dir,
        "v1.pck",
        &[
            ("project.binary", b"cfg-v1"),
            ("scenes/main.tscn", b"[gd_scene]"),
            ("scripts/player.gdc", b"bytecode-v1"),
            ("removed.txt", b"only in v1"),
        ],
    );
    let revised = build_pck(
        dir,
        "v2.pck",
        &[
            ("project.binary", b"cfg-v2"),
            ("scenes/main.tscn", b"[gd_scene]"),
            ("scripts/player.gdc", b"bytecode-v2"),
            ("scripts/enemy.gdc", b"new"),
        ],
    );
    (base, revised)
}

#[test]
fn test_create_then_apply_patch() {
    let temp = temp_dir();
    let (base, revised) = builds(temp.path());

    let patch = temp.path().join("patch");
    let summary = create_patch(&base, &revised, &patch, &PatchOptions::default()).unwrap();
    assert_eq!(summary.added, vec!["scripts/enemy.gdc"]);
    assert_eq!(summary.modified, vec!["project.binary", "scripts/player.gdc"]);

    let out = temp.path().join("game_patched.pck");
    apply_patch(&base, &patch, &out, &PatchOptions::default()).unwrap();

    let patched = temp.path().join("patched");
    extract_all(&out, &patched, &ExtractOptions::default()).unwrap();
    let revised_tree = temp.path().join("revised");
    extract_all(&revised, &revised_tree, &ExtractOptions::default()).unwrap();

    // Deletions are not carried by a patch
    let mut expected = read_tree(&revised_tree);
    expected.insert("removed.txt".to_string(), b"only in v1".to_vec());
    assert_eq!(read_tree(&patched), expected);

    assert_eq!(
        Archive::open(&out).unwrap().header().template(),
        Archive::open(&base).unwrap().header().template()
    );
}

#[test]
fn test_apply_patch_with_container() {
    let temp = temp_dir();
    let (base, revised) = builds(temp.path());
    let patch = temp.path().join("patch");
    create_patch(&base, &revised, &patch, &PatchOptions::default()).unwrap();

    let template = temp.path().join("vpk_template");
    fs::create_dir_all(template.join("sce_sys")).unwrap();
    fs::write(template.join("eboot.bin"), b"ELF").unwrap();

    let options = PatchOptions {
        container: Some(ContainerTarget {
            template_dir: template,
            output: temp.path().join("game.vpk"),
            options: ContainerOptions::default(),
        }),
        ..PatchOptions::default()
    };
    let out = temp.path().join("game_patched.pck");
    let summary = apply_patch(&base, &patch, &out, &options).unwrap();

    assert_eq!(summary.merged.total(), 3);
    assert!(summary.container.is_some());
    assert!(temp.path().join("game.vpk").is_file());
}

#[test]
fn test_missing_container_template_is_tagged() {
    let temp = temp_dir();
    let base = build_pck(temp.path(), "game.pck", &as_files(&[("a", b"1".to_vec())]));
    let patch = temp.path().join("patch");
    fs::create_dir_all(&patch).unwrap();

    let options = PatchOptions {
        container: Some(ContainerTarget {
            template_dir: temp.path().join("vpk_template"),
            output: temp.path().join("game.vpk"),
            options: ContainerOptions::default(),
        }),
        ..PatchOptions::default()
    };
    let err = apply_patch(&base, &patch, temp.path().join("out.pck"), &options).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Containerize));
    assert!(matches!(err.root(), Error::MissingPath(_)));
}

#[test]
fn test_cancelled_apply_publishes_nothing() {
    let temp = temp_dir();
    let (base, _) = builds(temp.path());
    let patch = temp.path().join("patch");
    fs::create_dir_all(&patch).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let options = PatchOptions {
        cancel: Some(token),
        ..PatchOptions::default()
    };
    let out = temp.path().join("game_patched.pck");
    let err = apply_patch(&base, &patch, &out, &options).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Extract));
    assert!(matches!(err.root(), Error::Cancelled));
    assert!(!out.exists());
}
