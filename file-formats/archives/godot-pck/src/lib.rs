//! # godot_pck - Godot 3 PCK Archive Library
//!
//! Reading, writing and patching of the `.pck` resource archives produced by
//! the Godot 3 engine export.
//!
//! ## Features
//!
//! - Header and index codec with exact round-trip of version and reserved
//!   metadata
//! - Parallel extraction with path traversal protection
//! - SHA-256 based delta computation between two archive trees
//! - Override merging and deterministic repacking with recomputed offsets
//! - Temp-file-then-rename publishing for every output
//! - Distribution container (".vpk") assembly
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```no_run
//! use godot_pck::Archive;
//!
//! # fn main() -> Result<(), godot_pck::Error> {
//! let mut archive = Archive::open("game.pck")?;
//! println!("Engine version {}", archive.header().version);
//!
//! for entry in archive.list() {
//!     println!("{} ({} bytes)", entry.path, entry.size);
//! }
//!
//! let data = archive.read_file("res://project.binary")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Patching
//!
//! ```no_run
//! use godot_pck::{ExtractOptions, RepackOptions, extract_all, merge_overrides, repack};
//! use godot_pck::HeaderTemplate;
//!
//! # fn main() -> Result<(), godot_pck::Error> {
//! let template = HeaderTemplate::from_archive("game.pck")?;
//! extract_all("game.pck", "extracted", &ExtractOptions::default())?;
//! merge_overrides("extracted", "patch")?;
//! repack("extracted", "game_patched.pck", Some(&template), &RepackOptions::default())?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod builder;
pub mod cancel;
pub mod container;
pub mod delta;
pub mod digest;
pub mod error;
pub mod extract;
pub mod header;
pub mod index;
pub mod io;
pub mod merge;
pub mod patch;
pub mod path;
pub mod repack;
pub mod tree;
pub mod verify;

// Re-export commonly used types
pub use archive::{Archive, ArchiveInfo};
pub use builder::{ArchiveBuilder, BuildSummary};
pub use cancel::CancellationToken;
pub use container::{ContainerOptions, ContainerSummary, build_container};
pub use delta::{DeltaEntry, DeltaKind, DeltaOptions, DeltaSet, compute_delta};
pub use error::{Error, Result, Stage, StageExt};
pub use extract::{ExtractOptions, ExtractSummary, extract_all, extract_archive};
pub use header::{ArchiveHeader, HEADER_SIZE, HeaderTemplate, PCK_MAGIC, PackVersion};
pub use index::{ArchiveIndex, IndexEntry, parse_header_index, serialize_header_index};
pub use merge::{MergeSummary, merge_overrides};
pub use patch::{
    ApplySummary, ContainerTarget, PatchOptions, PatchSummary, apply_patch, create_patch, run_all,
};
pub use path::VIRTUAL_ROOT;
pub use repack::{RepackOptions, RepackSummary, repack, repack_tree};
pub use tree::FileTree;
pub use verify::{VerifyIssue, VerifyOptions, VerifyReport, verify, verify_archive};
