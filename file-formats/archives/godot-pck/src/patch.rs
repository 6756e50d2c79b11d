//! End-to-end patch pipelines
//!
//! These chain parsing, extraction, comparison, merging, repacking and
//! container assembly. Every error is tagged with the [`Stage`] that failed,
//! so a front-end can report where a pipeline stopped:
//!
//! ```no_run
//! use godot_pck::patch::{PatchOptions, apply_patch};
//!
//! # fn main() {
//! match apply_patch("game.pck", "patch", "game_patched.pck", &PatchOptions::default()) {
//!     Ok(summary) => println!("{} files patched", summary.merged.total()),
//!     Err(e) => eprintln!("stopped during {:?}: {e}", e.stage()),
//! }
//! # }
//! ```

use crate::archive::Archive;
use crate::cancel::CancellationToken;
use crate::container::{ContainerOptions, ContainerSummary, build_container};
use crate::delta::{DeltaKind, DeltaOptions, DeltaSet, compute_delta};
use crate::error::{Stage, StageExt};
use crate::extract::{ExtractOptions, ExtractSummary, extract_all};
use crate::merge::{MergeSummary, merge_overrides};
use crate::repack::{RepackOptions, RepackSummary, repack};
use crate::tree::FileTree;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where and how to build a distribution container after repacking
#[derive(Debug, Clone)]
pub struct ContainerTarget {
    /// Template application tree
    pub template_dir: PathBuf,
    /// Container file to write
    pub output: PathBuf,
    /// Container layout
    pub options: ContainerOptions,
}

/// Options shared by the patch pipelines
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Extract, hash and checksum on the rayon thread pool
    pub parallel: bool,
    /// Checked before each file's I/O in every stage
    pub cancel: Option<CancellationToken>,
    /// Build a container from the repacked archive
    pub container: Option<ContainerTarget>,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
            container: None,
        }
    }
}

impl PatchOptions {
    fn extract(&self) -> ExtractOptions {
        ExtractOptions {
            parallel: self.parallel,
            cancel: self.cancel.clone(),
        }
    }

    fn delta(&self) -> DeltaOptions {
        DeltaOptions {
            parallel: self.parallel,
            cancel: self.cancel.clone(),
        }
    }

    fn repack(&self) -> RepackOptions {
        RepackOptions {
            parallel: self.parallel,
            cancel: self.cancel.clone(),
        }
    }
}

/// Result of [`create_patch`]
#[derive(Debug, Clone, Default)]
pub struct PatchSummary {
    /// Relative paths that only exist in the revised archive
    pub added: Vec<String>,
    /// Relative paths whose content changed
    pub modified: Vec<String>,
}

impl PatchSummary {
    /// Number of files in the patch folder
    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len()
    }
}

/// Result of [`apply_patch`] and [`run_all`]
#[derive(Debug, Clone)]
pub struct ApplySummary {
    /// Entries extracted from the base archive
    pub extracted: ExtractSummary,
    /// Override files copied onto the extracted tree
    pub merged: MergeSummary,
    /// The written archive
    pub repacked: RepackSummary,
    /// The written container, if one was requested
    pub container: Option<ContainerSummary>,
}

/// Build a patch folder holding every file of `revised_pck` that is new or
/// differs from `base_pck`
///
/// Both archives are extracted into a scratch directory that is removed
/// afterwards. The patch folder is assembled next to `output_dir` and only
/// replaces an existing folder once it is complete.
pub fn create_patch<B, R, O>(
    base_pck: B,
    revised_pck: R,
    output_dir: O,
    options: &PatchOptions,
) -> Result<PatchSummary>
where
    B: AsRef<Path>,
    R: AsRef<Path>,
    O: AsRef<Path>,
{
    let base_pck = base_pck.as_ref();
    let revised_pck = revised_pck.as_ref();
    let output_dir = output_dir.as_ref();

    Archive::open(base_pck).stage(Stage::Parse)?;
    Archive::open(revised_pck).stage(Stage::Parse)?;

    let work = scratch_dir().stage(Stage::Extract)?;
    let base_dir = work.path().join("base");
    let revised_dir = work.path().join("revised");
    extract_all(base_pck, &base_dir, &options.extract()).stage(Stage::Extract)?;
    extract_all(revised_pck, &revised_dir, &options.extract()).stage(Stage::Extract)?;

    let delta = compare_trees(&base_dir, &revised_dir, &options.delta()).stage(Stage::Compare)?;

    publish_dir(output_dir, |staging| delta.materialize(staging)).stage(Stage::Compare)?;

    let mut summary = PatchSummary::default();
    for (relative, entry) in delta.iter() {
        match entry.kind {
            DeltaKind::Added => summary.added.push(relative.to_string()),
            DeltaKind::Modified => summary.modified.push(relative.to_string()),
        }
    }
    log::info!(
        "Patch folder {}: {} added, {} modified",
        output_dir.display(),
        summary.added.len(),
        summary.modified.len()
    );
    Ok(summary)
}

/// Apply a patch folder to `base_pck` and write the result to `output_pck`
///
/// The base archive is extracted into a scratch directory, the patch folder
/// is merged on top and the tree is repacked with the base archive's header
/// as template. With [`PatchOptions::container`] set, a container is built
/// from the new archive.
pub fn apply_patch<B, P, O>(
    base_pck: B,
    patch_dir: P,
    output_pck: O,
    options: &PatchOptions,
) -> Result<ApplySummary>
where
    B: AsRef<Path>,
    P: AsRef<Path>,
    O: AsRef<Path>,
{
    let work = scratch_dir().stage(Stage::Extract)?;
    run_pipeline(
        base_pck.as_ref(),
        &work.path().join("extracted"),
        patch_dir.as_ref(),
        output_pck.as_ref(),
        options,
    )
}

/// Extract, merge and repack through a working directory that is kept
///
/// `extracted_dir` is left in place afterwards, so the merged tree can be
/// inspected or edited and repacked again.
pub fn run_all<B, E, P, O>(
    base_pck: B,
    extracted_dir: E,
    patch_dir: P,
    output_pck: O,
    options: &PatchOptions,
) -> Result<ApplySummary>
where
    B: AsRef<Path>,
    E: AsRef<Path>,
    P: AsRef<Path>,
    O: AsRef<Path>,
{
    run_pipeline(
        base_pck.as_ref(),
        extracted_dir.as_ref(),
        patch_dir.as_ref(),
        output_pck.as_ref(),
        options,
    )
}

fn run_pipeline(
    base_pck: &Path,
    extracted_dir: &Path,
    patch_dir: &Path,
    output_pck: &Path,
    options: &PatchOptions,
) -> Result<ApplySummary> {
    let template = Archive::open(base_pck)
        .stage(Stage::Parse)?
        .header()
        .template();
    if !patch_dir.is_dir() {
        return Err(crate::Error::MissingPath(patch_dir.to_path_buf()).in_stage(Stage::Merge));
    }

    let extracted = extract_all(base_pck, extracted_dir, &options.extract()).stage(Stage::Extract)?;
    let merged = merge_overrides(extracted_dir, patch_dir).stage(Stage::Merge)?;
    let repacked = repack(extracted_dir, output_pck, Some(&template), &options.repack())
        .stage(Stage::Repack)?;

    let container = match &options.container {
        Some(target) => Some(
            build_container(
                output_pck,
                &target.template_dir,
                &target.output,
                &target.options,
            )
            .stage(Stage::Containerize)?,
        ),
        None => None,
    };

    Ok(ApplySummary {
        extracted,
        merged,
        repacked,
        container,
    })
}

fn scratch_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

fn compare_trees(base_dir: &Path, revised_dir: &Path, options: &DeltaOptions) -> Result<DeltaSet> {
    let base = FileTree::scan(base_dir)?;
    let revised = FileTree::scan(revised_dir)?;
    compute_delta(&base, &revised, options)
}

/// Fill a staging directory next to `destination`, then swap it into place
fn publish_dir<F>(destination: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".staging-");
    // Same mode as a plain create_dir once the umask applies
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o777));
    }
    let staging = builder.tempdir_in(parent)?;
    fill(staging.path())?;

    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }
    fs::rename(staging.path(), destination)?;
    Ok(())
}
