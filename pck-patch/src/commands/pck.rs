//! PCK archive command implementations

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use godot_pck::{
    Archive, ContainerOptions, ContainerTarget, ExtractOptions, HeaderTemplate, PatchOptions,
    RepackOptions, VerifyIssue, VerifyOptions, build_container, create_patch, extract_all,
    merge_overrides, repack, verify_archive,
};
use std::path::{Path, PathBuf};

use crate::utils::{
    add_table_row, create_spinner, create_table, format_bytes, format_checksum, format_reserved,
    matches_pattern, truncate_path,
};

/// Container options shared by the commands that can finish with a VPK
#[derive(Args, Clone, Debug)]
pub struct VpkArgs {
    /// Assemble a VPK after repacking
    #[arg(long)]
    pub build_vpk: bool,

    /// Folder containing the full VPK structure
    #[arg(short = 't', long, default_value = "vpk_template")]
    pub vpk_template: PathBuf,

    /// Final .vpk filename
    #[arg(long, default_value = "game.vpk")]
    pub vpk_output: PathBuf,
}

impl VpkArgs {
    fn target(&self) -> Option<ContainerTarget> {
        self.build_vpk.then(|| ContainerTarget {
            template_dir: self.vpk_template.clone(),
            output: self.vpk_output.clone(),
            options: ContainerOptions::default(),
        })
    }
}

#[derive(Subcommand)]
pub enum PckCommands {
    /// Show information about a PCK archive
    Info {
        /// Path to the PCK archive
        archive: PathBuf,
    },

    /// List files in a PCK archive
    List {
        /// Path to the PCK archive
        archive: PathBuf,

        /// Show detailed information (offset, size, checksum)
        #[arg(short, long)]
        long: bool,

        /// Filter files by pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Extract every file of a PCK archive
    Extract {
        /// Path to the PCK archive
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "extracted")]
        output: PathBuf,

        /// Extract one file at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Copy every file of a patch folder onto an extracted tree
    Merge {
        /// Extracted tree to patch
        #[arg(short, long, default_value = "extracted")]
        extracted: PathBuf,

        /// Folder holding the override files
        #[arg(short, long, default_value = "patch")]
        patch: PathBuf,
    },

    /// Pack a directory tree into a new PCK archive
    Repack {
        /// Directory to pack
        #[arg(short, long, default_value = "extracted")]
        extracted: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = "game_patched.pck")]
        output: PathBuf,

        /// Archive whose header version and reserved block are reused
        #[arg(short = 'i', long)]
        pck: Option<PathBuf>,

        #[command(flatten)]
        vpk: VpkArgs,
    },

    /// Extract, merge the patch folder, then repack
    All {
        /// Input PCK archive
        #[arg(short = 'i', long)]
        pck: PathBuf,

        /// Working directory for the extracted tree
        #[arg(short, long, default_value = "extracted")]
        extracted: PathBuf,

        /// Folder holding the override files
        #[arg(short, long, default_value = "patch")]
        patch: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = "game_patched.pck")]
        output: PathBuf,

        #[command(flatten)]
        vpk: VpkArgs,
    },

    /// Create a patch folder with the files that are new or changed in a
    /// revised archive
    Diff {
        /// Original archive
        base: PathBuf,

        /// Revised archive
        revised: PathBuf,

        /// Patch folder to write
        #[arg(short, long, default_value = "patch")]
        output: PathBuf,
    },

    /// Apply a patch folder to an archive
    Apply {
        /// Archive to patch
        base: PathBuf,

        /// Folder holding the override files
        #[arg(short, long, default_value = "patch")]
        patch: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = "game_patched.pck")]
        output: PathBuf,

        #[command(flatten)]
        vpk: VpkArgs,
    },

    /// Verify the layout of a PCK archive
    Verify {
        /// Path to the PCK archive
        archive: PathBuf,

        /// Compare each payload against its stored MD5
        #[arg(long)]
        check_checksums: bool,
    },

    /// Build a VPK from an existing archive
    Vpk {
        /// Archive to place into the VPK
        archive: PathBuf,

        /// Folder containing the full VPK structure
        #[arg(short = 't', long, default_value = "vpk_template")]
        template: PathBuf,

        /// Final .vpk filename
        #[arg(short, long, default_value = "game.vpk")]
        output: PathBuf,

        /// Location of the archive inside the VPK
        #[arg(long, default_value = godot_pck::container::DEFAULT_DATA_PATH)]
        data_path: String,
    },
}

pub fn execute(command: PckCommands) -> Result<()> {
    match command {
        PckCommands::Info { archive } => show_info(&archive),
        PckCommands::List {
            archive,
            long,
            filter,
        } => list_archive(&archive, long, filter),
        PckCommands::Extract {
            archive,
            output,
            sequential,
        } => extract_archive(&archive, &output, sequential),
        PckCommands::Merge { extracted, patch } => merge_patch(&extracted, &patch),
        PckCommands::Repack {
            extracted,
            output,
            pck,
            vpk,
        } => repack_tree(&extracted, &output, pck.as_deref(), &vpk),
        PckCommands::All {
            pck,
            extracted,
            patch,
            output,
            vpk,
        } => run_all(&pck, &extracted, &patch, &output, &vpk),
        PckCommands::Diff {
            base,
            revised,
            output,
        } => diff_archives(&base, &revised, &output),
        PckCommands::Apply {
            base,
            patch,
            output,
            vpk,
        } => apply_patch(&base, &patch, &output, &vpk),
        PckCommands::Verify {
            archive,
            check_checksums,
        } => verify(&archive, check_checksums),
        PckCommands::Vpk {
            archive,
            template,
            output,
            data_path,
        } => build_vpk(&archive, &template, &output, data_path),
    }
}

fn show_info(path: &Path) -> Result<()> {
    let archive = Archive::open(path).context("Failed to open archive")?;
    let info = archive.info();

    println!("PCK Archive Information");
    println!("=======================");
    println!("Path: {}", path.display());
    println!("Pack version: {}", info.header.version);
    println!("Reserved block: {}", format_reserved(&info.header.reserved));
    println!("Declared entries: {}", info.header.file_count);
    println!("Unique entries: {}", info.entry_count);
    println!("Data size: {}", format_bytes(info.data_size));
    println!("Archive size: {}", format_bytes(info.archive_size));

    Ok(())
}

fn list_archive(path: &Path, long: bool, filter: Option<String>) -> Result<()> {
    let archive = Archive::open(path).context("Failed to open archive")?;
    let pattern = filter.as_deref().unwrap_or("*");

    let entries: Vec<_> = archive
        .list()
        .iter()
        .filter(|e| matches_pattern(&e.path, pattern))
        .collect();

    if entries.is_empty() {
        println!("No files found matching pattern: {pattern}");
        return Ok(());
    }

    if long {
        let mut table = create_table(vec!["File", "Offset", "Size", "MD5"]);
        for entry in entries {
            add_table_row(
                &mut table,
                vec![
                    truncate_path(&entry.path, 60),
                    entry.offset.to_string(),
                    format_bytes(entry.size.max(0) as u64),
                    format_checksum(&entry.checksum),
                ],
            );
        }
        table.printstd();
    } else {
        for entry in entries {
            println!("{}", entry.path);
        }
    }

    Ok(())
}

fn extract_archive(archive: &Path, output: &Path, sequential: bool) -> Result<()> {
    let spinner = create_spinner("Extracting files...");
    let options = ExtractOptions {
        parallel: !sequential,
        ..ExtractOptions::default()
    };
    let summary = extract_all(archive, output, &options);
    spinner.finish_and_clear();
    let summary = summary.with_context(|| format!("Failed to extract {}", archive.display()))?;

    println!(
        "Extracted {} files ({}) to {}",
        summary.extracted,
        format_bytes(summary.bytes),
        output.display()
    );
    Ok(())
}

fn merge_patch(extracted: &Path, patch: &Path) -> Result<()> {
    let summary = merge_overrides(extracted, patch)
        .with_context(|| format!("Failed to merge {}", patch.display()))?;

    for path in &summary.replaced {
        log::info!("Replaced: {path}");
    }
    for path in &summary.added {
        log::info!("Added: {path}");
    }
    println!(
        "Patched {} files ({} replaced, {} added)",
        summary.total(),
        summary.replaced.len(),
        summary.added.len()
    );
    Ok(())
}

fn repack_tree(extracted: &Path, output: &Path, pck: Option<&Path>, vpk: &VpkArgs) -> Result<()> {
    let template = pck
        .map(HeaderTemplate::from_archive)
        .transpose()
        .context("Failed to read header template")?;

    let spinner = create_spinner("Repacking...");
    let summary = repack(extracted, output, template.as_ref(), &RepackOptions::default());
    spinner.finish_and_clear();
    let summary = summary.context("Failed to repack")?;

    println!(
        "Repacked {} files ({}) -> {}",
        summary.file_count,
        format_bytes(summary.archive_size),
        output.display()
    );

    if let Some(target) = vpk.target() {
        containerize(output, &target)?;
    }
    Ok(())
}

fn run_all(pck: &Path, extracted: &Path, patch: &Path, output: &Path, vpk: &VpkArgs) -> Result<()> {
    let options = PatchOptions {
        container: vpk.target(),
        ..PatchOptions::default()
    };

    let spinner = create_spinner("Extracting, merging and repacking...");
    let summary = godot_pck::run_all(pck, extracted, patch, output, &options);
    spinner.finish_and_clear();
    let summary = summary.context("Patch pipeline failed")?;

    print_apply_summary(&summary, output);
    Ok(())
}

fn diff_archives(base: &Path, revised: &Path, output: &Path) -> Result<()> {
    let spinner = create_spinner("Comparing archives...");
    let summary = create_patch(base, revised, output, &PatchOptions::default());
    spinner.finish_and_clear();
    let summary = summary.context("Failed to create patch")?;

    if summary.total() == 0 {
        println!("No differences found");
        return Ok(());
    }

    let mut table = create_table(vec!["File", "Change"]);
    for path in &summary.added {
        add_table_row(&mut table, vec![truncate_path(path, 60), "added".to_string()]);
    }
    for path in &summary.modified {
        add_table_row(
            &mut table,
            vec![truncate_path(path, 60), "modified".to_string()],
        );
    }
    table.printstd();

    println!(
        "Wrote {} files to {} ({} added, {} modified)",
        summary.total(),
        output.display(),
        summary.added.len(),
        summary.modified.len()
    );
    Ok(())
}

fn apply_patch(base: &Path, patch: &Path, output: &Path, vpk: &VpkArgs) -> Result<()> {
    let options = PatchOptions {
        container: vpk.target(),
        ..PatchOptions::default()
    };

    let spinner = create_spinner("Applying patch...");
    let summary = godot_pck::apply_patch(base, patch, output, &options);
    spinner.finish_and_clear();
    let summary = summary.context("Failed to apply patch")?;

    print_apply_summary(&summary, output);
    Ok(())
}

fn print_apply_summary(summary: &godot_pck::ApplySummary, output: &Path) {
    println!(
        "Patched {} files ({} replaced, {} added)",
        summary.merged.total(),
        summary.merged.replaced.len(),
        summary.merged.added.len()
    );
    println!(
        "Repacked {} files ({}) -> {}",
        summary.repacked.file_count,
        format_bytes(summary.repacked.archive_size),
        output.display()
    );
    if let Some(container) = &summary.container {
        println!(
            "Built VPK with {} files ({})",
            container.files,
            format_bytes(container.container_size)
        );
    }
}

fn verify(path: &Path, check_checksums: bool) -> Result<()> {
    let spinner = create_spinner("Verifying archive...");
    let report = verify_archive(path, &VerifyOptions { check_checksums });
    spinner.finish_and_clear();
    let report = report.context("Failed to verify archive")?;

    for issue in &report.issues {
        match issue {
            VerifyIssue::OutOfBounds { path } => println!("✗ {path}: outside of the archive"),
            VerifyIssue::InsideIndex { path } => {
                println!("✗ {path}: payload starts inside the index")
            }
            VerifyIssue::Overlap { first, second } => {
                println!("✗ {second}: overlaps {first}")
            }
            VerifyIssue::ChecksumMismatch {
                path,
                stored,
                actual,
            } => println!(
                "✗ {path}: checksum {} != {}",
                hex::encode(stored),
                hex::encode(actual)
            ),
        }
    }
    if report.unchecked > 0 {
        println!("{} entries carry no checksum", report.unchecked);
    }

    if report.is_ok() {
        println!("✓ Archive verification passed ({} entries)", report.checked);
        Ok(())
    } else {
        bail!(
            "Archive verification failed with {} issues",
            report.issues.len()
        )
    }
}

fn build_vpk(archive: &Path, template: &Path, output: &Path, data_path: String) -> Result<()> {
    containerize(
        archive,
        &ContainerTarget {
            template_dir: template.to_path_buf(),
            output: output.to_path_buf(),
            options: ContainerOptions { data_path },
        },
    )
}

fn containerize(archive: &Path, target: &ContainerTarget) -> Result<()> {
    if !target.template_dir.is_dir() {
        bail!(
            "VPK template folder '{}' not found",
            target.template_dir.display()
        );
    }

    let spinner = create_spinner("Building VPK...");
    let summary = build_container(archive, &target.template_dir, &target.output, &target.options);
    spinner.finish_and_clear();
    let summary = summary.context("Failed to build VPK")?;

    println!(
        "Built VPK: {} ({} files, {})",
        target.output.display(),
        summary.files,
        format_bytes(summary.container_size)
    );
    Ok(())
}
