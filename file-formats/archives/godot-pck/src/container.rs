//! Distribution container (".vpk") assembly
//!
//! A container is a ZIP file holding a template application tree with the
//! packed game data dropped in at a fixed location. Every entry is stored
//! without compression and carries Unix mode 0777.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Location of the archive inside the container
pub const DEFAULT_DATA_PATH: &str = "game_data/game.pck";

/// Unix permission bits written for every entry
pub const ENTRY_MODE: u32 = 0o777;

/// Options for building a container
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// `/`-separated path the archive is stored at
    ///
    /// The template's copy of the parent directory is dropped entirely.
    pub data_path: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
        }
    }
}

impl ContainerOptions {
    /// Directory holding the archive, without trailing slash
    fn data_dir(&self) -> Option<&str> {
        self.data_path.rsplit_once('/').map(|(dir, _)| dir)
    }
}

/// Result of building a container
#[derive(Debug, Clone, Default)]
pub struct ContainerSummary {
    /// Directory entries written
    pub directories: usize,
    /// File entries written, the archive included
    pub files: usize,
    /// Size of the written container
    pub container_size: u64,
}

#[derive(Debug)]
enum ContainerItem {
    Directory,
    File(PathBuf),
}

/// Build a container from `template_dir` with `archive` at the data path
///
/// The output is written to a temporary file next to `output` and renamed
/// into place once complete.
pub fn build_container<A, T, O>(
    archive: A,
    template_dir: T,
    output: O,
    options: &ContainerOptions,
) -> Result<ContainerSummary>
where
    A: AsRef<Path>,
    T: AsRef<Path>,
    O: AsRef<Path>,
{
    let archive = archive.as_ref();
    let template_dir = template_dir.as_ref();
    let output = output.as_ref();

    if !template_dir.is_dir() {
        return Err(Error::MissingPath(template_dir.to_path_buf()));
    }
    if !archive.is_file() {
        return Err(Error::MissingPath(archive.to_path_buf()));
    }
    crate::path::validate_relative_path(&options.data_path)?;

    let items = collect_items(archive, template_dir, options)?;
    log::info!(
        "Building container {} from {} ({} entries)",
        output.display(),
        template_dir.display(),
        items.len()
    );

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let mut summary = write_items(BufWriter::new(temp_file.as_file_mut()), &items)?;
    temp_file.as_file().sync_all()?;
    summary.container_size = temp_file.as_file().metadata()?.len();

    temp_file.persist(output).map_err(|e| Error::Io(e.error))?;
    log::info!(
        "Wrote {} ({} directories, {} files)",
        output.display(),
        summary.directories,
        summary.files
    );
    Ok(summary)
}

/// Every container entry, keyed by its name inside the ZIP
fn collect_items(
    archive: &Path,
    template_dir: &Path,
    options: &ContainerOptions,
) -> Result<BTreeMap<String, ContainerItem>> {
    let data_dir = options.data_dir();
    let replaced = |rel: &str| match data_dir {
        Some(dir) => rel == dir || rel.starts_with(&format!("{dir}/")),
        None => rel == options.data_path,
    };

    let mut items = BTreeMap::new();
    for entry in WalkDir::new(template_dir).follow_links(false).min_depth(1) {
        let entry = entry?;
        let rel = crate::path::relative_slash_path(template_dir, entry.path())?;
        if replaced(&rel) {
            continue;
        }
        if entry.file_type().is_dir() {
            items.insert(format!("{rel}/"), ContainerItem::Directory);
        } else if entry.file_type().is_file() {
            items.insert(rel, ContainerItem::File(entry.path().to_path_buf()));
        } else {
            log::warn!("Skipping non-regular template entry {rel}");
        }
    }

    // Parent directories of the data path
    let mut prefix = String::new();
    for part in options.data_path.split('/').filter(|p| !p.is_empty()) {
        if !prefix.is_empty() {
            items.insert(format!("{prefix}/"), ContainerItem::Directory);
            prefix.push('/');
        }
        prefix.push_str(part);
    }
    items.insert(prefix, ContainerItem::File(archive.to_path_buf()));

    Ok(items)
}

/// Entries this large need ZIP64 extra fields
fn needs_zip64(len: u64) -> bool {
    len >= u64::from(u32::MAX)
}

fn write_items<W: Write + Seek>(
    writer: W,
    items: &BTreeMap<String, ContainerItem>,
) -> Result<ContainerSummary> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .unix_permissions(ENTRY_MODE);

    let mut zip = ZipWriter::new(writer);
    let mut summary = ContainerSummary::default();
    for (name, item) in items {
        match item {
            ContainerItem::Directory => {
                zip.add_directory(name.as_str(), options)?;
                summary.directories += 1;
            }
            ContainerItem::File(source) => {
                let mut file = File::open(source)?;
                let len = file.metadata()?.len();
                zip.start_file(name.as_str(), options.large_file(needs_zip64(len)))?;
                io::copy(&mut file, &mut zip)?;
                summary.files += 1;
            }
        }
        log::debug!("Stored {name}");
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(summary)
}
