//! Error types for the PCK library

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for PCK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the header and index of an archive
    Parse,
    /// Writing archive entries out to a directory
    Extract,
    /// Comparing two extracted trees
    Compare,
    /// Copying override files onto an extracted tree
    Merge,
    /// Serializing a tree into a new archive
    Repack,
    /// Assembling the distribution container
    Containerize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Compare => "compare",
            Stage::Merge => "merge",
            Stage::Repack => "repack",
            Stage::Containerize => "containerize",
        };
        f.write_str(name)
    }
}

/// Main error type for PCK operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad magic or structurally invalid header/index
    #[error("Invalid PCK format: {0}")]
    Format(String),

    /// A field declared more bytes than the input holds
    #[error("Truncated input: {field} of entry {entry} needs {needed} more bytes")]
    Truncated {
        /// Name of the field being read
        field: &'static str,
        /// Index of the entry being read (0 for header fields)
        entry: usize,
        /// Bytes that were still required
        needed: u64,
    },

    /// A payload read returned fewer bytes than the index promised
    #[error("Short read for {path}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Virtual path of the entry
        path: String,
        /// Size recorded in the index
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// No index entry has the requested path
    #[error("File not found in archive: {0}")]
    FileNotFound(String),

    /// A required directory or file does not exist
    #[error("Path not found: {}", .0.display())]
    MissingPath(PathBuf),

    /// Entry path would resolve outside of the destination directory
    #[error("Unsafe entry path: {0}")]
    UnsafePath(String),

    /// Distribution container could not be written
    #[error("Container error: {0}")]
    Container(String),

    /// Operation was cancelled between files
    #[error("Operation cancelled")]
    Cancelled,

    /// An error tagged with the pipeline stage that produced it
    #[error("{stage} failed: {source}")]
    Stage {
        /// Failing stage
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new Format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a new Container error
    pub fn container<S: Into<String>>(msg: S) -> Self {
        Error::Container(msg.into())
    }

    /// Tag this error with a pipeline stage
    ///
    /// Errors that already carry a stage keep the innermost one.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage this error was tagged with, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, with stage tags removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error indicates the archive is corrupted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self.root(),
            Error::Format(_) | Error::Truncated { .. } | Error::ShortRead { .. }
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::Container(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let msg = err.to_string();
        Error::Io(err.into_io_error().unwrap_or_else(|| io::Error::other(msg)))
    }
}

/// Extension for attaching a [`Stage`] to fallible results
pub trait StageExt<T> {
    /// Tag the error (if any) with `stage`
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}
