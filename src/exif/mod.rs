//! Metadata reading and writing through a pluggable backend.
//!
//! Everything that touches a file's embedded metadata goes through
//! [`MetadataBackend`]. The crate ships [`ExifToolBackend`], which shells out to
//! `exiftool`; tests substitute an in-memory fake.
//!
//! - [`Snapshot`] — the tags of one file at one point in time, plus [`Snapshot::diff`]
//! - [`TagValues`] — the values the user wants written
//! - [`CaptureTimestamp`] — parsing of capture date/time strings

mod exiftool;
mod reader;
mod snapshot;
mod timestamp;
mod writer;

pub use exiftool::ExifToolBackend;
pub use reader::{keywords_from, parse_snapshot};
pub use snapshot::{MetaDiff, Snapshot, TagChange};
pub use timestamp::CaptureTimestamp;
pub use writer::write_args;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised at the backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status} for {path}: {stderr}")]
    ToolFailed {
        program: String,
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("malformed metadata output for {path}: {source}")]
    MalformedOutput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Capability interface over a metadata tool.
///
/// Implementations are called strictly sequentially from one thread.
pub trait MetadataBackend {
    /// Read all extended metadata (XMP, IPTC) plus the capture timestamp.
    fn read_all(&self, path: &Path) -> Result<Snapshot, BackendError>;

    /// Read the file's current keyword list.
    fn read_keywords(&self, path: &Path) -> Result<Vec<String>, BackendError>;

    /// Write `values` into the file in place. The keyword is added to the
    /// existing list; the other fields are replaced. Blank fields are left alone.
    fn write(&self, path: &Path, values: &TagValues) -> Result<(), BackendError>;
}

/// The metadata values to apply to every file in a batch.
///
/// ```rust
/// use exif_tagger::exif::TagValues;
///
/// let values = TagValues {
///     keyword: "beach".into(),
///     date_time_original: "2023-05-01 12:30:45.500".into(),
///     ..Default::default()
/// };
/// assert!(!values.is_blank());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValues {
    /// Slash-delimited taxonomy, e.g. `Places/Beach`.
    pub hierarchical_subject: String,
    /// A single keyword, added to the existing keyword list.
    pub keyword: String,
    pub description: String,
    /// Capture date/time, e.g. `2023:05:01 12:30:45` or `2023-05-01 12:30:45.500`.
    pub date_time_original: String,
}

impl TagValues {
    /// `true` if there is nothing to write.
    pub fn is_blank(&self) -> bool {
        self.hierarchical_subject.trim().is_empty()
            && self.keyword.trim().is_empty()
            && self.description.trim().is_empty()
            && self.date_time_original.trim().is_empty()
    }
}
