//! Renaming updated files after their capture timestamp.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::exif::CaptureTimestamp;

/// Picks collision-free target names for one batch run.
///
/// When `<stem><ext>` is taken, `<stem> (1)<ext>`, `<stem> (2)<ext>`, ... are
/// tried. The counter for a given target name only ever moves forward during a
/// run, so a number handed out once is never handed out again, even if the file
/// holding it is later moved away.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::exif::CaptureTimestamp;
/// use exif_tagger::rename::Renamer;
/// use std::path::Path;
///
/// let mut renamer = Renamer::new();
/// let ts = CaptureTimestamp::parse("2024:01:01 10:00:00").unwrap();
/// let new_path = renamer.rename(Path::new("IMG_0001.jpg"), &ts).unwrap();
/// println!("{}", new_path.display());
/// ```
#[derive(Debug, Default)]
pub struct Renamer {
    next_suffix: HashMap<PathBuf, u32>,
}

impl Renamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The path `current` should be renamed to. Returns `current` itself if it
    /// already carries the target name.
    pub fn target_for(&mut self, current: &Path, stem: &str) -> PathBuf {
        let dir = current.parent().unwrap_or_else(|| Path::new(""));
        let ext = current
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let base = dir.join(format!("{stem}{ext}"));
        if base == current || !base.exists() {
            return base;
        }

        let n = self.next_suffix.entry(base).or_insert(1);
        loop {
            let candidate = dir.join(format!("{stem} ({n}){ext}"));
            *n += 1;
            if candidate == current || !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Rename `current` after `timestamp` and return the new path.
    pub fn rename(&mut self, current: &Path, timestamp: &CaptureTimestamp) -> Result<PathBuf> {
        let target = self.target_for(current, &timestamp.file_stem());
        if target == current {
            log::debug!("Already named after its capture time: {}", current.display());
            return Ok(target);
        }

        std::fs::rename(current, &target).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                current.display(),
                target.display()
            )
        })?;
        Ok(target)
    }
}
