use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{CollectorConfig, Config};
use crate::exif::{MetadataBackend, TagValues};
use crate::rename::Renamer;
use crate::report::{self, BatchReport, WorkItem};

/// What happened to one file in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Metadata was written and both snapshots were captured.
    Applied(WorkItem),
    /// The keyword was already present; nothing was written.
    Skipped,
    /// Reading, writing or parsing failed; the file is left out of the report.
    Failed(String),
}

/// Ordered, duplicate-free list of files queued for a batch.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::config::CollectorConfig;
/// use exif_tagger::pipeline::Worklist;
/// use std::path::PathBuf;
///
/// let mut worklist = Worklist::new();
/// worklist.add_paths(&[PathBuf::from("./photos")], &CollectorConfig::default());
/// println!("{} file(s) queued", worklist.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    paths: Vec<PathBuf>,
    /// Identity key of every queued file, mapped to its index in `paths`.
    seen: HashMap<PathBuf, usize>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect images from `paths` and queue the ones not already queued.
    /// Returns how many were added.
    pub fn add_paths(&mut self, paths: &[PathBuf], config: &CollectorConfig) -> usize {
        collect_images(paths, config)
            .into_iter()
            .filter(|path| self.push(path.clone()))
            .count()
    }

    /// Queue a single path as-is. Returns `false` if the same file was already
    /// queued, under this or any other spelling of its path.
    pub fn push(&mut self, path: PathBuf) -> bool {
        let key = identity(&path);
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, self.paths.len());
        self.paths.push(path);
        true
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.seen.clear();
    }

    /// Point the entry for `old` at `new`, keeping its position.
    pub fn replace(&mut self, old: &Path, new: PathBuf) {
        let Some(index) = self.paths.iter().position(|p| p.as_path() == old) else {
            return;
        };
        self.seen.retain(|_, i| *i != index);
        self.seen.insert(identity(&new), index);
        self.paths[index] = new;
    }
}

/// Result of [`run_batch`].
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Applied files in queue order, with their final paths.
    pub report: BatchReport,
    /// Files skipped by the keyword guard.
    pub skipped: Vec<PathBuf>,
    /// Files that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Applied files that were renamed, as `(old, new)`.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Report files written to disk.
    pub report_paths: Vec<PathBuf>,
}

impl BatchSummary {
    /// Number of successfully processed files.
    pub fn processed(&self) -> usize {
        self.report.len()
    }
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively in file name order. Only files whose extension is in
/// `config.extensions` (case-insensitive) are kept. Duplicates are dropped,
/// keeping the first occurrence. Missing or unreadable paths are left out.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::config::CollectorConfig;
/// use exif_tagger::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(
///     &[
///         PathBuf::from("photo.jpg"),       // single file
///         PathBuf::from("./photos/"),        // entire directory
///     ],
///     &CollectorConfig::default(),
/// );
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf], config: &CollectorConfig) -> Vec<PathBuf> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();
    let mut keep = |path: PathBuf| {
        if seen.insert(identity(&path)) {
            images.push(path);
        }
    };

    for path in paths {
        if path.is_file() {
            if is_supported_image(path, &config.extensions) {
                keep(path.clone());
            } else {
                log::debug!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(config.follow_links)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p, &config.extensions) {
                    keep(p.to_path_buf());
                }
            }
        } else {
            log::debug!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// The key two paths to the same file share: the canonical path when it can
/// be resolved, otherwise the path as given.
fn identity(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Check if a file has an allowed image extension.
fn is_supported_image(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Apply `values` to a single file.
///
/// 1. **Guard**: if the file already carries `values.keyword`, skip it
/// 2. **Before**: capture the full snapshot
/// 3. **Write**: overwrite the target fields in place (after an optional backup)
/// 4. **After**: capture the snapshot again and diff
///
/// Every backend error, including unparseable tool output, ends processing of
/// this file only.
pub fn apply_values(
    backend: &dyn MetadataBackend,
    path: &Path,
    values: &TagValues,
    config: &Config,
) -> FileOutcome {
    let keyword = values.keyword.trim();
    if !keyword.is_empty() {
        match backend.read_keywords(path) {
            Ok(existing) if existing.iter().any(|k| k == keyword) => {
                log::info!("  Keyword {keyword:?} already present, skipping");
                return FileOutcome::Skipped;
            }
            Ok(_) => {}
            Err(e) => return FileOutcome::Failed(format!("Failed to read keywords: {e}")),
        }
    }

    let before = match backend.read_all(path) {
        Ok(snapshot) => snapshot,
        Err(e) => return FileOutcome::Failed(format!("Failed to read metadata: {e}")),
    };

    if config.output.backup_originals {
        if let Err(e) = backup_file(path) {
            log::warn!("Failed to backup {}: {e}", path.display());
        }
    }

    if let Err(e) = backend.write(path, values) {
        return FileOutcome::Failed(format!("Failed to write metadata: {e}"));
    }

    let after = match backend.read_all(path) {
        Ok(snapshot) => snapshot,
        Err(e) => return FileOutcome::Failed(format!("Failed to re-read metadata: {e}")),
    };

    FileOutcome::Applied(WorkItem::new(path.to_path_buf(), before, after))
}

/// Run one batch over `worklist`, strictly in order, on the calling thread.
///
/// Applied files are renamed after their capture timestamp (if enabled and
/// present) and collected into the report, which is then written as
/// configured. Skipped and failed files are listed in the summary only.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::config::{CollectorConfig, Config};
/// use exif_tagger::exif::{ExifToolBackend, TagValues};
/// use exif_tagger::pipeline::{run_batch, Worklist};
/// use std::path::PathBuf;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let mut worklist = Worklist::new();
/// worklist.add_paths(&[PathBuf::from("./photos")], &config.collector);
///
/// let values = TagValues { keyword: "beach".into(), ..Default::default() };
/// let backend = ExifToolBackend::from_config(&config.exiftool);
/// let summary = run_batch(&worklist, &values, &backend, &config)?;
/// println!("Processed {} images", summary.processed());
/// # Ok(())
/// # }
/// ```
pub fn run_batch(
    worklist: &Worklist,
    values: &TagValues,
    backend: &dyn MetadataBackend,
    config: &Config,
) -> Result<BatchSummary> {
    if worklist.is_empty() {
        anyhow::bail!("No files selected. Add one or more images to process.");
    }
    if values.is_blank() {
        anyhow::bail!("Nothing to write: subject, keyword, description and date/time are all empty.");
    }

    let mut summary = BatchSummary::default();
    let mut renamer = Renamer::new();
    let total = worklist.len();

    for (i, path) in worklist.paths().iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", i + 1, total, path.display());

        match apply_values(backend, path, values, config) {
            FileOutcome::Applied(mut item) => {
                log::info!("  {} tag(s) changed", item.diff.len());
                if config.rename.enabled {
                    if let Some(timestamp) = item.after.capture_timestamp() {
                        match renamer.rename(&item.path, &timestamp) {
                            Ok(new_path) => {
                                if new_path != item.path {
                                    log::info!("  Renamed to {}", new_path.display());
                                    summary.renamed.push((item.path.clone(), new_path.clone()));
                                }
                                item.path = new_path;
                            }
                            Err(e) => log::warn!("  {e:#}"),
                        }
                    }
                }
                summary.report.push(item);
            }
            FileOutcome::Skipped => summary.skipped.push(path.clone()),
            FileOutcome::Failed(reason) => {
                log::error!("  Error: {reason}");
                summary.failed.push((path.clone(), reason));
            }
        }
    }

    summary.report_paths = report::write_report(&summary.report, &config.report);

    log::info!(
        "Done: {} updated, {} skipped, {} failed out of {total} images",
        summary.processed(),
        summary.skipped.len(),
        summary.failed.len()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collector() -> CollectorConfig {
        CollectorConfig::default()
    }

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_image_extensions() {
        let exts = collector().extensions;
        assert!(is_supported_image(Path::new("photo.jpg"), &exts));
        assert!(is_supported_image(Path::new("photo.JPEG"), &exts));
        assert!(is_supported_image(Path::new("photo.png"), &exts));
        assert!(is_supported_image(Path::new("photo.Gif"), &exts));
        assert!(is_supported_image(Path::new("photo.bmp"), &exts));
    }

    #[test]
    fn unsupported_image_extensions() {
        let exts = collector().extensions;
        assert!(!is_supported_image(Path::new("photo.heic"), &exts));
        assert!(!is_supported_image(Path::new("doc.pdf"), &exts));
        assert!(!is_supported_image(Path::new("photo.jpg.bak"), &exts));
        assert!(!is_supported_image(Path::new("noext"), &exts));
    }

    #[test]
    fn custom_extension_list() {
        let exts = vec!["heic".to_string()];
        assert!(is_supported_image(Path::new("photo.HEIC"), &exts));
        assert!(!is_supported_image(Path::new("photo.jpg"), &exts));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()], &collector());
        assert_eq!(images, [jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        assert!(collect_images(&[txt], &collector()).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        let deeper = sub.join("deeper");
        fs::create_dir_all(&deeper).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(dir.path().join("notes.txt"), b"fake").unwrap();
        fs::write(sub.join("b.PNG"), b"fake").unwrap();
        fs::write(sub.join("c.heic"), b"fake").unwrap();
        fs::write(deeper.join("d.gif"), b"fake").unwrap();
        fs::write(deeper.join("e.bmp"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()], &collector());
        assert_eq!(
            images,
            [
                dir.path().join("a.jpg"),
                sub.join("b.PNG"),
                deeper.join("d.gif"),
                deeper.join("e.bmp"),
            ]
        );
    }

    #[test]
    fn collect_images_deduplicates_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"fake").unwrap();
        fs::write(&b, b"fake").unwrap();

        let images = collect_images(
            &[b.clone(), dir.path().to_path_buf(), a.clone(), b.clone()],
            &collector(),
        );
        assert_eq!(images, [b, a]);
    }

    #[test]
    fn collect_images_same_file_through_dot_segments() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let a = sub.join("a.jpg");
        fs::write(&a, b"fake").unwrap();

        let images = collect_images(
            &[
                sub.clone(),
                sub.join(".").join("a.jpg"),
                sub.join("..").join("sub").join("a.jpg"),
            ],
            &collector(),
        );
        assert_eq!(images, [a]);
    }

    #[cfg(unix)]
    #[test]
    fn collect_images_same_file_through_symlinked_dir() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.jpg"), b"fake").unwrap();
        std::os::unix::fs::symlink(&sub, dir.path().join("link")).unwrap();

        let images = collect_images(&[dir.path().to_path_buf()], &collector());
        assert_eq!(images, [dir.path().join("link").join("a.jpg")]);
    }

    #[test]
    fn collect_images_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_images(&[dir.path().to_path_buf()], &collector()).is_empty());
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")], &collector());
        assert!(images.is_empty());
    }

    // ── Worklist ─────────────────────────────────────────────────────

    #[test]
    fn worklist_keeps_order_across_adds() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"fake").unwrap();
        fs::write(&b, b"fake").unwrap();

        let mut worklist = Worklist::new();
        assert_eq!(worklist.add_paths(&[b.clone()], &collector()), 1);
        assert_eq!(worklist.add_paths(&[dir.path().to_path_buf()], &collector()), 1);
        assert_eq!(worklist.paths(), [b.clone(), a.clone()]);

        worklist.replace(&a, dir.path().join("renamed.jpg"));
        assert_eq!(worklist.paths()[1], dir.path().join("renamed.jpg"));
        assert!(!worklist.push(dir.path().join("renamed.jpg")));
        assert!(worklist.push(a));

        worklist.clear();
        assert!(worklist.is_empty());
    }

    #[test]
    fn worklist_ignores_other_spellings_of_queued_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let a = sub.join("a.jpg");
        fs::write(&a, b"fake").unwrap();

        let mut worklist = Worklist::new();
        let added = worklist.add_paths(
            &[
                sub.clone(),
                sub.join(".").join("a.jpg"),
                sub.join("..").join("sub").join("a.jpg"),
            ],
            &collector(),
        );
        assert_eq!(added, 1);
        assert!(!worklist.push(sub.join("..").join("sub").join("a.jpg")));
        assert_eq!(worklist.paths(), [a]);
    }

    // ── backup_file ──────────────────────────────────────────────────

    #[test]
    fn backup_keeps_first_copy() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"original").unwrap();

        let backup = backup_file(&jpg).unwrap();
        assert_eq!(backup, dir.path().join("photo.jpg.bak"));

        fs::write(&jpg, b"modified").unwrap();
        backup_file(&jpg).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"original");
    }
}
