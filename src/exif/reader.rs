use serde_json::{Map, Value};
use std::path::Path;

use super::BackendError;
use super::snapshot::Snapshot;

/// Tag selection for a full snapshot: every XMP and IPTC tag plus the capture time.
pub(super) const READ_ALL_ARGS: &[&str] = &[
    "-j",
    "-G",
    "-xmp:all",
    "-iptc:all",
    "-DateTimeOriginal",
    "-SubSecDateTimeOriginal",
];

/// Tag selection for the keyword list only.
pub(super) const READ_KEYWORDS_ARGS: &[&str] = &["-j", "-G", "-Keywords"];

/// Bookkeeping key exiftool adds to every JSON object; not a tag.
const SOURCE_FILE_KEY: &str = "SourceFile";

/// Parse the JSON printed by `exiftool -j` for a single file.
///
/// exiftool prints an array with one object per file. An empty array (or no
/// output at all) yields an empty snapshot.
pub fn parse_snapshot(path: &Path, stdout: &[u8]) -> Result<Snapshot, BackendError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        log::debug!("No metadata output for {}", path.display());
        return Ok(Snapshot::default());
    }

    let objects: Vec<Map<String, Value>> =
        serde_json::from_slice(stdout).map_err(|source| BackendError::MalformedOutput {
            path: path.to_path_buf(),
            source,
        })?;

    let tags = objects
        .into_iter()
        .next()
        .map(|object| {
            object
                .into_iter()
                .filter(|(key, _)| key != SOURCE_FILE_KEY)
                .collect()
        })
        .unwrap_or_default();

    Ok(Snapshot::new(tags))
}

/// Collect keywords from every `*:Keywords` tag in a snapshot.
///
/// exiftool prints a single keyword as a plain string and several as an array.
/// Numeric keywords come back as JSON numbers. Order is kept, duplicates dropped.
pub fn keywords_from(snapshot: &Snapshot) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    let values = snapshot
        .tags()
        .iter()
        .filter(|(key, _)| key.rsplit(':').next() == Some("Keywords"))
        .map(|(_, value)| value);

    for value in values {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for item in items {
            let keyword = match item {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
    }

    keywords
}
