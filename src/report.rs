//! Before/after metadata reports.

use anyhow::{Context, Result};
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ReportConfig, ReportLayout};
use crate::exif::{MetaDiff, Snapshot};

/// The per-file unit of a batch run: where the file ended up and what changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "file_path")]
    pub path: PathBuf,
    pub before: Snapshot,
    pub after: Snapshot,
    #[serde(rename = "metaDiff")]
    pub diff: MetaDiff,
}

impl WorkItem {
    /// Build a finished work item from two complete snapshots of `path`.
    pub fn new(path: PathBuf, before: Snapshot, after: Snapshot) -> Self {
        let diff = before.diff(&after);
        Self {
            path,
            before,
            after,
            diff,
        }
    }
}

/// Ordered work items of one run, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchReport {
    entries: Vec<WorkItem>,
}

impl BatchReport {
    pub fn push(&mut self, item: WorkItem) {
        self.entries.push(item);
    }

    pub fn entries(&self) -> &[WorkItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }
}

/// Write `report` to disk as configured. Returns the files written.
///
/// Best-effort: every failure is logged and skipped. Nothing is written for an
/// empty report.
pub fn write_report(report: &BatchReport, config: &ReportConfig) -> Vec<PathBuf> {
    if !config.enabled || report.is_empty() {
        return Vec::new();
    }

    let mut written = Vec::new();
    match config.layout {
        ReportLayout::Batch => {
            let dir = config
                .directory
                .clone()
                .or_else(|| {
                    report
                        .entries
                        .first()
                        .and_then(|item| item.path.parent())
                        .map(Path::to_path_buf)
                })
                .unwrap_or_default();
            let path = dir.join(render_file_name(&config.file_name));
            match write_json(&path, report) {
                Ok(()) => written.push(path),
                Err(e) => log::error!("{e:#}"),
            }
        }
        ReportLayout::PerFile => {
            for item in &report.entries {
                let path = per_file_report_path(&item.path);
                match write_json(&path, item) {
                    Ok(()) => written.push(path),
                    Err(e) => log::error!("{e:#}"),
                }
            }
        }
    }
    written
}

/// `<file name>.json` next to the image, so `a.jpg` and `a.png` never share a report.
fn per_file_report_path(image: &Path) -> PathBuf {
    let mut name = image.file_name().unwrap_or_default().to_os_string();
    name.push(".json");
    image.with_file_name(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to save metadata to {}", path.display()))?;
    log::info!("Metadata saved to {}", path.display());
    Ok(())
}

/// Expand strftime specifiers in `template` with the local time. A template
/// chrono cannot parse is used as-is.
fn render_file_name(template: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        log::warn!("Invalid report file name template {template:?}, using it literally");
        return template.to_string();
    }
    Local::now().format_with_items(items.into_iter()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(pairs: &[(&str, Value)]) -> Snapshot {
        Snapshot::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn item(path: PathBuf) -> WorkItem {
        WorkItem::new(
            path,
            snapshot(&[("IPTC:Keywords", json!("sea"))]),
            snapshot(&[("IPTC:Keywords", json!(["sea", "beach"]))]),
        )
    }

    fn config(dir: &Path, layout: ReportLayout) -> ReportConfig {
        ReportConfig {
            enabled: true,
            layout,
            file_name: "report.json".into(),
            directory: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn work_item_field_names() {
        let value = serde_json::to_value(item(PathBuf::from("a.jpg"))).unwrap();
        let obj = value.as_object().unwrap();
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        for key in ["file_path", "before", "after", "metaDiff"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(
            value["metaDiff"]["IPTC:Keywords"],
            json!({"before": "sea", "after": ["sea", "beach"]})
        );
    }

    #[test]
    fn batch_layout_writes_one_array() {
        let dir = TempDir::new().unwrap();
        let mut report = BatchReport::default();
        report.push(item(dir.path().join("a.jpg")));
        report.push(item(dir.path().join("b.jpg")));

        let written = write_report(&report, &config(dir.path(), ReportLayout::Batch));
        assert_eq!(written, [dir.path().join("report.json")]);

        let parsed: Vec<WorkItem> =
            serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(parsed, report.entries());
    }

    #[test]
    fn batch_layout_defaults_to_first_item_directory() {
        let dir = TempDir::new().unwrap();
        let mut report = BatchReport::default();
        report.push(item(dir.path().join("a.jpg")));

        let mut cfg = config(dir.path(), ReportLayout::Batch);
        cfg.directory = None;
        let written = write_report(&report, &cfg);
        assert_eq!(written, [dir.path().join("report.json")]);
    }

    #[test]
    fn per_file_layout_writes_next_to_images() {
        let dir = TempDir::new().unwrap();
        let mut report = BatchReport::default();
        report.push(item(dir.path().join("2024-01-01 10-00-00.jpg")));
        report.push(item(dir.path().join("b.png")));

        let written = write_report(&report, &config(dir.path(), ReportLayout::PerFile));
        assert_eq!(
            written,
            [
                dir.path().join("2024-01-01 10-00-00.jpg.json"),
                dir.path().join("b.png.json"),
            ]
        );
        let parsed: WorkItem =
            serde_json::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(parsed.path, dir.path().join("b.png"));
    }

    #[test]
    fn per_file_reports_keep_same_stem_apart() {
        let dir = TempDir::new().unwrap();
        let mut report = BatchReport::default();
        report.push(item(dir.path().join("a.jpg")));
        report.push(item(dir.path().join("a.png")));

        let written = write_report(&report, &config(dir.path(), ReportLayout::PerFile));
        assert_eq!(
            written,
            [dir.path().join("a.jpg.json"), dir.path().join("a.png.json")]
        );
        for (path, image) in written.iter().zip(["a.jpg", "a.png"]) {
            let parsed: WorkItem = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(parsed.path, dir.path().join(image));
        }
    }

    #[test]
    fn empty_or_disabled_report_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let empty = BatchReport::default();
        assert!(write_report(&empty, &config(dir.path(), ReportLayout::Batch)).is_empty());

        let mut report = BatchReport::default();
        report.push(item(dir.path().join("a.jpg")));
        let mut cfg = config(dir.path(), ReportLayout::Batch);
        cfg.enabled = false;
        assert!(write_report(&report, &cfg).is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut report = BatchReport::default();
        report.push(item(dir.path().join("a.jpg")));

        let cfg = config(&dir.path().join("missing").join("nested"), ReportLayout::Batch);
        assert!(write_report(&report, &cfg).is_empty());
    }

    #[test]
    fn file_name_template() {
        assert_eq!(render_file_name("report.json"), "report.json");
        let rendered = render_file_name("tagger-report-%Y.json");
        assert!(rendered.starts_with("tagger-report-2"));
        assert!(rendered.ends_with(".json"));
        assert_eq!(render_file_name("report-100%"), "report-100%");
    }
}
