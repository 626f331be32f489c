use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the exif-tagger library.
///
/// Controls how exiftool is invoked, which files are collected, whether files
/// are renamed, and how the batch report is written.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_tagger::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.exiftool.program = "/usr/local/bin/exiftool".into();
/// config.rename.enabled = false;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the external metadata tool is invoked.
    pub exiftool: ExifToolConfig,
    /// Which files are picked up from dropped paths and directories.
    pub collector: CollectorConfig,
    /// Renaming by capture timestamp.
    pub rename: RenameConfig,
    /// Where and how the before/after report is written.
    pub report: ReportConfig,
    /// Output behavior (backups).
    pub output: OutputConfig,
}

/// exiftool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifToolConfig {
    /// Program name or path.
    pub program: String,
    /// Extra arguments passed on every call, before the file path.
    pub extra_args: Vec<String>,
}

/// File collection from dropped paths or a chosen directory.
///
/// # Example
///
/// ```rust
/// use exif_tagger::config::CollectorConfig;
///
/// let collector = CollectorConfig::default();
/// assert!(collector.extensions.iter().any(|e| e == "jpg"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Allowed extensions without the dot, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Follow symlinks while walking directories.
    pub follow_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Rename updated files to `<date> <time>[(<fraction>)]<ext>`.
    pub enabled: bool,
}

/// Report layout on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// One JSON array for the whole run.
    Batch,
    /// One `<file name>.json` (`a.jpg.json`) next to every updated image.
    PerFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// If `false`, no report is written at all.
    pub enabled: bool,
    pub layout: ReportLayout,
    /// strftime template for the batch report file name.
    pub file_name: String,
    /// Directory for the batch report. Defaults to the first updated image's directory.
    pub directory: Option<PathBuf>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, copy an image to `<name>.<ext>.bak` before modifying it.
    pub backup_originals: bool,
}

impl Default for ExifToolConfig {
    fn default() -> Self {
        Self {
            program: "exiftool".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "gif", "bmp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            follow_links: true,
        }
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layout: ReportLayout::Batch,
            file_name: "tagger-report-%Y%m%d-%H%M%S.json".to_string(),
            directory: None,
        }
    }
}

impl Config {
    /// Resolve the config file path (next to the executable).
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.exiftool.program, "exiftool");
        assert_eq!(config.collector.extensions, ["jpg", "jpeg", "png", "gif", "bmp"]);
        assert!(config.collector.follow_links);
        assert!(config.rename.enabled);
        assert!(config.report.enabled);
        assert_eq!(config.report.layout, ReportLayout::Batch);
        assert!(!config.output.backup_originals);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.rename.enabled = false;
        config.report.layout = ReportLayout::PerFile;
        config.exiftool.extra_args = vec!["-charset".into(), "filename=utf8".into()];
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert!(!loaded.rename.enabled);
        assert_eq!(loaded.report.layout, ReportLayout::PerFile);
        assert_eq!(loaded.exiftool.extra_args, ["-charset", "filename=utf8"]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert!(config.rename.enabled);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"report": {"layout": "per_file"}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.report.layout, ReportLayout::PerFile);
        assert!(config.report.enabled);
        assert_eq!(config.exiftool.program, "exiftool");
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
