use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use super::reader::{READ_ALL_ARGS, READ_KEYWORDS_ARGS, keywords_from, parse_snapshot};
use super::snapshot::Snapshot;
use super::writer::write_args;
use super::{BackendError, MetadataBackend, TagValues};
use crate::config::ExifToolConfig;

/// [`MetadataBackend`] that runs one blocking `exiftool` process per call.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tagger::exif::{ExifToolBackend, MetadataBackend};
/// use std::path::Path;
///
/// let backend = ExifToolBackend::new("exiftool");
/// let snapshot = backend.read_all(Path::new("photo.jpg")).unwrap();
/// println!("{} tags", snapshot.len());
/// ```
#[derive(Debug, Clone)]
pub struct ExifToolBackend {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl ExifToolBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ExifToolConfig) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            extra_args: config.extra_args.clone(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// `args`, the configured extra arguments, then `--` and `path`, so a file
    /// name starting with `-` is never read as an option.
    fn argv<S: AsRef<str>>(&self, args: &[S], path: &Path) -> Vec<OsString> {
        let mut argv: Vec<OsString> = args.iter().map(|a| a.as_ref().into()).collect();
        argv.extend(self.extra_args.iter().map(OsString::from));
        argv.push("--".into());
        argv.push(path.as_os_str().to_os_string());
        argv
    }

    /// Run exiftool with `args` followed by `path` and return stdout.
    fn run<S: AsRef<str>>(&self, args: &[S], path: &Path) -> Result<Vec<u8>, BackendError> {
        let argv = self.argv(args, path);

        log::debug!("exiftool {:?}", argv);

        let output: Output = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| BackendError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(BackendError::ToolFailed {
                program: self.program_name(),
                path: path.to_path_buf(),
                status: output.status,
                stderr,
            });
        }

        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::warn!("exiftool: {line}");
        }

        Ok(output.stdout)
    }
}

impl Default for ExifToolBackend {
    fn default() -> Self {
        Self::from_config(&ExifToolConfig::default())
    }
}

impl MetadataBackend for ExifToolBackend {
    fn read_all(&self, path: &Path) -> Result<Snapshot, BackendError> {
        let stdout = self.run(READ_ALL_ARGS, path)?;
        parse_snapshot(path, &stdout)
    }

    fn read_keywords(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let stdout = self.run(READ_KEYWORDS_ARGS, path)?;
        let snapshot = parse_snapshot(path, &stdout)?;
        Ok(keywords_from(&snapshot))
    }

    fn write(&self, path: &Path, values: &TagValues) -> Result<(), BackendError> {
        let stdout = self.run(&write_args(values), path)?;
        log::debug!("exiftool: {}", String::from_utf8_lossy(&stdout).trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let backend = ExifToolBackend::new("/nonexistent/bin/exiftool-missing");
        let err = backend.read_all(Path::new("photo.jpg")).unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
        assert!(err.to_string().contains("exiftool-missing"));
    }

    #[test]
    fn default_uses_exiftool_on_path() {
        let backend = ExifToolBackend::default();
        assert_eq!(backend.program, PathBuf::from("exiftool"));
        assert!(backend.extra_args.is_empty());
    }

    #[test]
    fn extra_args_from_config() {
        let config = ExifToolConfig {
            program: "/opt/exiftool/exiftool".into(),
            extra_args: vec!["-charset".into(), "filename=utf8".into()],
        };
        let backend = ExifToolBackend::from_config(&config);
        assert_eq!(backend.program, PathBuf::from("/opt/exiftool/exiftool"));
        assert_eq!(backend.extra_args, ["-charset", "filename=utf8"]);
    }

    #[test]
    fn path_follows_end_of_options() {
        let config = ExifToolConfig {
            program: "exiftool".into(),
            extra_args: vec!["-charset".into(), "filename=utf8".into()],
        };
        let backend = ExifToolBackend::from_config(&config);
        let argv = backend.argv(&["-j", "-G"], Path::new("-dash.jpg"));
        assert_eq!(
            argv,
            ["-j", "-G", "-charset", "filename=utf8", "--", "-dash.jpg"]
                .map(OsString::from)
        );
    }
}
