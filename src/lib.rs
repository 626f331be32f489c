//! # exif-tagger
//!
//! Bulk image tagger: write a hierarchical subject, a keyword, a description and
//! a capture date/time into many images at once through `exiftool`, record a
//! before/after snapshot of every file, and rename updated files after their
//! capture timestamp.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_tagger::config::Config;
//! use exif_tagger::exif::{ExifToolBackend, TagValues};
//! use exif_tagger::pipeline::{run_batch, Worklist};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     // Queue images from files and directories (recursively)
//!     let mut worklist = Worklist::new();
//!     worklist.add_paths(&[PathBuf::from("./photos")], &config.collector);
//!
//!     let values = TagValues {
//!         hierarchical_subject: "Places/Beach".into(),
//!         keyword: "beach".into(),
//!         description: "Summer holiday".into(),
//!         date_time_original: "2023-05-01 12:30:45.500".into(),
//!     };
//!
//!     let backend = ExifToolBackend::from_config(&config.exiftool);
//!     let summary = run_batch(&worklist, &values, &backend, &config)?;
//!
//!     println!("Processed {} images", summary.processed());
//!     for path in &summary.report_paths {
//!         println!("Report: {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Per-file flow
//!
//! | Step | Effect |
//! |------|--------|
//! | Keyword guard | File already has the keyword → skipped, nothing written |
//! | Before snapshot | All XMP + IPTC tags and the capture time |
//! | Write | Subject, description, capture time replaced; keyword appended |
//! | After snapshot | Same tags again, diffed against the before snapshot |
//! | Rename | `2023-05-01 12-30-45(500).jpg`, ` (1)`, ` (2)` on collision |
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`exif`] — Metadata backend trait, exiftool implementation, snapshots and diffs
//! - [`pipeline`] — File collection, worklist, per-file apply and the batch loop
//! - [`rename`] — Capture-timestamp renaming with collision suffixes
//! - [`report`] — Work items and the JSON report writer

pub mod config;
pub mod exif;
pub mod pipeline;
pub mod rename;
pub mod report;
