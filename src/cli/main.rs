use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exif_tagger::config::{self, ReportLayout};
use exif_tagger::exif::{ExifToolBackend, MetadataBackend, Snapshot, TagValues};
use exif_tagger::pipeline::{self, Worklist};

#[derive(Parser, Debug)]
#[command(
    name = "exif-tagger",
    version,
    about = "Bulk image tagger: write subject, keyword, description and capture date with exiftool"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Hierarchical subject, e.g. "Places/Beach"
    #[arg(long, value_name = "SUBJECT", default_value = "")]
    subject: String,

    /// Keyword to add; files that already have it are skipped
    #[arg(long, value_name = "KEYWORD", default_value = "")]
    keyword: String,

    /// Description
    #[arg(long, value_name = "TEXT", default_value = "")]
    description: String,

    /// Capture date/time, e.g. "2023:05:01 12:30:45" or "2023-05-01 12:30:45.500"
    #[arg(long = "date-time", value_name = "DATETIME", default_value = "")]
    date_time: String,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Keep file names, even when a capture time is present
    #[arg(long)]
    no_rename: bool,

    /// Write one <image>.json (e.g. a.jpg.json) next to every image instead of a batch report
    #[arg(long)]
    per_file_report: bool,

    /// Display the metadata snapshot of every image and exit
    #[arg(long)]
    show: bool,

    /// Print the batch report as JSON after the run
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    // Load config and apply CLI overrides
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.no_rename {
        config.rename.enabled = false;
    }
    if cli.per_file_report {
        config.report.layout = ReportLayout::PerFile;
    }

    let mut worklist = Worklist::new();
    worklist.add_paths(&cli.paths, &config.collector);
    if worklist.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    let backend = ExifToolBackend::from_config(&config.exiftool);

    // Handle --show
    if cli.show {
        for path in worklist.paths() {
            match backend.read_all(path) {
                Ok(snapshot) => print_snapshot(path, &snapshot),
                Err(e) => log::error!("{}: {e}", path.display()),
            }
        }
        return Ok(());
    }

    let values = TagValues {
        hierarchical_subject: cli.subject,
        keyword: cli.keyword,
        description: cli.description,
        date_time_original: cli.date_time,
    };

    log::info!("Found {} image(s) to process", worklist.len());

    let summary = pipeline::run_batch(&worklist, &values, &backend, &config)?;

    for (path, reason) in &summary.failed {
        log::warn!("Failed: {} ({reason})", path.display());
    }
    for path in &summary.report_paths {
        log::info!("Report: {}", path.display());
    }

    if cli.json {
        println!("{}", summary.report.to_json()?);
    }

    println!("Processed {} images", summary.processed());
    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 35 chars + 2 leading spaces).
const INDENT: &str = "                                     ";

/// Print every tag of a snapshot, one row per tag.
fn print_snapshot(path: &std::path::Path, snapshot: &Snapshot) {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if snapshot.is_empty() {
        println!("  {DIM}(no XMP/IPTC metadata or capture time found){RESET}");
        println!();
        return;
    }

    for (tag, value) in snapshot.tags() {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        print_row(tag, &text);
    }

    if let Some(ts) = snapshot.capture_timestamp() {
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        print_row("Rename target", &format!("{}.<ext>", ts.file_stem()));
    }
    println!();
}

/// Print a single row in the tag table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<32}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
