//! Batch pipeline that renames photos by capture time
//!
//! Handles the core logic of:
//! - Walking the source directory tree
//! - Filtering by extension
//! - Extracting capture timestamps
//! - Copying (and optionally removing) files into the destination directory

use crate::config::Config;
use crate::error::{Error, Result};
use crate::time::{ExifReader, TimestampReader};
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Destination file name format, e.g. `2023-05-01_10.00.00`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

/// Counters for a single run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunCounters {
    /// Every visited non-directory entry
    pub total: usize,
    /// Files relocated successfully
    pub processed: usize,
    /// Files filtered out, without a usable timestamp, or failed
    pub skipped: usize,
    /// Bytes written to the destination
    pub bytes_copied: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} file(s) processed, {} file(s) skipped ({} files in total), {} copied",
            self.processed,
            self.skipped,
            self.total,
            format_size(self.bytes_copied)
        )
    }
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// File was copied (and removed, if requested)
    Processed,
    /// Dry run - would have processed
    DryRun,
    /// Extension is not one of the supported image types
    Unsupported,
    /// Metadata decoded but had no capture timestamp
    NoTimestamp,
    /// Metadata could not be decoded
    DecodeFailed,
    /// Copy or removal failed
    Failed,
}

impl ProcessingStatus {
    /// Whether the file counts towards `processed`
    pub fn is_processed(&self) -> bool {
        matches!(self, ProcessingStatus::Processed | ProcessingStatus::DryRun)
    }
}

/// One file under consideration
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Source file path
    pub source: PathBuf,
    /// Lowercase extension including the leading dot, empty if none
    pub extension: String,
    /// Extracted capture timestamp
    pub timestamp: Option<NaiveDateTime>,
    /// Computed destination path
    pub destination: Option<PathBuf>,
}

impl FileTask {
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            extension: file_extension(source),
            timestamp: None,
            destination: None,
        }
    }

    fn into_result(self, status: ProcessingStatus, error: Option<String>) -> FileResult {
        FileResult {
            source: self.source,
            destination: self.destination,
            timestamp: self.timestamp,
            status,
            bytes: 0,
            error,
        }
    }
}

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Destination file path (if one was computed)
    pub destination: Option<PathBuf>,
    /// Extracted capture timestamp
    pub timestamp: Option<NaiveDateTime>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Bytes copied
    pub bytes: u64,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub counters: RunCounters,
    pub results: Vec<FileResult>,
}

/// Main processor for renaming photos
pub struct Processor<R = ExifReader> {
    config: Config,
    reader: R,
}

impl Processor<ExifReader> {
    /// Create a new processor reading timestamps from EXIF metadata
    pub fn new(config: Config) -> Self {
        Self::with_reader(config, ExifReader::new())
    }
}

impl<R: TimestampReader> Processor<R> {
    /// Create a processor with a custom timestamp source
    pub fn with_reader(config: Config, reader: R) -> Self {
        Self { config, reader }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the processing pipeline.
    ///
    /// Traversal errors abort the run; every per-file failure is logged and
    /// counted as skipped.
    pub fn run(&self) -> Result<RunReport> {
        let _span = span!(Level::INFO, "processor_run").entered();

        // The destination may live inside the source tree; never walk into it.
        // It is created lazily by the first copy, so it is resolved per directory.
        let excluded = self.config.destination_dir.as_path();

        let mut report = RunReport::default();
        let walker = WalkDir::new(&self.config.source_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e, excluded));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }

            debug!(path = %entry.path().display(), "reading");
            let result = self.process_file(entry.path(), &mut report.counters);
            report.results.push(result);
        }

        info!("{}", report.counters.summary());
        Ok(report)
    }

    /// Process one file, updating `counters`
    pub fn process_file(&self, path: &Path, counters: &mut RunCounters) -> FileResult {
        counters.total += 1;
        let result = self.process_task(FileTask::new(path));

        if result.status.is_processed() {
            counters.processed += 1;
            counters.bytes_copied += result.bytes;
        } else {
            counters.skipped += 1;
        }
        result
    }

    fn process_task(&self, mut task: FileTask) -> FileResult {
        let path = task.source.clone();

        if !self.config.is_supported(&task.extension) {
            info!(path = %path.display(), "skipped because it has a non-valid extension");
            return task.into_result(ProcessingStatus::Unsupported, None);
        }

        debug!(path = %path.display(), "processing");

        let timestamp = match self.reader.capture_time(&path) {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => {
                warn!(path = %path.display(), "metadata does not have a valid timestamp");
                return task.into_result(ProcessingStatus::NoTimestamp, None);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read metadata, skipping");
                return task.into_result(ProcessingStatus::DecodeFailed, Some(e.to_string()));
            }
        };
        task.timestamp = Some(timestamp);

        let destination =
            build_destination_path(&self.config.destination_dir, &timestamp, &task.extension);
        task.destination = Some(destination.clone());

        if self.config.dry_run {
            info!(
                source = %path.display(),
                destination = %destination.display(),
                "Would process file"
            );
            return task.into_result(ProcessingStatus::DryRun, None);
        }

        match self.relocate(&path, &destination) {
            Ok(bytes) => {
                info!(
                    source = %path.display(),
                    destination = %destination.display(),
                    %timestamp,
                    "Processed file"
                );
                let mut result = task.into_result(ProcessingStatus::Processed, None);
                result.bytes = bytes;
                result
            }
            Err(e) => {
                error!(
                    source = %path.display(),
                    destination = %destination.display(),
                    error = %e,
                    "Failed to process file"
                );
                task.into_result(ProcessingStatus::Failed, Some(e.to_string()))
            }
        }
    }

    /// Copy `source` to `destination`, then remove the source if configured
    fn relocate(&self, source: &Path, destination: &Path) -> Result<u64> {
        fs::create_dir_all(&self.config.destination_dir)?;

        if destination.exists() {
            if is_same_file(source, destination) {
                return Err(Error::SameFile {
                    path: destination.to_path_buf(),
                });
            }
            if self.config.protects_existing() {
                return Err(Error::DestinationExists {
                    path: destination.to_path_buf(),
                });
            }
            debug!(destination = %destination.display(), "Overwriting existing file");
        }

        let bytes = copy_file(source, destination)?;
        debug!(
            destination = %destination.display(),
            bytes,
            size = %format_size(bytes),
            "copied"
        );

        if self.config.remove_originals {
            fs::remove_file(source)?;
            info!(path = %source.display(), "deleted");
        }

        Ok(bytes)
    }
}

/// Format the destination file name for a capture timestamp
pub fn destination_file_name(timestamp: &NaiveDateTime, extension: &str) -> String {
    format!(
        "{}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        extension.to_lowercase()
    )
}

/// Join the destination directory with the formatted file name
pub fn build_destination_path(
    destination_dir: &Path,
    timestamp: &NaiveDateTime,
    extension: &str,
) -> PathBuf {
    destination_dir.join(destination_file_name(timestamp, extension))
}

/// Copy file with buffered I/O.
///
/// The bytes go to a hidden temporary file next to `dest` which is renamed
/// into place once complete, so a failed copy never leaves a partial `dest`.
/// The source modification time is preserved.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    let file_name = dest.file_name().ok_or_else(|| Error::InvalidFilename {
        path: dest.to_path_buf(),
    })?;
    let temp = dest.with_file_name(format!(".{}.part", file_name.to_string_lossy()));

    let bytes = match write_copy(source, &temp) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&temp, dest) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    // Preserve modification time
    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
    {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }

    Ok(bytes)
}

fn write_copy(source: &Path, dest: &Path) -> Result<u64> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let bytes = std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}

/// Render a byte count with 1024-based units and one decimal place
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

    let mut value = bytes as f64;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}YiB", value)
}

/// Lowercase extension with its leading dot, taken from the last `.` of the
/// file name. A dotfile such as `.JPG` has the extension `.jpg`.
fn file_extension(path: &Path) -> String {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return String::new();
    };
    name.rfind('.')
        .map(|i| name[i..].to_lowercase())
        .unwrap_or_default()
}

fn is_excluded_dir(entry: &walkdir::DirEntry, excluded: &Path) -> bool {
    // The root is never pruned, otherwise nothing would be walked
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let Ok(excluded) = fs::canonicalize(excluded) else {
        return false;
    };
    let skip = fs::canonicalize(entry.path()).is_ok_and(|p| p == excluded);
    if skip {
        debug!(path = %entry.path().display(), "Excluding destination directory from traversal");
    }
    skip
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
