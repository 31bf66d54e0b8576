//! photo-chrono - rename photos by their original capture time
//!
//! This library provides the pieces of a small batch pipeline:
//! - Recursive traversal of a source directory
//! - HEIC/JPEG extension filtering
//! - EXIF `DateTimeOriginal` extraction
//! - Copying to `YYYY-MM-DD_HH.MM.SS.<ext>` with overwrite protection
//! - An optional read-only HTTP server (with mutual TLS) for the result

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod serve;
pub mod time;

pub use cli::Cli;
pub use config::{Config, ConflictPolicy, ServeConfig, TlsConfig};
pub use error::{Error, Result};
pub use process::{FileResult, ProcessingStatus, Processor, RunCounters, RunReport, format_size};
pub use time::{ExifReader, TimestampReader};
