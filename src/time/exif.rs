//! EXIF capture time extraction for JPEG and HEIC images

use super::TimestampReader;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Reads `DateTimeOriginal` through kamadak-exif.
///
/// `read_from_container` sniffs the container format, so the same reader
/// covers JPEG and HEIF/HEIC files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifReader;

impl ExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl TimestampReader for ExifReader {
    fn capture_time(&self, path: &Path) -> Result<Option<NaiveDateTime>> {
        extract_exif_time(path)
    }
}

/// Extract the original capture time from EXIF metadata
pub fn extract_exif_time(path: &Path) -> Result<Option<NaiveDateTime>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        // The container is valid but has no EXIF block
        Err(exif::Error::NotFound(_)) => {
            trace!(?path, "No EXIF data in container");
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::MetadataDecode {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        return Ok(None);
    };

    let datetime = parse_exif_datetime(&field.display_value().to_string());
    trace!(?path, ?datetime, "Found DateTimeOriginal");
    Ok(datetime)
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
///
/// All-zero and blank dates fail to parse and yield `None`.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // kamadak-exif renders DateTime tags as "2024-01-15 14:30:00", raw values
    // come through as "2024:01:15 14:30:00", possibly quoted
    let s = s.trim().trim_matches('"');

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}
