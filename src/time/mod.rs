//! Capture time extraction
//!
//! The pipeline only needs one fact from an image's metadata: the original
//! capture timestamp. [`TimestampReader`] is the seam between the pipeline
//! and the metadata decoder so the decoder can be swapped out in tests.

pub mod exif;

use crate::error::Result;
use chrono::NaiveDateTime;
use std::path::Path;

pub use self::exif::ExifReader;

/// Source of original capture timestamps
pub trait TimestampReader {
    /// Read the capture timestamp of `path`.
    ///
    /// Returns `Ok(None)` when the file decodes but carries no usable
    /// timestamp, and an error when the file cannot be decoded at all.
    fn capture_time(&self, path: &Path) -> Result<Option<NaiveDateTime>>;
}

impl<T: TimestampReader + ?Sized> TimestampReader for &T {
    fn capture_time(&self, path: &Path) -> Result<Option<NaiveDateTime>> {
        (**self).capture_time(path)
    }
}
