//! Error types for photo-chrono

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo-chrono operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for photo-chrono
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Failed to decode metadata of {path}: {message}")]
    MetadataDecode { path: PathBuf, message: String },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Source and destination are the same file: {path}")]
    SameFile { path: PathBuf },

    #[error("Invalid file name: {path}")]
    InvalidFilename { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TLS setup error: {0}")]
    Tls(String),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::WalkDir(_) | Error::Config(_) | Error::Tls(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_file_errors_are_recoverable() {
        let decode = Error::MetadataDecode {
            path: PathBuf::from("bad.heic"),
            message: "Unknown image format".into(),
        };
        assert!(!decode.is_fatal());
        assert!(decode.to_string().contains("bad.heic"));

        let exists = Error::DestinationExists {
            path: PathBuf::from("out/2023-05-01_10.00.00.jpg"),
        };
        assert!(!exists.is_fatal());
        assert_eq!(
            exists.to_string(),
            "Destination already exists: out/2023-05-01_10.00.00.jpg"
        );

        let io = Error::from(std::io::Error::other("disk full"));
        assert!(!io.is_fatal());
    }

    #[test]
    fn test_config_error_is_fatal() {
        assert!(Error::Config("empty source".into()).is_fatal());
    }
}
