//! Configuration types for photo-chrono

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Extensions accepted by the pipeline (lowercase, without the dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["heic", "jpeg", "jpg"];

/// What to do when the computed destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConflictPolicy {
    /// Refuse to copy and report the file (overwrite protection)
    #[default]
    Fail,
    /// Replace the existing destination file
    Overwrite,
}

/// Configuration for the batch pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree to read photos from
    pub source_dir: PathBuf,

    /// Directory the renamed photos are written to
    pub destination_dir: PathBuf,

    /// Delete each source file after it was copied successfully
    pub remove_originals: bool,

    /// Destination collision handling
    pub conflict: ConflictPolicy,

    /// Dry run mode - compute destinations without touching files
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./"),
            destination_dir: PathBuf::from("./output"),
            remove_originals: false,
            conflict: ConflictPolicy::default(),
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Check if a file extension is supported.
    /// Accepts the extension with or without its leading dot, in any case.
    pub fn is_supported(&self, ext: &str) -> bool {
        is_supported_extension(ext)
    }

    /// Whether overwrite protection is active
    pub fn protects_existing(&self) -> bool {
        self.conflict == ConflictPolicy::Fail
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::Config("source directory must not be empty".into()));
        }
        if self.destination_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "destination directory must not be empty".into(),
            ));
        }
        if self.source_dir == self.destination_dir {
            return Err(Error::Config(format!(
                "source and destination are the same directory: {}",
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}

/// Extension filter shared by the pipeline and its callers
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.trim_start_matches('.').to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|e| *e == ext_lower)
}

/// TLS material for the file server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// PEM certificate chain presented by the server
    pub cert: PathBuf,
    /// PEM private key for `cert`
    pub key: PathBuf,
    /// PEM bundle of CAs client certificates must chain to
    pub client_ca: PathBuf,
}

/// Configuration for the optional HTTP file server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Directory served at `/`
    pub root: PathBuf,
    /// TCP port to listen on
    pub port: u16,
    /// Mutual TLS; plain HTTP when absent
    pub tls: Option<TlsConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions_case_insensitive() {
        for ext in [".heic", ".HEIC", ".Jpg", ".jpg", ".JPEG", "jpeg", "HeIc"] {
            assert!(is_supported_extension(ext), "{ext} should be accepted");
        }
    }

    #[test]
    fn test_unsupported_extensions() {
        for ext in [".txt", ".png", ".mov", ".heif", "", ".", ".jpgx", "jp"] {
            assert!(!is_supported_extension(ext), "{ext} should be rejected");
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source_dir, PathBuf::from("./"));
        assert_eq!(config.destination_dir, PathBuf::from("./output"));
        assert!(!config.remove_originals);
        assert!(config.protects_existing());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_same_directory() {
        let config = Config {
            source_dir: PathBuf::from("photos"),
            destination_dir: PathBuf::from("photos"),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            source_dir: PathBuf::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
