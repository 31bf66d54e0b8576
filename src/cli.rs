//! CLI argument parsing with clap

use crate::config::{Config, ConflictPolicy, ServeConfig, TlsConfig};
use clap::Parser;
use std::path::PathBuf;

/// photo-chrono - rename photos by their capture time
///
/// Walks a directory tree, reads the original capture timestamp from the
/// EXIF metadata of every HEIC/JPEG file and copies it to the destination
/// as `YYYY-MM-DD_HH.MM.SS.<ext>`. Optionally serves the result over HTTP.
#[derive(Parser, Debug)]
#[command(name = "photo-chrono")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path for getting files from
    #[arg(short, long, default_value = "./")]
    pub source: PathBuf,

    /// Path to save the renamed files to
    #[arg(short, long, default_value = "./output")]
    pub destination: PathBuf,

    /// Delete source files after a successful copy
    #[arg(short, long)]
    pub remove: bool,

    /// What to do when the destination file already exists
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Fail)]
    pub conflict: ConflictPolicy,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Serve the destination directory over HTTP after processing
    #[arg(long)]
    pub serve: bool,

    /// Port for the file server
    #[arg(short, long, default_value = "80", env = "PHOTO_CHRONO_PORT")]
    pub port: u16,

    /// CA bundle used to verify client certificates (enables mutual TLS)
    #[arg(long, requires = "tls_cert", requires = "tls_key")]
    pub client_ca: Option<PathBuf>,

    /// Server certificate chain (PEM) for mutual TLS
    #[arg(long, requires = "client_ca")]
    pub tls_cert: Option<PathBuf>,

    /// Server private key (PEM) for mutual TLS
    #[arg(long, requires = "client_ca")]
    pub tls_key: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Convert CLI arguments to the pipeline Config
    pub fn to_config(&self) -> Config {
        Config {
            source_dir: self.source.clone(),
            destination_dir: self.destination.clone(),
            remove_originals: self.remove,
            conflict: self.conflict,
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }

    /// File server settings, if serving was requested
    pub fn to_serve_config(&self) -> Option<ServeConfig> {
        if !self.serve {
            return None;
        }

        let tls = match (&self.client_ca, &self.tls_cert, &self.tls_key) {
            (Some(client_ca), Some(cert), Some(key)) => Some(TlsConfig {
                cert: cert.clone(),
                key: key.clone(),
                client_ca: client_ca.clone(),
            }),
            _ => None,
        };

        Some(ServeConfig {
            root: self.destination.clone(),
            port: self.port,
            tls,
        })
    }
}
