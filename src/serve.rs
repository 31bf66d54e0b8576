//! Read-only HTTP file server for the destination directory
//!
//! Independent of the batch pipeline: it only needs a directory to serve.
//! Plain HTTP runs on `axum::serve`; mutual TLS runs on `axum-server`
//! with a rustls config that requires client certificates.

use crate::config::{ServeConfig, TlsConfig};
use crate::error::{Error, Result};
use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use std::fs::File;
use std::io::BufReader;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Router serving `root` as static content at `/`.
///
/// Files and `index.html` come from `ServeDir`; a directory without an index
/// falls through to a generated HTML listing.
pub fn router(root: &Path) -> Router {
    let listing_root = root.to_path_buf();
    let listing = move |uri: Uri| {
        let root = listing_root.clone();
        async move { list_directory(&root, uri.path()).await }
    };

    Router::new()
        .fallback_service(ServeDir::new(root).fallback(listing.into_service()))
        .layer(TraceLayer::new_for_http())
}

/// Render the entries of the directory `request_path` maps to under `root`
async fn list_directory(root: &Path, request_path: &str) -> Response {
    let Some(dir) = resolve_under(root, request_path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            Ok(None) => break,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
    names.sort();

    let mut body = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
    for name in &names {
        let escaped = escape_html(name);
        body.push_str(&format!("<a href=\"{escaped}\">{escaped}</a>\n"));
    }
    body.push_str("</pre>\n");

    Html(body).into_response()
}

/// Map a request path onto `root`, refusing anything that climbs out of it
fn resolve_under(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut dir = root.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => dir.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(dir)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Serve the configured directory until the process is terminated.
///
/// # Errors
///
/// Returns an error if the TLS material cannot be loaded, the listener fails
/// to bind, or the server terminates unexpectedly.
pub async fn serve(config: ServeConfig) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let app = router(&config.root);

    match &config.tls {
        None => {
            info!(%addr, root = %config.root.display(), "starting up server");
            let listener = TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
        Some(tls) => {
            let server_config = mutual_tls_config(tls)?;
            info!(
                %addr,
                root = %config.root.display(),
                client_ca = %tls.client_ca.display(),
                "starting up server with mutual TLS"
            );
            let rustls_config = RustlsConfig::from_config(Arc::new(server_config));
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service())
                .await?;
        }
    }

    Ok(())
}

/// Build a rustls server config that requires a client certificate signed by
/// one of the CAs in `tls.client_ca`. TLS 1.2 is the minimum version.
pub fn mutual_tls_config(tls: &TlsConfig) -> Result<ServerConfig> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());

    let mut roots = RootCertStore::empty();
    for cert in load_certs(&tls.client_ca)? {
        roots
            .add(cert)
            .map_err(|e| Error::Tls(format!("invalid CA in {}: {e}", tls.client_ca.display())))?;
    }

    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let certs = load_certs(&tls.cert)?;
    let key = load_private_key(&tls.key)?;

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|e| Error::Tls(e.to_string()))?
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| Error::Tls(e.to_string()))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

fn open_pem(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::Tls(format!("cannot read {}: {e}", path.display())))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open_pem(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::Tls(format!("malformed PEM in {}: {e}", path.display())))?;

    if certs.is_empty() {
        return Err(Error::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| Error::Tls(format!("malformed PEM in {}: {e}", path.display())))?
        .ok_or_else(|| Error::Tls(format!("no private key found in {}", path.display())))
}
