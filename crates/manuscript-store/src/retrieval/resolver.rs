//! Download resolver
//!
//! Strategies, first success wins:
//! 1. Remote by identifier (primary, then mirror), via a temp file
//! 2. Remote by URL, rewritten to its attachment variant
//! 3. Local candidate paths
//!
//! When all fail the error lists every source that was tried.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::config::AppConfig;
use crate::error::{AttemptedSources, Error, Result};
use crate::providers::ObjectStore;
use crate::types::{DocumentRecord, FileKind};

const ATTACHMENT_SEGMENT: &str = "/upload/fl_attachment/";
const MAX_FILENAME_CHARS: usize = 100;
const TEMP_PREFIX: &str = "manuscript-download-";

/// Where a download was served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    Remote { backend: String, id: String },
    Url(String),
    Local(PathBuf),
}

/// A resolved download body
pub struct ResolvedDownload {
    pub body: Body,
    pub length: Option<u64>,
    pub source: DownloadSource,
}

impl std::fmt::Debug for ResolvedDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedDownload")
            .field("length", &self.length)
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves record files to a byte stream
#[derive(Clone)]
pub struct DownloadResolver {
    primary: Arc<dyn ObjectStore>,
    mirror: Option<Arc<dyn ObjectStore>>,
    http: reqwest::Client,
    storage_root: PathBuf,
    fallback_dirs: Vec<PathBuf>,
    cwd: PathBuf,
    temp_dir: PathBuf,
}

impl DownloadResolver {
    pub fn new(
        config: &AppConfig,
        primary: Arc<dyn ObjectStore>,
        mirror: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.download.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            primary,
            mirror,
            http,
            storage_root: config.storage.root.clone(),
            fallback_dirs: config.storage.fallback_dirs.clone(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            temp_dir: config
                .download
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        })
    }

    /// Override the working directory used for relative candidates
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Run the strategy chain for one file of a record
    pub async fn resolve(&self, record: &DocumentRecord, kind: FileKind) -> Result<ResolvedDownload> {
        let file = record.file(kind);
        let mut attempted = AttemptedSources::default();

        // 1. By identifier
        let mut by_id: Vec<(&Arc<dyn ObjectStore>, &str)> = Vec::new();
        if let Some(id) = file.remote_id {
            by_id.push((&self.primary, id));
        }
        if let (Some(store), Some(id)) = (&self.mirror, file.mirror_id) {
            by_id.push((store, id));
        }
        for (store, id) in by_id {
            attempted.remote_ids.push(format!("{}:{}", store.name(), id));
            match self.fetch_via_temp(store, id).await {
                Ok((body, length)) => {
                    tracing::info!(record = %record.id, backend = store.name(), "Serving from remote store");
                    return Ok(ResolvedDownload {
                        body,
                        length: Some(length),
                        source: DownloadSource::Remote {
                            backend: store.name().to_string(),
                            id: id.to_string(),
                        },
                    });
                }
                Err(e) => {
                    tracing::warn!(record = %record.id, backend = store.name(), "Remote fetch failed: {}", e);
                }
            }
        }

        // 2. By URL
        if let Some(url) = file.remote_url {
            let url = attachment_url(url);
            attempted.remote_urls.push(url.clone());
            match self.fetch_url(&url).await {
                Ok((body, length)) => {
                    tracing::info!(record = %record.id, url = %url, "Serving from remote URL");
                    return Ok(ResolvedDownload {
                        body,
                        length,
                        source: DownloadSource::Url(url),
                    });
                }
                Err(e) => {
                    tracing::warn!(record = %record.id, url = %url, "URL fetch failed: {}", e);
                }
            }
        }

        // 3. Local disk
        if let Some(name) = file.local_name {
            for path in local_candidates(&self.storage_root, &self.cwd, &self.fallback_dirs, name) {
                attempted.local_paths.push(path.display().to_string());
                if let Some(length) = non_empty_file(&path).await {
                    let handle = tokio::fs::File::open(&path).await?;
                    tracing::info!(record = %record.id, path = %path.display(), "Serving from local disk");
                    return Ok(ResolvedDownload {
                        body: Body::from_stream(ReaderStream::new(handle)),
                        length: Some(length),
                        source: DownloadSource::Local(path),
                    });
                }
            }
        }

        tracing::warn!(record = %record.id, kind = %kind, "No download source available");
        Err(Error::DownloadSourceExhausted {
            record_id: record.id.to_string(),
            kind: kind.extension().to_string(),
            attempted,
        })
    }

    /// Fetch an object into a temp file and stream it back; the temp file is
    /// removed when the body is finished or dropped
    async fn fetch_via_temp(&self, store: &Arc<dyn ObjectStore>, id: &str) -> Result<(Body, u64)> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let temp_path = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.temp_dir)?
            .into_temp_path();

        let length = store.fetch_to(id, &temp_path).await?;
        if length == 0 {
            return Err(Error::NotFound(format!("remote object {} is empty", id)));
        }

        let file = tokio::fs::File::open(&temp_path).await?;
        let stream = ReaderStream::new(file).map(move |chunk| {
            let _keep = &temp_path;
            chunk
        });

        Ok((Body::from_stream(stream), length))
    }

    async fn fetch_url(&self, url: &str) -> Result<(Body, Option<u64>)> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let length = response.content_length();
        Ok((Body::from_stream(response.bytes_stream()), length))
    }
}

async fn non_empty_file(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}

/// Rewrite a delivery URL to its attachment variant
pub fn attachment_url(url: &str) -> String {
    if url.contains(ATTACHMENT_SEGMENT) {
        url.to_string()
    } else {
        url.replacen("/upload/", ATTACHMENT_SEGMENT, 1)
    }
}

/// Local paths scanned for a stored file name, in order
pub fn local_candidates(
    root: &Path,
    cwd: &Path,
    fallback_dirs: &[PathBuf],
    local_name: &str,
) -> Vec<PathBuf> {
    let Some(name) = Path::new(local_name).file_name() else {
        return Vec::new();
    };

    let mut candidates = vec![
        root.join(name),
        root.join("uploads").join(name),
        root.join("journals").join(name),
        cwd.join("uploads").join(name),
        cwd.join("..").join("uploads").join(name),
        cwd.join("public").join("uploads").join(name),
        cwd.join("server").join("uploads").join(name),
    ];
    candidates.extend(fallback_dirs.iter().map(|dir| dir.join(name)));

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|p| seen.insert(p.clone()));
    candidates
}

/// Header-safe download name: `[A-Za-z0-9_- ]` only, space runs as `_`
pub fn sanitize_download_name(base: &str) -> String {
    let kept: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();

    let mut out = String::new();
    let mut in_space = false;
    for c in kept.trim_matches(' ').chars() {
        if c == ' ' {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out.chars().take(MAX_FILENAME_CHARS).collect()
}

/// File name for a record download, with extension
pub fn download_file_name(record: &DocumentRecord, kind: FileKind) -> String {
    let mut base = sanitize_download_name(&record.title);
    if base.is_empty() {
        if let Some(original) = record.file(kind).original_name {
            base = sanitize_download_name(crate::intake::file_stem(original));
        }
    }
    if base.is_empty() {
        base = "document".to_string();
    }
    format!("{}.{}", base, kind.extension())
}

/// Build the attachment response
pub fn download_response(record: &DocumentRecord, kind: FileKind, download: ResolvedDownload) -> Response {
    let file_name = download_file_name(record, kind);
    let mut response = (StatusCode::OK, download.body).into_response();
    let headers = response.headers_mut();

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = download.length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    response
}
