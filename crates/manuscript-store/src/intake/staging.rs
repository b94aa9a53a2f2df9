//! Files staged on local disk during an upload
//!
//! A `StagedFile` deletes itself when dropped unless it was explicitly kept,
//! so every early return out of intake leaves nothing behind.

use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::Result;

/// A file written under the storage root for the duration of a request
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    local_name: String,
    original_name: String,
    content_type: String,
    size: u64,
    armed: bool,
}

impl StagedFile {
    /// Create an empty staged file for `original_name` and open it for writing
    pub async fn create(
        root: &Path,
        original_name: &str,
        content_type: &str,
    ) -> Result<(Self, tokio::fs::File)> {
        tokio::fs::create_dir_all(root).await?;

        let local_name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );
        let path = root.join(&local_name);
        let file = tokio::fs::File::create(&path).await?;

        let staged = Self {
            path,
            local_name,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size: 0,
            armed: true,
        };
        Ok((staged, file))
    }

    /// Stage an in-memory buffer (derived files)
    pub async fn from_bytes(
        root: &Path,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Self> {
        let (mut staged, mut file) = Self::create(root, original_name, content_type).await?;
        file.write_all(data).await?;
        file.flush().await?;
        staged.size = data.len() as u64;
        Ok(staged)
    }

    /// Record bytes appended by the writer returned from `create`
    pub fn add_size(&mut self, bytes: u64) {
        self.size += bytes;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the file under the storage root
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Name supplied by the client
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Declared content type
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read up to `n` leading bytes for signature checks
    pub async fn leading_bytes(&self, n: usize) -> Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = file.read(&mut buf[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Read the whole file
    pub async fn read_all(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Keep the file on disk and return its local name
    pub fn retain(mut self) -> String {
        self.armed = false;
        std::mem::take(&mut self.local_name)
    }

    /// Remove the file now
    pub async fn discard(mut self) {
        self.armed = false;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), "Failed to remove staged file: {}", e);
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), "Failed to remove staged file: {}", e);
                }
            }
        }
    }
}

/// Reduce a client file name to `[A-Za-z0-9._-]`, keeping the extension
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
