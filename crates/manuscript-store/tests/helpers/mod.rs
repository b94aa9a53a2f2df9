//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use manuscript_store::config::AppConfig;
use manuscript_store::error::{Error, Result};
use manuscript_store::providers::{ObjectStore, StoredObject};
use manuscript_store::storage::RecordDb;
use manuscript_store::{build_router, AppState};

/// In-memory object store with failure switches
#[derive(Default)]
pub struct MockStore {
    name: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    fail_all: AtomicBool,
    /// Fail uploads of files with this extension only
    fail_extension: Mutex<Option<String>>,
}

impl MockStore {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        let store = Self::new(name);
        store.fail_all.store(true, Ordering::SeqCst);
        store
    }

    pub fn fail_extension(&self, ext: &str) {
        *self.fail_extension.lock() = Some(ext.to_string());
    }

    pub fn put(&self, id: &str, data: &[u8]) {
        self.objects.lock().insert(id.to_string(), data.to_vec());
    }

    pub fn object_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.objects.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn get(&self, id: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(id).cloned()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    fn url(&self, id: &str) -> String {
        format!("https://cdn.test/{}/raw/upload/{}", self.name, id)
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<StoredObject> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(Error::remote_upload(&self.name, "connection refused"));
        }
        let ext = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        if self.fail_extension.lock().as_deref() == Some(ext.as_str()) {
            return Err(Error::remote_upload(&self.name, "quota exceeded"));
        }

        let data = tokio::fs::read(local_path).await?;
        self.put(key, &data);
        Ok(StoredObject {
            secure_url: self.url(key),
            public_id: key.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.deleted.lock().push(public_id.to_string());
        self.objects
            .lock()
            .remove(public_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(public_id.to_string()))
    }

    async fn fetch_to(&self, public_id: &str, dest: &Path) -> Result<u64> {
        let data = self
            .get(public_id)
            .ok_or_else(|| Error::NotFound(public_id.to_string()))?;
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A router over an in-memory database and a temp storage root
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new(primary: Arc<MockStore>, mirror: Option<Arc<MockStore>>) -> Self {
        Self::with_config(primary, mirror, |_| {})
    }

    pub fn with_config(
        primary: Arc<MockStore>,
        mirror: Option<Arc<MockStore>>,
        adjust: impl FnOnce(&mut AppConfig),
    ) -> Self {
        Self::build(primary, mirror, adjust, |_| RecordDb::in_memory().unwrap())
    }

    /// Records live in `<dir>/records.db` so tests can reach the file directly
    pub fn with_file_db(primary: Arc<MockStore>, mirror: Option<Arc<MockStore>>) -> Self {
        Self::build(primary, mirror, |_| {}, |dir| {
            RecordDb::new(dir.join("records.db")).unwrap()
        })
    }

    fn build(
        primary: Arc<MockStore>,
        mirror: Option<Arc<MockStore>>,
        adjust: impl FnOnce(&mut AppConfig),
        open_db: impl FnOnce(&Path) -> RecordDb,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.root = dir.path().join("uploads");
        config.download.temp_dir = Some(dir.path().join("fetch"));
        adjust(&mut config);

        let db = open_db(dir.path());
        let primary: Arc<dyn ObjectStore> = primary;
        let mirror: Option<Arc<dyn ObjectStore>> = mirror.map(|m| m as Arc<dyn ObjectStore>);
        let state = AppState::from_parts(config, db, primary, mirror).unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            dir,
        }
    }

    pub fn storage_root(&self) -> PathBuf {
        self.state.storage_root().to_path_buf()
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("records.db")
    }

    /// Files currently in the storage root
    pub fn stored_files(&self) -> Vec<String> {
        list_dir(&self.storage_root())
    }

    /// Download temp files not yet cleaned up
    pub fn fetch_temp_files(&self) -> Vec<String> {
        list_dir(&self.dir.path().join("fetch"))
    }
}

fn list_dir(path: &Path) -> Vec<String> {
    match std::fs::read_dir(path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
        Err(_) => Vec::new(),
    }
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----manuscript-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n".to_vec()
}

pub fn sample_docx(text: &str) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    docx_rs::Docx::new()
        .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(text)))
        .build()
        .pack(&mut buf)
        .unwrap();
    buf.into_inner()
}

/// A complete journal upload form
pub fn journal_form() -> MultipartBody {
    MultipartBody::new()
        .text("title", "Deep Learning: A Survey")
        .text("abstract", "We survey deep learning.")
        .text("authors[]", "Ada Lovelace")
        .text("authors[]", "Alan Turing")
        .text("keywords", "ml, survey")
        .file("pdfFile", "survey.pdf", "application/pdf", &sample_pdf())
        .file("docxFile", "survey.docx", DOCX_MIME, &sample_docx("Survey body"))
}

pub async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
