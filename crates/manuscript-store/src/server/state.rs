//! Application state for the manuscript server

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::UploadPipeline;
use crate::providers::{build_object_store, ObjectStore};
use crate::retrieval::DownloadResolver;
use crate::storage::RecordDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Document database
    db: RecordDb,
    /// Primary object store
    primary: Arc<dyn ObjectStore>,
    /// Optional mirror store
    mirror: Option<Arc<dyn ObjectStore>>,
    /// Upload → cleanup → record pipeline
    pipeline: UploadPipeline,
    /// Download strategy chain
    resolver: DownloadResolver,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state from configuration
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Initializing manuscript store (remote: {:?}, mirror: {})",
            config.remote.kind,
            config.mirror.is_some()
        );

        std::fs::create_dir_all(&config.storage.root)?;
        tracing::info!("Storage root: {}", config.storage.root.display());

        let db = RecordDb::new(&config.database.path)?;
        tracing::info!("Database opened at {}", config.database.path.display());

        let primary = build_object_store(&config.remote, config.download.timeout()).await?;
        let mirror = match &config.mirror {
            Some(mirror) => Some(build_object_store(mirror, config.download.timeout()).await?),
            None => None,
        };
        tracing::info!(
            "Object stores ready (primary: {}, mirror: {})",
            primary.name(),
            mirror.as_ref().map(|m| m.name()).unwrap_or("none")
        );

        Self::from_parts(config, db, primary, mirror)
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: AppConfig,
        db: RecordDb,
        primary: Arc<dyn ObjectStore>,
        mirror: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self> {
        let pipeline = UploadPipeline::new(
            Arc::clone(&primary),
            mirror.clone(),
            db.clone(),
            config.storage.root.clone(),
        );
        let resolver = DownloadResolver::new(&config, Arc::clone(&primary), mirror.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                primary,
                mirror,
                pipeline,
                resolver,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &RecordDb {
        &self.inner.db
    }

    pub fn storage_root(&self) -> &Path {
        &self.inner.config.storage.root
    }

    pub fn primary(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.primary
    }

    pub fn mirror(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.inner.mirror.as_ref()
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.inner.pipeline
    }

    pub fn resolver(&self) -> &DownloadResolver {
        &self.inner.resolver
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
