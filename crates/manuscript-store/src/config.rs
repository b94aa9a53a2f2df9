//! Configuration for the manuscript store

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "MANUSCRIPT_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Local file storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Primary remote object store
    #[serde(default)]
    pub remote: RemoteStoreConfig,
    /// Optional secondary (mirror) store
    #[serde(default)]
    pub mirror: Option<RemoteStoreConfig>,
    /// Document database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Download resolver configuration
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum multipart body size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Production mode hides error detail from responses
    #[serde(default)]
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
            production: false,
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory uploads are staged into (and retained in when remote fails)
    pub root: PathBuf,
    /// Extra directories scanned by the download resolver, after the built-in candidates
    #[serde(default)]
    pub fallback_dirs: Vec<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("uploads");
        Self {
            root,
            fallback_dirs: Vec::new(),
        }
    }
}

/// Which remote backend to talk to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStoreKind {
    /// No remote store; every upload degrades to local-only
    #[default]
    Disabled,
    /// CDN-style REST object store
    Http,
    /// Google Cloud Storage (requires the `gcp` feature)
    Gcs,
}

impl std::str::FromStr for RemoteStoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "disabled" | "none" => Ok(Self::Disabled),
            "http" => Ok(Self::Http),
            "gcs" => Ok(Self::Gcs),
            other => Err(Error::Config(format!("Unknown remote store kind: {}", other))),
        }
    }
}

/// Remote object store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteStoreConfig {
    /// Backend kind
    #[serde(default)]
    pub kind: RemoteStoreKind,
    /// Upload endpoint, e.g. "https://api.cdn.example/v1/demo/raw/upload" (http)
    #[serde(default)]
    pub upload_url: String,
    /// Delivery base for fetching by id, e.g. "https://cdn.example/demo/raw/upload" (http)
    #[serde(default)]
    pub delivery_url: String,
    /// API key (http)
    #[serde(default)]
    pub api_key: String,
    /// API secret used to sign requests (http)
    #[serde(default)]
    pub api_secret: String,
    /// Bucket name (gcs)
    #[serde(default)]
    pub bucket: String,
    /// Key prefix prepended to every object key
    #[serde(default)]
    pub prefix: String,
}

impl RemoteStoreConfig {
    /// Apply `<PREFIX>_KIND`, `<PREFIX>_UPLOAD_URL`, ... environment overrides
    fn apply_env(&mut self, prefix: &str) -> Result<()> {
        if let Some(kind) = env_var(&format!("{}_KIND", prefix)) {
            self.kind = kind.parse()?;
        }
        if let Some(v) = env_var(&format!("{}_UPLOAD_URL", prefix)) {
            self.upload_url = v;
        }
        if let Some(v) = env_var(&format!("{}_DELIVERY_URL", prefix)) {
            self.delivery_url = v;
        }
        if let Some(v) = env_var(&format!("{}_API_KEY", prefix)) {
            self.api_key = v;
        }
        if let Some(v) = env_var(&format!("{}_API_SECRET", prefix)) {
            self.api_secret = v;
        }
        if let Some(v) = env_var(&format!("{}_BUCKET", prefix)) {
            self.bucket = v;
        }
        if let Some(v) = env_var(&format!("{}_PREFIX", prefix)) {
            self.prefix = v;
        }
        Ok(())
    }
}

/// Document database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("manuscripts.db"),
        }
    }
}

/// Download resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Timeout for remote HTTP fetches in seconds
    pub timeout_secs: u64,
    /// Directory for objects fetched by id before streaming (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            temp_dir: None,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration: TOML file (if present) then environment overrides
    pub fn load() -> Result<Self> {
        let path = env_var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("manuscript-store.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(host) = env_var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(env) = env_var("APP_ENV") {
            self.server.production = env.eq_ignore_ascii_case("production");
        }
        if let Some(root) = env_var("STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(path) = env_var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        self.remote.apply_env("REMOTE_STORE")?;

        if env_var("MIRROR_STORE_KIND").is_some() {
            let mut mirror = self.mirror.take().unwrap_or_default();
            mirror.apply_env("MIRROR_STORE")?;
            self.mirror = Some(mirror);
        } else if let Some(mirror) = self.mirror.as_mut() {
            mirror.apply_env("MIRROR_STORE")?;
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
