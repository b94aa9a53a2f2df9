//! manuscript-store: journal and manuscript ingestion backend
//!
//! Accepts multipart PDF/DOCX uploads, validates file identity, stores files
//! in a remote object store (with an optional mirror) while keeping local
//! copies whenever the remote upload fails, indexes records in SQLite and
//! serves downloads through a remote-then-local fallback chain.

pub mod config;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use server::{build_router, state::AppState, ManuscriptServer};
pub use types::{DocumentRecord, FileKind, RecordKind, RecordStatus};
