//! SQLite document database for journal and submission records
//!
//! Both collections share one schema; list fields are stored as JSON text.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{DocumentRecord, NewRecord, RecordKind, RecordStatus};

const COLUMNS: &str = "id, title, abstract, authors, keywords, \
    docx_local_name, pdf_local_name, docx_original_name, pdf_original_name, \
    docx_remote_id, pdf_remote_id, docx_remote_url, pdf_remote_url, \
    docx_mirror_id, pdf_mirror_id, status, created_at, updated_at";

/// SQLite-based record database
#[derive(Clone)]
pub struct RecordDb {
    conn: Arc<Mutex<Connection>>,
}

impl RecordDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::Database(format!("Failed to set pragmas: {}", e)))?;

        for kind in [RecordKind::Journal, RecordKind::Submission] {
            let table = kind.table();
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    abstract TEXT NOT NULL,
                    authors TEXT NOT NULL DEFAULT '[]',
                    keywords TEXT NOT NULL DEFAULT '[]',
                    docx_local_name TEXT,
                    pdf_local_name TEXT,
                    docx_original_name TEXT,
                    pdf_original_name TEXT,
                    docx_remote_id TEXT,
                    pdf_remote_id TEXT,
                    docx_remote_url TEXT,
                    pdf_remote_url TEXT,
                    docx_mirror_id TEXT,
                    pdf_mirror_id TEXT,
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_{table}_status ON {table}(status);
                CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);
                "#
            ))
            .map_err(|e| Error::Database(format!("Failed to run migrations: {}", e)))?;
        }

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Insert a new record; the id and timestamps are assigned here
    pub fn insert(&self, record: &NewRecord) -> Result<DocumentRecord> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let conn = self.conn.lock();

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                record.kind.table(),
                COLUMNS
            ),
            params![
                id.to_string(),
                record.title,
                record.abstract_text,
                serde_json::to_string(&record.authors)?,
                serde_json::to_string(&record.keywords)?,
                record.docx.local_name,
                record.pdf.local_name,
                record.docx.original_name,
                record.pdf.original_name,
                record.docx.remote_id,
                record.pdf.remote_id,
                record.docx.remote_url,
                record.pdf.remote_url,
                record.docx.mirror_id,
                record.pdf.mirror_id,
                record.status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::RecordPersist(e.to_string()))?;

        Ok(DocumentRecord {
            id,
            kind: record.kind,
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            authors: record.authors.clone(),
            keywords: record.keywords.clone(),
            docx_local_name: record.docx.local_name.clone(),
            pdf_local_name: record.pdf.local_name.clone(),
            docx_original_name: record.docx.original_name.clone(),
            pdf_original_name: record.pdf.original_name.clone(),
            docx_remote_id: record.docx.remote_id.clone(),
            pdf_remote_id: record.pdf.remote_id.clone(),
            docx_remote_url: record.docx.remote_url.clone(),
            pdf_remote_url: record.pdf.remote_url.clone(),
            docx_mirror_id: record.docx.mirror_id.clone(),
            pdf_mirror_id: record.pdf.mirror_id.clone(),
            status: record.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a record by id
    pub fn get(&self, kind: RecordKind, id: &Uuid) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            COLUMNS,
            kind.table()
        ))?;

        let record = stmt
            .query_row(params![id.to_string()], |row| row_to_record(kind, row))
            .optional()?;

        Ok(record)
    }

    /// Look a record up in either collection
    pub fn find_any(&self, id: &Uuid) -> Result<Option<DocumentRecord>> {
        if let Some(record) = self.get(RecordKind::Journal, id)? {
            return Ok(Some(record));
        }
        self.get(RecordKind::Submission, id)
    }

    /// List records, newest first
    pub fn list(&self, kind: RecordKind) -> Result<Vec<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY created_at DESC",
            COLUMNS,
            kind.table()
        ))?;

        let records = stmt
            .query_map([], |row| row_to_record(kind, row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// Update the status of a record; returns the updated record
    pub fn update_status(
        &self,
        kind: RecordKind,
        id: &Uuid,
        status: RecordStatus,
    ) -> Result<Option<DocumentRecord>> {
        {
            let conn = self.conn.lock();
            let count = conn.execute(
                &format!(
                    "UPDATE {} SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    kind.table()
                ),
                params![status.as_str(), Utc::now().to_rfc3339(), id.to_string()],
            )?;
            if count == 0 {
                return Ok(None);
            }
        }
        self.get(kind, id)
    }

    /// Delete a record; returns whether a row was removed
    pub fn delete(&self, kind: RecordKind, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id.to_string()],
        )?;

        Ok(count > 0)
    }

    /// Count records in a collection
    pub fn count(&self, kind: RecordKind) -> Result<usize> {
        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(total as usize)
    }
}

fn parse_list(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_record(kind: RecordKind, row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
    let id_str: String = row.get(0)?;
    let authors: String = row.get(3)?;
    let keywords: String = row.get(4)?;
    let status_str: String = row.get(15)?;
    let created_at: String = row.get(16)?;
    let updated_at: String = row.get(17)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(DocumentRecord {
        id,
        kind,
        title: row.get(1)?,
        abstract_text: row.get(2)?,
        authors: parse_list(&authors),
        keywords: parse_list(&keywords),
        docx_local_name: row.get(5)?,
        pdf_local_name: row.get(6)?,
        docx_original_name: row.get(7)?,
        pdf_original_name: row.get(8)?,
        docx_remote_id: row.get(9)?,
        pdf_remote_id: row.get(10)?,
        docx_remote_url: row.get(11)?,
        pdf_remote_url: row.get(12)?,
        docx_mirror_id: row.get(13)?,
        pdf_mirror_id: row.get(14)?,
        status: RecordStatus::parse(&status_str).unwrap_or(RecordStatus::Submitted),
        created_at: parse_time(&created_at),
        updated_at: parse_time(&updated_at),
    })
}
