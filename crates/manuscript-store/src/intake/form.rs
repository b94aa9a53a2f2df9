//! Multipart upload form parsing
//!
//! Text parts are buffered; file parts are streamed chunk-by-chunk into the
//! storage root as `StagedFile`s.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::staging::StagedFile;
use crate::error::{Error, Result};
use crate::types::FieldList;

/// Multipart parts that carry files
pub const FILE_FIELDS: &[&str] = &["pdfFile", "docxFile", "file"];

/// A parsed upload form
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, StagedFile>,
}

impl UploadForm {
    /// Read every part of `multipart`, staging file parts under `root`
    pub async fn read(multipart: &mut Multipart, root: &Path) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            if FILE_FIELDS.contains(&name.as_str()) {
                let staged = stage_field(field, root).await?;
                tracing::debug!(
                    field = %name,
                    file = %staged.original_name(),
                    bytes = staged.size(),
                    "Staged upload"
                );
                // A repeated part replaces (and deletes) the earlier one
                form.files.insert(name, staged);
                continue;
            }

            if field.file_name().is_some() {
                tracing::debug!(field = %name, "Ignoring unexpected file part");
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            let key = name.trim_end_matches("[]").to_string();
            form.fields.entry(key).or_default().push(value);
        }

        Ok(form)
    }

    /// Build a form directly (tests, non-HTTP callers)
    pub fn from_parts(fields: Vec<(&str, &str)>, files: Vec<(&str, StagedFile)>) -> Self {
        let mut form = Self::default();
        for (name, value) in fields {
            form.fields
                .entry(name.trim_end_matches("[]").to_string())
                .or_default()
                .push(value.to_string());
        }
        for (name, file) in files {
            form.files.insert(name.to_string(), file);
        }
        form
    }

    /// First value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// A list field (`name` and `name[]` are merged); `None` when absent
    pub fn list(&self, name: &str) -> Option<FieldList> {
        self.fields
            .get(name)
            .map(|values| FieldList::from_form_values(values.clone()))
    }

    /// Remove a staged file from the form
    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

async fn stage_field(mut field: Field<'_>, root: &Path) -> Result<StagedFile> {
    let original_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let (mut staged, mut file) = StagedFile::create(root, &original_name, &content_type).await?;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await?;
        staged.add_size(chunk.len() as u64);
    }
    file.flush().await?;

    Ok(staged)
}

fn multipart_error(e: MultipartError) -> Error {
    Error::BadRequest(format!("Failed to read multipart body: {}", e.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_parts_merges_bracket_names() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = StagedFile::from_bytes(dir.path(), "a.pdf", "application/pdf", b"%PDF")
            .await
            .unwrap();

        let mut form = UploadForm::from_parts(
            vec![
                ("title", "T"),
                ("authors[]", "Ada"),
                ("authors[]", "Alan"),
                ("keywords", "x, y"),
            ],
            vec![("pdfFile", pdf)],
        );

        assert_eq!(form.text("title"), Some("T"));
        assert_eq!(form.list("authors").unwrap().normalize(), vec!["Ada", "Alan"]);
        assert_eq!(form.list("keywords").unwrap().normalize(), vec!["x", "y"]);
        assert!(form.list("missing").is_none());
        assert!(form.has_file("pdfFile"));
        assert!(form.take_file("pdfFile").is_some());
        assert!(!form.has_file("pdfFile"));
    }
}
