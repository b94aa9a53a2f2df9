//! Upload intake: multipart parsing, staging, validation and PDF derivation
//!
//! Validation order is fixed: missing file parts, then required text fields,
//! then per-file type checks, then file-name safety. Any rejection drops the
//! staged files, which removes them from disk.

pub mod convert;
pub mod form;
pub mod staging;
pub mod validation;

use std::path::Path;

pub use form::UploadForm;
pub use staging::StagedFile;
pub use validation::Metadata;

use crate::error::{Error, Result};
use crate::types::{FileKind, RecordKind};

/// An upload that passed every check, ready for the storage pipeline
#[derive(Debug)]
pub struct ValidatedUpload {
    pub kind: RecordKind,
    pub metadata: Metadata,
    pub docx: StagedFile,
    pub pdf: StagedFile,
    /// True when the PDF was generated from the DOCX
    pub pdf_derived: bool,
}

/// Validate a journal upload (`pdfFile` + `docxFile`)
pub async fn validate_journal(mut form: UploadForm) -> Result<ValidatedUpload> {
    let missing: Vec<&str> = ["pdfFile", "docxFile"]
        .into_iter()
        .filter(|name| !form.has_file(name))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingFile(missing.join(", ")));
    }
    let (Some(pdf), Some(docx)) = (form.take_file("pdfFile"), form.take_file("docxFile")) else {
        return Err(Error::MissingFile("pdfFile, docxFile".to_string()));
    };

    let metadata = validation::validate_metadata(&form)?;

    validation::check_file_type(&pdf, FileKind::Pdf).await?;
    validation::check_file_type(&docx, FileKind::Docx).await?;
    validation::check_file_name(pdf.original_name())?;
    validation::check_file_name(docx.original_name())?;

    Ok(ValidatedUpload {
        kind: RecordKind::Journal,
        metadata,
        docx,
        pdf,
        pdf_derived: false,
    })
}

/// Validate a submission upload (`file`, DOCX) and derive its PDF under `root`
pub async fn validate_submission(mut form: UploadForm, root: &Path) -> Result<ValidatedUpload> {
    let docx = form
        .take_file("file")
        .ok_or_else(|| Error::MissingFile("file".to_string()))?;

    let metadata = validation::validate_metadata(&form)?;

    validation::check_file_type(&docx, FileKind::Docx).await?;
    validation::check_file_name(docx.original_name())?;

    let data = docx.read_all().await?;
    let pdf_bytes = tokio::task::spawn_blocking(move || convert::docx_to_pdf(&data))
        .await
        .map_err(|e| Error::Internal(format!("PDF conversion task failed: {}", e)))?
        .map_err(|e| match e {
            Error::FileType { message, .. } => Error::file_type(docx.original_name(), message),
            other => other,
        })?;

    let pdf_name = format!("{}.pdf", file_stem(docx.original_name()));
    let pdf = StagedFile::from_bytes(root, &pdf_name, FileKind::Pdf.content_type(), &pdf_bytes)
        .await?;

    tracing::info!(
        docx = %docx.original_name(),
        pdf_bytes = pdf.size(),
        "Derived PDF from submission DOCX"
    );

    Ok(ValidatedUpload {
        kind: RecordKind::Submission,
        metadata,
        docx,
        pdf,
        pdf_derived: true,
    })
}

/// Client file name without its extension
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
