//! Record writer: turns validated metadata and upload outcomes into a record

use crate::intake::Metadata;
use crate::types::{NewRecord, RecordKind, RecordStatus, UploadFlags};

use super::uploader::UploadOutcome;

/// Assemble the record to insert; failed uploads leave their remote fields empty
pub fn build_record(
    kind: RecordKind,
    metadata: Metadata,
    docx: &UploadOutcome,
    pdf: &UploadOutcome,
) -> NewRecord {
    NewRecord {
        kind,
        title: metadata.title,
        abstract_text: metadata.abstract_text,
        authors: metadata.authors,
        keywords: metadata.keywords,
        docx: docx.location(),
        pdf: pdf.location(),
        status: RecordStatus::Submitted,
    }
}

/// Degraded-status flags for the response
pub fn upload_flags(docx: &UploadOutcome, pdf: &UploadOutcome) -> UploadFlags {
    let errors: Vec<String> = [docx, pdf]
        .iter()
        .filter_map(|o| {
            o.error
                .as_ref()
                .map(|e| format!("{}: {}", o.kind.extension().to_uppercase(), e))
        })
        .collect();

    UploadFlags {
        docx_failed: docx.failed(),
        pdf_failed: pdf.failed(),
        error: if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        },
    }
}
