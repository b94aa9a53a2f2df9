//! Upload validation: required fields, file identity and file-name safety
//!
//! File identity is checked in three layers:
//! 1. Extension allow-list, matched against the slot
//! 2. Declared MIME type allow-list per extension
//! 3. Signature bytes at the start of the file

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::form::UploadForm;
use super::staging::StagedFile;
use crate::error::{Error, Result};
use crate::types::FileKind;

/// ZIP local header, empty archive and spanned archive markers
pub const ZIP_SIGNATURES: &[&[u8]] = &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// PDF header
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

static PDF_MIME_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["application/pdf", "application/x-pdf", "application/octet-stream"]
        .into_iter()
        .collect()
});

static DOCX_MIME_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/zip",
        "application/x-zip-compressed",
        "application/octet-stream",
    ]
    .into_iter()
    .collect()
});

/// Extensions that mark a name as executable wherever they appear
static EXECUTABLE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Windows
        "exe", "bat", "cmd", "com", "scr", "msi", "msp", "dll", "pif", "cpl", "hta", "reg",
        "lnk", "inf",
        // Scripts
        "ps1", "psm1", "vbs", "vbe", "js", "jse", "wsf", "wsh", "sh", "bash", "csh", "py",
        "pl", "rb", "php",
        // JVM and packages
        "jar", "war", "class", "apk", "app", "deb", "rpm", "dmg",
    ]
    .into_iter()
    .collect()
});

static RESERVED_DEVICE_NAMES: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut names: HashSet<String> = ["CON", "PRN", "AUX", "NUL"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for n in 1..=9 {
        names.insert(format!("COM{}", n));
        names.insert(format!("LPT{}", n));
    }
    names
});

/// Metadata fields that survived validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
}

/// Validate the text fields, reporting every failing field at once
///
/// An absent list field is an empty list; a supplied list that normalizes to
/// nothing is an error.
pub fn validate_metadata(form: &UploadForm) -> Result<Metadata> {
    let mut failing = Vec::new();

    let title = form.text("title").map(str::trim).unwrap_or_default();
    if title.is_empty() {
        failing.push("title".to_string());
    }

    let abstract_text = form.text("abstract").map(str::trim).unwrap_or_default();
    if abstract_text.is_empty() {
        failing.push("abstract".to_string());
    }

    let mut list = |name: &str| -> Vec<String> {
        match form.list(name) {
            Some(raw) => {
                let values = raw.normalize();
                if values.is_empty() {
                    failing.push(name.to_string());
                }
                values
            }
            None => Vec::new(),
        }
    };
    let authors = list("authors");
    let keywords = list("keywords");

    if !failing.is_empty() {
        return Err(Error::Validation { fields: failing });
    }

    Ok(Metadata {
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        authors,
        keywords,
    })
}

/// Lower-cased extension of a client file name
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Check extension, declared MIME type and signature of a staged file
pub async fn check_file_type(file: &StagedFile, kind: FileKind) -> Result<()> {
    let name = file.original_name();

    match extension_of(name).as_deref() {
        Some(ext) if ext == kind.extension() => {}
        Some(ext @ ("pdf" | "docx")) => {
            return Err(Error::file_type(
                name,
                format!("expected a .{} file, got .{}", kind.extension(), ext),
            ));
        }
        _ => {
            return Err(Error::file_type(
                name,
                "only .docx and .pdf files are accepted",
            ));
        }
    }

    let declared = file
        .content_type()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let allowed = match kind {
        FileKind::Pdf => &*PDF_MIME_TYPES,
        FileKind::Docx => &*DOCX_MIME_TYPES,
    };
    if !allowed.contains(declared.as_str()) {
        return Err(Error::file_type(
            name,
            format!("content type '{}' is not allowed for .{}", declared, kind.extension()),
        ));
    }

    let head = file.leading_bytes(8).await?;
    if !signature_matches(&head, kind) {
        let detected = infer::get(&head)
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(Error::file_type(
            name,
            format!(
                "file contents do not look like a .{} file (detected: {})",
                kind.extension(),
                detected
            ),
        ));
    }

    Ok(())
}

/// Whether the leading bytes carry the signature for `kind`
pub fn signature_matches(head: &[u8], kind: FileKind) -> bool {
    match kind {
        FileKind::Pdf => head.starts_with(PDF_SIGNATURE),
        FileKind::Docx => ZIP_SIGNATURES.iter().any(|sig| head.starts_with(sig)),
    }
}

/// Reject names with traversal, reserved device names or executable extensions
pub fn check_file_name(name: &str) -> Result<()> {
    if name.contains("..") {
        return Err(Error::suspicious(name, "contains '..'"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::suspicious(name, "contains a path separator"));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::suspicious(name, "contains control characters"));
    }

    let mut segments = name.split('.');
    let stem = segments.next().unwrap_or_default().trim().to_uppercase();
    if RESERVED_DEVICE_NAMES.contains(&stem) {
        return Err(Error::suspicious(name, "reserved device name"));
    }

    for segment in segments {
        let segment = segment.trim().to_lowercase();
        if EXECUTABLE_EXTENSIONS.contains(segment.as_str()) {
            return Err(Error::suspicious(
                name,
                format!("executable extension .{}", segment),
            ));
        }
    }

    Ok(())
}
