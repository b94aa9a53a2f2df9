//! Core types for the manuscript store

pub mod field_list;
pub mod record;
pub mod response;

pub use field_list::FieldList;
pub use record::{
    DocumentRecord, FileKind, FileLocation, FileRef, NewRecord, RecordKind, RecordStatus,
};
pub use response::{
    DeleteResponse, RecordListResponse, RecordSummary, StatusUpdateRequest, UploadBody,
    UploadFlags, UploadResponse,
};
