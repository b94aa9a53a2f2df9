//! Retrieval of stored files for download

pub mod resolver;

pub use resolver::{
    attachment_url, download_file_name, download_response, local_candidates,
    sanitize_download_name, DownloadResolver, DownloadSource, ResolvedDownload,
};
