pub mod download;
pub mod list;

pub use download::{DownloadFileError, DownloadFileQuery, DownloadFileResponse};
pub use list::{BatchFile, ListFilesError, ListFilesQuery};
