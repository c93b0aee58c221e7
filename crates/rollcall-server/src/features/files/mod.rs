pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadFileCommand, UploadFileError, UploadFileResponse};

pub use queries::{
    BatchFile, DownloadFileError, DownloadFileQuery, DownloadFileResponse, ListFilesQuery,
};

pub use routes::files_routes;
