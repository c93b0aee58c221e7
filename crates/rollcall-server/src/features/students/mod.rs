//! Students: single-record CRUD, batch import, CSV export and photos

pub mod commands;
pub mod queries;
pub mod routes;
pub mod scope;
pub mod types;

pub use commands::{
    CreateStudentCommand, DeleteStudentCommand, ImportStudentsCommand, UpdateStudentCommand,
    UploadStudentPhotoCommand,
};
pub use queries::{
    CountStudentsQuery, ExportStudentsQuery, GetStudentQuery, ListStudentsQuery,
    PhotoArchiveQuery, StudentPhotosQuery,
};
pub use routes::students_routes;
pub use scope::StudentFilter;
pub use types::StudentDto;
