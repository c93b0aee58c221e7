pub mod create;
pub mod delete;
pub mod import;
pub mod update;
pub mod upload_photo;

pub use create::{CreateStudentCommand, CreateStudentError};
pub use delete::{DeleteStudentCommand, DeleteStudentError, DeleteStudentResponse};
pub use import::{ImportStudentsCommand, ImportStudentsError};
pub use update::{UpdateStudentCommand, UpdateStudentError};
pub use upload_photo::{UploadStudentPhotoCommand, UploadStudentPhotoError};
