pub mod create;
pub mod delete;
pub mod update;
pub mod upload_photo;

pub use create::{CreateUserCommand, CreateUserError};
pub use delete::{DeleteUserCommand, DeleteUserError, DeleteUserResponse};
pub use update::{UpdateUserCommand, UpdateUserError};
pub use upload_photo::{UploadUserPhotoCommand, UploadUserPhotoError};
