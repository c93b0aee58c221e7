//! School and distributor accounts

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{
    CreateUserCommand, DeleteUserCommand, UpdateUserCommand, UploadUserPhotoCommand,
};
pub use queries::{CountUsersQuery, GetUserQuery, ListUsersQuery};
pub use routes::users_routes;
pub use types::{UserDto, UserRow};
