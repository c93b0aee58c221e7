pub mod change_password;
pub mod login;

pub use change_password::{ChangePasswordCommand, ChangePasswordError, ChangePasswordResponse};
pub use login::{LoginCommand, LoginError};
