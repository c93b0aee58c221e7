pub mod count;
pub mod get;
pub mod list;

pub use count::{CountUsersError, CountUsersQuery, CountUsersResponse};
pub use get::{GetUserError, GetUserQuery};
pub use list::{ListUsersError, ListUsersQuery};
