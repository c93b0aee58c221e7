pub mod count;
pub mod export;
pub mod get;
pub mod list;
pub mod photos;
pub mod photos_archive;

pub use count::{CountStudentsError, CountStudentsQuery, CountStudentsResponse};
pub use export::{ExportStudentsError, ExportStudentsQuery, ExportedFile};
pub use get::{GetStudentError, GetStudentQuery};
pub use list::{ListStudentsError, ListStudentsQuery};
pub use photos::{StudentPhoto, StudentPhotosError, StudentPhotosQuery, StudentPhotosResponse};
pub use photos_archive::{PhotoArchive, PhotoArchiveError, PhotoArchiveQuery};
