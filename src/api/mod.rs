pub mod client;
pub mod error;
pub mod latest;
pub mod paginated;

pub use client::{DirectoryApi, HttpDirectoryClient};
pub use error::ClientError;
pub use latest::{RequestTracker, Ticket};
pub use paginated::PaginatedResult;
