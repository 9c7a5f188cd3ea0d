pub mod types;
pub mod codec;
pub mod cascade;
pub mod navigator;
pub mod policy;
pub mod search;
pub mod error;

pub use types::*;
pub use codec::{Location, QueryCodec};
pub use error::{FilterError, PolicyError};
pub use navigator::Navigator;
pub use policy::Access;
pub use search::{DebouncedSearch, SearchBridge, SearchState};
