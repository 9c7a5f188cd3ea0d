use thiserror::Error;

use super::types::{FilterKey, ViewKind};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Location {path} does not belong to the {view} view")]
    WrongView { view: ViewKind, path: String },

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Filter '{key}' is not available on the {view} view")]
    UnsupportedKey { view: ViewKind, key: FilterKey },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Role '{role}' requires a {key} scope but the user has none")]
    MissingScope { role: crate::types::Role, key: FilterKey },
}
