//! Shared types used across the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::filter::FilterKey;

/// Portal roles, broadest scope first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pastor,
    ChurchPastor,
    FellowshipLeader,
    CellLeader,
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pastor => "pastor",
            Role::ChurchPastor => "church_pastor",
            Role::FellowshipLeader => "fellowship_leader",
            Role::CellLeader => "cell_leader",
            Role::Other => "other",
        }
    }

    /// Scope keys pinned to the user's own ids for this role.
    pub fn forced_keys(&self) -> &'static [FilterKey] {
        match self {
            Role::Admin | Role::Pastor => &[],
            Role::ChurchPastor => &[FilterKey::Church],
            Role::FellowshipLeader => &[FilterKey::Church, FilterKey::Fellowship],
            Role::CellLeader | Role::Other => {
                &[FilterKey::Church, FilterKey::Fellowship, FilterKey::Cell]
            }
        }
    }

    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Admin | Role::Pastor)
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    /// Unrecognised role names map to [`Role::Other`], the narrowest scope.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "pastor" => Role::Pastor,
            "church_pastor" => Role::ChurchPastor,
            "fellowship_leader" => Role::FellowshipLeader,
            "cell_leader" => Role::CellLeader,
            _ => Role::Other,
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The organisational units an authenticated user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScope {
    pub church: Option<String>,
    pub fellowship: Option<String>,
    pub cell: Option<String>,
}

impl UserScope {
    pub fn id_for(&self, key: FilterKey) -> Option<&str> {
        match key {
            FilterKey::Church => self.church.as_deref(),
            FilterKey::Fellowship => self.fellowship.as_deref(),
            FilterKey::Cell => self.cell.as_deref(),
            _ => None,
        }
    }
}
