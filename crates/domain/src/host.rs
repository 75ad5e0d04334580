//! Host entries of the directory.

use serde::{Deserialize, Serialize};

use crate::error::RcError;
use crate::id::validate_identifier;

/// Whether a host can currently be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Up,
    Down,
}

impl Reachability {
    #[must_use]
    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}

impl From<bool> for Reachability {
    fn from(reachable: bool) -> Self {
        if reachable { Self::Up } else { Self::Down }
    }
}

/// A known host and its network location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    pub id: String,
    pub address: Option<String>,
    pub reachability: Reachability,
}

impl HostEntry {
    /// Create a reachable host entry.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if `id` is not a valid identifier.
    pub fn new(id: impl Into<String>, address: Option<String>) -> Result<Self, RcError> {
        let id = id.into();
        validate_identifier(&id, false)?;
        Ok(Self {
            id,
            address,
            reachability: Reachability::Up,
        })
    }
}
