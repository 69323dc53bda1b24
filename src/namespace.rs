use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::storage::{RECORDS_PREFIX, SELECTED_PREFIX};
use crate::errors::TransferError;
use crate::types::StoreKey;

/// Training department that owns one record set and one selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// Lighting department.
    #[default]
    #[serde(rename = "LMP")]
    Lmp,
    /// Building department.
    #[serde(rename = "BMP")]
    Bmp,
}

impl Namespace {
    /// Every namespace, in toggle order.
    pub const ALL: [Namespace; 2] = [Namespace::Lmp, Namespace::Bmp];

    /// Key suffix and display label (`LMP` / `BMP`).
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Lmp => "LMP",
            Namespace::Bmp => "BMP",
        }
    }

    /// Store key for this namespace's record set.
    pub fn records_key(self) -> StoreKey {
        format!("{RECORDS_PREFIX}{}", self.as_str())
    }

    /// Store key for this namespace's selected product name.
    pub fn selection_key(self) -> StoreKey {
        format!("{SELECTED_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = TransferError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LMP" => Ok(Namespace::Lmp),
            "BMP" => Ok(Namespace::Bmp),
            other => Err(TransferError::Configuration(format!(
                "unknown namespace '{other}' (expected LMP or BMP)"
            ))),
        }
    }
}
