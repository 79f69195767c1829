// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three sensitivity levels which can be attached to a resource. Greater levels are assumed to
/// be more restrictive than all lower ones.
///
/// Low < Medium < High
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sensitivity {
    /// Data which may be shared widely, for example with marketing or field partners.
    Low,

    /// Default classification for most project data.
    Medium,

    /// Data which could endanger people or partners when leaked.
    High,
}

impl Sensitivity {
    /// All levels in ascending order.
    pub const ALL: [Sensitivity; 3] = [Sensitivity::Low, Sensitivity::Medium, Sensitivity::High];

    /// Numeric rank of this level, starting with `Low = 1`.
    pub fn rank(self) -> u8 {
        match self {
            Sensitivity::Low => 1,
            Sensitivity::Medium => 2,
            Sensitivity::High => 3,
        }
    }

    /// Returns `true` if this level is at or below the given threshold.
    pub fn at_most(self, threshold: Sensitivity) -> bool {
        self.rank() <= threshold.rank()
    }

    /// Returns the more sensitive of both levels.
    pub fn most_sensitive(self, other: Sensitivity) -> Sensitivity {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }
}

/// Returns `true` if `a` is at or below `b`.
pub fn at_most(a: Sensitivity, b: Sensitivity) -> bool {
    a.at_most(b)
}

impl Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sensitivity::Low => "Low",
            Sensitivity::Medium => "Medium",
            Sensitivity::High => "High",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for Sensitivity {
    type Err = SensitivityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            _ => Err(SensitivityError::Unknown(value.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SensitivityError {
    #[error("unknown sensitivity level '{0}', expected one of Low, Medium, High")]
    Unknown(String),
}
