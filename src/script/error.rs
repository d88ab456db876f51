use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a program was rejected
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidCode {
    TooLong { chars: usize, max: usize },
    InfiniteLoop { pattern: String },
    UnsupportedConditional,
    TooManyActions { count: usize, max: usize },
}

impl InvalidCode {
    /// Player-facing crash message
    pub fn crash_message(&self) -> &'static str {
        match self {
            Self::TooLong { .. } | Self::TooManyActions { .. } => {
                "Poor performance detected, game crashed."
            }
            Self::InfiniteLoop { .. } => "Infinite loop detected, game crashed.",
            Self::UnsupportedConditional => "Could not interpret your logic.",
        }
    }
}

impl fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { chars, max } => {
                write!(f, "program is {chars} characters long (max {max})")
            }
            Self::InfiniteLoop { pattern } => {
                write!(f, "infinite loop detected: `{pattern}`")
            }
            Self::UnsupportedConditional => {
                write!(f, "conditional logic without any recognised action")
            }
            Self::TooManyActions { count, max } => {
                write!(f, "program has {count} actions (max {max})")
            }
        }
    }
}

impl std::error::Error for InvalidCode {}
