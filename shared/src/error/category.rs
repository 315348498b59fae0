//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 4xxx: Episode errors
/// - 5xxx: Order line errors
/// - 6xxx: Catalog errors
/// - 7xxx: Cabinet errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Episode errors (4xxx)
    Episode,
    /// Order line errors (5xxx)
    Line,
    /// Catalog errors (6xxx)
    Catalog,
    /// Cabinet stock errors (7xxx)
    Cabinet,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            4000..5000 => Self::Episode,
            5000..6000 => Self::Line,
            6000..7000 => Self::Catalog,
            7000..8000 => Self::Cabinet,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Episode => "episode",
            Self::Line => "line",
            Self::Catalog => "catalog",
            Self::Cabinet => "cabinet",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
