//! Unified error codes for the dispensing reconciliation service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Episode errors
//! - 5xxx: Order line / quantity ledger errors
//! - 6xxx: Catalog errors
//! - 7xxx: Cabinet stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Query or payload failed a validation rule
    ValidationFailed = 2,
    /// Body could not be decoded into the operation's request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 4xxx: Episode ====================
    /// Episode not found
    EpisodeNotFound = 4001,
    /// Submission carries no order lines
    EmptySubmission = 4002,
    /// Department hint could not be resolved
    DepartmentUnresolved = 4003,
    /// None of the targeted lines can be cancelled
    NoEligibleLines = 4004,
    /// Cancel targets belong to more than one episode
    TargetsSpanEpisodes = 4005,

    // ==================== 5xxx: Order line ====================
    /// Order line not found
    LineNotFound = 5001,
    /// used + returned would exceed the ordered quantity
    QuantityExceedsOrdered = 5002,
    /// Quantity must be greater than zero
    QuantityNotPositive = 5003,
    /// Line has been discontinued
    LineDiscontinued = 5004,
    /// Line version does not match the expected version
    LineVersionConflict = 5005,
    /// New line is missing its ordered quantity
    QuantityRequired = 5006,

    // ==================== 6xxx: Catalog ====================
    /// One or more item codes are not in the product catalog
    InvalidItemCodes = 6001,

    // ==================== 7xxx: Cabinet ====================
    /// Stock unit not found
    StockUnitNotFound = 7001,
    /// Stock unit is already dispensed
    StockUnitAlreadyDispensed = 7002,
    /// Stock unit is already in the cabinet
    StockUnitAlreadyInCabinet = 7003,
    /// Stock unit already registered
    StockUnitExists = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Storage corrupted
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Request body could not be decoded",
            ErrorCode::RequiredField => "Required field missing",

            // Episode
            ErrorCode::EpisodeNotFound => "Episode not found",
            ErrorCode::EmptySubmission => "Submission carries no order lines",
            ErrorCode::DepartmentUnresolved => "Department could not be resolved",
            ErrorCode::NoEligibleLines => "No targeted line is eligible for cancellation",
            ErrorCode::TargetsSpanEpisodes => "Cancel targets span more than one episode",

            // Order line
            ErrorCode::LineNotFound => "Order line not found",
            ErrorCode::QuantityExceedsOrdered => "Quantity would exceed the ordered quantity",
            ErrorCode::QuantityNotPositive => "Quantity must be greater than zero",
            ErrorCode::LineDiscontinued => "Order line is discontinued",
            ErrorCode::LineVersionConflict => "Order line version conflict",
            ErrorCode::QuantityRequired => "Ordered quantity is required for new lines",

            // Catalog
            ErrorCode::InvalidItemCodes => "Item codes not found in catalog",

            // Cabinet
            ErrorCode::StockUnitNotFound => "Stock unit not found",
            ErrorCode::StockUnitAlreadyDispensed => "Stock unit is already dispensed",
            ErrorCode::StockUnitAlreadyInCabinet => "Stock unit is already in the cabinet",
            ErrorCode::StockUnitExists => "Stock unit already registered",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageCorrupted => "Storage corrupted",
            ErrorCode::SystemBusy => "System busy, retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Episode
            4001 => Ok(ErrorCode::EpisodeNotFound),
            4002 => Ok(ErrorCode::EmptySubmission),
            4003 => Ok(ErrorCode::DepartmentUnresolved),
            4004 => Ok(ErrorCode::NoEligibleLines),
            4005 => Ok(ErrorCode::TargetsSpanEpisodes),

            // Order line
            5001 => Ok(ErrorCode::LineNotFound),
            5002 => Ok(ErrorCode::QuantityExceedsOrdered),
            5003 => Ok(ErrorCode::QuantityNotPositive),
            5004 => Ok(ErrorCode::LineDiscontinued),
            5005 => Ok(ErrorCode::LineVersionConflict),
            5006 => Ok(ErrorCode::QuantityRequired),

            // Catalog
            6001 => Ok(ErrorCode::InvalidItemCodes),

            // Cabinet
            7001 => Ok(ErrorCode::StockUnitNotFound),
            7002 => Ok(ErrorCode::StockUnitAlreadyDispensed),
            7003 => Ok(ErrorCode::StockUnitAlreadyInCabinet),
            7004 => Ok(ErrorCode::StockUnitExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::InvalidRequest.code(), 5);
        assert_eq!(ErrorCode::EpisodeNotFound.code(), 4001);
        assert_eq!(ErrorCode::QuantityExceedsOrdered.code(), 5002);
        assert_eq!(ErrorCode::InvalidItemCodes.code(), 6001);
        assert_eq!(ErrorCode::StockUnitNotFound.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::LineNotFound).unwrap();
        assert_eq!(json, "5001");

        let json = serde_json::to_string(&ErrorCode::Success).unwrap();
        assert_eq!(json, "0");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(code, ErrorCode::InvalidItemCodes);

        let code: ErrorCode = serde_json::from_str("9404").unwrap();
        assert_eq!(code, ErrorCode::SystemBusy);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());

        // retired general codes stay unassigned
        let result: Result<ErrorCode, _> = serde_json::from_str("1");
        assert!(result.is_err());

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::LineDiscontinued), "5004");
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }

    #[test]
    fn test_every_code_converts_back() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidRequest,
            ErrorCode::RequiredField,
            ErrorCode::EpisodeNotFound,
            ErrorCode::EmptySubmission,
            ErrorCode::DepartmentUnresolved,
            ErrorCode::NoEligibleLines,
            ErrorCode::TargetsSpanEpisodes,
            ErrorCode::LineNotFound,
            ErrorCode::QuantityExceedsOrdered,
            ErrorCode::QuantityNotPositive,
            ErrorCode::LineDiscontinued,
            ErrorCode::LineVersionConflict,
            ErrorCode::QuantityRequired,
            ErrorCode::InvalidItemCodes,
            ErrorCode::StockUnitNotFound,
            ErrorCode::StockUnitAlreadyDispensed,
            ErrorCode::StockUnitAlreadyInCabinet,
            ErrorCode::StockUnitExists,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::StorageCorrupted,
            ErrorCode::SystemBusy,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }
}
