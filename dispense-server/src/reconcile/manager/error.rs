use super::super::ledger::LedgerError;
use super::super::storage::StorageError;
use crate::cabinet::CabinetError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // ===== ValidationError =====
    #[error("Item codes not found in catalog: {0:?}")]
    InvalidItemCodes(Vec<String>),

    #[error("Submission carries no order lines")]
    EmptySubmission,

    #[error("Department could not be resolved: {0:?}")]
    DepartmentUnresolved(Option<String>),

    #[error("New lines need a positive quantity: {0:?}")]
    QuantityRequired(Vec<String>),

    #[error("Quantity must be greater than zero")]
    QuantityNotPositive,

    #[error("Order line {0} is discontinued")]
    LineDiscontinued(u64),

    #[error("No targeted line is eligible for cancellation")]
    NoEligibleLines,

    #[error("Cancel targets span more than one episode: {0:?}")]
    TargetsSpanEpisodes(Vec<u64>),

    #[error("Stock unit {0} is already dispensed")]
    StockUnitAlreadyDispensed(String),

    #[error("Stock unit {0} is already in the cabinet")]
    StockUnitAlreadyInCabinet(String),

    #[error("{field} is required")]
    RequiredField { field: &'static str },

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    // ===== QuantityError =====
    #[error("Quantity {requested} exceeds pending {pending} on line {line_id}")]
    QuantityExceedsOrdered {
        line_id: u64,
        requested: u32,
        pending: u32,
    },

    // ===== NotFoundError =====
    #[error("Episode not found: {0}")]
    EpisodeNotFound(String),

    #[error("Order line not found: {0}")]
    LineNotFound(u64),

    #[error("Stock unit not found: {0}")]
    StockUnitNotFound(String),

    // ===== ConflictError =====
    #[error("Line {line_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        line_id: u64,
        expected: u64,
        actual: u64,
    },

    #[error("Stock unit already registered: {0}")]
    StockUnitExists(String),
}

/// Error taxonomy seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Quantity,
    NotFound,
    Conflict,
    Storage,
}

impl ManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidItemCodes(_)
            | Self::EmptySubmission
            | Self::DepartmentUnresolved(_)
            | Self::QuantityRequired(_)
            | Self::QuantityNotPositive
            | Self::LineDiscontinued(_)
            | Self::NoEligibleLines
            | Self::TargetsSpanEpisodes(_)
            | Self::StockUnitAlreadyDispensed(_)
            | Self::StockUnitAlreadyInCabinet(_)
            | Self::RequiredField { .. }
            | Self::MalformedRequest(_) => ErrorKind::Validation,
            Self::QuantityExceedsOrdered { .. } => ErrorKind::Quantity,
            Self::EpisodeNotFound(_) | Self::LineNotFound(_) | Self::StockUnitNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::VersionConflict { .. } | Self::StockUnitExists(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Storage(e) => classify_storage_error(e),
            Self::InvalidItemCodes(_) => ErrorCode::InvalidItemCodes,
            Self::EmptySubmission => ErrorCode::EmptySubmission,
            Self::DepartmentUnresolved(_) => ErrorCode::DepartmentUnresolved,
            Self::QuantityRequired(_) => ErrorCode::QuantityRequired,
            Self::QuantityNotPositive => ErrorCode::QuantityNotPositive,
            Self::LineDiscontinued(_) => ErrorCode::LineDiscontinued,
            Self::NoEligibleLines => ErrorCode::NoEligibleLines,
            Self::TargetsSpanEpisodes(_) => ErrorCode::TargetsSpanEpisodes,
            Self::StockUnitAlreadyDispensed(_) => ErrorCode::StockUnitAlreadyDispensed,
            Self::StockUnitAlreadyInCabinet(_) => ErrorCode::StockUnitAlreadyInCabinet,
            Self::RequiredField { .. } => ErrorCode::RequiredField,
            Self::MalformedRequest(_) => ErrorCode::InvalidRequest,
            Self::QuantityExceedsOrdered { .. } => ErrorCode::QuantityExceedsOrdered,
            Self::EpisodeNotFound(_) => ErrorCode::EpisodeNotFound,
            Self::LineNotFound(_) => ErrorCode::LineNotFound,
            Self::StockUnitNotFound(_) => ErrorCode::StockUnitNotFound,
            Self::VersionConflict { .. } => ErrorCode::LineVersionConflict,
            Self::StockUnitExists(_) => ErrorCode::StockUnitExists,
        }
    }

    /// Structured detail for the caller and the audit journal
    pub fn detail(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Self::InvalidItemCodes(codes) => json!({ "invalid_codes": codes }),
            Self::QuantityRequired(codes) => json!({ "item_codes": codes }),
            Self::DepartmentUnresolved(hint) => json!({ "department_hint": hint }),
            Self::LineDiscontinued(id) | Self::LineNotFound(id) => json!({ "line_id": id }),
            Self::TargetsSpanEpisodes(ids) => json!({ "episode_ids": ids }),
            Self::QuantityExceedsOrdered {
                line_id,
                requested,
                pending,
            } => json!({ "line_id": line_id, "requested": requested, "pending": pending }),
            Self::VersionConflict {
                line_id,
                expected,
                actual,
            } => json!({ "line_id": line_id, "expected_version": expected, "actual_version": actual }),
            Self::EpisodeNotFound(reference) => json!({ "episode": reference }),
            Self::StockUnitNotFound(rfid)
            | Self::StockUnitExists(rfid)
            | Self::StockUnitAlreadyDispensed(rfid)
            | Self::StockUnitAlreadyInCabinet(rfid) => json!({ "rfid": rfid }),
            Self::RequiredField { field } => json!({ "field": field }),
            Self::MalformedRequest(reason) => json!({ "reason": reason }),
            _ => serde_json::Value::Null,
        }
    }
}

/// Map storage failures onto error codes
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) | StorageError::DanglingIndex { .. } => {
            return ErrorCode::StorageCorrupted;
        }
        StorageError::Transaction(_) => return ErrorCode::SystemBusy,
        _ => {}
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::DatabaseError
}

impl From<LedgerError> for ManagerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotPositive => ManagerError::QuantityNotPositive,
            LedgerError::Cancelled(id) => ManagerError::LineDiscontinued(id),
            LedgerError::ExceedsOrdered {
                line_id,
                requested,
                pending,
            } => ManagerError::QuantityExceedsOrdered {
                line_id,
                requested,
                pending,
            },
        }
    }
}

impl From<CabinetError> for ManagerError {
    fn from(err: CabinetError) -> Self {
        match err {
            CabinetError::Storage(e) => ManagerError::Storage(e),
            CabinetError::NotFound(rfid) => ManagerError::StockUnitNotFound(rfid),
            CabinetError::AlreadyRegistered(rfid) => ManagerError::StockUnitExists(rfid),
            CabinetError::AlreadyDispensed(rfid) => ManagerError::StockUnitAlreadyDispensed(rfid),
            CabinetError::AlreadyInCabinet(rfid) => ManagerError::StockUnitAlreadyInCabinet(rfid),
            CabinetError::MissingField => ManagerError::RequiredField {
                field: "rfid and item_code",
            },
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let code = err.code();
        if err.kind() == ErrorKind::Storage {
            tracing::error!(error = %err, error_code = %code, "Storage error occurred");
        }
        let detail = err.detail();
        let mut app = AppError::with_message(code, err.to_string());
        if let serde_json::Value::Object(map) = detail {
            for (key, value) in map {
                app = app.with_detail(key, value);
            }
        }
        app
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
