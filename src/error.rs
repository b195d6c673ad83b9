use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CostHierarchyError {
    #[error("Invalid tolerance {0}: must not be negative")]
    InvalidTolerance(Decimal),

    #[error("Invalid unit price scale {0}: must be between 0 and 28")]
    InvalidUnitPriceScale(u32),

    #[error("Broken hierarchy at item {item}: {details}")]
    BrokenHierarchy { item: String, details: String },

    #[error("Unknown cost item: {0}")]
    UnknownItem(Uuid),

    #[error("Invalid billing month: {0}")]
    InvalidMonth(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CostHierarchyError>;
