use thiserror::Error;

/// Error type shared across the COSEM stack.
#[derive(Error, Debug)]
pub enum CosemError {
    #[error("invalid attribute index {index}, object has {count} attributes")]
    InvalidAttributeIndex { index: u8, count: u8 },

    #[error("invalid method index {index}, object has {count} methods")]
    InvalidMethodIndex { index: u8, count: u8 },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("invalid logical name: {0}")]
    InvalidLogicalName(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type alias used across the COSEM stack.
pub type CosemResult<T> = Result<T, CosemError>;
