//! Error types for BioEngine Analytics
//!
//! Errors only surface at the edges of the engine (parsing input, selecting
//! filters, loading configuration). The computations themselves are total.

use thiserror::Error;

/// Errors that can occur around the analytics engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid filter selector: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid calendar month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
