//! Adapter for reading dashboard API payloads into records
//!
//! The API returns plain JSON arrays, either bare or wrapped under `data`.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::schema::de::parse_timestamp;
use crate::types::{ActivityRecord, BiometricRecord, RecordId};

/// Adapter for converting API payloads to records
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON array of activity records
    pub fn parse_activities(json: &str) -> Result<Vec<ActivityRecord>, EngineError> {
        parse_array(json)
    }

    /// Parse a JSON array of biometric records
    pub fn parse_biometrics(json: &str) -> Result<Vec<BiometricRecord>, EngineError> {
        parse_array(json)
    }

    /// Parse activity records, treating an unreadable payload as an empty list.
    ///
    /// A failed fetch must still produce a valid (empty) dashboard.
    pub fn parse_activities_or_empty(json: &str) -> Vec<ActivityRecord> {
        Self::parse_activities(json).unwrap_or_else(|e| {
            warn!(error = %e, "activity payload unreadable, using empty list");
            Vec::new()
        })
    }

    /// Parse biometric records, treating an unreadable payload as an empty list
    pub fn parse_biometrics_or_empty(json: &str) -> Vec<BiometricRecord> {
        Self::parse_biometrics(json).unwrap_or_else(|e| {
            warn!(error = %e, "biometric payload unreadable, using empty list");
            Vec::new()
        })
    }

    /// Validate a batch of activity records; only failing records are returned
    pub fn validate_activities(records: &[ActivityRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let errors = validate_activity(record);
                (!errors.is_empty()).then(|| ValidationResult {
                    index: idx,
                    record_id: record.id.clone(),
                    errors,
                })
            })
            .collect()
    }

    /// Validate a batch of biometric records; only failing records are returned
    pub fn validate_biometrics(records: &[BiometricRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let errors = validate_biometric(record);
                (!errors.is_empty()).then(|| ValidationResult {
                    index: idx,
                    record_id: None,
                    errors,
                })
            })
            .collect()
    }
}

/// Accepts either a bare array or an object wrapping it under `data`
fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, EngineError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let array = match value {
        serde_json::Value::Array(items) => serde_json::Value::Array(items),
        serde_json::Value::Object(mut map) => match map.remove("data") {
            Some(inner @ serde_json::Value::Array(_)) => inner,
            _ => {
                return Err(EngineError::ParseError(
                    "expected a JSON array of records".to_string(),
                ))
            }
        },
        serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
        _ => {
            return Err(EngineError::ParseError(
                "expected a JSON array of records".to_string(),
            ))
        }
    };
    let records: Vec<T> = serde_json::from_value(array)?;
    debug!(count = records.len(), "parsed record array");
    Ok(records)
}

fn validate_activity(record: &ActivityRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match record.fecha.as_deref() {
        None => errors.push(ValidationError::MissingField("fecha")),
        Some(raw) => {
            if parse_timestamp(raw).is_err() {
                errors.push(ValidationError::InvalidDate(raw.to_string()));
            }
        }
    }

    if record.tipo.is_none() {
        errors.push(ValidationError::MissingField("tipo"));
    }

    let numeric = [
        ("distancia_km", record.distancia_km),
        ("duracion_min", record.duracion_min),
        ("elevacion_m", record.elevacion_m),
        ("calorias", record.calorias),
    ];
    for (field, value) in numeric {
        if let Some(v) = value {
            if v < 0.0 {
                errors.push(ValidationError::NegativeValue { field, value: v });
            }
        }
    }

    errors
}

fn validate_biometric(record: &BiometricRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match record.fecha.as_deref() {
        None => errors.push(ValidationError::MissingField("fecha")),
        Some(raw) => {
            if parse_timestamp(raw).is_err() {
                errors.push(ValidationError::InvalidDate(raw.to_string()));
            }
        }
    }

    match record.peso {
        None => errors.push(ValidationError::MissingField("peso")),
        Some(w) if w <= 0.0 => errors.push(ValidationError::NegativeValue {
            field: "peso",
            value: w,
        }),
        Some(_) => {}
    }

    errors
}

/// Result of record validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<RecordId>,
    pub errors: Vec<ValidationError>,
}

/// Validation errors for API records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unparseable date: {0}")]
    InvalidDate(String),

    #[error("Field {field} must not be negative (got {value})")]
    NegativeValue { field: &'static str, value: f64 },
}
