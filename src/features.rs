//! Per-activity feature derivation
//!
//! This module derives the values every dashboard view needs from a raw
//! activity record:
//! - Normalized activity classification
//! - Body weight as of the activity date
//! - Pace (minutes per km)

use crate::normalizer::ActivityNormalizer;
use crate::types::{ActivityRecord, EnrichedActivity};
use crate::weight::WeightTimeline;

/// Feature deriver for computing enriched activities
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive features for one record at its position in the input array
    pub fn derive(index: usize, record: &ActivityRecord, weights: &WeightTimeline) -> EnrichedActivity {
        let date = record.date();
        let kind = ActivityNormalizer::normalize(record);
        let weight_kg = date.and_then(|d| weights.weight_as_of(d));
        let pace_min_per_km = compute_pace(record.distance_km(), record.duration_min());

        EnrichedActivity {
            index,
            record: record.clone(),
            date,
            kind,
            weight_kg,
            pace_min_per_km,
        }
    }

    /// Derive features for every record, preserving input order
    pub fn derive_all(records: &[ActivityRecord], weights: &WeightTimeline) -> Vec<EnrichedActivity> {
        let enriched: Vec<EnrichedActivity> = records
            .iter()
            .enumerate()
            .map(|(index, record)| Self::derive(index, record, weights))
            .collect();

        let undated = enriched.iter().filter(|a| a.date.is_none()).count();
        if undated > 0 {
            tracing::warn!(undated, "activities without a usable date");
        }
        tracing::debug!(count = enriched.len(), "derived activity features");

        enriched
    }
}

/// Pace in minutes per km; `None` unless both distance and duration are positive
pub fn compute_pace(distance_km: Option<f64>, duration_min: Option<f64>) -> Option<f64> {
    match (distance_km, duration_min) {
        (Some(dist), Some(dur)) if dist > 0.0 && dur > 0.0 => Some(dur / dist),
        _ => None,
    }
}

/// Speed in km/h; `None` unless both distance and duration are positive
pub fn compute_speed(distance_km: Option<f64>, duration_min: Option<f64>) -> Option<f64> {
    match (distance_km, duration_min) {
        (Some(dist), Some(dur)) if dist > 0.0 && dur > 0.0 => Some(dist / (dur / 60.0)),
        _ => None,
    }
}
