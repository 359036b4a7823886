//! Body weight timeline
//!
//! This module answers "what did I weigh on this day" for activity rows and
//! weight-ranked views. Biometric records are sorted once, most recent first,
//! and each lookup is a binary search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BiometricRecord;

/// One usable weight measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub date: DateTime<Utc>,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
}

/// Weight measurements ordered by date, most recent first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightTimeline {
    points: Vec<WeightPoint>,
}

impl WeightTimeline {
    /// Build the timeline, skipping records without a date or a positive weight
    pub fn new(records: &[BiometricRecord]) -> Self {
        let mut points: Vec<WeightPoint> = records
            .iter()
            .filter_map(|record| {
                Some(WeightPoint {
                    date: record.date()?,
                    weight_kg: record.weight_kg()?,
                    body_fat_pct: record.grasa_pct,
                })
            })
            .collect();

        // Stable sort keeps API order among same-instant measurements
        points.sort_by(|a, b| b.date.cmp(&a.date));

        let skipped = records.len() - points.len();
        if skipped > 0 {
            tracing::debug!(skipped, "biometric records without date or weight ignored");
        }

        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Most recent measurement
    pub fn latest(&self) -> Option<&WeightPoint> {
        self.points.first()
    }

    /// Most recent measurement taken at or before `date`
    pub fn point_as_of(&self, date: DateTime<Utc>) -> Option<&WeightPoint> {
        // Descending order: every point before the partition is later than `date`
        let idx = self.points.partition_point(|p| p.date > date);
        self.points.get(idx)
    }

    /// Weight (kg) as of `date`, `None` when the date predates every measurement
    pub fn weight_as_of(&self, date: DateTime<Utc>) -> Option<f64> {
        self.point_as_of(date).map(|p| p.weight_kg)
    }

    pub fn points(&self) -> &[WeightPoint] {
        &self.points
    }
}

/// Weight as of `date` over an unsorted biometric list.
///
/// Convenience for one-off lookups; build a [`WeightTimeline`] when looking up
/// many dates against the same list.
pub fn weight_as_of(date: DateTime<Utc>, records: &[BiometricRecord]) -> Option<f64> {
    WeightTimeline::new(records).weight_as_of(date)
}
