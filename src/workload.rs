//! Acute:Chronic Workload Ratio
//!
//! This module compares the last week's running volume against the last four
//! weeks' to flag injury risk. Load is distance (km) averaged per day over
//! each window; road and trail running are tracked separately because they
//! stress the joints differently.
//!
//! Everything is a pure function of the activity list and a reference time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ACUTE_WINDOW_DAYS, DEFAULT_CHRONIC_WINDOW_DAYS};
use crate::types::EnrichedActivity;

/// Ratio above which load is in the danger zone
pub const DANGER_RATIO: f64 = 1.5;

/// Ratio above which load is in the caution zone
pub const CAUTION_RATIO: f64 = 1.3;

/// Ratio below which load counts as under-training
pub const UNDERLOAD_RATIO: f64 = 0.8;

/// Risk band for a workload ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcwrStatus {
    #[serde(rename = "ZONA ROJA (PELIGRO)")]
    Danger,
    #[serde(rename = "ZONA AMARILLA")]
    Caution,
    #[serde(rename = "BAJA CARGA")]
    Underload,
    #[serde(rename = "ZONA VERDE")]
    Safe,
}

impl AcwrStatus {
    /// Band a ratio; under-load requires some chronic history
    pub fn classify(ratio: f64, chronic_avg: f64) -> Self {
        if ratio > DANGER_RATIO {
            AcwrStatus::Danger
        } else if ratio > CAUTION_RATIO {
            AcwrStatus::Caution
        } else if ratio < UNDERLOAD_RATIO && chronic_avg > 0.0 {
            AcwrStatus::Underload
        } else {
            AcwrStatus::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AcwrStatus::Danger => "ZONA ROJA (PELIGRO)",
            AcwrStatus::Caution => "ZONA AMARILLA",
            AcwrStatus::Underload => "BAJA CARGA",
            AcwrStatus::Safe => "ZONA VERDE",
        }
    }

    /// Dashboard accent color for the band
    pub fn color(&self) -> &'static str {
        match self {
            AcwrStatus::Danger => "#ff4b4b",
            AcwrStatus::Caution => "#ffd60a",
            AcwrStatus::Underload => "#00d2ff",
            AcwrStatus::Safe => "#00ffaa",
        }
    }
}

/// Acute and chronic daily averages and their ratio
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadRatio {
    /// Mean km/day over the acute window
    pub acute_avg: f64,
    /// Mean km/day over the chronic window
    pub chronic_avg: f64,
    /// acute / chronic, 0 when there is no chronic load
    pub ratio: f64,
    /// Activities inside the chronic window
    pub sessions: usize,
}

impl LoadRatio {
    /// Ratio rounded to two decimals for display
    pub fn display(&self) -> String {
        format!("{:.2}", self.ratio)
    }
}

/// Per-discipline ratios
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisciplineRatios {
    pub road: LoadRatio,
    pub trail: LoadRatio,
}

/// Full workload report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrReport {
    /// All activities with a distance
    pub global: LoadRatio,
    pub by_discipline: DisciplineRatios,
    /// Headline ratio: the riskier discipline, or global without running history
    pub headline: LoadRatio,
    pub status: AcwrStatus,
    pub status_color: String,
}

/// Workload ratio calculator
#[derive(Debug, Clone, Copy)]
pub struct AcwrCalculator {
    acute_days: i64,
    chronic_days: i64,
}

impl Default for AcwrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl AcwrCalculator {
    /// Create with the standard 7/28 day windows
    pub const fn new() -> Self {
        Self {
            acute_days: DEFAULT_ACUTE_WINDOW_DAYS,
            chronic_days: DEFAULT_CHRONIC_WINDOW_DAYS,
        }
    }

    /// Create with custom window lengths (days)
    pub const fn with_windows(acute_days: i64, chronic_days: i64) -> Self {
        Self {
            acute_days,
            chronic_days,
        }
    }

    /// Compute global, road and trail ratios as of `reference`
    pub fn compute(&self, activities: &[EnrichedActivity], reference: DateTime<Utc>) -> AcwrReport {
        let global = self.ratio(activities.iter(), reference);
        let road = self.ratio(activities.iter().filter(|a| a.kind.is_road_running()), reference);
        let trail = self.ratio(activities.iter().filter(|a| a.kind.is_trail()), reference);

        let headline = if road.sessions == 0 && trail.sessions == 0 {
            global
        } else if trail.ratio > road.ratio {
            trail
        } else {
            road
        };

        let status = AcwrStatus::classify(headline.ratio, headline.chronic_avg);
        tracing::debug!(
            ratio = headline.ratio,
            status = status.as_str(),
            "computed workload ratio"
        );

        AcwrReport {
            global,
            by_discipline: DisciplineRatios { road, trail },
            headline,
            status,
            status_color: status.color().to_string(),
        }
    }

    fn ratio<'a>(
        &self,
        activities: impl Iterator<Item = &'a EnrichedActivity>,
        reference: DateTime<Utc>,
    ) -> LoadRatio {
        let acute_start = reference - Duration::days(self.acute_days);
        let chronic_start = reference - Duration::days(self.chronic_days);

        let mut acute_km = 0.0;
        let mut chronic_km = 0.0;
        let mut sessions = 0;

        for activity in activities {
            let Some(date) = activity.date else { continue };
            if date > reference || date <= chronic_start {
                continue;
            }
            sessions += 1;
            let km = activity.distance_km().unwrap_or(0.0);
            chronic_km += km;
            if date > acute_start {
                acute_km += km;
            }
        }

        let acute_avg = daily_average(acute_km, self.acute_days);
        let chronic_avg = daily_average(chronic_km, self.chronic_days);
        let ratio = if chronic_avg > 0.0 {
            acute_avg / chronic_avg
        } else {
            0.0
        };

        LoadRatio {
            acute_avg,
            chronic_avg,
            ratio,
            sessions,
        }
    }
}

/// Mean km per day; an empty window has no load
fn daily_average(km: f64, days: i64) -> f64 {
    if days > 0 {
        km / days as f64
    } else {
        0.0
    }
}

/// Compute the workload report with the standard windows
pub fn compute_acwr(activities: &[EnrichedActivity], reference: DateTime<Utc>) -> AcwrReport {
    AcwrCalculator::new().compute(activities, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureDeriver;
    use crate::types::ActivityRecord;
    use crate::weight::WeightTimeline;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    fn activity(days_ago: i64, tipo: &str, km: f64) -> ActivityRecord {
        let date = reference() - Duration::days(days_ago) - Duration::hours(1);
        ActivityRecord {
            fecha: Some(date.to_rfc3339()),
            tipo: Some(tipo.to_string()),
            distancia_km: Some(km),
            ..Default::default()
        }
    }

    fn enrich(records: &[ActivityRecord]) -> Vec<EnrichedActivity> {
        FeatureDeriver::derive_all(records, &WeightTimeline::default())
    }

    #[test]
    fn test_empty_input_is_safe_zone() {
        let report = compute_acwr(&[], reference());
        assert_eq!(report.headline.ratio, 0.0);
        assert_eq!(report.status, AcwrStatus::Safe);
        assert_eq!(report.status.as_str(), "ZONA VERDE");
    }

    #[test]
    fn test_old_activities_give_zero_ratio() {
        let records = vec![activity(30, "running", 10.0), activity(45, "trail", 20.0)];
        let report = compute_acwr(&enrich(&records), reference());

        assert_eq!(report.global.chronic_avg, 0.0);
        assert_eq!(report.headline.ratio, 0.0);
        assert!(report.headline.ratio.is_finite());
        assert_eq!(report.status, AcwrStatus::Safe);
    }

    #[test]
    fn test_danger_zone_at_ratio_two() {
        // 84 km in the last week (12/day) and 168 km over 28 days (6/day)
        let mut records = Vec::new();
        for day in 0..7 {
            records.push(activity(day, "running", 12.0));
        }
        for day in 7..14 {
            records.push(activity(day, "running", 12.0));
        }

        let report = compute_acwr(&enrich(&records), reference());

        assert!((report.global.acute_avg - 12.0).abs() < 1e-9);
        assert!((report.global.chronic_avg - 6.0).abs() < 1e-9);
        assert!((report.headline.ratio - 2.0).abs() < 1e-9);
        assert_eq!(report.status, AcwrStatus::Danger);
        assert_eq!(report.status_color, "#ff4b4b");
        assert_eq!(report.headline.display(), "2.00");
    }

    #[test]
    fn test_headline_is_riskier_discipline() {
        let records = vec![
            // Road: steady volume spread across the month
            activity(2, "running", 8.0),
            activity(9, "running", 8.0),
            activity(16, "running", 8.0),
            activity(23, "running", 8.0),
            // Trail: everything this week
            activity(1, "trail_running", 20.0),
        ];

        let report = compute_acwr(&enrich(&records), reference());

        assert!((report.by_discipline.road.ratio - 1.0).abs() < 1e-9);
        assert!((report.by_discipline.trail.ratio - 4.0).abs() < 1e-9);
        assert_eq!(report.headline, report.by_discipline.trail);
        assert_eq!(report.status, AcwrStatus::Danger);
    }

    #[test]
    fn test_global_fallback_without_running() {
        let records = vec![activity(1, "cycling", 40.0), activity(20, "cycling", 40.0)];
        let report = compute_acwr(&enrich(&records), reference());

        assert_eq!(report.by_discipline.road.sessions, 0);
        assert_eq!(report.by_discipline.trail.sessions, 0);
        assert_eq!(report.headline, report.global);
        // 40/7 vs 80/28 = 2.0
        assert_eq!(report.status, AcwrStatus::Danger);
    }

    #[test]
    fn test_future_activities_ignored() {
        let records = vec![activity(-3, "running", 50.0)];
        let report = compute_acwr(&enrich(&records), reference());
        assert_eq!(report.global.sessions, 0);
        assert_eq!(report.global.ratio, 0.0);
    }

    #[test]
    fn test_status_banding() {
        assert_eq!(AcwrStatus::classify(1.51, 5.0), AcwrStatus::Danger);
        assert_eq!(AcwrStatus::classify(1.5, 5.0), AcwrStatus::Caution);
        assert_eq!(AcwrStatus::classify(1.31, 5.0), AcwrStatus::Caution);
        assert_eq!(AcwrStatus::classify(1.3, 5.0), AcwrStatus::Safe);
        assert_eq!(AcwrStatus::classify(0.8, 5.0), AcwrStatus::Safe);
        assert_eq!(AcwrStatus::classify(0.5, 5.0), AcwrStatus::Underload);
        assert_eq!(AcwrStatus::classify(0.0, 0.0), AcwrStatus::Safe);
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&AcwrStatus::Underload).unwrap();
        assert_eq!(json, "\"BAJA CARGA\"");
    }

    #[test]
    fn test_empty_windows_stay_finite() {
        let records = vec![activity(1, "running", 10.0), activity(10, "trail", 6.0)];
        let enriched = enrich(&records);

        for calc in [AcwrCalculator::with_windows(0, 28), AcwrCalculator::with_windows(0, 0)] {
            let report = calc.compute(&enriched, reference());
            for ratio in [report.global, report.by_discipline.road, report.by_discipline.trail] {
                assert!(ratio.acute_avg.is_finite());
                assert!(ratio.chronic_avg.is_finite());
                assert!(ratio.ratio.is_finite());
            }
        }

        let report = AcwrCalculator::with_windows(0, 28).compute(&enriched, reference());
        assert_eq!(report.global.acute_avg, 0.0);
        assert_eq!(report.status, AcwrStatus::Underload);
    }

    #[test]
    fn test_custom_windows() {
        let records = vec![activity(1, "running", 14.0), activity(10, "running", 14.0)];
        let calc = AcwrCalculator::with_windows(14, 28);
        let report = calc.compute(&enrich(&records), reference());
        // 28/14 vs 28/28
        assert!((report.global.ratio - 2.0).abs() < 1e-9);
    }
}
