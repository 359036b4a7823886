//! Snapshot encoding
//!
//! This module renders a dashboard snapshot into the JSON payload consumed by
//! the presentation layers. Numeric values are pre-formatted the way the
//! activity table and KPI cards show them, so every surface displays the same
//! strings.

use serde::{Deserialize, Serialize};

use crate::aggregate::{DisciplineUsage, HeadlineUnit, TypeCount};
use crate::error::EngineError;
use crate::filters::FilterSelection;
use crate::format::{format_number, format_pace_or_speed, format_weight};
use crate::pipeline::DashboardSnapshot;
use crate::types::EnrichedActivity;
use crate::workload::{AcwrReport, LoadRatio};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Table row with display-ready values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub key: String,
    pub date: Option<String>,
    pub label: String,
    pub name: Option<String>,
    pub distance_km: String,
    pub duration_min: String,
    /// `m:ss` pace, or `x.y km/h` when pace is not meaningful
    pub pace: Option<String>,
    pub calories: String,
    pub weight_kg: String,
    pub heart_rate_avg: String,
    pub heart_rate_max: String,
    pub elevation_m: String,
    pub cadence: String,
    pub source: Option<String>,
}

impl ActivityRow {
    pub fn from_activity(activity: &EnrichedActivity) -> Self {
        let record = &activity.record;
        let distance = activity.distance_km();
        let duration = activity.duration_min();

        Self {
            key: activity.key(),
            date: activity.date.map(|d| d.to_rfc3339()),
            label: activity.kind.to_string(),
            name: record.nombre.clone(),
            distance_km: format_number(distance, 2),
            duration_min: format_number(duration, 0),
            pace: format_pace_or_speed(distance, duration),
            calories: format_number(record.calorias, 0),
            weight_kg: format_weight(activity.weight_kg),
            heart_rate_avg: format_number(record.fc_media, 0),
            heart_rate_max: format_number(record.fc_max, 0),
            elevation_m: format_number(activity.record.elevation_m(), 0),
            cadence: format_number(record.cadencia_media, 0),
            source: record.fuente.clone(),
        }
    }
}

/// Page position of the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

/// KPI strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiPayload {
    pub total_km: f64,
    pub total_hours: f64,
    pub count: usize,
    /// Headline figure with its unit, e.g. `"42.5 km"` or `"3.5 hrs"`
    pub headline: String,
}

/// One workload ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPayload {
    /// Two-decimal ratio
    pub ratio: String,
    pub acute_avg: f64,
    pub chronic_avg: f64,
}

impl From<&LoadRatio> for RatioPayload {
    fn from(ratio: &LoadRatio) -> Self {
        Self {
            ratio: ratio.display(),
            acute_avg: ratio.acute_avg,
            chronic_avg: ratio.chronic_avg,
        }
    }
}

/// Articular health card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrPayload {
    pub acwr: RatioPayload,
    pub acwr_road: RatioPayload,
    pub acwr_trail: RatioPayload,
    pub acwr_global: RatioPayload,
    pub status: String,
    pub color: String,
}

impl From<&AcwrReport> for AcwrPayload {
    fn from(report: &AcwrReport) -> Self {
        Self {
            acwr: (&report.headline).into(),
            acwr_road: (&report.by_discipline.road).into(),
            acwr_trail: (&report.by_discipline.trail).into(),
            acwr_global: (&report.global).into(),
            status: report.status.as_str().to_string(),
            color: report.status_color.clone(),
        }
    }
}

/// Latest weight card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPayload {
    pub weight_kg: String,
    pub date: Option<String>,
}

/// Full dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub producer: Producer,
    pub reference: String,
    pub filters: FilterSelection,
    pub page: PageInfo,
    pub rows: Vec<ActivityRow>,
    pub kpis: KpiPayload,
    pub acwr: AcwrPayload,
    pub available_types: Vec<String>,
    pub type_distribution: Vec<TypeCount>,
    pub discipline_usage: DisciplineUsage,
    pub latest_weight: WeightPayload,
}

/// Encoder for dashboard payloads
#[derive(Debug, Clone, Default)]
pub struct SnapshotEncoder {
    instance_id: Option<String>,
}

impl SnapshotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every payload with the embedding application's instance id
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id: Some(instance_id),
        }
    }

    /// Build the payload for a snapshot
    pub fn encode(&self, snapshot: &DashboardSnapshot) -> DashboardPayload {
        let producer = Producer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let kpis = &snapshot.kpis;
        let headline = match kpis.headline.unit {
            HeadlineUnit::Km => format!("{:.1} km", kpis.headline.value),
            HeadlineUnit::Hrs => format!("{:.1} hrs", kpis.headline.value),
        };

        let latest_weight = WeightPayload {
            weight_kg: format_weight(snapshot.latest_weight.map(|w| w.weight_kg)),
            date: snapshot.latest_weight.map(|w| w.date.to_rfc3339()),
        };

        DashboardPayload {
            producer,
            reference: snapshot.reference.to_rfc3339(),
            filters: snapshot.filters.clone(),
            page: PageInfo {
                page: snapshot.rows.page,
                total_pages: snapshot.rows.total_pages,
                total_items: snapshot.rows.total_items,
                page_size: snapshot.rows.page_size,
            },
            rows: snapshot.rows.items.iter().map(ActivityRow::from_activity).collect(),
            kpis: KpiPayload {
                total_km: kpis.total_km,
                total_hours: kpis.total_hours,
                count: kpis.count,
                headline,
            },
            acwr: (&snapshot.acwr).into(),
            available_types: snapshot
                .available_types
                .iter()
                .map(|k| k.to_string())
                .collect(),
            type_distribution: snapshot.type_distribution.clone(),
            discipline_usage: snapshot.discipline_usage,
            latest_weight,
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(&self, snapshot: &DashboardSnapshot) -> Result<String, EngineError> {
        let payload = self.encode(snapshot);
        serde_json::to_string_pretty(&payload).map_err(|e| EngineError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MISSING;
    use crate::pipeline::{compute_dashboard, DashboardQuery};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn make_snapshot() -> DashboardSnapshot {
        let activities = r#"[
            {"id": "g-1", "fecha": "2025-04-09T06:45:00Z", "tipo": "running", "nombre": "Series", "distancia_km": 10, "duracion_min": 55, "calorias": 640.4, "fc_media": 151, "fc_max": 178, "fuente": "garmin"},
            {"fecha": "2025-04-08T18:00:00Z", "tipo": "strength", "duracion_min": 45}
        ]"#;
        let biometrics = r#"[{"fecha": "2025-04-01", "peso": 70.24}]"#;
        let query = DashboardQuery::new(Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap());
        compute_dashboard(activities, biometrics, &query).unwrap()
    }

    #[test]
    fn test_rows_are_display_formatted() {
        let payload = SnapshotEncoder::new().encode(&make_snapshot());

        let expected = ActivityRow {
            key: "g-1".to_string(),
            date: Some("2025-04-09T06:45:00+00:00".to_string()),
            label: "Running Entreno".to_string(),
            name: Some("Series".to_string()),
            distance_km: "10.00".to_string(),
            duration_min: "55".to_string(),
            pace: Some("5:30".to_string()),
            calories: "640".to_string(),
            weight_kg: "70.2".to_string(),
            heart_rate_avg: "151".to_string(),
            heart_rate_max: "178".to_string(),
            elevation_m: "--".to_string(),
            cadence: "--".to_string(),
            source: Some("garmin".to_string()),
        };
        assert_eq!(payload.rows[0], expected);

        let strength = &payload.rows[1];
        assert_eq!(strength.key, "1");
        assert_eq!(strength.distance_km, MISSING);
        assert_eq!(strength.pace, None);
    }

    #[test]
    fn test_producer_and_cards() {
        let encoder = SnapshotEncoder::with_instance_id("ios-shell".to_string());
        let payload = encoder.encode(&make_snapshot());

        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, ENGINE_VERSION);
        assert_eq!(payload.producer.instance_id.as_deref(), Some("ios-shell"));
        assert_eq!(payload.kpis.headline, "10.0 km");
        assert_eq!(payload.kpis.total_hours, 1.7);
        assert_eq!(payload.latest_weight.weight_kg, "70.2");
        // The only run falls in the acute week
        assert_eq!(payload.acwr.status, "ZONA ROJA (PELIGRO)");
        assert_eq!(payload.acwr.acwr.ratio, "4.00");
        assert_eq!(payload.page.total_items, 2);
    }

    #[test]
    fn test_encode_to_json() {
        let json = SnapshotEncoder::new().encode_to_json(&make_snapshot()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("producer").is_some());
        assert!(parsed["producer"].get("instance_id").is_none());
        assert_eq!(parsed["filters"]["date"], "all");
        assert_eq!(parsed["filters"]["type"], "all");
        assert_eq!(parsed["acwr"]["color"], "#ff4b4b");
    }
}
