//! Core types for the BioEngine analytics pipeline
//!
//! This module defines the records received from the dashboard API, the typed
//! activity classification, and the per-activity derived view that flows
//! through filtering, ranking and aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::schema::de;

/// Opaque record identifier as served by the API (numeric or text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Activity record as received from the API.
///
/// Every field is optional and kept exactly as received; numeric fields accept
/// numbers or numeric strings. Use the accessor methods to read values that are
/// safe to compute with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "de::lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Activity timestamp (ISO-8601)
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    /// Raw activity type (provider or locale specific)
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    /// Free-text activity name
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub distancia_km: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub duracion_min: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub calorias: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub elevacion_m: Option<f64>,
    /// Average heart rate (bpm)
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub fc_media: Option<f64>,
    /// Max heart rate (bpm)
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub fc_max: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub cadencia_media: Option<f64>,
    /// Data source (garmin, apple, runkeeper, ...)
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub fuente: Option<String>,
}

impl ActivityRecord {
    /// Parsed activity timestamp, `None` when absent or unparseable
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.fecha.as_deref().and_then(|s| de::parse_timestamp(s).ok())
    }

    /// Distance in km, only when it is a usable non-negative number
    pub fn distance_km(&self) -> Option<f64> {
        non_negative(self.distancia_km)
    }

    /// Duration in minutes, only when it is a usable non-negative number
    pub fn duration_min(&self) -> Option<f64> {
        non_negative(self.duracion_min)
    }

    /// Elevation gain in meters, only when it is a usable non-negative number
    pub fn elevation_m(&self) -> Option<f64> {
        non_negative(self.elevacion_m)
    }
}

/// Body composition record as received from the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiometricRecord {
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    /// Body weight (kg)
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub peso: Option<f64>,
    /// Body fat (percentage)
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub grasa_pct: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64", skip_serializing_if = "Option::is_none")]
    pub masa_muscular_kg: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_string", skip_serializing_if = "Option::is_none")]
    pub fuente: Option<String>,
}

impl BiometricRecord {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.fecha.as_deref().and_then(|s| de::parse_timestamp(s).ok())
    }

    /// Weight in kg, only when strictly positive
    pub fn weight_kg(&self) -> Option<f64> {
        self.peso.filter(|w| w.is_finite() && *w > 0.0)
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Normalized activity classification.
///
/// Serializes to (and displays as) the dashboard label, e.g. `"Trail Running"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityKind {
    Caminata,
    Ciclismo,
    FuerzaYCardio,
    Natacion,
    Yoga,
    Respiracion,
    Tenis,
    TrailRunning,
    HikingSenderismo,
    RunningEntreno,
    FondoLargo,
    CompeticionCalle,
    /// No type present on the record ("Otros")
    Unspecified,
    /// Unknown provider type, title-cased
    Other(String),
}

impl ActivityKind {
    /// All canonical kinds (everything but `Other`)
    pub const CANONICAL: [ActivityKind; 13] = [
        ActivityKind::Caminata,
        ActivityKind::Ciclismo,
        ActivityKind::FuerzaYCardio,
        ActivityKind::Natacion,
        ActivityKind::Yoga,
        ActivityKind::Respiracion,
        ActivityKind::Tenis,
        ActivityKind::TrailRunning,
        ActivityKind::HikingSenderismo,
        ActivityKind::RunningEntreno,
        ActivityKind::FondoLargo,
        ActivityKind::CompeticionCalle,
        ActivityKind::Unspecified,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::Caminata => "Caminata",
            ActivityKind::Ciclismo => "Ciclismo",
            ActivityKind::FuerzaYCardio => "Fuerza y Cardio",
            ActivityKind::Natacion => "Natación",
            ActivityKind::Yoga => "Yoga",
            ActivityKind::Respiracion => "Respiración",
            ActivityKind::Tenis => "Tenis",
            ActivityKind::TrailRunning => "Trail Running",
            ActivityKind::HikingSenderismo => "Hiking/Senderismo",
            ActivityKind::RunningEntreno => "Running Entreno",
            ActivityKind::FondoLargo => "Fondo Largo",
            ActivityKind::CompeticionCalle => "Competición Calle",
            ActivityKind::Unspecified => "Otros",
            ActivityKind::Other(label) => label.as_str(),
        }
    }

    /// Map a dashboard label back to its kind; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        Self::CANONICAL
            .iter()
            .find(|kind| kind.as_str() == label)
            .cloned()
            .unwrap_or_else(|| ActivityKind::Other(label.to_string()))
    }

    /// Road running disciplines (training, long run, road race)
    pub fn is_road_running(&self) -> bool {
        matches!(
            self,
            ActivityKind::RunningEntreno | ActivityKind::FondoLargo | ActivityKind::CompeticionCalle
        )
    }

    /// Off-road disciplines
    pub fn is_trail(&self) -> bool {
        matches!(self, ActivityKind::TrailRunning | ActivityKind::HikingSenderismo)
    }

    /// Activities without a meaningful distance (headline switches to hours)
    pub fn is_distance_less(&self) -> bool {
        matches!(self, ActivityKind::FuerzaYCardio)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActivityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(ActivityKind::from_label(&label))
    }
}

/// Activity with its derived values, computed once per dataset load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedActivity {
    /// Position in the raw input array
    pub index: usize,
    /// Source record
    pub record: ActivityRecord,
    /// Parsed timestamp
    pub date: Option<DateTime<Utc>>,
    /// Normalized classification
    pub kind: ActivityKind,
    /// Body weight as of the activity date (kg)
    pub weight_kg: Option<f64>,
    /// Pace in minutes per km, when distance and duration are both positive
    pub pace_min_per_km: Option<f64>,
}

impl EnrichedActivity {
    /// Stable key for presentation: the record id, else the positional index
    pub fn key(&self) -> String {
        match &self.record.id {
            Some(id) => id.to_string(),
            None => self.index.to_string(),
        }
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.record.distance_km()
    }

    pub fn duration_min(&self) -> Option<f64> {
        self.record.duration_min()
    }
}
