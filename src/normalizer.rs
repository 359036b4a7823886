//! Activity type normalization
//!
//! This module maps raw provider/locale activity types onto the dashboard's
//! classification:
//! - Trail detection from type, name or elevation gain
//! - Road running split into training, long run and road race
//! - Static synonym table for English and Spanish provider strings
//! - Title-cased passthrough for anything unknown

use crate::types::{ActivityKind, ActivityRecord};

/// Elevation gain (m) above which a run counts as trail
pub const TRAIL_ELEVATION_THRESHOLD_M: f64 = 100.0;

/// Distance (km) above which a non-race run counts as a long run
pub const LONG_RUN_DISTANCE_KM: f64 = 15.0;

const RUNNING_TYPES: [&str; 4] = ["running", "carrera", "run", "correr"];

const COMPETITION_MARKERS: [&str; 8] = [
    "maraton",
    "marathon",
    "10k",
    "21k",
    "42k",
    "gp",
    "competencia",
    "competición",
];

/// Synonyms for provider/locale type strings, matched on the lower-cased type
fn lookup_synonym(lowered: &str) -> Option<ActivityKind> {
    let kind = match lowered {
        "walking" | "caminata" | "walk" => ActivityKind::Caminata,
        "cycling" | "ciclismo" | "cycle" | "bike" => ActivityKind::Ciclismo,
        "strength" | "fuerza" | "weight_training" | "strength_training" | "indoor_cardio"
        | "cardio" => ActivityKind::FuerzaYCardio,
        "swimming" | "natación" | "swim" => ActivityKind::Natacion,
        "yoga" => ActivityKind::Yoga,
        "breathwork" | "respiración" => ActivityKind::Respiracion,
        "tennis" | "tenis" => ActivityKind::Tenis,
        "trail_running" | "trail" => ActivityKind::TrailRunning,
        "hiking" => ActivityKind::HikingSenderismo,
        _ => return None,
    };
    Some(kind)
}

/// Normalizer for classifying activity records
pub struct ActivityNormalizer;

impl ActivityNormalizer {
    /// Classify a full record, using name, elevation and distance refinements
    pub fn normalize(record: &ActivityRecord) -> ActivityKind {
        classify(
            record.tipo.as_deref(),
            record.nombre.as_deref(),
            record.elevation_m(),
            record.distance_km(),
        )
    }

    /// Classify a bare type string (no name/elevation/distance refinement)
    pub fn normalize_type(tipo: &str) -> ActivityKind {
        classify(Some(tipo), None, None, None)
    }
}

fn classify(
    tipo: Option<&str>,
    nombre: Option<&str>,
    elevation_m: Option<f64>,
    distance_km: Option<f64>,
) -> ActivityKind {
    let raw = match tipo {
        Some(t) if !t.trim().is_empty() => t,
        _ => return ActivityKind::Unspecified,
    };

    let lowered = raw.trim().to_lowercase();
    let name = nombre.map(str::to_lowercase).unwrap_or_default();
    let elevation = elevation_m.unwrap_or(0.0);
    let distance = distance_km.unwrap_or(0.0);

    if lowered.contains("trail")
        || lowered.contains("hiking")
        || name.contains("trail")
        || elevation > TRAIL_ELEVATION_THRESHOLD_M
    {
        return ActivityKind::TrailRunning;
    }

    if RUNNING_TYPES.contains(&lowered.as_str()) {
        let is_competition = COMPETITION_MARKERS
            .iter()
            .any(|marker| name.contains(marker) || lowered.contains(marker));

        if is_competition {
            return ActivityKind::CompeticionCalle;
        }
        if distance > LONG_RUN_DISTANCE_KM && !name.contains("entrenamiento") {
            return ActivityKind::FondoLargo;
        }
        return ActivityKind::RunningEntreno;
    }

    lookup_synonym(&lowered).unwrap_or_else(|| {
        tracing::trace!(tipo = raw, "unmapped activity type");
        // Raw types that already are a dashboard label map to that label
        ActivityKind::from_label(&title_case(raw.trim()))
    })
}

/// Upper-case the first character, keep the rest as received
fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(nombre: Option<&str>, distance: Option<f64>, elevation: Option<f64>) -> ActivityRecord {
        ActivityRecord {
            tipo: Some("running".to_string()),
            nombre: nombre.map(str::to_string),
            distancia_km: distance,
            elevacion_m: elevation,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_type_is_otros() {
        let record = ActivityRecord::default();
        assert_eq!(ActivityNormalizer::normalize(&record), ActivityKind::Unspecified);
        assert_eq!(ActivityNormalizer::normalize(&record).as_str(), "Otros");
    }

    #[test]
    fn test_unknown_type_is_title_cased() {
        assert_eq!(
            ActivityNormalizer::normalize_type("paddle_board"),
            ActivityKind::Other("Paddle_board".to_string())
        );
        assert_eq!(ActivityNormalizer::normalize_type("ñandú").as_str(), "Ñandú");
    }

    #[test]
    fn test_raw_labels_map_to_canonical_kinds() {
        assert_eq!(ActivityNormalizer::normalize_type("otros"), ActivityKind::Unspecified);
        assert_eq!(
            ActivityNormalizer::normalize_type("Competición Calle"),
            ActivityKind::CompeticionCalle
        );
        assert_eq!(
            ActivityNormalizer::normalize_type("fondo Largo"),
            ActivityKind::FondoLargo
        );

        let race = ActivityRecord {
            tipo: Some("Competición Calle".to_string()),
            distancia_km: Some(10.0),
            ..Default::default()
        };
        assert!(ActivityNormalizer::normalize(&race).is_road_running());
    }

    #[test]
    fn test_elevation_overrides_running() {
        let record = run(None, Some(8.0), Some(150.0));
        assert_eq!(ActivityNormalizer::normalize(&record), ActivityKind::TrailRunning);
    }

    #[test]
    fn test_trail_from_name_and_type() {
        assert_eq!(
            ActivityNormalizer::normalize(&run(Some("Trail del Cerro"), Some(12.0), None)),
            ActivityKind::TrailRunning
        );
        assert_eq!(
            ActivityNormalizer::normalize_type("Trail_Running"),
            ActivityKind::TrailRunning
        );
        assert_eq!(ActivityNormalizer::normalize_type("hiking"), ActivityKind::TrailRunning);
    }

    #[test]
    fn test_running_subclassification() {
        assert_eq!(
            ActivityNormalizer::normalize(&run(Some("Maraton de Rosario"), Some(42.2), None)),
            ActivityKind::CompeticionCalle
        );
        assert_eq!(
            ActivityNormalizer::normalize(&run(Some("Rodaje domingo"), Some(18.0), None)),
            ActivityKind::FondoLargo
        );
        assert_eq!(
            ActivityNormalizer::normalize(&run(Some("Entrenamiento largo"), Some(18.0), None)),
            ActivityKind::RunningEntreno
        );
        assert_eq!(
            ActivityNormalizer::normalize(&run(None, Some(6.0), None)),
            ActivityKind::RunningEntreno
        );
    }

    #[test]
    fn test_competition_beats_long_distance() {
        let record = run(Some("Competencia 21K"), Some(21.1), None);
        assert_eq!(ActivityNormalizer::normalize(&record), ActivityKind::CompeticionCalle);
    }

    #[test]
    fn test_synonym_table() {
        let cases = [
            ("Walking", ActivityKind::Caminata),
            ("bike", ActivityKind::Ciclismo),
            (" strength_training ", ActivityKind::FuerzaYCardio),
            ("indoor_cardio", ActivityKind::FuerzaYCardio),
            ("natación", ActivityKind::Natacion),
            ("yoga", ActivityKind::Yoga),
            ("breathwork", ActivityKind::Respiracion),
            ("tenis", ActivityKind::Tenis),
        ];
        for (raw, expected) in cases {
            assert_eq!(ActivityNormalizer::normalize_type(raw), expected, "{raw}");
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let record = run(Some("GP Ciudad"), Some(10.0), Some(20.0));
        let first = ActivityNormalizer::normalize(&record);
        let second = ActivityNormalizer::normalize(&record);
        assert_eq!(first, second);
    }
}
