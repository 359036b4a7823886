//! Display formatting for activity table values

use crate::features::{compute_pace, compute_speed};

/// Placeholder for values that are not available
pub const MISSING: &str = "--";

/// Paces slower than this many whole minutes per km are not shown
pub const MAX_DISPLAY_PACE_MIN: u64 = 60;

/// Pace as `m:ss` per km.
///
/// `None` when distance or duration is missing or not positive, or when the
/// pace is too slow to be meaningful.
pub fn format_pace(distance_km: Option<f64>, duration_min: Option<f64>) -> Option<String> {
    let pace = compute_pace(distance_km, duration_min)?;
    let total_seconds = (pace * 60.0).round();
    if !total_seconds.is_finite() {
        return None;
    }

    let total_seconds = total_seconds as u64;
    let (minutes, seconds) = (total_seconds / 60, total_seconds % 60);
    if minutes > MAX_DISPLAY_PACE_MIN {
        return None;
    }
    Some(format!("{minutes}:{seconds:02}"))
}

/// Speed as `x.y km/h`, `None` unless both values are positive
pub fn format_speed(distance_km: Option<f64>, duration_min: Option<f64>) -> Option<String> {
    compute_speed(distance_km, duration_min).map(|kmh| format!("{kmh:.1} km/h"))
}

/// Pace when displayable, else speed
pub fn format_pace_or_speed(distance_km: Option<f64>, duration_min: Option<f64>) -> Option<String> {
    format_pace(distance_km, duration_min).or_else(|| format_speed(distance_km, duration_min))
}

/// Weight with one decimal, or the missing placeholder
pub fn format_weight(weight_kg: Option<f64>) -> String {
    match weight_kg {
        Some(w) => format!("{w:.1}"),
        None => MISSING.to_string(),
    }
}

/// Number with a fixed count of decimals, or the missing placeholder
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => MISSING.to_string(),
    }
}
