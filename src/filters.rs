//! Dashboard filters
//!
//! Three independent selectors narrow the activity list, applied in order:
//! date window, activity type, then an optional metric ranking. Selectors
//! parse from the same strings the dashboard uses (`"30d"`, `"Tenis"`,
//! `"pace_top10"`, ...).

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::{ActivityKind, EnrichedActivity};

/// Date window selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateFilter {
    #[default]
    All,
    Last7Days,
    Last30Days,
    Last90Days,
    /// Trailing seven days
    Week,
    /// Calendar month containing the reference date
    Month,
    /// Trailing three calendar months
    ThreeMonths,
    /// Calendar year containing the reference date
    Year,
}

/// Inclusive time range covered by a date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }

    fn from_days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }
}

impl DateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Last7Days => "7d",
            DateFilter::Last30Days => "30d",
            DateFilter::Last90Days => "90d",
            DateFilter::Week => "week",
            DateFilter::Month => "month",
            DateFilter::ThreeMonths => "3months",
            DateFilter::Year => "year",
        }
    }

    /// Time range selected relative to `reference`; `None` for `all`
    pub fn window(&self, reference: DateTime<Utc>) -> Option<DateWindow> {
        let today = reference.date_naive();
        let days_back = |n: i64| today - Duration::days(n);

        let window = match self {
            DateFilter::All => return None,
            DateFilter::Last7Days | DateFilter::Week => DateWindow::from_days(days_back(7), today),
            DateFilter::Last30Days => DateWindow::from_days(days_back(30), today),
            DateFilter::Last90Days => DateWindow::from_days(days_back(90), today),
            DateFilter::ThreeMonths => {
                let first = today.checked_sub_months(Months::new(3)).unwrap_or(NaiveDate::MIN);
                DateWindow::from_days(first, today)
            }
            DateFilter::Month => {
                let first = today - Duration::days(i64::from(today.day0()));
                let last = first
                    .checked_add_months(Months::new(1))
                    .map(|next| next - Duration::days(1))
                    .unwrap_or(NaiveDate::MAX);
                DateWindow::from_days(first, last)
            }
            DateFilter::Year => {
                let first = today - Duration::days(i64::from(today.ordinal0()));
                let last = first
                    .checked_add_months(Months::new(12))
                    .map(|next| next - Duration::days(1))
                    .unwrap_or(NaiveDate::MAX);
                DateWindow::from_days(first, last)
            }
        };
        Some(window)
    }

    /// Move the reference date by `steps` units of this filter (prev/next navigation)
    pub fn shift(&self, reference: DateTime<Utc>, steps: i32) -> DateTime<Utc> {
        let days = match self {
            DateFilter::All => return reference,
            DateFilter::Last7Days | DateFilter::Week => 7,
            DateFilter::Last30Days => 30,
            DateFilter::Last90Days => 90,
            DateFilter::Month => return shift_months(reference, steps, 1),
            DateFilter::ThreeMonths => return shift_months(reference, steps, 3),
            DateFilter::Year => return shift_months(reference, steps, 12),
        };
        reference + Duration::days(days * i64::from(steps))
    }

    /// Whether an activity date passes this filter
    pub fn matches(&self, date: Option<DateTime<Utc>>, reference: DateTime<Utc>) -> bool {
        match self.window(reference) {
            None => true,
            Some(window) => date.is_some_and(|d| window.contains(d)),
        }
    }
}

fn shift_months(reference: DateTime<Utc>, steps: i32, unit: u32) -> DateTime<Utc> {
    let months = Months::new(steps.unsigned_abs() * unit);
    let shifted = if steps >= 0 {
        reference.checked_add_months(months)
    } else {
        reference.checked_sub_months(months)
    };
    shifted.unwrap_or(reference)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

impl FromStr for DateFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim() {
            "all" | "" => DateFilter::All,
            "7d" => DateFilter::Last7Days,
            "30d" => DateFilter::Last30Days,
            "90d" => DateFilter::Last90Days,
            "week" => DateFilter::Week,
            "month" => DateFilter::Month,
            "3months" => DateFilter::ThreeMonths,
            "year" => DateFilter::Year,
            other => {
                return Err(EngineError::InvalidFilter(format!(
                    "unknown date filter '{other}'"
                )))
            }
        };
        Ok(filter)
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for DateFilter {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateFilter> for String {
    fn from(filter: DateFilter) -> Self {
        filter.as_str().to_string()
    }
}

/// Activity type selector
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Kind(ActivityKind),
}

impl TypeFilter {
    pub fn matches(&self, kind: &ActivityKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Kind(selected) => selected == kind,
        }
    }

    /// Selected kind, `None` for `all`
    pub fn kind(&self) -> Option<&ActivityKind> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Kind(kind) => Some(kind),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "" => Ok(TypeFilter::All),
            label => Ok(TypeFilter::Kind(ActivityKind::from_label(label))),
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str("all"),
            TypeFilter::Kind(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl TryFrom<String> for TypeFilter {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeFilter> for String {
    fn from(filter: TypeFilter) -> Self {
        filter.to_string()
    }
}

/// Metric ranking selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricFilter {
    #[default]
    None,
    WeightMax,
    WeightMin,
    WeightTop10,
    WeightBottom10,
    DistMax,
    DistTop10,
    PaceMax,
    PaceTop10,
    DurMax,
    DurTop10,
}

impl MetricFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFilter::None => "none",
            MetricFilter::WeightMax => "weight_max",
            MetricFilter::WeightMin => "weight_min",
            MetricFilter::WeightTop10 => "weight_top10",
            MetricFilter::WeightBottom10 => "weight_bottom10",
            MetricFilter::DistMax => "dist_max",
            MetricFilter::DistTop10 => "dist_top10",
            MetricFilter::PaceMax => "pace_max",
            MetricFilter::PaceTop10 => "pace_top10",
            MetricFilter::DurMax => "dur_max",
            MetricFilter::DurTop10 => "dur_top10",
        }
    }

    /// Number of entries kept, `None` when no ranking is selected
    pub fn limit(&self, top_n: usize) -> Option<usize> {
        match self {
            MetricFilter::None => None,
            MetricFilter::WeightMax
            | MetricFilter::WeightMin
            | MetricFilter::DistMax
            | MetricFilter::PaceMax
            | MetricFilter::DurMax => Some(1),
            MetricFilter::WeightTop10
            | MetricFilter::WeightBottom10
            | MetricFilter::DistTop10
            | MetricFilter::PaceTop10
            | MetricFilter::DurTop10 => Some(top_n),
        }
    }

    /// Rank and truncate an already date/type filtered list
    pub fn apply<'a>(
        &self,
        mut items: Vec<&'a EnrichedActivity>,
        config: &EngineConfig,
    ) -> Vec<&'a EnrichedActivity> {
        let Some(limit) = self.limit(config.top_n) else {
            return items;
        };

        // `sort_by` is stable: ties keep input order
        match self {
            MetricFilter::WeightMax | MetricFilter::WeightTop10 => {
                items.sort_by(|a, b| descending_missing_last(a.weight_kg, b.weight_kg));
            }
            MetricFilter::WeightMin | MetricFilter::WeightBottom10 => {
                items.retain(|a| a.weight_kg.is_some());
                items.sort_by(|a, b| ascending_missing_last(a.weight_kg, b.weight_kg));
            }
            MetricFilter::PaceMax | MetricFilter::PaceTop10 => {
                let min_distance = config.pace_min_distance_km;
                items.retain(|a| a.distance_km().is_some_and(|d| d > min_distance));
                items.sort_by(|a, b| ascending_missing_last(a.pace_min_per_km, b.pace_min_per_km));
            }
            MetricFilter::DistMax | MetricFilter::DistTop10 => {
                items.sort_by(|a, b| {
                    let (x, y) = (a.distance_km().unwrap_or(0.0), b.distance_km().unwrap_or(0.0));
                    y.total_cmp(&x)
                });
            }
            MetricFilter::DurMax | MetricFilter::DurTop10 => {
                items.sort_by(|a, b| {
                    let (x, y) = (a.duration_min().unwrap_or(0.0), b.duration_min().unwrap_or(0.0));
                    y.total_cmp(&x)
                });
            }
            MetricFilter::None => {}
        }

        items.truncate(limit);
        items
    }
}

fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ascending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for MetricFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim() {
            "none" | "" => MetricFilter::None,
            "weight_max" => MetricFilter::WeightMax,
            "weight_min" => MetricFilter::WeightMin,
            "weight_top10" => MetricFilter::WeightTop10,
            "weight_bottom10" => MetricFilter::WeightBottom10,
            "dist_max" => MetricFilter::DistMax,
            "dist_top10" => MetricFilter::DistTop10,
            "pace_max" => MetricFilter::PaceMax,
            "pace_top10" => MetricFilter::PaceTop10,
            "dur_max" => MetricFilter::DurMax,
            "dur_top10" => MetricFilter::DurTop10,
            other => {
                return Err(EngineError::InvalidFilter(format!(
                    "unknown metric filter '{other}'"
                )))
            }
        };
        Ok(filter)
    }
}

impl fmt::Display for MetricFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MetricFilter {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetricFilter> for String {
    fn from(filter: MetricFilter) -> Self {
        filter.as_str().to_string()
    }
}

/// The three selectors together
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub date: DateFilter,
    #[serde(rename = "type")]
    pub activity_type: TypeFilter,
    pub metric: MetricFilter,
}

/// Apply date, type and metric filters in that order
pub fn apply_filters<'a>(
    activities: &'a [EnrichedActivity],
    selection: &FilterSelection,
    reference: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<&'a EnrichedActivity> {
    let window = selection.date.window(reference);

    let matching: Vec<&EnrichedActivity> = activities
        .iter()
        .filter(|a| match window {
            None => true,
            Some(w) => a.date.is_some_and(|d| w.contains(d)),
        })
        .filter(|a| selection.activity_type.matches(&a.kind))
        .collect();

    let total = matching.len();
    let ranked = selection.metric.apply(matching, config);
    tracing::debug!(
        date = selection.date.as_str(),
        activity_type = %selection.activity_type,
        metric = selection.metric.as_str(),
        matched = total,
        kept = ranked.len(),
        "applied filters"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureDeriver;
    use crate::types::{ActivityRecord, BiometricRecord};
    use crate::weight::WeightTimeline;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 14, 18, 30, 0).unwrap()
    }

    fn record(fecha: &str, tipo: &str, km: Option<f64>, min: Option<f64>) -> ActivityRecord {
        ActivityRecord {
            fecha: Some(fecha.to_string()),
            tipo: Some(tipo.to_string()),
            distancia_km: km,
            duracion_min: min,
            ..Default::default()
        }
    }

    fn enrich(records: &[ActivityRecord]) -> Vec<EnrichedActivity> {
        FeatureDeriver::derive_all(records, &WeightTimeline::default())
    }

    fn select(date: &str, kind: &str, metric: &str) -> FilterSelection {
        FilterSelection {
            date: date.parse().unwrap(),
            activity_type: kind.parse().unwrap(),
            metric: metric.parse().unwrap(),
        }
    }

    #[test]
    fn test_window_boundaries_are_whole_days() {
        let window = DateFilter::Last7Days.window(reference()).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 5, 7, 0, 0, 0).unwrap());
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2025, 5, 14, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert!(DateFilter::All.window(reference()).is_none());
    }

    #[test]
    fn test_calendar_windows() {
        let month = DateFilter::Month.window(reference()).unwrap();
        assert_eq!(month.start, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(month.end.date_naive(), NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());

        let year = DateFilter::Year.window(reference()).unwrap();
        assert_eq!(year.start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(year.end.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        let quarter = DateFilter::ThreeMonths.window(reference()).unwrap();
        assert_eq!(quarter.start, Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_february_month_window() {
        let reference = Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0).unwrap();
        let month = DateFilter::Month.window(reference).unwrap();
        assert_eq!(month.end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_shift_navigation() {
        let r = reference();
        assert_eq!(DateFilter::Week.shift(r, -1), r - Duration::days(7));
        assert_eq!(DateFilter::Last30Days.shift(r, 2), r + Duration::days(60));
        assert_eq!(
            DateFilter::Month.shift(r, -1),
            Utc.with_ymd_and_hms(2025, 4, 14, 18, 30, 0).unwrap()
        );
        assert_eq!(
            DateFilter::Year.shift(r, 1),
            Utc.with_ymd_and_hms(2026, 5, 14, 18, 30, 0).unwrap()
        );
        assert_eq!(DateFilter::All.shift(r, 5), r);
    }

    #[test]
    fn test_seven_day_window_and_total() {
        let records = vec![
            record("2025-05-13T07:00:00Z", "running", Some(5.0), Some(30.0)),
            record("2025-05-10T07:00:00Z", "yoga", Some(0.0), Some(45.0)),
            record("2025-05-08T07:00:00Z", "running", Some(10.0), Some(55.0)),
            record("2025-04-04T07:00:00Z", "running", Some(3.0), Some(20.0)),
        ];
        let activities = enrich(&records);
        let config = EngineConfig::default();

        let kept = apply_filters(&activities, &select("7d", "all", "none"), reference(), &config);

        assert_eq!(kept.len(), 3);
        let total: f64 = kept.iter().filter_map(|a| a.distance_km()).sum();
        assert_eq!(total, 15.0);
    }

    #[test]
    fn test_undated_dropped_by_windows_only() {
        let records = vec![
            record("2025-05-13", "running", Some(5.0), None),
            ActivityRecord {
                tipo: Some("running".to_string()),
                ..Default::default()
            },
        ];
        let activities = enrich(&records);
        let config = EngineConfig::default();

        assert_eq!(apply_filters(&activities, &select("all", "all", "none"), reference(), &config).len(), 2);
        assert_eq!(apply_filters(&activities, &select("year", "all", "none"), reference(), &config).len(), 1);
    }

    #[test]
    fn test_type_filter_uses_normalized_label() {
        let records = vec![
            record("2025-05-13", "tennis", None, Some(60.0)),
            record("2025-05-12", "tenis", None, Some(90.0)),
            record("2025-05-11", "cycling", Some(40.0), Some(90.0)),
        ];
        let activities = enrich(&records);
        let kept = apply_filters(
            &activities,
            &select("all", "Tenis", "none"),
            reference(),
            &EngineConfig::default(),
        );
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|a| a.kind == ActivityKind::Tenis));
    }

    #[test]
    fn test_dist_top10_descending() {
        let records: Vec<ActivityRecord> = (0..15)
            .map(|i| {
                let km = ((i * 7) % 15) as f64 + 1.0;
                record("2025-05-01", "cycling", Some(km), Some(60.0))
            })
            .collect();
        let activities = enrich(&records);

        let kept = apply_filters(
            &activities,
            &select("all", "all", "dist_top10"),
            reference(),
            &EngineConfig::default(),
        );

        assert_eq!(kept.len(), 10);
        assert_eq!(kept[0].distance_km(), Some(15.0));
        for pair in kept.windows(2) {
            assert!(pair[0].distance_km() >= pair[1].distance_km());
        }
    }

    #[test]
    fn test_pace_excludes_short_distances() {
        let records = vec![
            record("2025-05-01", "running", Some(0.3), Some(1.0)),
            record("2025-05-02", "running", Some(10.0), Some(50.0)),
            record("2025-05-03", "running", Some(5.0), Some(27.5)),
            record("2025-05-04", "running", Some(8.0), None),
        ];
        let activities = enrich(&records);
        let config = EngineConfig::default();

        let best = apply_filters(&activities, &select("all", "all", "pace_max"), reference(), &config);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].index, 1);

        let top = apply_filters(&activities, &select("all", "all", "pace_top10"), reference(), &config);
        let order: Vec<usize> = top.iter().map(|a| a.index).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_weight_rankings() {
        let biometrics = vec![
            BiometricRecord {
                fecha: Some("2025-03-01".to_string()),
                peso: Some(74.0),
                ..Default::default()
            },
            BiometricRecord {
                fecha: Some("2025-04-01".to_string()),
                peso: Some(72.0),
                ..Default::default()
            },
        ];
        let records = vec![
            record("2025-02-01", "running", Some(5.0), Some(30.0)),
            record("2025-03-15", "running", Some(5.0), Some(30.0)),
            record("2025-04-15", "running", Some(5.0), Some(30.0)),
        ];
        let activities = FeatureDeriver::derive_all(&records, &WeightTimeline::new(&biometrics));
        let config = EngineConfig::default();

        let heaviest = apply_filters(&activities, &select("all", "all", "weight_top10"), reference(), &config);
        let order: Vec<usize> = heaviest.iter().map(|a| a.index).collect();
        assert_eq!(order, vec![1, 2, 0]);

        let lightest = apply_filters(&activities, &select("all", "all", "weight_bottom10"), reference(), &config);
        let order: Vec<usize> = lightest.iter().map(|a| a.index).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn test_duration_ties_keep_input_order() {
        let records = vec![
            record("2025-05-01", "yoga", None, Some(30.0)),
            record("2025-05-02", "yoga", None, Some(60.0)),
            record("2025-05-03", "yoga", None, Some(30.0)),
            record("2025-05-04", "yoga", None, None),
        ];
        let activities = enrich(&records);
        let kept = apply_filters(
            &activities,
            &select("all", "all", "dur_top10"),
            reference(),
            &EngineConfig::default(),
        );
        let order: Vec<usize> = kept.iter().map(|a| a.index).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_unknown_selectors_rejected() {
        assert!(matches!(
            "fortnight".parse::<DateFilter>(),
            Err(EngineError::InvalidFilter(_))
        ));
        assert!("speed_max".parse::<MetricFilter>().is_err());
    }

    #[test]
    fn test_empty_selectors_mean_unfiltered() {
        assert_eq!("".parse::<DateFilter>().unwrap(), DateFilter::All);
        assert_eq!(" ".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!("".parse::<MetricFilter>().unwrap(), MetricFilter::None);

        let selection: FilterSelection =
            serde_json::from_str(r#"{"date": "", "type": "", "metric": ""}"#).unwrap();
        assert_eq!(selection, FilterSelection::default());
    }

    #[test]
    fn test_selection_deserializes_from_dashboard_strings() {
        let selection: FilterSelection =
            serde_json::from_str(r#"{"date": "30d", "type": "Fuerza y Cardio", "metric": "dur_max"}"#)
                .unwrap();
        assert_eq!(selection.date, DateFilter::Last30Days);
        assert_eq!(selection.activity_type, TypeFilter::Kind(ActivityKind::FuerzaYCardio));
        assert_eq!(selection.metric, MetricFilter::DurMax);

        let defaults: FilterSelection = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, FilterSelection::default());
    }
}
