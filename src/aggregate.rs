//! Aggregates over enriched activities
//!
//! KPIs are computed over the filtered set; the catalog statistics (type
//! list, distribution, discipline usage, calendar) over the whole dataset.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::EngineError;
use crate::filters::TypeFilter;
use crate::types::{ActivityKind, EnrichedActivity};
use crate::weight::WeightTimeline;

/// Number of slices in the type distribution
pub const DISTRIBUTION_SLICES: usize = 6;

/// Unit shown by the headline KPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadlineUnit {
    Km,
    Hrs,
}

/// Headline figure of the KPI strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub value: f64,
    pub unit: HeadlineUnit,
}

/// Totals over the filtered activities (before pagination)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Total distance, one decimal
    pub total_km: f64,
    /// Total duration in hours, one decimal
    pub total_hours: f64,
    pub count: usize,
    pub headline: Headline,
}

impl Kpis {
    pub fn compute(activities: &[&EnrichedActivity], type_filter: &TypeFilter) -> Self {
        let km: f64 = activities.iter().filter_map(|a| a.distance_km()).sum();
        let minutes: f64 = activities.iter().filter_map(|a| a.duration_min()).sum();

        let total_km = round1(km);
        let total_hours = round1(minutes / 60.0);

        let headline = match type_filter.kind() {
            Some(kind) if kind.is_distance_less() => Headline {
                value: total_hours,
                unit: HeadlineUnit::Hrs,
            },
            _ => Headline {
                value: total_km,
                unit: HeadlineUnit::Km,
            },
        };

        Self {
            total_km,
            total_hours,
            count: activities.len(),
            headline,
        }
    }
}

/// Most recent body weight measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestWeight {
    pub weight_kg: f64,
    pub date: DateTime<Utc>,
}

impl LatestWeight {
    pub fn from_timeline(timeline: &WeightTimeline) -> Option<Self> {
        timeline.latest().map(|p| Self {
            weight_kg: p.weight_kg,
            date: p.date,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Distinct normalized types present, sorted by label
pub fn available_types(activities: &[EnrichedActivity]) -> Vec<ActivityKind> {
    let labels: BTreeSet<&str> = activities.iter().map(|a| a.kind.as_str()).collect();
    labels.into_iter().map(ActivityKind::from_label).collect()
}

/// Session count for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub kind: ActivityKind,
    pub count: usize,
}

/// Most frequent types, count descending then label ascending
pub fn type_distribution(activities: &[EnrichedActivity]) -> Vec<TypeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.kind.as_str()).or_insert(0) += 1;
    }

    // BTreeMap iterates by label, so the stable sort breaks ties alphabetically
    let mut distribution: Vec<TypeCount> = counts
        .into_iter()
        .map(|(label, count)| TypeCount {
            kind: ActivityKind::from_label(label),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution.truncate(DISTRIBUTION_SLICES);
    distribution
}

/// Accumulated usage of one discipline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageBucket {
    pub km: f64,
    pub sessions: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl UsageBucket {
    fn add(&mut self, activity: &EnrichedActivity) {
        self.km += activity.distance_km().unwrap_or(0.0);
        self.sessions += 1;
        if let Some(date) = activity.date {
            self.first = Some(self.first.map_or(date, |d| d.min(date)));
            self.last = Some(self.last.map_or(date, |d| d.max(date)));
        }
    }
}

/// Usage per discipline, for equipment wear tracking
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisciplineUsage {
    pub trail: UsageBucket,
    pub road: UsageBucket,
    pub training: UsageBucket,
    pub tennis: UsageBucket,
    pub bike: UsageBucket,
}

impl DisciplineUsage {
    pub fn compute(activities: &[EnrichedActivity]) -> Self {
        let mut usage = Self::default();
        for activity in activities {
            let bucket = match activity.kind {
                ActivityKind::TrailRunning | ActivityKind::HikingSenderismo => &mut usage.trail,
                ActivityKind::FondoLargo | ActivityKind::CompeticionCalle => &mut usage.road,
                ActivityKind::RunningEntreno => &mut usage.training,
                ActivityKind::Tenis => &mut usage.tennis,
                ActivityKind::Ciclismo => &mut usage.bike,
                _ => continue,
            };
            bucket.add(activity);
        }
        for bucket in [
            &mut usage.trail,
            &mut usage.road,
            &mut usage.training,
            &mut usage.tennis,
            &mut usage.bike,
        ] {
            bucket.km = round1(bucket.km);
        }
        usage
    }
}

/// Activity entry in a calendar cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub key: String,
    pub kind: ActivityKind,
    pub distance_km: Option<f64>,
}

/// Calendar cell for a day with activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    pub activities: Vec<CalendarEntry>,
}

/// Month grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Empty cells before day 1 in a Sunday-first grid
    pub leading_blank_days: u32,
    /// Days with at least one activity, ascending
    pub days: Vec<CalendarDay>,
}

/// Group the activities of one calendar month by day, keeping input order per day
pub fn calendar_month(
    activities: &[EnrichedActivity],
    year: i32,
    month: u32,
) -> Result<CalendarMonth, EngineError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(EngineError::InvalidMonth { year, month })?;
    let last = first
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .ok_or(EngineError::InvalidMonth { year, month })?;

    let mut by_day: BTreeMap<u32, Vec<CalendarEntry>> = BTreeMap::new();
    for activity in activities {
        let Some(date) = activity.date.map(|d| d.date_naive()) else {
            continue;
        };
        if date < first || date > last {
            continue;
        }
        by_day.entry(date.day()).or_default().push(CalendarEntry {
            key: activity.key(),
            kind: activity.kind.clone(),
            distance_km: activity.distance_km(),
        });
    }

    Ok(CalendarMonth {
        year,
        month,
        days_in_month: last.day(),
        leading_blank_days: first.weekday().num_days_from_sunday(),
        days: by_day
            .into_iter()
            .map(|(day, activities)| CalendarDay { day, activities })
            .collect(),
    })
}
