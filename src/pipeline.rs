//! Pipeline orchestration
//!
//! This module provides the public API for BioEngine Analytics.
//! It orchestrates the full pipeline from raw API JSON to a dashboard snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    available_types, calendar_month, type_distribution, CalendarMonth, DisciplineUsage, Kpis,
    LatestWeight, TypeCount,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::features::FeatureDeriver;
use crate::filters::{apply_filters, FilterSelection};
use crate::pagination::{paginate, FilterState, Page};
use crate::schema::RecordAdapter;
use crate::types::{ActivityKind, ActivityRecord, BiometricRecord, EnrichedActivity};
use crate::weight::WeightTimeline;
use crate::workload::{AcwrCalculator, AcwrReport};

fn first_page() -> usize {
    1
}

/// What the dashboard is asking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(flatten)]
    pub filters: FilterSelection,
    /// 1-based table page
    #[serde(default = "first_page")]
    pub page: usize,
    /// "Now" for windows and workload ratios
    pub reference: DateTime<Utc>,
}

impl DashboardQuery {
    /// Unfiltered first page as of `reference`
    pub fn new(reference: DateTime<Utc>) -> Self {
        Self {
            filters: FilterSelection::default(),
            page: 1,
            reference,
        }
    }

    /// Query for a dashboard view's filter state, with prev/next navigation applied
    pub fn from_state(state: &FilterState, now: DateTime<Utc>) -> Self {
        Self {
            filters: state.selection().clone(),
            page: state.page(),
            reference: state.reference(now),
        }
    }
}

/// Everything a dashboard view renders for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub reference: DateTime<Utc>,
    pub filters: FilterSelection,
    /// Current table page of filtered activities
    pub rows: Page<EnrichedActivity>,
    pub kpis: Kpis,
    pub acwr: AcwrReport,
    pub available_types: Vec<ActivityKind>,
    pub type_distribution: Vec<TypeCount>,
    pub discipline_usage: DisciplineUsage,
    pub latest_weight: Option<LatestWeight>,
}

/// Compute a dashboard snapshot from raw API JSON.
///
/// # Arguments
/// * `activities_json` - Activity array (bare or wrapped under `data`)
/// * `biometrics_json` - Biometric array (bare or wrapped under `data`)
/// * `query` - Filter selection, page and reference date
///
/// # Example
/// ```ignore
/// let query = DashboardQuery::new(Utc::now());
/// let snapshot = compute_dashboard(&activities, &biometrics, &query)?;
/// println!("{} km", snapshot.kpis.total_km);
/// ```
pub fn compute_dashboard(
    activities_json: &str,
    biometrics_json: &str,
    query: &DashboardQuery,
) -> Result<DashboardSnapshot, EngineError> {
    let activities = RecordAdapter::parse_activities(activities_json)?;
    let biometrics = RecordAdapter::parse_biometrics(biometrics_json)?;

    let mut engine = AnalyticsEngine::new();
    engine.load(activities, biometrics);
    Ok(engine.dashboard(query))
}

/// Like [`compute_dashboard`], but an unparseable payload counts as an empty list.
///
/// Mirrors a failed fetch on the dashboard: the view still renders, just empty.
pub fn compute_dashboard_lenient(
    activities_json: &str,
    biometrics_json: &str,
    query: &DashboardQuery,
) -> DashboardSnapshot {
    let activities = RecordAdapter::parse_activities_or_empty(activities_json);
    let biometrics = RecordAdapter::parse_biometrics_or_empty(biometrics_json);

    let mut engine = AnalyticsEngine::new();
    engine.load(activities, biometrics);
    engine.dashboard(query)
}

/// Stateful engine holding the current dataset.
///
/// Use this when the same dataset serves many queries (filter changes, paging):
/// per-activity enrichment runs once per [`load`](Self::load).
pub struct AnalyticsEngine {
    config: EngineConfig,
    activities: Vec<ActivityRecord>,
    biometrics: Vec<BiometricRecord>,
    weights: WeightTimeline,
    enriched: Vec<EnrichedActivity>,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsEngine {
    /// Create an empty engine with default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an empty engine with specific settings
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            activities: Vec::new(),
            biometrics: Vec::new(),
            weights: WeightTimeline::default(),
            enriched: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the dataset wholesale and recompute per-activity features
    pub fn load(&mut self, activities: Vec<ActivityRecord>, biometrics: Vec<BiometricRecord>) {
        self.weights = WeightTimeline::new(&biometrics);
        self.enriched = FeatureDeriver::derive_all(&activities, &self.weights);
        self.activities = activities;
        self.biometrics = biometrics;

        tracing::debug!(
            activities = self.activities.len(),
            biometrics = self.biometrics.len(),
            weights = self.weights.len(),
            "dataset loaded"
        );
    }

    /// Parse and load raw API JSON
    pub fn load_json(&mut self, activities_json: &str, biometrics_json: &str) -> Result<(), EngineError> {
        let activities = RecordAdapter::parse_activities(activities_json)?;
        let biometrics = RecordAdapter::parse_biometrics(biometrics_json)?;
        self.load(activities, biometrics);
        Ok(())
    }

    /// Raw activity records as loaded
    pub fn records(&self) -> &[ActivityRecord] {
        &self.activities
    }

    pub fn biometrics(&self) -> &[BiometricRecord] {
        &self.biometrics
    }

    /// Enriched activities, in input order
    pub fn activities(&self) -> &[EnrichedActivity] {
        &self.enriched
    }

    pub fn weights(&self) -> &WeightTimeline {
        &self.weights
    }

    /// Workload ratios as of `reference`
    pub fn acwr(&self, reference: DateTime<Utc>) -> AcwrReport {
        self.calculator().compute(&self.enriched, reference)
    }

    /// Activities of one calendar month grouped by day
    pub fn calendar(&self, year: i32, month: u32) -> Result<CalendarMonth, EngineError> {
        calendar_month(&self.enriched, year, month)
    }

    /// Compute everything a dashboard view needs for `query`
    pub fn dashboard(&self, query: &DashboardQuery) -> DashboardSnapshot {
        let filtered = apply_filters(&self.enriched, &query.filters, query.reference, &self.config);
        let kpis = Kpis::compute(&filtered, &query.filters.activity_type);

        let owned: Vec<EnrichedActivity> = filtered.into_iter().cloned().collect();
        let rows = paginate(&owned, query.page, self.config.page_size);

        tracing::debug!(
            matched = rows.total_items,
            page = rows.page,
            total_pages = rows.total_pages,
            "dashboard computed"
        );

        DashboardSnapshot {
            reference: query.reference,
            filters: query.filters.clone(),
            rows,
            kpis,
            acwr: self.acwr(query.reference),
            available_types: available_types(&self.enriched),
            type_distribution: type_distribution(&self.enriched),
            discipline_usage: DisciplineUsage::compute(&self.enriched),
            latest_weight: LatestWeight::from_timeline(&self.weights),
        }
    }

    fn calculator(&self) -> AcwrCalculator {
        AcwrCalculator::with_windows(self.config.acute_window_days, self.config.chronic_window_days)
    }
}
