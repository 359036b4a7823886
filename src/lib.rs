//! BioEngine Analytics - Activity analytics engine for the training dashboard
//!
//! BioEngine turns the raw activity and biometric records served by the
//! dashboard API into everything the dashboard shows, through a deterministic
//! pipeline: record parsing → type normalization → feature derivation
//! (weight as of date, pace) → filtering and pagination → aggregation
//! (KPIs, workload ratios, distributions, calendar) → payload encoding.
//!
//! ## Modules
//!
//! - **Classification**: [`normalizer`] maps raw type strings to display labels
//! - **Workload**: [`workload`] computes acute:chronic ratios per discipline
//! - **Views**: [`filters`], [`pagination`] and [`aggregate`] back the table,
//!   KPI strip, charts and calendar

pub mod aggregate;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod filters;
pub mod format;
pub mod normalizer;
pub mod pagination;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod weight;
pub mod workload;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::EngineError;
pub use filters::{DateFilter, FilterSelection, MetricFilter, TypeFilter};
pub use pipeline::{
    compute_dashboard, compute_dashboard_lenient, AnalyticsEngine, DashboardQuery, DashboardSnapshot,
};
pub use types::{ActivityKind, ActivityRecord, BiometricRecord, EnrichedActivity};
pub use workload::{compute_acwr, AcwrReport, AcwrStatus};

// Schema exports
pub use schema::RecordAdapter;

/// Engine version embedded in all payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "bioengine-analytics";
