//! Table pagination and the dashboard's filter state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::{DateFilter, FilterSelection, MetricFilter, TypeFilter};

/// One page of a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page index after clamping
    pub page: usize,
    /// Always at least 1, even for an empty list
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

/// Slice `items` into the requested page; the index is clamped into range
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items,
        page,
        total_pages,
        total_items,
        page_size,
    }
}

/// Filter selection as held by a dashboard view.
///
/// Changing the date or type filter sends the table back to page 1; changing
/// the metric ranking or the page itself does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    selection: FilterSelection,
    page: usize,
    /// Prev/next steps applied to the reference date, in units of the date filter
    period_offset: i32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selection: FilterSelection::default(),
            page: 1,
            period_offset: 0,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn period_offset(&self) -> i32 {
        self.period_offset
    }

    pub fn set_date_filter(&mut self, date: DateFilter) {
        if self.selection.date != date {
            self.selection.date = date;
            self.period_offset = 0;
            self.page = 1;
        }
    }

    pub fn set_type_filter(&mut self, activity_type: TypeFilter) {
        if self.selection.activity_type != activity_type {
            self.selection.activity_type = activity_type;
            self.page = 1;
        }
    }

    pub fn set_metric_filter(&mut self, metric: MetricFilter) {
        self.selection.metric = metric;
    }

    /// Pages below 1 become 1; the upper bound is clamped when paginating
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Move the date window back (negative) or forward (positive)
    pub fn shift_period(&mut self, steps: i32) {
        self.period_offset = self.period_offset.saturating_add(steps);
        self.page = 1;
    }

    /// Effective reference date after prev/next navigation
    pub fn reference(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.selection.date.shift(now, self.period_offset)
    }
}
