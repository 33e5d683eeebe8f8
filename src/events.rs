use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::warn;

use crate::client::SecurityApi;
use crate::models::{EventQuery, SecurityEvent, Severity, TimeRange};

/// User-chosen filters for the events page. Purely client-side; they only
/// drive query parameters. Reset together via Clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilters {
    pub severity: Option<Severity>,
    pub ip: String,
    pub event_type: String,
    pub time_range: Option<TimeRange>,
}

/// View-model for the paginated events listing. Any filter change resets
/// pagination to the first page; row expansion is local state only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPageState {
    pub filters: EventFilters,
    pub page: u32,
    pub page_size: u32,
    pub expanded: HashSet<String>,
    pub events: Vec<SecurityEvent>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl EventsPageState {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: EventFilters::default(),
            page: 1,
            page_size: page_size.max(1),
            expanded: HashSet::new(),
            events: Vec::new(),
            total: 0,
            loading: true,
            error: None,
        }
    }

    pub fn set_severity(&mut self, severity: Option<Severity>) {
        self.filters.severity = severity;
        self.page = 1;
    }

    pub fn set_ip(&mut self, ip: String) {
        self.filters.ip = ip;
        self.page = 1;
    }

    pub fn set_event_type(&mut self, event_type: String) {
        self.filters.event_type = event_type;
        self.page = 1;
    }

    pub fn set_time_range(&mut self, time_range: Option<TimeRange>) {
        self.filters.time_range = time_range;
        self.page = 1;
    }

    /// Apply a whole filter set at once (the surface's "Apply").
    pub fn apply_filters(&mut self, filters: EventFilters) {
        self.filters = filters;
        self.page = 1;
    }

    /// Reset every filter field to its default (the surface's "Clear").
    pub fn clear(&mut self) {
        self.filters = EventFilters::default();
        self.page = 1;
    }

    pub fn total_pages(&self) -> u32 {
        ((self.total + self.page_size as u64 - 1) / self.page_size as u64) as u32
    }

    /// Navigate to a page, clamped to the known page range.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1).min(self.total_pages().max(1));
    }

    /// Toggle per-row detail. Local state only; never triggers a refetch.
    /// Returns whether the row is expanded afterwards.
    pub fn toggle_row(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    /// Compose the upstream query from the current filters and page. Offset
    /// is always recomputed from the page; empty text fields are omitted and
    /// the ip substring is passed through uninterpreted.
    pub fn query(&self, now: DateTime<Utc>) -> EventQuery {
        EventQuery {
            limit: self.page_size,
            offset: (self.page - 1) * self.page_size,
            severity: self.filters.severity,
            event_type: non_empty(&self.filters.event_type),
            ip: non_empty(&self.filters.ip),
            start_time: self.filters.time_range.map(|range| range.start_from(now)),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Re-fetch the listing for the current filters/page. The lock is never held
/// across the network call.
pub async fn reload(state: &RwLock<EventsPageState>, api: &dyn SecurityApi) {
    let query = {
        let mut s = state.write().await;
        s.loading = true;
        s.query(Utc::now())
    };

    match api.fetch_events(&query).await {
        Ok(page) => {
            let mut s = state.write().await;
            s.events = page.events;
            s.total = page.total;
            s.error = None;
            s.loading = false;
        }
        Err(err) => {
            warn!(error = %err, "events fetch failed");
            let mut s = state.write().await;
            s.error = Some(err.to_string());
            s.loading = false;
        }
    }
}
