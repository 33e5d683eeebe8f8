use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::client::SecurityApi;
use crate::metrics::Metrics;
use crate::models::{DashboardStats, EventQuery, SecurityEvent};

/// The two dashboard fetch slots. Each records its error independently so
/// either panel can fail, be dismissed, and be retried on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardSlot {
    Stats,
    Events,
}

/// Shared dashboard view-model. Stale data is retained while an error is
/// shown; a successful fetch of a slot replaces both.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub stats: Option<DashboardStats>,
    pub recent_events: Option<Vec<SecurityEvent>>,
    pub stats_error: Option<String>,
    pub events_error: Option<String>,
    pub refreshing: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Drives the dashboard: a once-per-second countdown that triggers a refresh
/// cycle at zero, manual refresh that resets the countdown, and a
/// monotonically increasing request epoch that discards results of cycles
/// that were superseded before they settled.
pub struct Refresher {
    api: Arc<dyn SecurityApi>,
    metrics: Arc<Metrics>,
    state: tokio::sync::RwLock<DashboardState>,
    epoch: AtomicU64,
    countdown: AtomicU32,
    interval_secs: u32,
    recent_events_limit: u32,
}

impl Refresher {
    pub fn new(
        api: Arc<dyn SecurityApi>,
        metrics: Arc<Metrics>,
        interval_secs: u32,
        recent_events_limit: u32,
    ) -> Self {
        let interval_secs = interval_secs.max(1);
        Self {
            api,
            metrics,
            state: tokio::sync::RwLock::new(DashboardState::default()),
            epoch: AtomicU64::new(0),
            countdown: AtomicU32::new(interval_secs),
            interval_secs,
            recent_events_limit,
        }
    }

    pub fn seconds_until_refresh(&self) -> u32 {
        self.countdown.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Advance the countdown by one second. Returns true when it wrapped,
    /// i.e. a refresh is due. The value stays within `[0, interval]`.
    fn tick(&self) -> bool {
        let previous = self
            .countdown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                Some(if value <= 1 {
                    self.interval_secs
                } else {
                    value - 1
                })
            })
            .unwrap_or(self.interval_secs);
        previous <= 1
    }

    fn begin_cycle(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == token
    }

    /// One refresh cycle: stats and recent events fetched in parallel,
    /// bookkeeping applied only after both settle, and only if no newer
    /// cycle has started in the meantime.
    pub async fn refresh(&self) {
        let token = self.begin_cycle();
        self.metrics.refresh_cycles.inc();
        {
            let mut state = self.state.write().await;
            state.refreshing = true;
        }

        let events_query = EventQuery {
            limit: self.recent_events_limit,
            ..Default::default()
        };
        let (stats, events) = tokio::join!(
            self.api.fetch_stats(),
            self.api.fetch_events(&events_query)
        );

        if !self.is_current(token) {
            self.metrics.stale_drops.inc();
            debug!(token, "discarding refresh results superseded by a newer cycle");
            return;
        }

        let mut state = self.state.write().await;
        match stats {
            Ok(stats) => {
                state.stats = Some(stats);
                state.stats_error = None;
            }
            Err(err) => {
                self.metrics.fetch_failures.inc();
                warn!(error = %err, "stats fetch failed");
                state.stats_error = Some(err.to_string());
            }
        }
        match events {
            Ok(page) => {
                state.recent_events = Some(page.events);
                state.events_error = None;
            }
            Err(err) => {
                self.metrics.fetch_failures.inc();
                warn!(error = %err, "recent events fetch failed");
                state.events_error = Some(err.to_string());
            }
        }
        state.last_updated = Some(Utc::now());
        state.refreshing = false;
    }

    /// Operator-triggered refresh: same cycle, countdown reset immediately.
    pub async fn manual_refresh(&self) {
        self.countdown.store(self.interval_secs, Ordering::SeqCst);
        self.metrics.manual_refreshes.inc();
        self.refresh().await;
    }

    /// Dismiss one error panel without touching the retained data.
    pub async fn dismiss(&self, slot: DashboardSlot) {
        let mut state = self.state.write().await;
        match slot {
            DashboardSlot::Stats => state.stats_error = None,
            DashboardSlot::Events => state.events_error = None,
        }
    }

    /// The recurring ticker. Runs until the task is dropped at shutdown.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(Duration::from_secs(1));

        loop {
            ticker.tick().await;
            if self.tick() {
                self.refresh().await;
            }
            self.metrics
                .seconds_until_refresh
                .set(self.seconds_until_refresh() as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExportDownload;
    use crate::error::ApiError;
    use crate::models::{EventsPage, ExportRequest, HeatmapData, TimeRange};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted stand-in for the backend: queued responses per endpoint,
    /// falling back to empty successes once drained.
    #[derive(Default)]
    struct ScriptedApi {
        stats: Mutex<VecDeque<Result<DashboardStats, ApiError>>>,
        events: Mutex<VecDeque<Result<EventsPage, ApiError>>>,
    }

    impl ScriptedApi {
        fn queue_stats(&self, result: Result<DashboardStats, ApiError>) {
            self.stats.lock().unwrap().push_back(result);
        }

        fn queue_events(&self, result: Result<EventsPage, ApiError>) {
            self.events.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl SecurityApi for ScriptedApi {
        async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
            self.stats
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(DashboardStats::default()))
        }

        async fn fetch_events(&self, _query: &EventQuery) -> Result<EventsPage, ApiError> {
            self.events.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(EventsPage {
                    events: Vec::new(),
                    total: 0,
                })
            })
        }

        async fn fetch_heatmap(&self, _range: TimeRange) -> Result<HeatmapData, ApiError> {
            Ok(HeatmapData {
                buckets: Vec::new(),
            })
        }

        async fn fetch_export(
            &self,
            _request: &ExportRequest,
        ) -> Result<ExportDownload, ApiError> {
            Err(ApiError::Status { status: 501 })
        }
    }

    fn refresher_with(api: ScriptedApi) -> Refresher {
        Refresher::new(Arc::new(api), Arc::new(Metrics::new()), 30, 20)
    }

    #[test]
    fn countdown_triggers_exactly_once_per_interval() {
        let refresher = refresher_with(ScriptedApi::default());

        let mut triggered = 0;
        for _ in 0..30 {
            let value = refresher.seconds_until_refresh();
            assert!(value <= 30, "countdown escaped its bounds: {}", value);
            if refresher.tick() {
                triggered += 1;
            }
        }
        assert_eq!(triggered, 1);

        for _ in 0..60 {
            if refresher.tick() {
                triggered += 1;
            }
        }
        assert_eq!(triggered, 3);
    }

    #[tokio::test]
    async fn manual_refresh_resets_the_countdown() {
        let refresher = refresher_with(ScriptedApi::default());
        for _ in 0..12 {
            refresher.tick();
        }
        assert_eq!(refresher.seconds_until_refresh(), 18);

        refresher.manual_refresh().await;
        assert_eq!(refresher.seconds_until_refresh(), 30);
    }

    #[tokio::test]
    async fn failed_fetch_surfaces_error_then_retry_clears_it() {
        let api = ScriptedApi::default();
        api.queue_stats(Ok(DashboardStats::default()));
        api.queue_events(Err(ApiError::Status { status: 500 }));
        api.queue_stats(Ok(DashboardStats::default()));
        api.queue_events(Ok(EventsPage {
            events: Vec::new(),
            total: 3,
        }));
        let refresher = refresher_with(api);

        refresher.refresh().await;
        let state = refresher.snapshot().await;
        assert!(state.stats.is_some());
        assert!(state.events_error.is_some());
        let first_update = state.last_updated.expect("timestamp set after both settle");

        refresher.refresh().await;
        let state = refresher.snapshot().await;
        assert!(state.events_error.is_none());
        assert!(state.recent_events.is_some());
        assert!(state.last_updated.unwrap() >= first_update);
    }

    #[tokio::test]
    async fn both_slots_record_failures_independently() {
        let api = ScriptedApi::default();
        api.queue_stats(Err(ApiError::Status { status: 502 }));
        api.queue_events(Err(ApiError::Status { status: 502 }));
        let refresher = refresher_with(api);

        refresher.refresh().await;
        let state = refresher.snapshot().await;
        assert!(state.stats_error.is_some());
        assert!(state.events_error.is_some());
        assert!(state.stats.is_none());
        assert!(state.last_updated.is_some());
        assert!(!state.refreshing);
    }

    #[tokio::test]
    async fn dismiss_clears_one_panel_and_keeps_data() {
        let api = ScriptedApi::default();
        api.queue_stats(Ok(DashboardStats {
            total_events: 9,
            ..Default::default()
        }));
        api.queue_events(Err(ApiError::Status { status: 500 }));
        let refresher = refresher_with(api);

        refresher.refresh().await;
        refresher.dismiss(DashboardSlot::Events).await;

        let state = refresher.snapshot().await;
        assert!(state.events_error.is_none());
        assert_eq!(state.stats.unwrap().total_events, 9);
    }

    #[test]
    fn superseded_cycles_are_no_longer_current() {
        let refresher = refresher_with(ScriptedApi::default());

        let first = refresher.begin_cycle();
        assert!(refresher.is_current(first));

        let second = refresher.begin_cycle();
        assert!(!refresher.is_current(first));
        assert!(refresher.is_current(second));
    }
}
