use prometheus::{Counter, Encoder, Gauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub refresh_cycles: Counter,
    pub manual_refreshes: Counter,
    pub fetch_failures: Counter,
    pub stale_drops: Counter,
    pub exports: Counter,
    pub seconds_until_refresh: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let refresh_cycles = Counter::new(
            "console_refresh_cycles_total",
            "Total number of dashboard refresh cycles started",
        )
        .unwrap();

        let manual_refreshes = Counter::new(
            "console_manual_refreshes_total",
            "Refresh cycles triggered by the operator instead of the countdown",
        )
        .unwrap();

        let fetch_failures = Counter::new(
            "console_fetch_failures_total",
            "Upstream fetches that failed (transport or non-2xx)",
        )
        .unwrap();

        let stale_drops = Counter::new(
            "console_stale_responses_total",
            "Refresh results discarded because a newer cycle had started",
        )
        .unwrap();

        let exports = Counter::new(
            "console_exports_total",
            "Event export downloads completed",
        )
        .unwrap();

        let seconds_until_refresh = Gauge::new(
            "console_seconds_until_refresh",
            "Seconds remaining on the auto-refresh countdown",
        )
        .unwrap();

        registry.register(Box::new(refresh_cycles.clone())).unwrap();
        registry.register(Box::new(manual_refreshes.clone())).unwrap();
        registry.register(Box::new(fetch_failures.clone())).unwrap();
        registry.register(Box::new(stale_drops.clone())).unwrap();
        registry.register(Box::new(exports.clone())).unwrap();
        registry
            .register(Box::new(seconds_until_refresh.clone()))
            .unwrap();

        Self {
            registry,
            refresh_cycles,
            manual_refreshes,
            fetch_failures,
            stale_drops,
            exports,
            seconds_until_refresh,
        }
    }

    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
