use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Envelope every backend payload arrives in.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Operator-assigned event importance, used for filtering and color-coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Warn,
    Medium,
    Info,
}

impl Severity {
    /// Declaration order used for every per-severity listing.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Warn,
        Severity::Medium,
        Severity::Info,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Warn => "WARN",
            Severity::Medium => "MEDIUM",
            Severity::Info => "INFO",
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Warn => 2,
            Severity::Medium => 1,
            Severity::Info => 0,
        }
    }
}

/// Backend-reported state of the security log's tamper-evidence mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    #[default]
    Intact,
    Degraded,
    Compromised,
}

/// A single security event as served by the backend. Immutable once fetched;
/// ordering is server-provided (descending by timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub subject_value: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopIp {
    pub ip: String,
    pub event_count: u64,
    pub failed_logins: u64,
    pub highest_severity: Severity,
}

/// Aggregate dashboard counters, replaced wholesale every poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: u64,
    pub failed_logins_24h: u64,
    pub blocked_attempts_24h: u64,
    pub critical_events_24h: u64,
    pub active_break_glass: u64,
    pub integrity_status: IntegrityStatus,
    #[serde(default)]
    pub events_by_severity: HashMap<Severity, u64>,
    #[serde(default)]
    pub top_ips: Vec<TopIp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpCount {
    pub ip: String,
    pub count: u64,
}

/// One fixed-width aggregation window of the heatmap series.
///
/// Invariant: `count` equals the sum of `by_severity` values when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapBucket {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    #[serde(default)]
    pub by_severity: Option<HashMap<Severity, u64>>,
    #[serde(default)]
    pub top_ips: Option<Vec<IpCount>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapData {
    pub buckets: Vec<HeatmapBucket>,
}

/// Selectable heatmap window. Bucket width is hourly for the 24h range and
/// daily otherwise, so the bucket count is constant per range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            TimeRange::Last24Hours => "24h",
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
        }
    }

    pub const fn bucket_count(self) -> usize {
        match self {
            TimeRange::Last24Hours => 24,
            TimeRange::Last7Days => 7,
            TimeRange::Last30Days => 30,
        }
    }

    pub fn bucket_width(self) -> chrono::Duration {
        match self {
            TimeRange::Last24Hours => chrono::Duration::hours(1),
            TimeRange::Last7Days | TimeRange::Last30Days => chrono::Duration::days(1),
        }
    }

    pub fn duration(self) -> chrono::Duration {
        match self {
            TimeRange::Last24Hours => chrono::Duration::hours(24),
            TimeRange::Last7Days => chrono::Duration::days(7),
            TimeRange::Last30Days => chrono::Duration::days(30),
        }
    }

    pub fn start_from(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

/// Query parameters for the events endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub limit: u32,
    pub offset: u32,
    pub severity: Option<Severity>,
    pub event_type: Option<String>,
    pub ip: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            severity: None,
            event_type: None,
            ip: None,
            start_time: None,
        }
    }
}

impl EventQuery {
    /// The ip substring is forwarded exactly as entered; the backend owns the
    /// substring match.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(severity) = self.severity {
            params.push(("severity", severity.label().to_string()));
        }
        if let Some(ref event_type) = self.event_type {
            params.push(("eventType", event_type.clone()));
        }
        if let Some(ref ip) = self.ip {
            params.push(("ip", ip.clone()));
        }
        if let Some(start_time) = self.start_time {
            params.push(("startTime", start_time.to_rfc3339()));
        }
        params
    }
}

/// One page of the events listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub events: Vec<SecurityEvent>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Parameters for an export download.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub severities: Vec<Severity>,
}

impl ExportRequest {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("startDate", self.start_date.format("%Y-%m-%d").to_string()),
            ("endDate", self.end_date.format("%Y-%m-%d").to_string()),
            ("format", self.format.extension().to_string()),
        ];
        if !self.event_types.is_empty() {
            params.push(("eventTypes", self.event_types.join(",")));
        }
        if !self.severities.is_empty() {
            let joined = self
                .severities
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("severities", joined));
        }
        params
    }
}
