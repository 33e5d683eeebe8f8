use serde::Serialize;
use std::collections::HashMap;

use crate::models::{DashboardStats, SecurityEvent, Severity, TopIp};

/// One row of the severity breakdown driving the percentage bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityShare {
    pub severity: Severity,
    pub count: u64,
    pub percent: u8,
}

/// Breakdown over every severity in declared order, with rounded whole-number
/// percentages of the total. An empty map yields five zero rows.
pub fn severity_shares(by_severity: &HashMap<Severity, u64>) -> Vec<SeverityShare> {
    let total: u64 = by_severity.values().sum();

    Severity::ALL
        .iter()
        .map(|&severity| {
            let count = by_severity.get(&severity).copied().unwrap_or(0);
            let percent = if total == 0 {
                0
            } else {
                ((count as f64 / total as f64) * 100.0).round() as u8
            };
            SeverityShare {
                severity,
                count,
                percent,
            }
        })
        .collect()
}

/// Tally a fetched event list locally, for views that derive their own
/// breakdown instead of trusting the stats payload.
pub fn count_by_severity(events: &[SecurityEvent]) -> HashMap<Severity, u64> {
    let mut counts: HashMap<Severity, u64> = HashMap::new();
    for event in events {
        *counts.entry(event.severity).or_insert(0) += 1;
    }
    counts
}

/// Top-IP table rows ordered by event count, highest first. The backend
/// already sends them ordered; this keeps the table stable if it ever stops.
pub fn ranked_top_ips(stats: &DashboardStats) -> Vec<TopIp> {
    let mut ips = stats.top_ips.clone();
    ips.sort_by(|a, b| b.event_count.cmp(&a.event_count));
    ips
}
