use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::models::{HeatmapData, IpCount, Severity, TimeRange};

/// Vertical offset between a hovered cell's top edge and the tooltip anchor.
pub const TOOLTIP_OFFSET: f64 = 10.0;

/// Normalized cell intensity: `min(count / maxCount, 1)`, with an empty
/// series or an empty cell pinned to zero.
pub fn intensity(count: u64, max_count: u64) -> f64 {
    if max_count == 0 || count == 0 {
        return 0.0;
    }
    (count as f64 / max_count as f64).min(1.0)
}

/// The four linear intensity bands. Intervals are lower-inclusive, so an
/// intensity of exactly 0.5 lands in `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl HeatBand {
    const fn base_color(self) -> (u8, u8, u8) {
        match self {
            HeatBand::Low => (34, 197, 94),
            HeatBand::Moderate => (234, 179, 8),
            HeatBand::High => (249, 115, 22),
            HeatBand::Critical => (239, 68, 68),
        }
    }
}

/// Band for a cell, `None` for the empty-cell special case.
pub fn band(count: u64, max_count: u64) -> Option<HeatBand> {
    if count == 0 || max_count == 0 {
        return None;
    }
    let i = intensity(count, max_count);
    Some(if i < 0.25 {
        HeatBand::Low
    } else if i < 0.5 {
        HeatBand::Moderate
    } else if i < 0.75 {
        HeatBand::High
    } else {
        HeatBand::Critical
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Glow {
    pub radius: f64,
    pub alpha: f64,
}

/// Presentation style for one heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellStyle {
    pub band: Option<HeatBand>,
    pub fill: Rgba,
    pub glow: Option<Glow>,
}

/// Pure, deterministic `(count, maxCount) -> (color, glow)`.
///
/// Empty cells render near-transparent with no glow regardless of the series
/// maximum; everything else gets its band color with alpha and glow scaled by
/// intensity.
pub fn cell_style(count: u64, max_count: u64) -> CellStyle {
    let Some(band) = band(count, max_count) else {
        return CellStyle {
            band: None,
            fill: Rgba {
                r: 148,
                g: 163,
                b: 184,
                a: 0.04,
            },
            glow: None,
        };
    };

    let i = intensity(count, max_count);
    let (r, g, b) = band.base_color();
    CellStyle {
        band: Some(band),
        fill: Rgba {
            r,
            g,
            b,
            a: (0.15 + 0.85 * i).min(1.0),
        },
        glow: Some(Glow {
            radius: 2.0 + 10.0 * i,
            alpha: 0.6 * i,
        }),
    }
}

/// Bounding rectangle of a hovered cell, in the renderer's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TooltipAnchor {
    pub x: f64,
    pub y: f64,
}

/// Tooltip anchor: horizontal center of the cell, above its top edge.
/// Computed at hover time, never persisted.
pub fn tooltip_anchor(rect: CellRect, offset: f64) -> TooltipAnchor {
    TooltipAnchor {
        x: rect.x + rect.width / 2.0,
        y: rect.y - offset,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub count: u64,
    pub style: CellStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_severity: Option<HashMap<Severity, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_ips: Option<Vec<IpCount>>,
}

/// Presentation-ready heatmap series with per-cell styles and the locally
/// computed series maximum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapView {
    pub range: TimeRange,
    pub max_count: u64,
    pub cells: Vec<HeatmapCell>,
}

impl HeatmapView {
    pub fn from_data(range: TimeRange, data: HeatmapData) -> Self {
        if data.buckets.len() != range.bucket_count() {
            warn!(
                range = range.as_str(),
                expected = range.bucket_count(),
                received = data.buckets.len(),
                "heatmap bucket count does not match the selected range"
            );
        }

        let max_count = data.buckets.iter().map(|b| b.count).max().unwrap_or(0);

        let cells = data
            .buckets
            .into_iter()
            .map(|bucket| {
                if let Some(by_severity) = &bucket.by_severity {
                    let sum: u64 = by_severity.values().sum();
                    if sum != bucket.count {
                        warn!(
                            timestamp = %bucket.timestamp,
                            count = bucket.count,
                            severity_sum = sum,
                            "heatmap bucket count disagrees with its severity breakdown"
                        );
                    }
                }
                HeatmapCell {
                    timestamp: bucket.timestamp,
                    count: bucket.count,
                    style: cell_style(bucket.count, max_count),
                    by_severity: bucket.by_severity,
                    top_ips: bucket.top_ips,
                }
            })
            .collect();

        Self {
            range,
            max_count,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeatmapBucket;
    use chrono::{TimeZone, Utc};

    #[test]
    fn reference_series_maps_to_expected_bands() {
        // Series [0, 10, 50, 100] against a max of 100.
        assert_eq!(intensity(0, 100), 0.0);
        assert_eq!(intensity(10, 100), 0.1);
        assert_eq!(intensity(50, 100), 0.5);
        assert_eq!(intensity(100, 100), 1.0);

        assert_eq!(band(0, 100), None);
        assert_eq!(band(10, 100), Some(HeatBand::Low));
        assert_eq!(band(50, 100), Some(HeatBand::High));
        assert_eq!(band(100, 100), Some(HeatBand::Critical));
    }

    #[test]
    fn zero_count_is_transparent_without_glow_for_any_max() {
        for max_count in [0u64, 1, 50, 10_000] {
            let style = cell_style(0, max_count);
            assert_eq!(style.band, None);
            assert!(style.fill.a < 0.05);
            assert!(style.glow.is_none());
        }
    }

    #[test]
    fn band_mapping_is_monotonic_in_count() {
        let max_count = 200;
        let mut last_rank = 0u8;
        for count in 0..=max_count {
            let rank = match band(count, max_count) {
                None => 0,
                Some(HeatBand::Low) => 1,
                Some(HeatBand::Moderate) => 2,
                Some(HeatBand::High) => 3,
                Some(HeatBand::Critical) => 4,
            };
            assert!(rank >= last_rank, "band dropped at count {}", count);
            last_rank = rank;
        }
        assert_eq!(last_rank, 4);
    }

    #[test]
    fn fill_alpha_and_glow_scale_with_intensity() {
        let faint = cell_style(10, 100);
        let strong = cell_style(90, 100);
        assert!(strong.fill.a > faint.fill.a);
        assert!(strong.glow.unwrap().radius > faint.glow.unwrap().radius);
        assert!(strong.glow.unwrap().alpha > faint.glow.unwrap().alpha);
    }

    #[test]
    fn counts_above_max_clamp_to_full_intensity() {
        assert_eq!(intensity(500, 100), 1.0);
        assert_eq!(band(500, 100), Some(HeatBand::Critical));
    }

    #[test]
    fn tooltip_anchors_center_top_with_offset() {
        let rect = CellRect {
            x: 100.0,
            y: 80.0,
            width: 24.0,
            height: 24.0,
        };
        let anchor = tooltip_anchor(rect, TOOLTIP_OFFSET);
        assert_eq!(anchor.x, 112.0);
        assert_eq!(anchor.y, 70.0);
    }

    #[test]
    fn view_derives_series_max_and_styles() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let buckets = (0..24)
            .map(|hour| HeatmapBucket {
                timestamp: base + chrono::Duration::hours(hour),
                count: if hour == 3 { 80 } else { 0 },
                by_severity: None,
                top_ips: None,
            })
            .collect();

        let view = HeatmapView::from_data(TimeRange::Last24Hours, HeatmapData { buckets });
        assert_eq!(view.max_count, 80);
        assert_eq!(view.cells.len(), 24);
        assert_eq!(view.cells[3].style.band, Some(HeatBand::Critical));
        assert_eq!(view.cells[0].style.band, None);
    }

    #[test]
    fn css_color_formats_with_two_decimal_alpha() {
        let style = cell_style(100, 100);
        assert_eq!(style.fill.css(), "rgba(239, 68, 68, 1.00)");
    }
}
