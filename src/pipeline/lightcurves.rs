//! Long-format photometry table: one row per (source, measurement).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::parser;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightcurveRow {
    pub id: String,
    pub jd: f64,
    pub flux: Option<f64>,
    pub flux_err: Option<f64>,
    pub filter: Option<String>,
    /// A point with no flux is an upper limit / non-detection
    pub is_detection: bool,
}

impl LightcurveRow {
    fn dedup_key(&self) -> (u64, Option<String>, Option<u64>, Option<u64>) {
        (
            self.jd.to_bits(),
            self.filter.clone(),
            self.flux.map(f64::to_bits),
            self.flux_err.map(f64::to_bits),
        )
    }
}

/// Per-source extraction tallies, folded into the build report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PointStats {
    pub emitted: usize,
    pub dropped: usize,
    pub duplicates: usize,
}

/// Convert a single photometry point into a flat row. `None` when the point
/// has no usable Julian date.
pub fn photometry_point_to_row(source_id: &str, point: &Value) -> Option<LightcurveRow> {
    let point = point.as_object()?;
    let jd = parser::number(point.get("jd"))?;
    let flux = parser::number(point.get("flux"));
    let flux_err =
        parser::number(point.get("fluxerr")).or_else(|| parser::number(point.get("flux_err")));

    let filter = match point.get("filters") {
        Some(Value::Object(filters)) => parser::string(filters.get("name")),
        other => parser::string(other),
    };

    Some(LightcurveRow {
        id: source_id.to_string(),
        jd,
        flux,
        flux_err,
        filter,
        is_detection: flux.is_some(),
    })
}

/// Rows for every usable, distinct photometry point of one source.
pub fn points_to_rows(source_id: &str, photometry: &[Value]) -> (Vec<LightcurveRow>, PointStats) {
    let mut stats = PointStats::default();
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for point in photometry {
        let Some(row) = photometry_point_to_row(source_id, point) else {
            stats.dropped += 1;
            continue;
        };
        if !seen.insert(row.dedup_key()) {
            stats.duplicates += 1;
            continue;
        }
        rows.push(row);
    }

    stats.emitted = rows.len();
    (rows, stats)
}

/// Extract all photometry points for a single source record.
pub fn source_to_lightcurve_rows(obj: &Value) -> Vec<LightcurveRow> {
    let Some(id) = parser::source_id(obj) else {
        return Vec::new();
    };
    points_to_rows(&id, parser::parse_photometry(obj)).0
}
