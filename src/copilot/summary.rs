//! Per-candidate structured summary handed to the copilot.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pipeline::dataset::SourceRow;
use crate::pipeline::lightcurves::LightcurveRow;

/// Lightweight, interpretable description of one lightcurve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightcurveSummary {
    pub n_points: usize,
    pub n_detections: usize,
    /// Sorted, without duplicates
    pub filters: Vec<String>,
    pub flux_min: Option<f64>,
    pub flux_max: Option<f64>,
    pub time_span_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub source: SourceRow,
    pub lightcurve: LightcurveSummary,
}

/// Summarise the photometry of a single source.
///
/// Flux range and time span are computed over detections only and are all
/// `None` when the source has none.
pub fn summarize_lightcurve<'a, I>(rows: I) -> LightcurveSummary
where
    I: IntoIterator<Item = &'a LightcurveRow>,
{
    let mut n_points = 0;
    let mut n_detections = 0;
    let mut filters = BTreeSet::new();
    let mut flux_range: Option<(f64, f64)> = None;
    let mut jd_range: Option<(f64, f64)> = None;

    for row in rows {
        n_points += 1;
        if let Some(ref f) = row.filter {
            filters.insert(f.clone());
        }
        let Some(flux) = row.flux else {
            continue;
        };
        n_detections += 1;
        flux_range = Some(widen(flux_range, flux));
        jd_range = Some(widen(jd_range, row.jd));
    }

    LightcurveSummary {
        n_points,
        n_detections,
        filters: filters.into_iter().collect(),
        flux_min: flux_range.map(|(lo, _)| lo),
        flux_max: flux_range.map(|(_, hi)| hi),
        time_span_days: jd_range.map(|(lo, hi)| hi - lo),
    }
}

fn widen(range: Option<(f64, f64)>, value: f64) -> (f64, f64) {
    match range {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    }
}

/// Look up a candidate and summarise it against the lightcurve table.
pub fn candidate_summary(
    source_id: &str,
    sources: &[SourceRow],
    lightcurves: &[LightcurveRow],
) -> Result<CandidateSummary> {
    let Some(source) = sources.iter().find(|s| s.id == source_id) else {
        bail!("Source not found: {}", source_id);
    };

    let lightcurve = summarize_lightcurve(lightcurves.iter().filter(|p| p.id == source_id));

    Ok(CandidateSummary {
        source: source.clone(),
        lightcurve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, jd: f64, flux: Option<f64>, filter: Option<&str>) -> LightcurveRow {
        LightcurveRow {
            id: id.to_string(),
            jd,
            flux,
            flux_err: None,
            filter: filter.map(str::to_string),
            is_detection: flux.is_some(),
        }
    }

    #[test]
    fn test_summary_over_detections_only() {
        let rows = vec![
            point("a", 10.0, Some(5.0), Some("r")),
            point("a", 12.5, Some(2.0), Some("g")),
            point("a", 30.0, None, Some("r")),
            point("a", 11.0, Some(7.5), None),
        ];
        let s = summarize_lightcurve(&rows);
        assert_eq!(s.n_points, 4);
        assert_eq!(s.n_detections, 3);
        assert_eq!(s.filters, vec!["g".to_string(), "r".to_string()]);
        assert_eq!(s.flux_min, Some(2.0));
        assert_eq!(s.flux_max, Some(7.5));
        // non-detection at jd 30 does not stretch the span
        assert_eq!(s.time_span_days, Some(2.5));
    }

    #[test]
    fn test_summary_without_detections() {
        let rows = vec![point("a", 1.0, None, Some("i"))];
        let s = summarize_lightcurve(&rows);
        assert_eq!(s.n_points, 1);
        assert_eq!(s.n_detections, 0);
        assert_eq!(s.filters, vec!["i".to_string()]);
        assert_eq!(s.flux_min, None);
        assert_eq!(s.flux_max, None);
        assert_eq!(s.time_span_days, None);
    }

    #[test]
    fn test_summary_empty() {
        let s = summarize_lightcurve(&Vec::<LightcurveRow>::new());
        assert_eq!(s.n_points, 0);
        assert!(s.filters.is_empty());
        assert_eq!(s.time_span_days, None);
    }

    #[test]
    fn test_single_detection_has_zero_span() {
        let s = summarize_lightcurve(&[point("a", 4.0, Some(1.0), None)]);
        assert_eq!(s.time_span_days, Some(0.0));
    }
}
