//! Source-level table: one flat row per candidate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::parser::{self, ParseError};

/// One row of the source-level table.
///
/// Nullable columns stay `None` when the record lacks them. Absence carries
/// meaning for downstream models and is never filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    // Core identity
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub score: Option<f64>,
    // Survey pipeline flags
    pub is_transient: Option<bool>,
    pub is_varstar: Option<bool>,
    pub is_roid: Option<bool>,
    // Enrichment
    pub redshift: Option<f64>,
    pub label: Option<String>,
    // Availability
    pub has_tns: bool,
    pub has_redshift: bool,
    pub has_photometry: bool,
    pub has_spectra: bool,
    // Counts
    pub n_photometry: usize,
    pub n_spectra: usize,
}

/// Convert a single source record into a flat row.
pub fn source_to_row(obj: &Value) -> Result<SourceRow, ParseError> {
    let meta = parser::parse_metadata(obj)?;

    let n_photometry = count_distinct(parser::parse_photometry(obj), |_| None);
    let n_spectra = count_distinct(parser::parse_spectra(obj), spectrum_key);

    Ok(SourceRow {
        id: meta.id,
        ra: meta.ra,
        dec: meta.dec,
        score: meta.score,
        is_transient: meta.is_transient,
        is_varstar: parser::boolean(obj.get("varstar")),
        is_roid: parser::boolean(obj.get("is_roid")),
        redshift: meta.redshift,
        label: parser::parse_label(obj),
        has_tns: parser::tns_info(obj).is_some(),
        has_redshift: meta.redshift.is_some(),
        has_photometry: n_photometry > 0,
        has_spectra: n_spectra > 0,
        n_photometry,
        n_spectra,
    })
}

/// Spectra are identified by their own `id` when the archive provides one.
fn spectrum_key(spectrum: &Value) -> Option<String> {
    match spectrum.get("id")? {
        Value::Null => None,
        Value::String(s) => Some(format!("id:{}", s)),
        other => Some(format!("id:{}", other)),
    }
}

/// Canonical form of a JSON value. Object keys serialise in sorted order, so
/// two entries that differ only in key order compare equal.
pub fn canonical(value: &Value) -> String {
    value.to_string()
}

/// Count entries that are distinct under `key`, falling back to the
/// canonical JSON of the whole entry.
fn count_distinct<F>(entries: &[Value], key: F) -> usize
where
    F: Fn(&Value) -> Option<String>,
{
    let mut seen = HashSet::new();
    for entry in entries {
        let k = key(entry).unwrap_or_else(|| format!("json:{}", canonical(entry)));
        seen.insert(k);
    }
    seen.len()
}
