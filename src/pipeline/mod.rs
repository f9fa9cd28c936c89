//! JSON export → two flat tables keyed by source `id`.
//!
//! `sources` holds one row per candidate, `lightcurves` one row per distinct
//! photometry point. Only records that make it into `sources` contribute
//! lightcurve rows, so every lightcurve `id` joins to exactly one source.

pub mod dataset;
pub mod lightcurves;
pub mod parser;
pub mod table;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::DatasetConfig;
use dataset::SourceRow;
use lightcurves::LightcurveRow;
use parser::ParseError;

/// Both output tables of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub sources: Vec<SourceRow>,
    pub lightcurves: Vec<LightcurveRow>,
}

/// Counters describing what a build kept and what it left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub records_seen: usize,
    pub sources: usize,
    pub skipped_non_object: usize,
    pub skipped_invalid: usize,
    pub duplicate_ids: usize,
    pub lightcurve_points: usize,
    pub points_dropped: usize,
    pub duplicate_points: usize,
}

/// Build both tables in a single pass over the records.
///
/// In strict mode the first invalid record aborts the build; otherwise it is
/// skipped and counted.
pub fn build_tables(records: &[Value], strict: bool) -> Result<(Tables, BuildReport)> {
    let mut tables = Tables::default();
    let mut report = BuildReport {
        records_seen: records.len(),
        ..BuildReport::default()
    };
    let mut seen_ids = HashSet::new();

    for (index, obj) in records.iter().enumerate() {
        let row = match dataset::source_to_row(obj) {
            Ok(row) => row,
            // Non-object entries are not candidates; strict mode only covers records
            Err(ParseError::NotAnObject) => {
                report.skipped_non_object += 1;
                continue;
            }
            Err(e) if !strict => {
                warn!(
                    "Skipping record {} ({}): {}",
                    index,
                    parser::source_id(obj).unwrap_or_else(|| "no id".to_string()),
                    e
                );
                report.skipped_invalid += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Invalid record at index {}", index)),
        };

        if !seen_ids.insert(row.id.clone()) {
            warn!(
                "Skipping record {}: duplicate id {} (first occurrence kept)",
                index, row.id
            );
            report.duplicate_ids += 1;
            continue;
        }

        let (points, stats) = lightcurves::points_to_rows(&row.id, parser::parse_photometry(obj));
        report.lightcurve_points += stats.emitted;
        report.points_dropped += stats.dropped;
        report.duplicate_points += stats.duplicates;

        tables.sources.push(row);
        tables.lightcurves.extend(points);
    }

    report.sources = tables.sources.len();
    Ok((tables, report))
}

/// Source-level table, skipping records that cannot be flattened.
pub fn build_dataset(records: &[Value]) -> Vec<SourceRow> {
    lenient(records).sources
}

/// Long-format photometry table for the same records as [`build_dataset`].
pub fn build_lightcurve_dataset(records: &[Value]) -> Vec<LightcurveRow> {
    lenient(records).lightcurves
}

fn lenient(records: &[Value]) -> Tables {
    // Non-strict builds never fail
    build_tables(records, false)
        .map(|(tables, _)| tables)
        .unwrap_or_default()
}

/// Write both tables into `out_dir`, creating it if needed.
pub fn save_tables(tables: &Tables, out_dir: &Path, config: &DatasetConfig) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let sources_path = config.sources_path(out_dir);
    let lightcurves_path = config.lightcurves_path(out_dir);
    table::write_table(&tables.sources, &sources_path, config.format)?;
    table::write_table(&tables.lightcurves, &lightcurves_path, config.format)?;

    info!(
        "Wrote {} sources to {} and {} lightcurve points to {}",
        tables.sources.len(),
        sources_path.display(),
        tables.lightcurves.len(),
        lightcurves_path.display()
    );
    Ok(())
}

/// Read both tables back from `dir`.
pub fn load_tables(dir: &Path, config: &DatasetConfig) -> Result<Tables> {
    Ok(Tables {
        sources: table::read_table(&config.sources_path(dir), config.format)?,
        lightcurves: table::read_table(&config.lightcurves_path(dir), config.format)?,
    })
}
