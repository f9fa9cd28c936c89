use anyhow::Result;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::Config;
use crate::pipeline::{self, parser, table::TableFormat, BuildReport};

pub fn run(
    input: String,
    output_dir: String,
    format_override: Option<String>,
    strict_override: bool,
    config_path: Option<String>,
) -> Result<BuildReport> {
    let mut config = Config::load_with_path(config_path)?;

    if let Some(ref format) = format_override {
        info!("CLI override: format = {}", format);
        config.dataset.format = TableFormat::from_str(format)?;
    }
    if strict_override {
        info!("CLI override: strict = true");
        config.dataset.strict = true;
    }

    info!("Input: {}", input);
    info!("Output directory: {}", output_dir);

    let records = parser::load_json(Path::new(&input))?;
    info!("Loaded {} records", records.len());

    let (tables, report) = pipeline::build_tables(&records, config.dataset.strict)?;
    pipeline::save_tables(&tables, Path::new(&output_dir), &config.dataset)?;

    info!(
        "Build complete: {} sources, {} lightcurve points ({} records skipped, {} duplicate ids, {} points dropped, {} duplicate points)",
        report.sources,
        report.lightcurve_points,
        report.skipped_non_object + report.skipped_invalid,
        report.duplicate_ids,
        report.points_dropped,
        report.duplicate_points
    );

    Ok(report)
}
