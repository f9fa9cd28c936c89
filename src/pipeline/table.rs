//! Reading and writing the flat tables.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::util::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TableFormat {
    #[default]
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl TableFormat {
    pub fn extension(&self) -> &str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::JsonLines => "jsonl",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_str(ext),
            None => bail!("Cannot infer table format of {}", path.display()),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TableFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "jsonl" | "ndjson" | "json-lines" => Ok(TableFormat::JsonLines),
            _ => bail!("Unknown table format: {} (expected csv or jsonl)", s),
        }
    }
}

// Config files accept exactly what `--format` accepts
impl<'de> Deserialize<'de> for TableFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_str(&name).map_err(serde::de::Error::custom)
    }
}

/// Write rows to `path`, replacing any previous table atomically.
///
/// CSV leaves missing values as empty cells; JSON Lines writes `null`.
pub fn write_table<T: Serialize>(rows: &[T], path: &Path, format: TableFormat) -> Result<()> {
    debug!("Writing {} rows to {}", rows.len(), path.display());
    write_atomic(path, |out| match format {
        TableFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        }
        TableFormat::JsonLines => {
            for row in rows {
                serde_json::to_writer(&mut *out, row)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        }
    })
}

/// Read a table written by [`write_table`].
pub fn read_table<T: DeserializeOwned>(path: &Path, format: TableFormat) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let rows = match format {
        TableFormat::Csv => {
            let mut reader = csv::Reader::from_reader(file);
            let mut rows: Vec<T> = Vec::new();
            for (i, record) in reader.deserialize::<T>().enumerate() {
                // +2: one for the header, one for 1-based line numbers
                let row = record
                    .with_context(|| format!("{}: bad row at line {}", path.display(), i + 2))?;
                rows.push(row);
            }
            rows
        }
        TableFormat::JsonLines => {
            let mut rows: Vec<T> = Vec::new();
            for (i, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line)
                    .with_context(|| format!("{}: bad row at line {}", path.display(), i + 1))?;
                rows.push(row);
            }
            rows
        }
    };

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
