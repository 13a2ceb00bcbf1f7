//! CSV loader for the hourly price, PV, and demand series.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::{ColumnRef, DataConfig};
use crate::error::{Error, Result};
use crate::series::HourlySeries;

/// A schema column resolved against the header row.
#[derive(Debug)]
struct Column {
    index: usize,
    label: String,
}

impl Column {
    fn resolve(column: &ColumnRef, headers: &csv::StringRecord) -> Result<Self> {
        match column {
            ColumnRef::Index(index) => Ok(Self {
                index: *index,
                label: headers
                    .get(*index)
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map_or_else(|| column.to_string(), str::to_string),
            }),
            ColumnRef::Name(name) => headers
                .iter()
                .position(|h| h.trim() == name)
                .map(|index| Self {
                    index,
                    label: name.clone(),
                })
                .ok_or_else(|| Error::Parse {
                    line: 1,
                    column: name.clone(),
                    message: "column not found in header row".to_string(),
                }),
        }
    }

    /// Parses a field that has no missing-value fallback.
    fn required(&self, record: &csv::StringRecord, line: usize) -> Result<f64> {
        let raw = record.get(self.index).ok_or_else(|| self.error(line, "field is absent"))?;
        parse_number(raw).ok_or_else(|| self.error(line, format!("\"{raw}\" is not a finite number")))
    }

    /// Parses a field where blank or absent means zero.
    fn optional(&self, record: &csv::StringRecord, line: usize) -> Result<f64> {
        match record.get(self.index).map(str::trim) {
            None | Some("") => Ok(0.0),
            Some(raw) => parse_number(raw)
                .ok_or_else(|| self.error(line, format!("\"{raw}\" is not a finite number"))),
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            line,
            column: self.label.clone(),
            message: message.into(),
        }
    }
}

/// Parses a finite number; `NaN` and infinities count as malformed.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok().filter(|v: &f64| v.is_finite())
}

/// Loads the hourly series from a CSV file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened, otherwise see
/// [`read_series`].
pub fn load_series(path: &Path, config: &DataConfig) -> Result<HourlySeries> {
    let file = File::open(path)?;
    debug!(path = %path.display(), "reading hourly data");
    read_series(file, config)
}

/// Reads the hourly series from any CSV source.
///
/// The first row is a header and is only used to resolve named columns.
/// PV values are multiplied by `config.pv_scale` (Wh to kWh by default).
/// A blank or absent demand field counts as zero; price and PV have no
/// such fallback.
///
/// # Errors
///
/// Returns [`Error::Parse`] for a missing or malformed price or PV field,
/// a malformed non-blank demand field, or a named column absent from the
/// header. CSV framing problems surface as [`Error::Csv`].
pub fn read_series(reader: impl Read, config: &DataConfig) -> Result<HourlySeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(config.delimiter as u8)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let price_col = Column::resolve(&config.columns.price, &headers)?;
    let pv_col = Column::resolve(&config.columns.pv, &headers)?;
    let demand_col = Column::resolve(&config.columns.demand, &headers)?;

    let mut price = Vec::new();
    let mut pv = Vec::new();
    let mut demand = Vec::new();
    let mut blank_demand = 0_usize;

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // quoted fields may span lines, so record index and file line differ
        let line = record
            .position()
            .map_or(i + 2, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
        pv.push(config.pv_scale * pv_col.required(&record, line)?);
        price.push(price_col.required(&record, line)?);
        let d = demand_col.optional(&record, line)?;
        if record.get(demand_col.index).is_none_or(|f| f.trim().is_empty()) {
            blank_demand += 1;
        }
        demand.push(d);
    }

    debug!(rows = price.len(), blank_demand, "parsed hourly series");
    HourlySeries::new(price, pv, demand)
}
