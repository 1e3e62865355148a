use chrono::{NaiveDate, NaiveTime};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::models::schema::column_list;
use crate::models::{Category, MeasurementField, RawRow, RawTable, Reading, WorkingTable};
use crate::utils::constants::{DEFAULT_NA_TOKENS, OUTPUT_DATE_FORMAT, SOURCE_DATE_FORMAT, TIME_FORMAT};

/// What the normalizer changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    /// Rows dropped because date or time did not parse
    pub invalid_timestamps: usize,
    /// Non-empty cells that did not parse as a number, per column
    pub coerced_to_missing: BTreeMap<MeasurementField, usize>,
}

impl NormalizationSummary {
    pub fn total_coerced(&self) -> usize {
        self.coerced_to_missing.values().sum()
    }
}

/// Parses dates, times and measurement values of a raw batch and sorts it
/// by `(station, date, time)`.
pub struct TypeNormalizer {
    na_tokens: Vec<String>,
}

/// Outcome of parsing one raw row
enum ParsedRow {
    Valid {
        reading: Reading,
        coerced: Vec<usize>,
    },
    InvalidTimestamp,
}

impl TypeNormalizer {
    pub fn new() -> Self {
        Self {
            na_tokens: DEFAULT_NA_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_na_tokens(na_tokens: Vec<String>) -> Self {
        Self { na_tokens }
    }

    /// Convert a raw batch into a sorted working table.
    ///
    /// Unparseable measurement values become missing. Rows whose date is not
    /// `DD/MM/YYYY` or whose time is not `HH:MM` are dropped. An empty batch
    /// yields an empty table.
    pub fn normalize(&self, raw: RawTable) -> (WorkingTable, NormalizationSummary) {
        let (columns, raw_rows) = raw.into_parts();
        let mut summary = NormalizationSummary {
            input_rows: raw_rows.len(),
            ..Default::default()
        };

        if raw_rows.is_empty() {
            return (WorkingTable::empty(columns), summary);
        }

        info!(
            "Formatting date from {} to {}, time as {}",
            SOURCE_DATE_FORMAT, OUTPUT_DATE_FORMAT, TIME_FORMAT
        );

        let parsed: Vec<ParsedRow> = raw_rows
            .into_par_iter()
            .map(|row| self.parse_row(row))
            .collect();

        let mut readings = Vec::with_capacity(parsed.len());
        let mut coerced_counts = vec![0usize; columns.len()];
        for row in parsed {
            match row {
                ParsedRow::Valid { reading, coerced } => {
                    for index in coerced {
                        coerced_counts[index] += 1;
                    }
                    readings.push(reading);
                }
                ParsedRow::InvalidTimestamp => summary.invalid_timestamps += 1,
            }
        }

        info!("Converting numeric cols {}", column_list(&columns));
        for (field, count) in columns.iter().zip(&coerced_counts) {
            if *count > 0 {
                debug!("{}: {} values could not be parsed and are now missing", field, count);
                summary.coerced_to_missing.insert(*field, *count);
            }
        }

        if summary.invalid_timestamps > 0 {
            warn!(
                "Dropped {} rows with an unparseable date or time",
                summary.invalid_timestamps
            );
        }

        // Stable sort keeps collaborator order among equal keys
        readings.sort_by(|a, b| {
            a.station
                .cmp(&b.station)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.time.cmp(&b.time))
        });
        info!("Sorting by [Station, Date, Time]");

        summary.output_rows = readings.len();
        (WorkingTable::new(columns, readings), summary)
    }

    fn parse_row(&self, row: RawRow) -> ParsedRow {
        let date = NaiveDate::parse_from_str(row.date.trim(), SOURCE_DATE_FORMAT);
        let time = NaiveTime::parse_from_str(row.time.trim(), TIME_FORMAT);
        let (Ok(date), Ok(time)) = (date, time) else {
            debug!(
                "Unparseable timestamp for {}: '{}' '{}'",
                row.station, row.date, row.time
            );
            return ParsedRow::InvalidTimestamp;
        };

        let mut coerced = Vec::new();
        let values = row
            .values
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let cell = cell.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
                let value = self.coerce(cell);
                if value.is_none() {
                    coerced.push(index);
                }
                value
            })
            .collect();

        ParsedRow::Valid {
            reading: Reading::new(Category::Label(row.station.trim().to_string()), date, time, values),
            coerced,
        }
    }

    /// Numeric value of a non-empty cell, `None` for status tokens and garbage
    pub fn coerce(&self, cell: &str) -> Option<f64> {
        if self.na_tokens.iter().any(|token| token == cell) {
            return None;
        }
        cell.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Default for TypeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
