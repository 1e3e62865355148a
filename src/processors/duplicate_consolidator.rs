use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::models::{Category, Reading, ReadingKey, WorkingTable};
use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateSummary {
    pub input_rows: usize,
    /// Rows identical to a later row in every field
    pub exact_duplicates: usize,
    /// Rows folded into another row sharing the same `(station, date, time)`
    pub merged_rows: usize,
    pub output_rows: usize,
}

impl DuplicateSummary {
    pub fn removed(&self) -> usize {
        self.input_rows - self.output_rows
    }
}

/// Every field of a row, with values compared bit for bit
type RowFingerprint = (Category, NaiveDate, NaiveTime, Vec<Option<u64>>);

/// Running per-column sum and count of non-missing values for one key
struct GroupAccumulator {
    sums: Vec<f64>,
    counts: Vec<usize>,
    members: usize,
}

impl GroupAccumulator {
    fn new(width: usize) -> Self {
        Self {
            sums: vec![0.0; width],
            counts: vec![0; width],
            members: 0,
        }
    }

    fn add(&mut self, values: &[Option<f64>]) {
        self.members += 1;
        for (index, value) in values.iter().enumerate() {
            if let Some(v) = value {
                self.sums[index] += v;
                self.counts[index] += 1;
            }
        }
    }

    fn means(&self) -> Vec<Option<f64>> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(sum, count)| (*count > 0).then(|| sum / *count as f64))
            .collect()
    }
}

/// Collapses repeated scrapes of the same timestamp into one reading
pub struct DuplicateConsolidator;

impl DuplicateConsolidator {
    pub fn new() -> Self {
        Self
    }

    /// Drop exact duplicates (last occurrence wins), then average the
    /// non-missing values of rows sharing `(station, date, time)`.
    ///
    /// The output is ordered by key and has unique keys.
    pub fn consolidate(&self, table: WorkingTable) -> (WorkingTable, DuplicateSummary) {
        let mut summary = DuplicateSummary {
            input_rows: table.len(),
            ..Default::default()
        };

        if table.is_empty() {
            return (table, summary);
        }

        info!("Data frame before cleaning duplicates: {} rows x {} columns", table.len(), table.columns().len());

        let (columns, rows) = table.into_parts();
        let rows = Self::remove_exact_duplicates(rows);
        summary.exact_duplicates = summary.input_rows - rows.len();
        let distinct_rows = rows.len();

        let mut groups: BTreeMap<ReadingKey, GroupAccumulator> = BTreeMap::new();
        for reading in &rows {
            groups
                .entry(reading.key())
                .or_insert_with(|| GroupAccumulator::new(columns.len()))
                .add(&reading.values);
        }

        let merged: Vec<Reading> = groups
            .into_iter()
            .map(|((station, date, time), group)| Reading::new(station, date, time, group.means()))
            .collect();

        summary.merged_rows = distinct_rows - merged.len();
        summary.output_rows = merged.len();

        info!(
            "Removed {} duplicate rows ({} exact, {} merged by mean)",
            summary.removed(),
            summary.exact_duplicates,
            summary.merged_rows
        );
        info!("Data frame after cleaning duplicates: {} rows x {} columns", merged.len(), columns.len());

        (WorkingTable::new(columns, merged), summary)
    }

    /// Keep the last of every group of identical rows, preserving order
    fn remove_exact_duplicates(rows: Vec<Reading>) -> Vec<Reading> {
        let mut seen: HashSet<RowFingerprint> = HashSet::with_capacity(rows.len());
        let mut kept: Vec<Reading> = rows
            .into_iter()
            .rev()
            .filter(|reading| seen.insert(Self::fingerprint(reading)))
            .collect();
        kept.reverse();
        kept
    }

    fn fingerprint(reading: &Reading) -> RowFingerprint {
        // -0.0 and 0.0 compare equal
        let values = reading
            .values
            .iter()
            .map(|v| v.map(|x| (x + 0.0).to_bits()))
            .collect();
        (reading.station.clone(), reading.date, reading.time, values)
    }
}

impl Default for DuplicateConsolidator {
    fn default() -> Self {
        Self::new()
    }
}
