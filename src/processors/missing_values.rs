use std::collections::BTreeMap;
use tracing::info;

use crate::config::CleaningConfig;
use crate::models::schema::column_list;
use crate::models::{MeasurementField, WorkingTable};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillSummary {
    /// Longest run of missing slots that was eligible for filling
    pub limit: usize,
    pub filled: BTreeMap<MeasurementField, usize>,
    pub still_missing: BTreeMap<MeasurementField, usize>,
}

impl FillSummary {
    pub fn total_filled(&self) -> usize {
        self.filled.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneSummary {
    pub dropped_columns: Vec<MeasurementField>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingValueSummary {
    pub input_rows: usize,
    pub fill: FillSummary,
    pub all_missing_rows: usize,
    pub prune: PruneSummary,
    pub output_rows: usize,
}

/// Missing-data policy: bounded forward-fill, all-missing row removal and
/// corruption pruning by column ratio and row count.
pub struct MissingValueHandler {
    columns_threshold: f64,
    rows_threshold: usize,
    days_limit: usize,
    samples_per_day: usize,
}

impl MissingValueHandler {
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            columns_threshold: config.columns_threshold,
            rows_threshold: config.rows_threshold,
            days_limit: config.days_limit,
            samples_per_day: config.samples_per_day(),
        }
    }

    pub fn with_thresholds(columns_threshold: f64, rows_threshold: usize) -> Self {
        Self::new(
            &CleaningConfig::default()
                .with_columns_threshold(columns_threshold)
                .with_rows_threshold(rows_threshold),
        )
    }

    pub fn with_days_limit(mut self, days_limit: usize) -> Self {
        self.days_limit = days_limit;
        self
    }

    pub fn fill_limit(&self) -> usize {
        self.days_limit * self.samples_per_day
    }

    /// Run all three steps in order
    pub fn handle(&self, table: WorkingTable) -> (WorkingTable, MissingValueSummary) {
        let mut summary = MissingValueSummary {
            input_rows: table.len(),
            ..Default::default()
        };

        if table.is_empty() {
            return (table, summary);
        }

        let input_columns = table.columns().len();

        let (table, fill) = self.forward_fill(table);
        let (table, all_missing_rows) = self.drop_all_missing_rows(table);
        let (table, prune) = self.prune_corrupted(table);

        info!(
            "Data frame before handling missing values: {} rows x {} columns, after: {} rows x {} columns",
            summary.input_rows,
            input_columns,
            table.len(),
            table.columns().len()
        );

        summary.fill = fill;
        summary.all_missing_rows = all_missing_rows;
        summary.prune = prune;
        summary.output_rows = table.len();

        (table, summary)
    }

    /// Carry the last known value of each station forward over at most
    /// `days_limit * samples_per_day` consecutive missing rows. Rows must be
    /// sorted by `(station, date, time)`.
    ///
    /// The last value and the gap count reset at every station boundary, so
    /// a station's leading gap stays missing instead of inheriting the
    /// previous station's readings. A whole-frame pandas `ffill` would carry
    /// them over.
    pub fn forward_fill(&self, table: WorkingTable) -> (WorkingTable, FillSummary) {
        let limit = self.fill_limit();
        let mut summary = FillSummary {
            limit,
            ..Default::default()
        };

        if table.is_empty() {
            return (table, summary);
        }

        let (columns, mut rows) = table.into_parts();

        for (index, field) in columns.iter().enumerate() {
            let mut last: Option<f64> = None;
            let mut gap = 0usize;
            let mut filled = 0usize;
            let mut still_missing = 0usize;

            for i in 0..rows.len() {
                if i > 0 && rows[i].station != rows[i - 1].station {
                    last = None;
                    gap = 0;
                }

                match rows[i].values[index] {
                    Some(value) => {
                        last = Some(value);
                        gap = 0;
                    }
                    None => {
                        gap += 1;
                        match last {
                            Some(value) if gap <= limit => {
                                rows[i].values[index] = Some(value);
                                filled += 1;
                            }
                            _ => still_missing += 1,
                        }
                    }
                }
            }

            summary.filled.insert(*field, filled);
            summary.still_missing.insert(*field, still_missing);
        }

        let lines: Vec<String> = columns
            .iter()
            .map(|field| {
                format!(
                    "{}: {} values ({} still left)",
                    field, summary.filled[field], summary.still_missing[field]
                )
            })
            .collect();
        info!(
            "Forward filling [{} days limit, {} slots]:\n{}",
            self.days_limit,
            limit,
            lines.join("\n")
        );

        (WorkingTable::new(columns, rows), summary)
    }

    /// Remove rows in which every measurement field is missing
    pub fn drop_all_missing_rows(&self, table: WorkingTable) -> (WorkingTable, usize) {
        if table.is_empty() {
            return (table, 0);
        }

        let before = table.len();
        let (columns, rows) = table.into_parts();
        let rows: Vec<_> = rows.into_iter().filter(|r| !r.is_all_missing()).collect();
        let dropped = before - rows.len();

        info!("Dropped {} rows with all columns missing values", dropped);

        (WorkingTable::new(columns, rows), dropped)
    }

    /// Drop columns whose missing share exceeds `columns_threshold` percent,
    /// then rows missing more than `rows_threshold` of the remaining fields.
    pub fn prune_corrupted(&self, table: WorkingTable) -> (WorkingTable, PruneSummary) {
        let mut summary = PruneSummary::default();

        if table.is_empty() {
            return (table, summary);
        }

        summary.dropped_columns = table
            .columns()
            .iter()
            .copied()
            .filter(|field| table.missing_percentage(*field) > self.columns_threshold)
            .collect();

        info!(
            "Dropped {} columns: {}, having more than {}% missing values",
            summary.dropped_columns.len(),
            column_list(&summary.dropped_columns),
            self.columns_threshold
        );

        let table = table.without_columns(&summary.dropped_columns);

        let before = table.len();
        let (columns, rows) = table.into_parts();
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|r| r.missing_count() <= self.rows_threshold)
            .collect();
        summary.dropped_rows = before - rows.len();

        if summary.dropped_rows > 0 {
            info!(
                "Dropped {} rows with more than {} columns missing values",
                summary.dropped_rows, self.rows_threshold
            );
        }

        (WorkingTable::new(columns, rows), summary)
    }
}

impl Default for MissingValueHandler {
    fn default() -> Self {
        Self::new(&CleaningConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Reading};
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
    use pretty_assertions::assert_eq;

    /// One station, consecutive 6-hourly slots starting 2020-01-01 01:00
    fn series(station: &str, values: &[Option<f64>]) -> Vec<Reading> {
        let start = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
        );
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let at = start + Duration::hours(6 * i as i64);
                Reading::new(Category::label(station), at.date(), at.time(), vec![*v])
            })
            .collect()
    }

    fn single_column(rows: Vec<Reading>) -> WorkingTable {
        WorkingTable::new(vec![MeasurementField::Pressure], rows)
    }

    #[test]
    fn test_fill_within_limit() {
        let table = single_column(series("A", &[Some(1.0), None, None, Some(4.0), None]));
        let (filled, summary) = MissingValueHandler::default().forward_fill(table);

        assert_eq!(
            filled.column(MeasurementField::Pressure).unwrap(),
            vec![Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]
        );
        assert_eq!(summary.limit, 8);
        assert_eq!(summary.filled[&MeasurementField::Pressure], 3);
        assert_eq!(summary.still_missing[&MeasurementField::Pressure], 0);
    }

    #[test]
    fn test_fill_bounded_run() {
        // One value followed by 10 missing slots; only the first 8 are filled
        let mut values = vec![Some(5.0)];
        values.extend(std::iter::repeat(None).take(10));
        values.push(Some(7.0));
        let table = single_column(series("A", &values));

        let (filled, summary) = MissingValueHandler::default().forward_fill(table);
        let column = filled.column(MeasurementField::Pressure).unwrap();

        assert!(column[1..=8].iter().all(|v| *v == Some(5.0)));
        assert_eq!(column[9], None);
        assert_eq!(column[10], None);
        assert_eq!(column[11], Some(7.0));
        assert_eq!(summary.filled[&MeasurementField::Pressure], 8);
        assert_eq!(summary.still_missing[&MeasurementField::Pressure], 2);
    }

    #[test]
    fn test_fill_limit_follows_days_limit() {
        let handler = MissingValueHandler::default().with_days_limit(1);
        assert_eq!(handler.fill_limit(), 4);

        let handler = MissingValueHandler::default().with_days_limit(0);
        let table = single_column(series("A", &[Some(1.0), None]));
        let (filled, _) = handler.forward_fill(table);
        assert_eq!(filled.column(MeasurementField::Pressure).unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_fill_does_not_cross_stations() {
        let mut rows = series("A", &[Some(1.0), Some(2.0)]);
        rows.extend(series("B", &[None, Some(3.0)]));
        let (filled, _) = MissingValueHandler::default().forward_fill(single_column(rows));

        assert_eq!(
            filled.column(MeasurementField::Pressure).unwrap(),
            vec![Some(1.0), Some(2.0), None, Some(3.0)]
        );
    }

    #[test]
    fn test_leading_gap_stays_missing() {
        let table = single_column(series("A", &[None, None, Some(3.0)]));
        let (filled, summary) = MissingValueHandler::default().forward_fill(table);
        assert_eq!(
            filled.column(MeasurementField::Pressure).unwrap(),
            vec![None, None, Some(3.0)]
        );
        assert_eq!(summary.still_missing[&MeasurementField::Pressure], 2);
    }

    #[test]
    fn test_fill_preserves_row_count() {
        let table = single_column(series("A", &[None, None, None]));
        let (filled, _) = MissingValueHandler::default().forward_fill(table);
        assert_eq!(filled.len(), 3);
    }

    #[test]
    fn test_drop_all_missing_rows() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        let table = WorkingTable::new(
            vec![MeasurementField::Pressure, MeasurementField::O3],
            vec![
                Reading::new(Category::label("A"), date, time, vec![None, None]),
                Reading::new(Category::label("B"), date, time, vec![None, Some(1.0)]),
            ],
        );

        let (table, dropped) = MissingValueHandler::default().drop_all_missing_rows(table);
        assert_eq!(dropped, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].station, Category::label("B"));
    }

    /// Ten rows; `missing[c]` is how many leading rows miss column `c`
    fn table_with_missing(columns: &[MeasurementField], missing: &[usize]) -> WorkingTable {
        let rows: Vec<Reading> = (0..10)
            .map(|i| {
                let values = missing
                    .iter()
                    .map(|&m| if i < m { None } else { Some(i as f64) })
                    .collect();
                Reading::new(
                    Category::label("A"),
                    NaiveDate::from_ymd_opt(2020, 1, 1 + i as u32).unwrap(),
                    NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
                    values,
                )
            })
            .collect();
        WorkingTable::new(columns.to_vec(), rows)
    }

    #[test]
    fn test_column_threshold() {
        let columns = [MeasurementField::No, MeasurementField::No2, MeasurementField::O3];
        // 80% missing, 60% missing, 70% missing
        let table = table_with_missing(&columns, &[8, 6, 7]);

        let handler = MissingValueHandler::with_thresholds(70.0, 12);
        let (table, summary) = handler.prune_corrupted(table);

        assert_eq!(summary.dropped_columns, vec![MeasurementField::No]);
        assert_eq!(table.columns(), &[MeasurementField::No2, MeasurementField::O3]);
        assert_eq!(summary.dropped_rows, 0);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_row_threshold_counts_remaining_columns_only() {
        let columns = [
            MeasurementField::No,
            MeasurementField::No2,
            MeasurementField::O3,
            MeasurementField::Pm10,
        ];
        // No is 90% missing and gets dropped first; rows 0..2 then miss 2 fields
        let table = table_with_missing(&columns, &[9, 2, 2, 1]);

        let handler = MissingValueHandler::with_thresholds(70.0, 1);
        let (table, summary) = handler.prune_corrupted(table);

        assert_eq!(summary.dropped_columns, vec![MeasurementField::No]);
        assert_eq!(summary.dropped_rows, 2);
        assert_eq!(table.len(), 8);
        assert!(table.rows().iter().all(|r| r.missing_count() <= 1));
    }

    #[test]
    fn test_handle_runs_all_steps() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        let table = WorkingTable::new(
            vec![MeasurementField::Pressure],
            vec![Reading::new(Category::label("A"), date, time, vec![None])],
        );

        let (table, summary) = MissingValueHandler::default().handle(table);
        assert!(table.is_empty());
        assert_eq!(summary.all_missing_rows, 1);
        assert_eq!(summary.output_rows, 0);
    }

    #[test]
    fn test_empty_table_is_noop() {
        let handler = MissingValueHandler::default();
        let (table, summary) = handler.handle(WorkingTable::default());
        assert!(table.is_empty());
        assert_eq!(summary, MissingValueSummary::default());
    }
}
