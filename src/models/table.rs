use crate::error::{ProcessingError, Result};
use crate::models::reading::Reading;
use crate::models::schema::MeasurementField;

/// One row of a raw batch exactly as a collaborator delivered it
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawRow {
    pub station: String,
    pub date: String,
    pub time: String,
    pub values: Vec<Option<String>>,
}

impl RawRow {
    pub fn new(
        station: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Self {
        Self {
            station: station.into(),
            date: date.into(),
            time: time.into(),
            values,
        }
    }
}

/// Untyped batch of scraped or fetched rows sharing one header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<MeasurementField>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(columns: Vec<MeasurementField>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<MeasurementField>, rows: Vec<RawRow>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: RawRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Row for {} {} {} has {} values, table has {} measurement columns",
                row.station,
                row.date,
                row.time,
                row.values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Concatenate another batch, realigning its columns by name.
    /// Columns known to only one side are missing on the other.
    pub fn append(&mut self, other: RawTable) {
        for field in &other.columns {
            if !self.columns.contains(field) {
                self.columns.push(*field);
                for row in &mut self.rows {
                    row.values.push(None);
                }
            }
        }

        let positions: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|field| self.column_index(*field))
            .collect();

        for row in other.rows {
            let mut values = vec![None; self.columns.len()];
            for (value, position) in row.values.into_iter().zip(&positions) {
                values[*position] = value;
            }
            self.rows.push(RawRow { values, ..row });
        }
    }

    pub fn column_index(&self, field: MeasurementField) -> Option<usize> {
        self.columns.iter().position(|c| *c == field)
    }

    pub fn columns(&self) -> &[MeasurementField] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<MeasurementField>, Vec<RawRow>) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Typed table flowing through the cleaning stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingTable {
    columns: Vec<MeasurementField>,
    rows: Vec<Reading>,
}

impl WorkingTable {
    /// Build a table without checking row widths. Stages use this for rows
    /// they derived from a table of the same columns; callers holding
    /// arbitrary readings should use [`WorkingTable::with_rows`].
    pub fn new(columns: Vec<MeasurementField>, rows: Vec<Reading>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        Self { columns, rows }
    }

    /// Build a table, failing if any reading's width differs from `columns`
    pub fn with_rows(columns: Vec<MeasurementField>, rows: Vec<Reading>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != columns.len()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Reading for {} {} {} has {} values, table has {} measurement columns",
                row.station,
                row.formatted_date(),
                row.formatted_time(),
                row.values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn empty(columns: Vec<MeasurementField>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[MeasurementField] {
        &self.columns
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<MeasurementField>, Vec<Reading>) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, field: MeasurementField) -> Option<usize> {
        self.columns.iter().position(|c| *c == field)
    }

    /// Values of one column in row order, `None` if the column is absent
    pub fn column(&self, field: MeasurementField) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(field)?;
        Some(self.rows.iter().map(|r| r.values.get(index).copied().flatten()).collect())
    }

    pub fn missing_count(&self, field: MeasurementField) -> usize {
        match self.column_index(field) {
            Some(index) => self
                .rows
                .iter()
                .filter(|r| r.values.get(index).copied().flatten().is_none())
                .count(),
            None => 0,
        }
    }

    /// Share of missing values in a column, in percent
    pub fn missing_percentage(&self, field: MeasurementField) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        100.0 * self.missing_count(field) as f64 / self.rows.len() as f64
    }

    /// Copy of the table without the given columns
    pub fn without_columns(self, dropped: &[MeasurementField]) -> WorkingTable {
        if dropped.is_empty() {
            return self;
        }

        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !dropped.contains(&self.columns[i]))
            .collect();
        let columns = keep.iter().map(|&i| self.columns[i]).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|reading| {
                let values = keep
                    .iter()
                    .map(|&i| reading.values.get(i).copied().flatten())
                    .collect();
                Reading { values, ..reading }
            })
            .collect();

        WorkingTable { columns, rows }
    }
}
