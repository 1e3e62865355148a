use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementField, RawTable, WorkingTable, KEY_COLUMNS};

/// How a CSV sink treats an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkMode {
    #[default]
    Overwrite,
    /// Add rows under an existing header, which must match exactly
    Append,
}

pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Cleaned table: dates as `YYYY/MM/DD`, times as `HH:MM`, missing values as empty cells
    pub fn write_table(&self, table: &WorkingTable, path: &Path, mode: SinkMode) -> Result<()> {
        let header = Self::header(table.columns());
        let records = table.rows().iter().map(|row| {
            let mut record = vec![row.station.to_string(), row.formatted_date(), row.formatted_time()];
            record.extend(row.values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            record
        });

        self.write_records(path, mode, &header, records)?;
        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    /// Raw batch exactly as collected, for the import command
    pub fn write_raw(&self, table: &RawTable, path: &Path, mode: SinkMode) -> Result<()> {
        let header = Self::header(table.columns());
        let records = table.rows().iter().map(|row| {
            let mut record = vec![row.station.clone(), row.date.clone(), row.time.clone()];
            record.extend(row.values.iter().map(|v| v.clone().unwrap_or_default()));
            record
        });

        self.write_records(path, mode, &header, records)?;
        info!("Wrote {} raw rows to {}", table.len(), path.display());
        Ok(())
    }

    fn header(columns: &[MeasurementField]) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(columns.iter().map(|f| f.column_name().to_string()))
            .collect()
    }

    fn write_records(
        &self,
        path: &Path,
        mode: SinkMode,
        header: &[String],
        records: impl Iterator<Item = Vec<String>>,
    ) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let write_header = match mode {
            SinkMode::Overwrite => true,
            SinkMode::Append => !self.check_existing_header(path, header)?,
        };

        let file = match mode {
            SinkMode::Overwrite => File::create(path)?,
            SinkMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(header)?;
        }
        for record in records {
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// True when the sink already has a header; errors if it differs from `expected`
    fn check_existing_header(&self, path: &Path, expected: &[String]) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let mut first_line = String::new();
        BufReader::new(File::open(path)?).read_line(&mut first_line)?;
        if first_line.trim().is_empty() {
            debug!("Appending to empty sink {}", path.display());
            return Ok(false);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .from_reader(first_line.as_bytes());
        let found: Vec<String> = match reader.records().next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        };

        if found != expected {
            return Err(ProcessingError::SinkMismatch {
                path: path.display().to_string(),
                expected: expected.join(", "),
                found: found.join(", "),
            });
        }

        Ok(true)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
