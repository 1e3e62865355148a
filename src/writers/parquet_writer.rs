use crate::error::{ProcessingError, Result};
use crate::models::{Reading, WorkingTable, DATE_COLUMN, STATION_COLUMN, TIME_COLUMN};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray, Time32SecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Timelike};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Days from 0001-01-01 to 1970-01-01, the Date32 epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write a cleaned table, replacing any existing file
    pub fn write_table(&self, table: &WorkingTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let schema = Self::create_schema(table);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in table.rows().chunks(self.row_group_size) {
            let batch = Self::rows_to_batch(table, chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    /// Key columns followed by one nullable Float64 per measurement column
    fn create_schema(table: &WorkingTable) -> Arc<Schema> {
        let mut fields = vec![
            Field::new(STATION_COLUMN, DataType::Utf8, false),
            Field::new(DATE_COLUMN, DataType::Date32, false),
            Field::new(TIME_COLUMN, DataType::Time32(TimeUnit::Second), false),
        ];
        fields.extend(
            table
                .columns()
                .iter()
                .map(|field| Field::new(field.column_name(), DataType::Float64, true)),
        );

        Arc::new(Schema::new(fields))
    }

    fn rows_to_batch(
        table: &WorkingTable,
        rows: &[Reading],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let stations: Vec<String> = rows.iter().map(|r| r.station.to_string()).collect();
        let dates: Vec<i32> = rows
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let times: Vec<i32> = rows
            .iter()
            .map(|r| r.time.num_seconds_from_midnight() as i32)
            .collect();

        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(stations)),
            Arc::new(Date32Array::from(dates)),
            Arc::new(Time32SecondArray::from(times)),
        ];
        for index in 0..table.columns().len() {
            let values: Vec<Option<f64>> = rows.iter().map(|r| r.values[index]).collect();
            arrays.push(Arc::new(Float64Array::from(values)));
        }

        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes: Vec<i64> = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // Compression actually used by the file, not this writer's setting
        let compression = (0..row_groups)
            .flat_map(|i| metadata.row_group(i).columns().iter())
            .map(|column| column.compression())
            .next()
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: fs::metadata(path)?.len(),
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, MeasurementField, Reading};
    use arrow::array::Array;
    use chrono::{NaiveDate, NaiveTime};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_table(rows: usize) -> WorkingTable {
        let date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let readings = (0..rows)
            .map(|i| {
                let time = NaiveTime::from_hms_opt(((i % 4) * 6 + 1) as u32, 0, 0).unwrap();
                let o3 = if i % 2 == 0 { Some(i as f64) } else { None };
                Reading::new(Category::label("TLV"), date, time, vec![Some(1013.0), o3])
            })
            .collect();
        WorkingTable::new(
            vec![MeasurementField::Pressure, MeasurementField::O3],
            readings,
        )
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out").join("clean.parquet");

        ParquetWriter::new().write_table(&sample_table(3), &path)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>()?;
        let batch = &batches[0];

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(4).name(), "O3");

        let dates = batch.column(1).as_any().downcast_ref::<Date32Array>().unwrap();
        // 2020-01-02 is 18263 days after the epoch
        assert_eq!(dates.value(0), 18263);

        let times = batch.column(2).as_any().downcast_ref::<Time32SecondArray>().unwrap();
        assert_eq!(times.value(1), 7 * 3600);

        let o3 = batch.column(4).as_any().downcast_ref::<Float64Array>().unwrap();
        assert!(o3.is_null(1));
        assert_eq!(o3.value(2), 2.0);

        Ok(())
    }

    #[test]
    fn test_row_groups_and_info() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("clean.parquet");

        let writer = ParquetWriter::new()
            .with_compression("zstd")?
            .with_row_group_size(4);
        writer.write_table(&sample_table(10), &path)?;

        let info = writer.get_file_info(&path)?;
        assert_eq!(info.total_rows, 10);
        assert_eq!(info.row_group_sizes, vec![4, 4, 2]);
        assert!(matches!(info.compression, Compression::ZSTD(_)));
        assert!(info.summary().contains("Total rows: 10"));

        Ok(())
    }

    #[test]
    fn test_unknown_compression() {
        assert!(ParquetWriter::new().with_compression("brotli-max").is_err());
    }
}
