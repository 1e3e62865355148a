use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::RawTable;
use crate::readers::RawCsvReader;

/// Reads several raw CSV batches at once and concatenates them
pub struct ConcurrentReader {
    max_workers: usize,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Read every file on the blocking pool, at most `max_workers` at a time.
    /// Batches are appended in argument order whatever order the reads finish in.
    pub async fn read_all(&self, paths: &[PathBuf]) -> Result<RawTable> {
        let permits = Arc::new(Semaphore::new(self.max_workers));

        let handles: Vec<JoinHandle<Result<RawTable>>> = paths
            .iter()
            .cloned()
            .map(|path| {
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.map_err(|e| {
                        ProcessingError::Config(format!("Reader pool closed: {}", e))
                    })?;
                    debug!("Reading {}", path.display());
                    tokio::task::spawn_blocking(move || RawCsvReader::new().read_path(&path)).await?
                })
            })
            .collect();

        let mut combined = RawTable::default();
        for handle in handles {
            let batch = handle.await??;
            combined.append(batch);
        }

        info!(
            "Read {} raw rows from {} files ({} workers)",
            combined.len(),
            paths.len(),
            self.max_workers
        );

        Ok(combined)
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementField;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_batches_keep_argument_order() -> Result<()> {
        let dir = TempDir::new()?;
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        fs::write(&first, "Station,Date,Time,O3\nTLV,01/01/2020,01:00,30\n")?;
        fs::write(&second, "Station,Date,Time,NO\nAfula,01/01/2020,01:00,4\n")?;

        let table = ConcurrentReader::new(2).read_all(&[first, second]).await?;

        assert_eq!(table.columns(), &[MeasurementField::O3, MeasurementField::No]);
        let stations: Vec<&str> = table.rows().iter().map(|r| r.station.as_str()).collect();
        assert_eq!(stations, vec!["TLV", "Afula"]);
        assert_eq!(table.rows()[1].values, vec![None, Some("4".to_string())]);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let reader = ConcurrentReader::new(1);
        let result = reader.read_all(&[PathBuf::from("/nonexistent/batch.csv")]).await;
        assert!(result.is_err());
    }
}
