use tracing::info;

use crate::config::CleaningConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementField, RawTable, WorkingTable};
use crate::processors::report::CleaningReport;
use crate::processors::{
    CategoricalNormalizer, DuplicateConsolidator, MissingValueHandler, OutlierClamper,
    TypeNormalizer,
};
use crate::utils::progress::ProgressReporter;

pub const STAGE_COUNT: u64 = 5;

/// Ordered composition of the cleaning stages.
///
/// Each stage takes ownership of the table produced by the previous one and
/// returns a new table; nothing is shared between stages or between runs.
pub struct CleaningPipeline {
    config: CleaningConfig,
    required_columns: Vec<MeasurementField>,
    normalizer: TypeNormalizer,
    consolidator: DuplicateConsolidator,
    missing: MissingValueHandler,
    clamper: OutlierClamper,
    categorical: CategoricalNormalizer,
}

impl CleaningPipeline {
    pub fn new(config: CleaningConfig) -> Result<Self> {
        config.validate_all()?;
        let required_columns = config.canonical_columns()?;

        Ok(Self {
            normalizer: TypeNormalizer::with_na_tokens(config.na_tokens.clone()),
            consolidator: DuplicateConsolidator::new(),
            missing: MissingValueHandler::new(&config),
            clamper: OutlierClamper::new(config.ranges.clone()),
            categorical: CategoricalNormalizer::new(),
            required_columns,
            config,
        })
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Fail if any configured canonical column is absent from the batch
    pub fn validate_schema(&self, raw: &RawTable) -> Result<()> {
        let missing: Vec<String> = self
            .required_columns
            .iter()
            .filter(|field| raw.column_index(**field).is_none())
            .map(|field| field.column_name().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProcessingError::MissingColumns(missing))
        }
    }

    pub fn run(&self, raw: RawTable) -> Result<(WorkingTable, CleaningReport)> {
        self.run_with_progress(raw, None)
    }

    pub fn run_with_progress(
        &self,
        raw: RawTable,
        progress: Option<&ProgressReporter>,
    ) -> Result<(WorkingTable, CleaningReport)> {
        let mut report = CleaningReport {
            input_rows: raw.len(),
            input_columns: raw.columns().to_vec(),
            ..Default::default()
        };

        if raw.is_empty() {
            info!("Empty input batch, nothing to clean");
            let table = WorkingTable::empty(raw.columns().to_vec());
            report.output_columns = table.columns().to_vec();
            return Ok((table, report));
        }

        self.validate_schema(&raw)?;
        info!(
            "Cleaning {} rows x {} measurement columns",
            raw.len(),
            raw.columns().len()
        );

        let stage = |name: &str| {
            if let Some(p) = progress {
                p.start_stage(name);
            }
        };

        stage("Normalizing types");
        let (table, normalization) = self.normalizer.normalize(raw);
        report.normalization = normalization;

        stage("Consolidating duplicates");
        let (table, duplicates) = self.consolidator.consolidate(table);
        report.duplicates = duplicates;

        stage("Handling missing values");
        let (table, missing) = self.missing.handle(table);
        report.missing = missing;

        stage("Clamping outliers");
        let (table, outliers) = self.clamper.clamp(table);
        report.outliers = outliers;

        stage("Encoding categorical columns");
        let table = if self.config.categorical_columns.is_empty() {
            table
        } else {
            let (table, encodings) = self
                .categorical
                .normalize(table, &self.config.categorical_columns);
            report.encodings = encodings;
            table
        };

        report.output_rows = table.len();
        report.output_columns = table.columns().to_vec();

        info!(
            "Cleaning done: {} rows in, {} rows out ({} removed)",
            report.input_rows,
            report.output_rows,
            report.rows_removed()
        );

        Ok((table, report))
    }
}
