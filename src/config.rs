use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementField, RangeTable};
use crate::utils::constants::{
    DEFAULT_COLUMNS_THRESHOLD, DEFAULT_DAYS_LIMIT, DEFAULT_NA_TOKENS, DEFAULT_ROWS_THRESHOLD,
    DEFAULT_SAMPLING_HOURS, ENV_PREFIX, TIME_FORMAT,
};

/// Parameters of the cleaning pipeline.
///
/// Resolved from defaults, an optional config file and `IMS_CLEANER_*`
/// environment variables, in that order. The acceptable-range table is
/// static and never read from a file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CleaningConfig {
    /// Drop a column when more than this percentage of its values is missing
    #[validate(range(min = 0.0, max = 100.0))]
    pub columns_threshold: f64,

    /// Drop a row when more than this many measurement fields are missing
    pub rows_threshold: usize,

    /// Forward-fill reach in days
    #[validate(range(max = 31))]
    pub days_limit: usize,

    #[validate(length(min = 1, max = 24))]
    pub sampling_hours: Vec<String>,

    pub na_tokens: Vec<String>,

    /// Measurement columns every raw batch must carry
    #[validate(length(min = 1))]
    pub columns: Vec<String>,

    /// String-valued columns replaced by integer codes, empty to skip encoding
    pub categorical_columns: Vec<String>,

    #[serde(skip)]
    pub ranges: RangeTable,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            columns_threshold: DEFAULT_COLUMNS_THRESHOLD,
            rows_threshold: DEFAULT_ROWS_THRESHOLD,
            days_limit: DEFAULT_DAYS_LIMIT,
            sampling_hours: DEFAULT_SAMPLING_HOURS.iter().map(|h| h.to_string()).collect(),
            na_tokens: DEFAULT_NA_TOKENS.iter().map(|t| t.to_string()).collect(),
            columns: MeasurementField::ALL
                .iter()
                .map(|f| f.column_name().to_string())
                .collect(),
            categorical_columns: Vec::new(),
            ranges: RangeTable::standard(),
        }
    }
}

impl CleaningConfig {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: CleaningConfig = builder.build()?.try_deserialize()?;
        config.validate_all()?;

        Ok(config)
    }

    pub fn with_columns_threshold(mut self, threshold: f64) -> Self {
        self.columns_threshold = threshold;
        self
    }

    pub fn with_rows_threshold(mut self, threshold: usize) -> Self {
        self.rows_threshold = threshold;
        self
    }

    pub fn with_days_limit(mut self, days: usize) -> Self {
        self.days_limit = days;
        self
    }

    pub fn with_categorical_columns(mut self, columns: Vec<String>) -> Self {
        self.categorical_columns = columns;
        self
    }

    /// Field-level rules plus checks that need parsing
    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;
        self.sampling_times()?;
        self.canonical_columns()?;
        Ok(())
    }

    pub fn sampling_times(&self) -> Result<Vec<NaiveTime>> {
        let mut times = Vec::with_capacity(self.sampling_hours.len());
        for hour in &self.sampling_hours {
            let time = NaiveTime::parse_from_str(hour.trim(), TIME_FORMAT).map_err(|_| {
                ProcessingError::Config(format!("Invalid sampling hour '{}', expected HH:MM", hour))
            })?;
            if times.contains(&time) {
                return Err(ProcessingError::Config(format!(
                    "Sampling hour '{}' listed twice",
                    hour
                )));
            }
            times.push(time);
        }
        Ok(times)
    }

    pub fn canonical_columns(&self) -> Result<Vec<MeasurementField>> {
        self.columns
            .iter()
            .map(|name| {
                MeasurementField::from_column_name(name).ok_or_else(|| {
                    ProcessingError::Config(format!("Unknown measurement column '{}'", name))
                })
            })
            .collect()
    }

    pub fn samples_per_day(&self) -> usize {
        self.sampling_hours.len()
    }

    /// Longest run of consecutive missing slots that forward-fill may cover
    pub fn fill_limit(&self) -> usize {
        self.days_limit * self.samples_per_day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// Serialises tests that call `load`, which reads the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets an environment variable for the lifetime of the guard
    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(key: &'static str, value: &str) -> Self {
            std::env::set_var(key, value);
            Self(key)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            std::env::remove_var(self.0);
        }
    }

    #[test]
    fn test_defaults() {
        let config = CleaningConfig::default();
        assert!(config.validate_all().is_ok());
        assert_eq!(config.columns_threshold, 70.0);
        assert_eq!(config.rows_threshold, 3);
        assert_eq!(config.days_limit, 2);
        assert_eq!(config.samples_per_day(), 4);
        assert_eq!(config.fill_limit(), 8);
        assert_eq!(config.canonical_columns().unwrap().len(), 12);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = CleaningConfig::default().with_columns_threshold(120.0);
        assert!(matches!(
            config.validate_all(),
            Err(ProcessingError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_sampling_hours() {
        let mut config = CleaningConfig::default();
        config.sampling_hours = vec!["01:00".into(), "25:00".into()];
        assert!(config.validate_all().is_err());

        config.sampling_hours = vec!["01:00".into(), "01:00".into()];
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut config = CleaningConfig::default();
        config.columns.push("Visibility".into());
        assert!(matches!(
            config.validate_all(),
            Err(ProcessingError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = NamedTempFile::with_suffix(".toml")?;
        writeln!(file, "columns_threshold = 50.0")?;
        writeln!(file, "days_limit = 1")?;
        writeln!(file, "categorical_columns = [\"Station\"]")?;

        let config = CleaningConfig::load(Some(file.path()))?;
        assert_eq!(config.columns_threshold, 50.0);
        assert_eq!(config.days_limit, 1);
        assert_eq!(config.rows_threshold, 3);
        assert_eq!(config.fill_limit(), 4);
        assert_eq!(config.categorical_columns, vec!["Station".to_string()]);

        Ok(())
    }

    #[test]
    fn test_environment_overrides_file() -> Result<()> {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let mut file = NamedTempFile::with_suffix(".toml")?;
        writeln!(file, "days_limit = 1")?;
        writeln!(file, "rows_threshold = 5")?;

        let _days = EnvVar::set("IMS_CLEANER_DAYS_LIMIT", "3");
        let config = CleaningConfig::load(Some(file.path()))?;

        assert_eq!(config.days_limit, 3);
        // Keys without a variable keep the file value
        assert_eq!(config.rows_threshold, 5);
        assert_eq!(config.fill_limit(), 12);

        Ok(())
    }

    #[test]
    fn test_environment_value_is_validated() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _threshold = EnvVar::set("IMS_CLEANER_COLUMNS_THRESHOLD", "150");

        assert!(CleaningConfig::load(None).is_err());
    }
}
