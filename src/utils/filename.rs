use chrono::{Datelike, Local};
use std::path::PathBuf;

use crate::utils::constants::{PROCESSED_DATA_DIR, PROCESSED_FILE_STEM};

/// Default cleaned-table path: data/processed/climate_air_quality_proc-{YYMMDD}.{extension}
pub fn generate_default_output_filename(extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        PROCESSED_FILE_STEM,
        year,
        now.month(),
        now.day(),
        extension
    );
    PathBuf::from(PROCESSED_DATA_DIR).join(filename)
}

/// Output format inferred from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "parquet" => Some(OutputFormat::Parquet),
            _ => None,
        }
    }
}
