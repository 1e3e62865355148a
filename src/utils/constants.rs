/// Date and time formats
pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";
pub const OUTPUT_DATE_FORMAT: &str = "%Y/%m/%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Sampling hours kept by the collaborators (four readings per day)
pub const DEFAULT_SAMPLING_HOURS: [&str; 4] = ["01:00", "07:00", "13:00", "19:00"];

/// Status strings the monitoring dashboard shows instead of a number
pub const DEFAULT_NA_TOKENS: [&str; 5] = ["Down", "InVld", "NoData", "Calib", "<Samp"];

/// Missing-value policy defaults
pub const DEFAULT_COLUMNS_THRESHOLD: f64 = 70.0;
pub const DEFAULT_ROWS_THRESHOLD: usize = 3;
pub const DEFAULT_DAYS_LIMIT: usize = 2;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "IMS_CLEANER";

/// File locations
pub const PROCESSED_DATA_DIR: &str = "data/processed";
pub const PROCESSED_FILE_STEM: &str = "climate_air_quality_proc";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
