use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ims-air-cleaner")]
#[command(about = "Cleaning pipeline for IMS weather and air-quality station readings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean raw station batches and write the processed table
    Clean {
        #[arg(short, long, required = true, num_args = 1.., help = "Raw CSV batch files")]
        input: Vec<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output .csv or .parquet path [default: data/processed/climate_air_quality_proc-{YYMMDD}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Append to an existing CSV output instead of replacing it")]
        append: bool,

        #[arg(long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Drop columns with more than this percentage missing")]
        columns_threshold: Option<f64>,

        #[arg(long, help = "Drop rows with more than this many missing values")]
        rows_threshold: Option<usize>,

        #[arg(long, help = "Forward-fill horizon in days")]
        days_limit: Option<usize>,

        #[arg(long, help = "Columns to encode as integer codes (e.g. Station)")]
        categorical: Vec<String>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Check raw batches and dry-run the pipeline without writing anything
    Validate {
        #[arg(short, long, required = true, num_args = 1.., help = "Raw CSV batch files")]
        input: Vec<PathBuf>,

        #[arg(long, help = "Configuration file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Convert a saved vendor API response into a raw CSV batch
    ImportApi {
        #[arg(short, long, help = "API response JSON file")]
        payload: PathBuf,

        #[arg(short, long, help = "Station name written to every row")]
        station: String,

        #[arg(short, long, help = "Raw CSV output path")]
        output: PathBuf,

        #[arg(long, help = "Append to an existing raw CSV batch")]
        append: bool,

        #[arg(long, help = "Configuration file (sampling hours)")]
        config: Option<PathBuf>,
    },

    /// Display information about a Parquet file
    Info {
        #[arg(help = "Parquet file")]
        file: PathBuf,
    },
}
