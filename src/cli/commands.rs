use std::fs;
use tracing::{info, warn};

use crate::cli::args::{Cli, Commands};
use crate::config::CleaningConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::pipeline::STAGE_COUNT;
use crate::processors::CleaningPipeline;
use crate::readers::{ApiPayloadReader, ConcurrentReader};
use crate::utils::filename::{generate_default_output_filename, OutputFormat};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter, SinkMode};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Clean {
            input,
            output,
            append,
            config,
            columns_threshold,
            rows_threshold,
            days_limit,
            categorical,
            compression,
            max_workers,
        } => {
            configure_thread_pool(max_workers);

            let mut cleaning = CleaningConfig::load(config.as_deref())?;
            if let Some(threshold) = columns_threshold {
                cleaning = cleaning.with_columns_threshold(threshold);
            }
            if let Some(threshold) = rows_threshold {
                cleaning = cleaning.with_rows_threshold(threshold);
            }
            if let Some(days) = days_limit {
                cleaning = cleaning.with_days_limit(days);
            }
            if !categorical.is_empty() {
                cleaning = cleaning.with_categorical_columns(categorical);
            }
            let pipeline = CleaningPipeline::new(cleaning)?;

            let output_file = output.unwrap_or_else(|| generate_default_output_filename("csv"));
            let format = OutputFormat::from_path(&output_file).ok_or_else(|| {
                ProcessingError::Config(format!(
                    "Output {} must end in .csv or .parquet",
                    output_file.display()
                ))
            })?;
            if append && format == OutputFormat::Parquet {
                return Err(ProcessingError::Config(
                    "--append is only supported for CSV output".to_string(),
                ));
            }

            println!("Cleaning {} raw batch file(s)", input.len());
            println!("Output file: {}", output_file.display());

            let raw = ConcurrentReader::new(max_workers).read_all(&input).await?;

            let progress = ProgressReporter::new_stages(STAGE_COUNT, false);
            let (table, report) = pipeline.run_with_progress(raw, Some(&progress))?;
            progress.finish_with_message(&format!("Cleaned {} rows", table.len()));

            println!("\n{}", report.generate_summary());

            match format {
                OutputFormat::Csv => {
                    let mode = if append { SinkMode::Append } else { SinkMode::Overwrite };
                    CsvWriter::new().write_table(&table, &output_file, mode)?;
                }
                OutputFormat::Parquet => {
                    let writer = ParquetWriter::new().with_compression(&compression)?;
                    writer.write_table(&table, &output_file)?;
                    println!("\n{}", writer.get_file_info(&output_file)?.summary());
                }
            }

            println!("Cleaning complete!");
        }

        Commands::Validate {
            input,
            config,
            max_workers,
        } => {
            configure_thread_pool(max_workers);

            let pipeline = CleaningPipeline::new(CleaningConfig::load(config.as_deref())?)?;
            let raw = ConcurrentReader::new(max_workers).read_all(&input).await?;

            pipeline.validate_schema(&raw)?;
            println!("Schema check passed for {} raw rows", raw.len());

            let progress = ProgressReporter::new_spinner("Dry-running pipeline...", false);
            let (_table, report) = pipeline.run(raw)?;
            progress.finish_with_message("Validation complete");

            println!("\n{}", report.generate_summary());
            println!("Validation complete - no output file written");
        }

        Commands::ImportApi {
            payload,
            station,
            output,
            append,
            config,
        } => {
            let cleaning = CleaningConfig::load(config.as_deref())?;
            let reader = ApiPayloadReader::new(station, cleaning.sampling_times()?);

            let content = fs::read_to_string(&payload)?;
            let raw = reader.read_str(&content)?;
            if raw.is_empty() {
                warn!("No rows at sampling hours in {}", payload.display());
            }

            let mode = if append { SinkMode::Append } else { SinkMode::Overwrite };
            CsvWriter::new().write_raw(&raw, &output, mode)?;
            println!("Imported {} rows into {}", raw.len(), output.display());
        }

        Commands::Info { file } => {
            println!("Analyzing Parquet file: {}", file.display());

            let file_info = ParquetWriter::new().get_file_info(&file)?;
            println!("\n{}", file_info.summary());
        }
    }

    Ok(())
}

/// Size the global rayon pool; a pool that already exists is kept
fn configure_thread_pool(max_workers: usize) {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers.max(1))
        .build_global()
    {
        Ok(()) => info!("Using {} worker threads", max_workers.max(1)),
        Err(e) => warn!("Keeping existing thread pool: {}", e),
    }
}
