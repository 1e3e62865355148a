use crate::models::schema::column_list;
use crate::models::MeasurementField;
use crate::processors::categorical::CategoryMapping;
use crate::processors::duplicate_consolidator::DuplicateSummary;
use crate::processors::missing_values::MissingValueSummary;
use crate::processors::outlier_clamper::ClampSummary;
use crate::processors::type_normalizer::NormalizationSummary;

/// Audit trail of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub input_columns: Vec<MeasurementField>,
    pub normalization: NormalizationSummary,
    pub duplicates: DuplicateSummary,
    pub missing: MissingValueSummary,
    pub outliers: ClampSummary,
    pub encodings: Vec<CategoryMapping>,
    pub output_rows: usize,
    pub output_columns: Vec<MeasurementField>,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.input_rows.saturating_sub(self.output_rows)
    }

    pub fn retention_percentage(&self) -> f64 {
        if self.input_rows == 0 {
            return 0.0;
        }
        100.0 * self.output_rows as f64 / self.input_rows as f64
    }

    /// Human-readable summary of every change the pipeline made
    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        summary.push_str(&format!(
            "Input: {} rows, {} measurement columns\n",
            self.input_rows,
            self.input_columns.len()
        ));
        summary.push_str(&format!(
            "Output: {} rows ({:.1}% retained), {} measurement columns\n",
            self.output_rows,
            self.retention_percentage(),
            self.output_columns.len()
        ));

        summary.push_str("\nType normalization:\n");
        summary.push_str(&format!(
            "  Rows with unparseable date/time dropped: {}\n",
            self.normalization.invalid_timestamps
        ));
        summary.push_str(&format!(
            "  Values coerced to missing: {}\n",
            self.normalization.total_coerced()
        ));
        for (field, count) in &self.normalization.coerced_to_missing {
            summary.push_str(&format!("    {}: {}\n", field, count));
        }

        summary.push_str("\nDuplicates:\n");
        summary.push_str(&format!(
            "  Exact duplicates removed: {}\n",
            self.duplicates.exact_duplicates
        ));
        summary.push_str(&format!(
            "  Rows merged by mean: {}\n",
            self.duplicates.merged_rows
        ));

        summary.push_str("\nMissing values:\n");
        summary.push_str(&format!(
            "  Forward-filled values (limit {} slots): {}\n",
            self.missing.fill.limit,
            self.missing.fill.total_filled()
        ));
        for (field, filled) in &self.missing.fill.filled {
            let left = self.missing.fill.still_missing.get(field).copied().unwrap_or(0);
            summary.push_str(&format!("    {}: {} filled, {} still missing\n", field, filled, left));
        }
        summary.push_str(&format!(
            "  Rows with all values missing dropped: {}\n",
            self.missing.all_missing_rows
        ));
        summary.push_str(&format!(
            "  Corrupted columns dropped: {} {}\n",
            self.missing.prune.dropped_columns.len(),
            column_list(&self.missing.prune.dropped_columns)
        ));
        summary.push_str(&format!(
            "  Corrupted rows dropped: {}\n",
            self.missing.prune.dropped_rows
        ));

        summary.push_str(&format!(
            "\nOutliers clamped: {}\n",
            self.outliers.total()
        ));
        for (field, count) in &self.outliers.clamped {
            summary.push_str(&format!(
                "    {}: {} below, {} above\n",
                field, count.below, count.above
            ));
        }

        for mapping in &self.encodings {
            summary.push_str(&format!("\nCategorical codes for {}:\n", mapping.column));
            for (label, code) in &mapping.codes {
                summary.push_str(&format!("    {} -> {}\n", label, code));
            }
        }

        summary
    }
}
