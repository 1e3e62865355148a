pub mod categorical;
pub mod duplicate_consolidator;
pub mod missing_values;
pub mod outlier_clamper;
pub mod pipeline;
pub mod report;
pub mod type_normalizer;

pub use categorical::{CategoricalNormalizer, CategoryMapping};
pub use duplicate_consolidator::{DuplicateConsolidator, DuplicateSummary};
pub use missing_values::{FillSummary, MissingValueHandler, MissingValueSummary, PruneSummary};
pub use outlier_clamper::{ClampSummary, OutlierClamper, OutlierCount};
pub use pipeline::CleaningPipeline;
pub use report::CleaningReport;
pub use type_normalizer::{NormalizationSummary, TypeNormalizer};
