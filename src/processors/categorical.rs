use std::collections::HashMap;
use tracing::{info, warn};

use crate::models::{
    Category, MeasurementField, WorkingTable, DATE_COLUMN, STATION_COLUMN, TIME_COLUMN,
};

/// Value-to-code assignment for one column, in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMapping {
    pub column: String,
    pub codes: Vec<(String, u32)>,
}

impl CategoryMapping {
    pub fn code_of(&self, value: &str) -> Option<u32> {
        self.codes
            .iter()
            .find(|(label, _)| label == value)
            .map(|(_, code)| *code)
    }
}

/// Replaces string-valued columns with integer codes starting at 1.
///
/// Codes are derived afresh from the values of each call and are not stable
/// across calls; persist the returned mappings if a stable encoding is needed.
pub struct CategoricalNormalizer;

impl CategoricalNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        table: WorkingTable,
        columns: &[String],
    ) -> (WorkingTable, Vec<CategoryMapping>) {
        let mut mappings = Vec::new();

        if table.is_empty() {
            return (table, mappings);
        }

        let (table_columns, mut rows) = table.into_parts();

        for column in columns {
            let name = column.trim();
            if !name.eq_ignore_ascii_case(STATION_COLUMN) {
                if name.eq_ignore_ascii_case(DATE_COLUMN) || name.eq_ignore_ascii_case(TIME_COLUMN) {
                    warn!("Key column {} is typed, not string-valued, not converting unique values", column);
                } else if MeasurementField::from_column_name(column).is_some() {
                    warn!("Column {} is numeric, not converting unique values", column);
                } else {
                    warn!("Unknown column {}, not converting unique values", column);
                }
                continue;
            }

            info!("Converting unique values for column {}", STATION_COLUMN);

            let mut codes: HashMap<Category, u32> = HashMap::new();
            let mut order: Vec<(String, u32)> = Vec::new();
            for reading in &mut rows {
                let next = codes.len() as u32 + 1;
                let code = *codes.entry(reading.station.clone()).or_insert_with(|| {
                    order.push((reading.station.to_string(), next));
                    next
                });
                reading.station = Category::Code(code);
            }

            let described: Vec<String> = order
                .iter()
                .map(|(label, code)| format!("{}: {}", label, code))
                .collect();
            info!(
                "{}, old to new values: {{{}}}",
                STATION_COLUMN,
                described.join(", ")
            );

            mappings.push(CategoryMapping {
                column: STATION_COLUMN.to_string(),
                codes: order,
            });
        }

        (WorkingTable::new(table_columns, rows), mappings)
    }
}

impl Default for CategoricalNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    fn table(stations: &[&str]) -> WorkingTable {
        let rows = stations
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Reading::new(
                    Category::label(*s),
                    NaiveDate::from_ymd_opt(2020, 1, 1 + i as u32).unwrap(),
                    NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
                    vec![Some(i as f64)],
                )
            })
            .collect();
        WorkingTable::new(vec![MeasurementField::O3], rows)
    }

    #[test]
    fn test_first_seen_order() {
        let input = table(&["Karmiel", "Afula", "Karmiel", "TLV", "Afula"]);
        let (output, mappings) =
            CategoricalNormalizer::new().normalize(input, &["Station".to_string()]);

        let codes: Vec<Option<u32>> = output.rows().iter().map(|r| r.station.as_code()).collect();
        assert_eq!(codes, vec![Some(1), Some(2), Some(1), Some(3), Some(2)]);

        assert_eq!(mappings.len(), 1);
        assert_eq!(
            mappings[0].codes,
            vec![
                ("Karmiel".to_string(), 1),
                ("Afula".to_string(), 2),
                ("TLV".to_string(), 3)
            ]
        );
        assert_eq!(mappings[0].code_of("TLV"), Some(3));
    }

    #[test]
    fn test_codes_rederived_per_call() {
        let normalizer = CategoricalNormalizer::new();
        let columns = vec!["Station".to_string()];

        let (_, first) = normalizer.normalize(table(&["Afula", "TLV"]), &columns);
        let (_, second) = normalizer.normalize(table(&["TLV", "Afula"]), &columns);

        // The same label gets a different code when first seen later
        assert_eq!(first[0].code_of("Afula"), Some(1));
        assert_eq!(second[0].code_of("Afula"), Some(2));
    }

    #[test]
    fn test_non_string_columns_skipped() {
        let input = table(&["Afula"]);
        let columns = vec!["O3".to_string(), "Visibility".to_string()];
        let (output, mappings) = CategoricalNormalizer::new().normalize(input.clone(), &columns);

        assert!(mappings.is_empty());
        assert_eq!(output, input);
    }

    #[test]
    fn test_key_columns_skipped() {
        let input = table(&["Afula", "TLV"]);
        let columns = vec!["Date".to_string(), " time ".to_string()];
        let (output, mappings) = CategoricalNormalizer::new().normalize(input.clone(), &columns);

        assert!(mappings.is_empty());
        assert_eq!(output, input);
    }

    #[test]
    fn test_empty_table() {
        let (output, mappings) =
            CategoricalNormalizer::new().normalize(WorkingTable::default(), &["Station".into()]);

        assert!(output.is_empty());
        assert!(mappings.is_empty());
    }
}
