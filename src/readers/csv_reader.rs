use encoding_rs::{Encoding, WINDOWS_1255};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementField, RawRow, RawTable, DATE_COLUMN, KEY_COLUMNS, STATION_COLUMN, TIME_COLUMN};

/// Reads a persisted raw batch (header row + one row per reading)
pub struct RawCsvReader;

/// Where each needed column sits in a CSV record
struct HeaderLayout {
    station: usize,
    date: usize,
    time: usize,
    measurements: Vec<(MeasurementField, usize)>,
}

impl RawCsvReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_path(&self, path: &Path) -> Result<RawTable> {
        let bytes = fs::read(path)?;
        let content = decode(&bytes);
        let table = self.read_str(&content)?;
        info!("Loaded {} raw rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn read_str(&self, content: &str) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let layout = Self::map_header(&headers)?;

        let mut table = RawTable::new(layout.measurements.iter().map(|(f, _)| *f).collect());
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let cell = |index: usize| record.get(index).unwrap_or("").to_string();
            let values = layout
                .measurements
                .iter()
                .map(|(_, index)| record.get(*index).filter(|v| !v.is_empty()).map(str::to_string))
                .collect();

            table.push_row(RawRow::new(
                cell(layout.station),
                cell(layout.date),
                cell(layout.time),
                values,
            ))?;
        }

        Ok(table)
    }

    fn map_header(headers: &csv::StringRecord) -> Result<HeaderLayout> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        let (station, date, time) = match (find(STATION_COLUMN), find(DATE_COLUMN), find(TIME_COLUMN)) {
            (Some(s), Some(d), Some(t)) => (s, d, t),
            (s, d, t) => {
                let missing = [s, d, t]
                    .iter()
                    .zip(KEY_COLUMNS)
                    .filter(|(index, _)| index.is_none())
                    .map(|(_, name)| name.to_string())
                    .collect();
                return Err(ProcessingError::MissingColumns(missing));
            }
        };

        let mut measurements: Vec<(MeasurementField, usize)> = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if index == station || index == date || index == time {
                continue;
            }
            match MeasurementField::from_column_name(header) {
                Some(field) if measurements.iter().any(|(f, _)| *f == field) => {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "Column {} appears more than once",
                        field
                    )));
                }
                Some(field) => measurements.push((field, index)),
                None => warn!("Ignoring unknown column '{}'", header),
            }
        }

        Ok(HeaderLayout {
            station,
            date,
            time,
            measurements,
        })
    }
}

impl Default for RawCsvReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode file bytes: a BOM wins, then UTF-8, then Windows-1255 (Hebrew
/// station names exported from spreadsheet tools).
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (content, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return content;
    }

    match std::str::from_utf8(bytes) {
        Ok(content) => Cow::Borrowed(content),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as {}", WINDOWS_1255.name());
            let (content, _) = WINDOWS_1255.decode_without_bom_handling(bytes);
            content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_header_and_rows() {
        let content = "Station,Date,Time,Pressure,RH,Notes\n\
                       TLV,01/01/2020,01:00,1013.2,Down,x\n\
                       Afula,01/01/2020,07:00,,55,y\n";

        let table = RawCsvReader::new().read_str(content).unwrap();

        assert_eq!(
            table.columns(),
            &[MeasurementField::Pressure, MeasurementField::RelativeHumidity]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0],
            RawRow::new("TLV", "01/01/2020", "01:00", vec![Some("1013.2".into()), Some("Down".into())])
        );
        assert_eq!(table.rows()[1].values, vec![None, Some("55".into())]);
    }

    #[test]
    fn test_missing_key_column() {
        let content = "Station,Pressure\nTLV,1000\n";
        match RawCsvReader::new().read_str(content) {
            Err(ProcessingError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["Date".to_string(), "Time".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_duplicate_measurement_column() {
        let content = "Station,Date,Time,O3,o3\n";
        assert!(matches!(
            RawCsvReader::new().read_str(content),
            Err(ProcessingError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let content = "Station,Date,Time,NO,NO2\nTLV,01/01/2020,01:00,3\n,,,,\n";
        let table = RawCsvReader::new().read_str(content).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].values, vec![Some("3".into()), None]);
    }

    #[test]
    fn test_windows_1255_file() -> Result<()> {
        let (encoded, _, _) = WINDOWS_1255.encode("Station,Date,Time,O3\nעפולה,01/01/2020,01:00,30\n");
        let mut file = NamedTempFile::new()?;
        file.write_all(&encoded)?;

        let table = RawCsvReader::new().read_path(file.path())?;
        assert_eq!(table.rows()[0].station, "עפולה");

        Ok(())
    }

    #[test]
    fn test_utf8_bom() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"\xEF\xBB\xBFStation,Date,Time,O3\nTLV,01/01/2020,01:00,30\n")?;

        let table = RawCsvReader::new().read_path(file.path())?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), &[MeasurementField::O3]);

        Ok(())
    }
}
