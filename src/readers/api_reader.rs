use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::models::{MeasurementField, RawRow, RawTable};
use crate::utils::constants::{SOURCE_DATE_FORMAT, TIME_FORMAT};

/// Monthly response body of the meteorological service API
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "stationId", default)]
    pub station_id: Option<u32>,
    #[serde(default)]
    pub data: Vec<ApiRow>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRow {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub channels: Vec<ApiChannel>,
}

#[derive(Debug, Deserialize)]
pub struct ApiChannel {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub valid: bool,
}

/// Turns one station's API payload into raw rows shaped like scraped rows
pub struct ApiPayloadReader {
    station_name: String,
    sampling_hours: Vec<NaiveTime>,
}

impl ApiPayloadReader {
    pub fn new(station_name: impl Into<String>, sampling_hours: Vec<NaiveTime>) -> Self {
        Self {
            station_name: station_name.into(),
            sampling_hours,
        }
    }

    pub fn read_str(&self, payload: &str) -> Result<RawTable> {
        let response: ApiResponse = serde_json::from_str(payload)?;
        self.read_response(response)
    }

    /// Keep rows at a sampling hour and valid channels of collected variables.
    /// The batch carries every canonical column so it joins scraped batches.
    pub fn read_response(&self, response: ApiResponse) -> Result<RawTable> {
        let columns = MeasurementField::ALL.to_vec();
        let mut table = RawTable::new(columns.clone());
        let mut skipped_hours = 0usize;

        for row in response.data {
            let Some(raw_datetime) = row.datetime.as_deref() else {
                error!("No datetime for row of station {}", self.station_name);
                continue;
            };
            let Some(timestamp) = parse_timestamp(raw_datetime) else {
                error!("Unparseable datetime '{}' for station {}", raw_datetime, self.station_name);
                continue;
            };

            let slot = NaiveTime::from_hms_opt(timestamp.hour(), timestamp.minute(), 0);
            if !slot.is_some_and(|t| self.sampling_hours.contains(&t)) {
                skipped_hours += 1;
                continue;
            }

            let mut values: Vec<Option<String>> = vec![None; columns.len()];
            let mut fetched = 0usize;
            for channel in row.channels.iter().filter(|c| c.valid) {
                let Some(field) = MeasurementField::from_api_channel(&channel.name) else {
                    continue;
                };
                if let (Some(position), Some(value)) =
                    (columns.iter().position(|c| *c == field), channel.value)
                {
                    values[position] = Some(value.to_string());
                    fetched += 1;
                }
            }
            debug!("{} values fetched for {}", fetched, raw_datetime);

            let row = RawRow::new(
                self.station_name.clone(),
                timestamp.format(SOURCE_DATE_FORMAT).to_string(),
                timestamp.format(TIME_FORMAT).to_string(),
                values,
            );
            table.push_row(row)?;
        }

        info!(
            "Extracted {} rows for {} ({} outside sampling hours)",
            table.len(),
            self.station_name,
            skipped_hours
        );

        Ok(table)
    }
}

/// ISO-8601 with or without offset; the local wall-clock time is kept
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
