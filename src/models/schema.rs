use std::fmt;

pub const STATION_COLUMN: &str = "Station";
pub const DATE_COLUMN: &str = "Date";
pub const TIME_COLUMN: &str = "Time";

/// Key columns, in sort and grouping order
pub const KEY_COLUMNS: [&str; 3] = [STATION_COLUMN, DATE_COLUMN, TIME_COLUMN];

/// Measurement columns of the canonical schema, in column order.
///
/// Column names match the header of the raw table persisted by the scraper
/// and API collaborators (`Pressure`, `RH`, `Temp`, ... `PM2.5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeasurementField {
    Pressure,
    RelativeHumidity,
    GroundTemperature,
    WindDirection,
    WindSpeed,
    Precipitation,
    No,
    No2,
    Nox,
    O3,
    Pm10,
    Pm25,
}

impl MeasurementField {
    pub const ALL: [MeasurementField; 12] = [
        MeasurementField::Pressure,
        MeasurementField::RelativeHumidity,
        MeasurementField::GroundTemperature,
        MeasurementField::WindDirection,
        MeasurementField::WindSpeed,
        MeasurementField::Precipitation,
        MeasurementField::No,
        MeasurementField::No2,
        MeasurementField::Nox,
        MeasurementField::O3,
        MeasurementField::Pm10,
        MeasurementField::Pm25,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            MeasurementField::Pressure => "Pressure",
            MeasurementField::RelativeHumidity => "RH",
            MeasurementField::GroundTemperature => "Temp",
            MeasurementField::WindDirection => "WD",
            MeasurementField::WindSpeed => "WS",
            MeasurementField::Precipitation => "PREC",
            MeasurementField::No => "NO",
            MeasurementField::No2 => "NO2",
            MeasurementField::Nox => "NOX",
            MeasurementField::O3 => "O3",
            MeasurementField::Pm10 => "PM10",
            MeasurementField::Pm25 => "PM2.5",
        }
    }

    /// Look up a field by header name, ignoring surrounding whitespace and ASCII case
    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.column_name().eq_ignore_ascii_case(name))
    }

    /// Map a vendor API channel name (`BP`, `TG`, `Rain`, ...) to its column
    pub fn from_api_channel(channel: &str) -> Option<Self> {
        match channel {
            "BP" => Some(MeasurementField::Pressure),
            "RH" => Some(MeasurementField::RelativeHumidity),
            "TG" => Some(MeasurementField::GroundTemperature),
            "WD" => Some(MeasurementField::WindDirection),
            "WS" => Some(MeasurementField::WindSpeed),
            "Rain" => Some(MeasurementField::Precipitation),
            _ => None,
        }
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Render a list of fields as `[A, B, C]` for log lines
pub fn column_list(fields: &[MeasurementField]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.column_name()).collect();
    format!("[{}]", names.join(", "))
}
