use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProcessingError, Result};
use crate::models::schema::MeasurementField;

/// Inclusive `[min, max]` interval; an unset bound is open on that side
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcceptableRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AcceptableRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Result<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(ProcessingError::Config(format!(
                    "Range lower bound {} is above upper bound {}",
                    lo, hi
                )));
            }
        }
        Ok(Self { min, max })
    }

    pub fn bounded(min: f64, max: f64) -> Result<Self> {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn is_below(&self, value: f64) -> bool {
        self.min.is_some_and(|lo| value < lo)
    }

    pub fn is_above(&self, value: f64) -> bool {
        self.max.is_some_and(|hi| value > hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        !self.is_below(value) && !self.is_above(value)
    }

    /// Nearest in-range value
    pub fn clamp(&self, value: f64) -> f64 {
        match (self.min, self.max) {
            (Some(lo), _) if value < lo => lo,
            (_, Some(hi)) if value > hi => hi,
            _ => value,
        }
    }
}

impl fmt::Display for AcceptableRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => write!(f, "[{}, {}]", lo, hi),
            (Some(lo), None) => write!(f, "[{}, inf)", lo),
            (None, Some(hi)) => write!(f, "(-inf, {}]", hi),
            (None, None) => f.write_str("(-inf, inf)"),
        }
    }
}

/// Acceptable range per measurement field. Fields without an entry are never clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTable {
    ranges: BTreeMap<MeasurementField, AcceptableRange>,
}

impl RangeTable {
    pub fn empty() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Physical limits used for outlier clamping of station readings.
    /// Pressure and PM2.5 are deliberately absent.
    pub fn standard() -> Self {
        let bounded = |min: f64, max: f64| AcceptableRange {
            min: Some(min),
            max: Some(max),
        };

        let mut ranges = BTreeMap::new();
        ranges.insert(MeasurementField::RelativeHumidity, bounded(0.0, 100.0));
        ranges.insert(MeasurementField::GroundTemperature, bounded(-50.0, 60.0));
        ranges.insert(MeasurementField::WindDirection, bounded(0.0, 360.0));
        for field in [
            MeasurementField::WindSpeed,
            MeasurementField::Precipitation,
            MeasurementField::No,
            MeasurementField::No2,
            MeasurementField::Nox,
            MeasurementField::O3,
            MeasurementField::Pm10,
        ] {
            ranges.insert(field, AcceptableRange::at_least(0.0));
        }

        Self { ranges }
    }

    pub fn with_range(mut self, field: MeasurementField, range: AcceptableRange) -> Self {
        self.ranges.insert(field, range);
        self
    }

    pub fn get(&self, field: MeasurementField) -> Option<&AcceptableRange> {
        self.ranges.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementField, &AcceptableRange)> {
        self.ranges.iter().map(|(field, range)| (*field, range))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::standard()
    }
}
