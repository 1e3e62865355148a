use chrono::{NaiveDate, NaiveTime};
use std::fmt;

use crate::utils::constants::{OUTPUT_DATE_FORMAT, TIME_FORMAT};

/// Categorical cell value: the original label, or the integer code it was
/// replaced with by the categorical normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Label(String),
    Code(u32),
}

impl Category {
    pub fn label(value: impl Into<String>) -> Self {
        Category::Label(value.into())
    }

    pub fn as_code(&self) -> Option<u32> {
        match self {
            Category::Code(code) => Some(*code),
            Category::Label(_) => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Label(label) => f.write_str(label),
            Category::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Sort, grouping and deduplication key of a reading
pub type ReadingKey = (Category, NaiveDate, NaiveTime);

/// One timestamped row of the working table. `values` is aligned with the
/// owning table's measurement columns; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub station: Category,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub values: Vec<Option<f64>>,
}

impl Reading {
    pub fn new(
        station: Category,
        date: NaiveDate,
        time: NaiveTime,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            station,
            date,
            time,
            values,
        }
    }

    pub fn key(&self) -> ReadingKey {
        (self.station.clone(), self.date, self.time)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Date rendered as `YYYY/MM/DD`
    pub fn formatted_date(&self) -> String {
        self.date.format(OUTPUT_DATE_FORMAT).to_string()
    }

    /// Time rendered as `HH:MM`
    pub fn formatted_time(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}
