pub mod ranges;
pub mod reading;
pub mod schema;
pub mod table;

pub use ranges::{AcceptableRange, RangeTable};
pub use reading::{Category, Reading, ReadingKey};
pub use schema::{MeasurementField, DATE_COLUMN, KEY_COLUMNS, STATION_COLUMN, TIME_COLUMN};
pub use table::{RawRow, RawTable, WorkingTable};
