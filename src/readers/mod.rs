pub mod api_reader;
pub mod concurrent_reader;
pub mod csv_reader;

pub use api_reader::{ApiChannel, ApiPayloadReader, ApiResponse, ApiRow};
pub use concurrent_reader::ConcurrentReader;
pub use csv_reader::RawCsvReader;
