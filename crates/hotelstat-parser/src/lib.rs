pub mod errors;
pub mod extract;
pub mod model;
mod normalize;

pub use errors::ExtractionError;
pub use extract::{ExtractedTable, TableExtractor};
pub use model::{Observation, RawArchive, Region, Series, SeriesKind, TabularRecord};
pub use normalize::{normalize_records, parse_decimal, parse_month};
