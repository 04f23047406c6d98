mod codec;

pub use codec::{normalize_date, FilterParam, FilterState};
