mod errors;

pub use errors::{ApiError, ClientError};

pub type Identifier = u32;
pub type RecordId = u32;
