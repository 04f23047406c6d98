mod snapshot;

pub use snapshot::ReferenceSource;
