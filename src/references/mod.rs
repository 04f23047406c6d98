mod book;

pub use book::{BookOutcome, LookupFilter, ReferenceBook};
