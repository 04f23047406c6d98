mod errors;
mod lookup;
mod page;
mod record;

pub use errors::FieldError;
pub use lookup::{Category, ChildLookup, LookupDraft, LookupItem, LookupKind, LookupRow, ReferenceSnapshot, Subcategory};
pub use page::{CategoryTotal, Paginated, Summary, SummaryStats, SummaryTotals, TypeTotal};
pub use record::{Record, RecordDraft};
