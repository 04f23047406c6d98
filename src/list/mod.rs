mod controller;
mod cursor;
#[cfg(test)]
mod tests;

pub use controller::{page_query, DeleteOutcome, ListController, LoadReport, LoadStatus};
pub use cursor::{derive_page, page_window, total_pages, try_derive_page, DerivedPage};
