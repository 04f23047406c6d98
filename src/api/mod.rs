mod http;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::{Category, LookupDraft, LookupKind, LookupRow, Paginated, Record, RecordDraft, ReferenceSnapshot, Subcategory, Summary};
use crate::types::{ApiError, Identifier, RecordId};

pub use http::HttpApi;
pub use memory::{InMemoryApi, Seed};

/// Canonical query parameters, ordered so requests are reproducible.
pub type Query = BTreeMap<String, String>;

/// The REST service as the controllers see it.
#[async_trait]
pub trait CashflowApi: Send + Sync + 'static {
    /// `GET reference-data/`
    async fn reference_data(&self) -> Result<ReferenceSnapshot, ApiError>;
    /// `GET transaction-types/{id}/categories/`
    async fn categories_of_type(&self, type_id: Identifier) -> Result<Vec<Category>, ApiError>;
    /// `GET categories/{id}/subcategories/`
    async fn subcategories_of_category(&self, category_id: Identifier) -> Result<Vec<Subcategory>, ApiError>;
    /// `GET transactions/?...`
    async fn list_transactions(&self, query: &Query) -> Result<Paginated<Record>, ApiError>;
    async fn transaction(&self, id: RecordId) -> Result<Record, ApiError>;
    async fn create_transaction(&self, draft: &RecordDraft) -> Result<Record, ApiError>;
    async fn update_transaction(&self, id: RecordId, draft: &RecordDraft) -> Result<Record, ApiError>;
    async fn delete_transaction(&self, id: RecordId) -> Result<(), ApiError>;
    /// `GET transactions/summary/?...`
    async fn summary(&self, query: &Query) -> Result<Summary, ApiError>;
    async fn list_lookups(&self, kind: LookupKind, query: &Query) -> Result<Paginated<LookupRow>, ApiError>;
    /// Creates when `id` is `None`, updates otherwise.
    async fn save_lookup(&self, kind: LookupKind, id: Option<Identifier>, draft: &LookupDraft) -> Result<LookupRow, ApiError>;
    async fn delete_lookup(&self, kind: LookupKind, id: Identifier) -> Result<(), ApiError>;
}
