use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::api::{CashflowApi, InMemoryApi, Query, Seed};
use crate::models::{Category, LookupDraft, LookupItem, LookupKind, LookupRow, Paginated, Record, RecordDraft, ReferenceSnapshot, Subcategory, Summary};
use crate::types::{ApiError, Identifier, RecordId};

/// Income (1) and expense (2) types with a small category tree under each.
pub(crate) fn seeded() -> InMemoryApi {
    InMemoryApi::from_seed(Seed {
        reference: ReferenceSnapshot {
            statuses: vec![LookupItem::new(1, "Business"), LookupItem::new(2, "Personal")],
            types: vec![LookupItem::new(1, "Пополнение"), LookupItem::new(2, "Списание")],
            categories: vec![
                Category::new(10, 1, "Salary"),
                Category::new(11, 1, "Investments"),
                Category::new(20, 2, "Marketing"),
                Category::new(21, 2, "Infrastructure")
            ],
            subcategories: vec![
                Subcategory::new(100, 10, "Bonus"),
                Subcategory::new(101, 10, "Base"),
                Subcategory::new(110, 11, "Dividends"),
                Subcategory::new(200, 20, "Avito"),
                Subcategory::new(201, 20, "Farpost"),
                Subcategory::new(210, 21, "VPS")
            ]
        },
        transactions: Vec::new()
    })
}

pub(crate) fn record(id: RecordId, day: u32, type_id: Identifier, category_id: Identifier, subcategory_id: Identifier, amount: i64) -> Record {
    Record::from_draft(id, RecordDraft {
        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap_or_default(),
        status_id: 1,
        type_id,
        category_id,
        subcategory_id,
        amount: Decimal::from(amount),
        comment: format!("record {id}")
    })
}

/// Seeded data plus `count` income records, one per day of March.
pub(crate) fn seeded_with_records(count: u32) -> InMemoryApi {
    (1..=count).fold(seeded(), |api, id| api.with_record(record(id, id.min(28), 1, 10, 100, 100)))
}

/// Wraps an `InMemoryApi` with per-call gates, injected failures and call counts.
///
/// Keys: `reference_data`, `categories:{type}`, `subcategories:{category}`,
/// `transactions`, `transaction:{id}`, `create`, `update:{id}`, `delete:{id}`,
/// `summary`, `lookups:{endpoint}`, `save_lookup:{endpoint}`, `delete_lookup:{endpoint}`.
pub(crate) struct ScriptedApi {
    inner: InMemoryApi,
    gates: DashMap<String, Arc<Notify>>,
    failures: DashMap<String, ()>,
    calls: DashMap<String, usize>
}

impl ScriptedApi {
    pub(crate) fn new(inner: InMemoryApi) -> Self {
        Self {
            inner,
            gates: DashMap::new(),
            failures: DashMap::new(),
            calls: DashMap::new()
        }
    }

    pub(crate) fn inner(&self) -> &InMemoryApi {
        &self.inner
    }

    /// Calls under `key` park until the returned `Notify` fires.
    pub(crate) fn gate(&self, key: &str) -> Arc<Notify> {
        self.gates.entry(key.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Later calls under `key` pass straight through; calls already parked keep waiting.
    pub(crate) fn ungate(&self, key: &str) {
        self.gates.remove(key);
    }

    pub(crate) fn fail(&self, key: &str) {
        self.failures.insert(key.to_string(), ());
    }

    pub(crate) fn heal(&self, key: &str) {
        self.failures.remove(key);
    }

    pub(crate) fn calls(&self, key: &str) -> usize {
        self.calls.get(key).map(|count| *count).unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    async fn enter(&self, key: String) -> Result<(), ApiError> {
        *self.calls.entry(key.clone()).or_insert(0) += 1;

        let gate = self.gates.get(&key).map(|gate| gate.value().clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failures.contains_key(&key) {
            return Err(ApiError::Unavailable(format!("scripted failure for [{key}]")));
        }

        Ok(())
    }
}

/// Waits until `api` has seen at least `count` calls under `key`.
pub(crate) async fn wait_for_calls(api: &ScriptedApi, key: &str, count: usize) {
    while api.calls(key) < count {
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl CashflowApi for ScriptedApi {
    async fn reference_data(&self) -> Result<ReferenceSnapshot, ApiError> {
        self.enter("reference_data".to_string()).await?;
        self.inner.reference_data().await
    }

    async fn categories_of_type(&self, type_id: Identifier) -> Result<Vec<Category>, ApiError> {
        self.enter(format!("categories:{type_id}")).await?;
        self.inner.categories_of_type(type_id).await
    }

    async fn subcategories_of_category(&self, category_id: Identifier) -> Result<Vec<Subcategory>, ApiError> {
        self.enter(format!("subcategories:{category_id}")).await?;
        self.inner.subcategories_of_category(category_id).await
    }

    async fn list_transactions(&self, query: &Query) -> Result<Paginated<Record>, ApiError> {
        self.enter("transactions".to_string()).await?;
        self.inner.list_transactions(query).await
    }

    async fn transaction(&self, id: RecordId) -> Result<Record, ApiError> {
        self.enter(format!("transaction:{id}")).await?;
        self.inner.transaction(id).await
    }

    async fn create_transaction(&self, draft: &RecordDraft) -> Result<Record, ApiError> {
        self.enter("create".to_string()).await?;
        self.inner.create_transaction(draft).await
    }

    async fn update_transaction(&self, id: RecordId, draft: &RecordDraft) -> Result<Record, ApiError> {
        self.enter(format!("update:{id}")).await?;
        self.inner.update_transaction(id, draft).await
    }

    async fn delete_transaction(&self, id: RecordId) -> Result<(), ApiError> {
        self.enter(format!("delete:{id}")).await?;
        self.inner.delete_transaction(id).await
    }

    async fn summary(&self, query: &Query) -> Result<Summary, ApiError> {
        self.enter("summary".to_string()).await?;
        self.inner.summary(query).await
    }

    async fn list_lookups(&self, kind: LookupKind, query: &Query) -> Result<Paginated<LookupRow>, ApiError> {
        self.enter(format!("lookups:{}", kind.endpoint())).await?;
        self.inner.list_lookups(kind, query).await
    }

    async fn save_lookup(&self, kind: LookupKind, id: Option<Identifier>, draft: &LookupDraft) -> Result<LookupRow, ApiError> {
        self.enter(format!("save_lookup:{}", kind.endpoint())).await?;
        self.inner.save_lookup(kind, id, draft).await
    }

    async fn delete_lookup(&self, kind: LookupKind, id: Identifier) -> Result<(), ApiError> {
        self.enter(format!("delete_lookup:{}", kind.endpoint())).await?;
        self.inner.delete_lookup(kind, id).await
    }
}
