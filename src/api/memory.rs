use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::api::{CashflowApi, Query};
use crate::models::{Category, LookupDraft, LookupItem, LookupKind, LookupRow, Paginated, Record, RecordDraft, ReferenceSnapshot, Subcategory, Summary, SummaryStats, TypeTotal};
use crate::types::{ApiError, Identifier, RecordId};

const LINK_BASE: &str = "http://memory.local/api/";
const DEFAULT_PAGE_SIZE: usize = 10;

/// Lookups plus transactions, the format of seed files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(flatten)]
    pub reference: ReferenceSnapshot,
    #[serde(default)]
    pub transactions: Vec<Record>
}

/// `CashflowApi` over a seed file, for offline use and tests. Covers the
/// paging, link and filter conventions the controllers rely on; write checks
/// stop at the cascade and in-use entries.
pub struct InMemoryApi {
    statuses: DashMap<Identifier, LookupItem>,
    types: DashMap<Identifier, LookupItem>,
    categories: DashMap<Identifier, Category>,
    subcategories: DashMap<Identifier, Subcategory>,
    records: DashMap<RecordId, Record>,
    next_id: AtomicU32
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            statuses: DashMap::new(),
            types: DashMap::new(),
            categories: DashMap::new(),
            subcategories: DashMap::new(),
            records: DashMap::new(),
            next_id: AtomicU32::new(1)
        }
    }

    pub fn from_seed(seed: Seed) -> Self {
        let api = Self::new();

        for status in seed.reference.statuses {
            api.bump_id(status.id);
            api.statuses.insert(status.id, status);
        }
        for kind in seed.reference.types {
            api.bump_id(kind.id);
            api.types.insert(kind.id, kind);
        }
        for category in seed.reference.categories {
            api.bump_id(category.id);
            api.categories.insert(category.id, category);
        }
        for subcategory in seed.reference.subcategories {
            api.bump_id(subcategory.id);
            api.subcategories.insert(subcategory.id, subcategory);
        }
        for record in seed.transactions {
            api.bump_id(record.id);
            api.records.insert(record.id, record);
        }

        api
    }

    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        Ok(Self::from_seed(serde_json::from_str(json)?))
    }

    #[cfg(test)]
    pub(crate) fn with_type(self, id: Identifier, name: &str) -> Self {
        self.bump_id(id);
        self.types.insert(id, LookupItem::new(id, name));
        self
    }

    #[cfg(test)]
    pub(crate) fn with_record(self, record: Record) -> Self {
        self.bump_id(record.id);
        self.records.insert(record.id, record);
        self
    }

    #[cfg(test)]
    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }

    fn bump_id(&self, id: Identifier) {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    fn allocate_id(&self) -> Identifier {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn sorted<T: Clone>(map: &DashMap<Identifier, T>) -> Vec<T> {
        let mut entries: Vec<(Identifier, T)> = map.iter().map(|entry| (*entry.key(), entry.value().clone())).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, value)| value).collect()
    }

    fn type_name(&self, id: Identifier) -> Option<String> {
        self.types.get(&id).map(|kind| kind.name.clone())
    }

    fn category_name(&self, id: Identifier) -> Option<String> {
        self.categories.get(&id).map(|category| category.name.clone())
    }

    fn decorate(&self, mut record: Record) -> Record {
        record.status_name = self.statuses.get(&record.status_id).map(|status| status.name.clone());
        record.transaction_type_name = self.type_name(record.type_id);
        record.category_name = self.category_name(record.category_id);
        record.subcategory_name = self.subcategories.get(&record.subcategory_id).map(|subcategory| subcategory.name.clone());
        record
    }

    /// Same checks the service runs on transaction writes.
    fn check_draft(&self, path: &str, draft: &RecordDraft) -> Result<(), ApiError> {
        if !self.statuses.contains_key(&draft.status_id) || !self.types.contains_key(&draft.type_id) {
            return Err(ApiError::status(path, 400, "unknown status or transaction type"));
        }

        let category_type = self.categories.get(&draft.category_id).map(|category| category.type_id);
        if category_type != Some(draft.type_id) {
            return Err(ApiError::status(path, 400, "category does not match transaction type"));
        }

        let subcategory_parent = self.subcategories.get(&draft.subcategory_id).map(|subcategory| subcategory.category_id);
        if subcategory_parent != Some(draft.category_id) {
            return Err(ApiError::status(path, 400, "subcategory does not match category"));
        }

        Ok(())
    }

    fn filtered_records(&self, path: &str, query: &Query) -> Result<Vec<Record>, ApiError> {
        let status: Option<Identifier> = parsed(path, query, "status")?;
        let kind: Option<Identifier> = parsed(path, query, "transaction_type")?;
        let category: Option<Identifier> = parsed(path, query, "category")?;
        let subcategory: Option<Identifier> = parsed(path, query, "subcategory")?;
        let date_from: Option<NaiveDate> = parsed(path, query, "date_from")?;
        let date_to: Option<NaiveDate> = parsed(path, query, "date_to")?;
        let amount_min: Option<Decimal> = parsed(path, query, "amount_min")?;
        let amount_max: Option<Decimal> = parsed(path, query, "amount_max")?;
        let search = query.get("search").map(|value| value.to_lowercase());

        let mut records: Vec<Record> = self.records.iter()
            .map(|entry| self.decorate(entry.value().clone()))
            .filter(|record| status.is_none_or(|id| record.status_id == id))
            .filter(|record| kind.is_none_or(|id| record.type_id == id))
            .filter(|record| category.is_none_or(|id| record.category_id == id))
            .filter(|record| subcategory.is_none_or(|id| record.subcategory_id == id))
            .filter(|record| date_from.is_none_or(|date| record.date >= date))
            .filter(|record| date_to.is_none_or(|date| record.date <= date))
            .filter(|record| amount_min.is_none_or(|amount| record.amount >= amount))
            .filter(|record| amount_max.is_none_or(|amount| record.amount <= amount))
            .filter(|record| search.as_deref().is_none_or(|needle| {
                record.comment.to_lowercase().contains(needle)
                    || record.category_name.as_deref().is_some_and(|name| name.to_lowercase().contains(needle))
                    || record.subcategory_name.as_deref().is_some_and(|name| name.to_lowercase().contains(needle))
            }))
            .collect();

        // Newest first, like the service
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        Ok(records)
    }

    fn lookup_rows(&self, kind: LookupKind) -> Vec<LookupRow> {
        let plain = |item: LookupItem| LookupRow {
            id: item.id,
            name: item.name,
            description: item.description,
            transaction_type: None,
            transaction_type_name: None,
            category: None,
            category_name: None
        };

        match kind {
            LookupKind::Status => Self::sorted(&self.statuses).into_iter().map(plain).collect(),
            LookupKind::TransactionType => Self::sorted(&self.types).into_iter().map(plain).collect(),
            LookupKind::Category => Self::sorted(&self.categories).into_iter().map(|category| LookupRow {
                id: category.id,
                transaction_type_name: self.type_name(category.type_id),
                transaction_type: Some(category.type_id),
                name: category.name,
                description: category.description,
                category: None,
                category_name: None
            }).collect(),
            LookupKind::Subcategory => Self::sorted(&self.subcategories).into_iter().map(|subcategory| LookupRow {
                id: subcategory.id,
                category_name: self.category_name(subcategory.category_id),
                category: Some(subcategory.category_id),
                transaction_type_name: self.categories.get(&subcategory.category_id).and_then(|category| self.type_name(category.type_id)),
                transaction_type: None,
                name: subcategory.name,
                description: subcategory.description
            }).collect()
        }
    }

    fn has_children(&self, kind: LookupKind, id: Identifier) -> bool {
        match kind {
            LookupKind::TransactionType => self.categories.iter().any(|entry| entry.type_id == id),
            LookupKind::Category => self.subcategories.iter().any(|entry| entry.category_id == id),
            LookupKind::Status | LookupKind::Subcategory => false
        }
    }

    fn is_referenced(&self, kind: LookupKind, id: Identifier) -> bool {
        self.records.iter().any(|entry| {
            let record = entry.value();
            match kind {
                LookupKind::Status => record.status_id == id,
                LookupKind::TransactionType => record.type_id == id,
                LookupKind::Category => record.category_id == id,
                LookupKind::Subcategory => record.subcategory_id == id
            }
        })
    }
}

fn parsed<T: FromStr>(path: &str, query: &Query, key: &str) -> Result<Option<T>, ApiError> {
    query.get(key)
        .map(|value| value.parse().map_err(|_| ApiError::status(path, 400, format!("invalid {key}"))))
        .transpose()
}

/// Cuts one page out of `items` and builds service-style links.
fn paginate<T>(path: &str, query: &Query, items: Vec<T>) -> Result<Paginated<T>, ApiError> {
    let page: usize = match query.get("page") {
        Some(value) => value.parse().ok().filter(|page| *page > 0).ok_or_else(|| ApiError::not_found(path))?,
        None => 1
    };
    let page_size: usize = query.get("page_size")
        .and_then(|value| value.parse().ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let count = items.len();
    let total_pages = count.div_ceil(page_size).max(1);

    if page > total_pages {
        return Err(ApiError::not_found(path));
    }

    let link = |target: usize| -> Result<String, ApiError> {
        let mut url = Url::parse(LINK_BASE)?.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter().filter(|(key, _)| key.as_str() != "page") {
                pairs.append_pair(key, value);
            }
            // The first page is addressed without a page parameter
            if target > 1 {
                pairs.append_pair("page", &target.to_string());
            }
        }
        Ok(url.to_string())
    };

    let next = if page < total_pages { Some(link(page + 1)?) } else { None };
    let previous = if page > 1 { Some(link(page - 1)?) } else { None };
    let results = items.into_iter().skip((page - 1) * page_size).take(page_size).collect();

    Ok(Paginated { count: count as u64, next, previous, results })
}

#[async_trait]
impl CashflowApi for InMemoryApi {
    async fn reference_data(&self) -> Result<ReferenceSnapshot, ApiError> {
        Ok(ReferenceSnapshot {
            statuses: Self::sorted(&self.statuses),
            types: Self::sorted(&self.types),
            categories: Self::sorted(&self.categories),
            subcategories: Self::sorted(&self.subcategories)
        })
    }

    async fn categories_of_type(&self, type_id: Identifier) -> Result<Vec<Category>, ApiError> {
        if !self.types.contains_key(&type_id) {
            return Err(ApiError::not_found(format!("transaction-types/{type_id}/categories/")));
        }

        Ok(Self::sorted(&self.categories).into_iter()
            .filter(|category| category.type_id == type_id)
            .collect())
    }

    async fn subcategories_of_category(&self, category_id: Identifier) -> Result<Vec<Subcategory>, ApiError> {
        if !self.categories.contains_key(&category_id) {
            return Err(ApiError::not_found(format!("categories/{category_id}/subcategories/")));
        }

        Ok(Self::sorted(&self.subcategories).into_iter()
            .filter(|subcategory| subcategory.category_id == category_id)
            .collect())
    }

    async fn list_transactions(&self, query: &Query) -> Result<Paginated<Record>, ApiError> {
        let path = "transactions/";
        let records = self.filtered_records(path, query)?;
        paginate(path, query, records)
    }

    async fn transaction(&self, id: RecordId) -> Result<Record, ApiError> {
        self.records.get(&id)
            .map(|record| self.decorate(record.value().clone()))
            .ok_or_else(|| ApiError::not_found(format!("transactions/{id}/")))
    }

    async fn create_transaction(&self, draft: &RecordDraft) -> Result<Record, ApiError> {
        self.check_draft("transactions/", draft)?;

        let id = self.allocate_id();
        let record = Record::from_draft(id, draft.clone());
        self.records.insert(id, record.clone());
        debug!("Created transaction [{id}]");

        Ok(self.decorate(record))
    }

    async fn update_transaction(&self, id: RecordId, draft: &RecordDraft) -> Result<Record, ApiError> {
        let path = format!("transactions/{id}/");

        if !self.records.contains_key(&id) {
            return Err(ApiError::not_found(path));
        }

        self.check_draft(&path, draft)?;

        let record = Record::from_draft(id, draft.clone());
        self.records.insert(id, record.clone());

        Ok(self.decorate(record))
    }

    async fn delete_transaction(&self, id: RecordId) -> Result<(), ApiError> {
        self.records.remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("transactions/{id}/")))
    }

    async fn summary(&self, query: &Query) -> Result<Summary, ApiError> {
        let records = self.filtered_records("transactions/summary/", query)?;
        let mut by_type: Vec<TypeTotal> = Vec::new();

        for record in &records {
            let type_name = record.transaction_type_name.clone().unwrap_or_default();
            match by_type.iter_mut().find(|row| row.type_name == type_name) {
                Some(row) => {
                    row.count += 1;
                    row.total = Some(row.total.unwrap_or_default() + record.amount);
                }
                None => by_type.push(TypeTotal { type_name, count: 1, total: Some(record.amount) })
            }
        }

        Ok(Summary {
            summary: SummaryStats { total_count: records.len() as u64, ..SummaryStats::default() },
            by_type,
            by_category: Vec::new()
        })
    }

    async fn list_lookups(&self, kind: LookupKind, query: &Query) -> Result<Paginated<LookupRow>, ApiError> {
        let path = format!("{}/", kind.endpoint());
        let search = query.get("search").map(|value| value.to_lowercase());
        let parent: Option<Identifier> = match kind.parent_param().and_then(|key| query.get(key)) {
            Some(value) => Some(value.parse().map_err(|_| ApiError::status(&path, 400, "invalid parent filter"))?),
            None => None
        };

        let rows = self.lookup_rows(kind).into_iter()
            .filter(|row| parent.is_none_or(|id| row.parent_id(kind) == Some(id)))
            .filter(|row| search.as_deref().is_none_or(|needle| {
                row.name.to_lowercase().contains(needle)
                    || row.description.as_deref().is_some_and(|text| text.to_lowercase().contains(needle))
            }))
            .collect();

        paginate(&path, query, rows)
    }

    async fn save_lookup(&self, kind: LookupKind, id: Option<Identifier>, draft: &LookupDraft) -> Result<LookupRow, ApiError> {
        let path = match id {
            Some(id) => format!("{}/{id}/", kind.endpoint()),
            None => format!("{}/", kind.endpoint())
        };

        if draft.name.trim().is_empty() {
            return Err(ApiError::status(&path, 400, "name is required"));
        }

        let exists = |id: Identifier| match kind {
            LookupKind::Status => self.statuses.contains_key(&id),
            LookupKind::TransactionType => self.types.contains_key(&id),
            LookupKind::Category => self.categories.contains_key(&id),
            LookupKind::Subcategory => self.subcategories.contains_key(&id)
        };

        if id.is_some_and(|id| !exists(id)) {
            return Err(ApiError::not_found(path));
        }

        let id = id.unwrap_or_else(|| self.allocate_id());
        let description = Some(draft.description.clone()).filter(|text| !text.is_empty());

        match kind {
            LookupKind::Status | LookupKind::TransactionType => {
                let item = LookupItem { id, name: draft.name.clone(), description };
                let map = if kind == LookupKind::Status { &self.statuses } else { &self.types };
                map.insert(id, item);
            }
            LookupKind::Category => {
                let type_id = draft.parent.filter(|parent| self.types.contains_key(parent))
                    .ok_or_else(|| ApiError::status(&path, 400, "transaction_type is required"))?;
                self.categories.insert(id, Category { description, ..Category::new(id, type_id, draft.name.clone()) });
            }
            LookupKind::Subcategory => {
                let category_id = draft.parent.filter(|parent| self.categories.contains_key(parent))
                    .ok_or_else(|| ApiError::status(&path, 400, "category is required"))?;
                self.subcategories.insert(id, Subcategory { description, ..Subcategory::new(id, category_id, draft.name.clone()) });
            }
        }

        self.lookup_rows(kind).into_iter()
            .find(|row| row.id == id)
            .ok_or_else(|| ApiError::not_found(path))
    }

    async fn delete_lookup(&self, kind: LookupKind, id: Identifier) -> Result<(), ApiError> {
        let path = format!("{}/{id}/", kind.endpoint());

        if self.is_referenced(kind, id) || self.has_children(kind, id) {
            return Err(ApiError::status(path, 409, "entry is still in use"));
        }

        let removed = match kind {
            LookupKind::Status => self.statuses.remove(&id).is_some(),
            LookupKind::TransactionType => self.types.remove(&id).is_some(),
            LookupKind::Category => self.categories.remove(&id).is_some(),
            LookupKind::Subcategory => self.subcategories.remove(&id).is_some()
        };

        if removed { Ok(()) } else { Err(ApiError::not_found(path)) }
    }
}
