use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::api::{CashflowApi, Query};
use crate::models::{LookupDraft, LookupKind, LookupRow};
use crate::reference::ReferenceSource;
use crate::render::{ConfirmGate, Renderer, Severity};
use crate::types::{ClientError, Identifier};

/// Search text and parent relation a lookup table is narrowed by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupFilter {
    pub search: Option<String>,
    pub parent: Option<Identifier>
}

impl LookupFilter {
    pub fn new(search: Option<&str>, parent: Option<Identifier>) -> Self {
        Self {
            search: search.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string),
            parent
        }
    }

    /// The parent is only sent for kinds that have one.
    pub fn to_query(&self, kind: LookupKind) -> Query {
        let mut query = Query::new();

        if let Some(search) = &self.search {
            query.insert("search".to_string(), search.clone());
        }

        if let (Some(key), Some(parent)) = (kind.parent_param(), self.parent) {
            query.insert(key.to_string(), parent.to_string());
        }

        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookOutcome {
    Listed(Vec<LookupRow>),
    Saved(LookupRow),
    Deleted,
    Declined,
    Failed
}

/// The screen managing statuses, types, categories and subcategories.
///
/// Each table keeps its own filter; saves and deletes re-list the table with
/// it and drop the shared reference snapshot, which no longer matches.
pub struct ReferenceBook<A, R, G> {
    api: Arc<A>,
    renderer: Arc<R>,
    gate: Arc<G>,
    reference: Arc<ReferenceSource<A>>,
    filters: Mutex<HashMap<LookupKind, LookupFilter>>
}

impl<A: CashflowApi, R: Renderer, G: ConfirmGate> ReferenceBook<A, R, G> {
    pub fn new(api: Arc<A>, renderer: Arc<R>, gate: Arc<G>, reference: Arc<ReferenceSource<A>>) -> Self {
        Self {
            api,
            renderer,
            gate,
            reference,
            filters: Mutex::new(HashMap::new())
        }
    }

    /// Lists all four tables concurrently.
    pub async fn open(&self) -> [BookOutcome; 4] {
        let [status, kind, category, subcategory] = LookupKind::ALL;

        let (status, kind, category, subcategory) = tokio::join!(
            self.list(status, None, None),
            self.list(kind, None, None),
            self.list(category, None, None),
            self.list(subcategory, None, None)
        );

        [status, kind, category, subcategory]
    }

    /// Lists `kind` narrowed by `search` and, for categories and subcategories, `parent`.
    pub async fn list(&self, kind: LookupKind, search: Option<&str>, parent: Option<Identifier>) -> BookOutcome {
        let filter = LookupFilter::new(search, parent);
        self.filters.lock().await.insert(kind, filter.clone());
        self.fetch(kind, &filter).await
    }

    /// Creates when `id` is `None`, updates otherwise, then re-lists.
    pub async fn save(&self, kind: LookupKind, id: Option<Identifier>, draft: &LookupDraft) -> BookOutcome {
        let row = match self.api.save_lookup(kind, id, draft).await {
            Ok(row) => row,
            Err(source) => {
                self.report(ClientError::write_rejected(format!("save the {}", kind.label()), source));
                return BookOutcome::Failed;
            }
        };

        let message = if id.is_some() { "Entry updated" } else { "Entry created" };
        info!("{message}: {} [{}]", kind.label(), row.id);
        self.renderer.notify(Severity::Success, message);
        self.reference.invalidate().await;
        self.relist(kind).await;

        BookOutcome::Saved(row)
    }

    /// Deletes after confirmation, then re-lists.
    pub async fn delete(&self, kind: LookupKind, id: Identifier) -> BookOutcome {
        if !self.gate.confirm(&format!("Delete {} [{id}]?", kind.label())).await {
            debug!("Deletion of {} [{id}] was declined", kind.label());
            return BookOutcome::Declined;
        }

        if let Err(source) = self.api.delete_lookup(kind, id).await {
            self.report(ClientError::write_rejected(format!("delete the {}", kind.label()), source));
            return BookOutcome::Failed;
        }

        info!("Deleted {} [{id}]", kind.label());
        self.renderer.notify(Severity::Success, "Entry deleted");
        self.reference.invalidate().await;
        self.relist(kind).await;

        BookOutcome::Deleted
    }

    async fn relist(&self, kind: LookupKind) {
        let filter = self.filters.lock().await.get(&kind).cloned().unwrap_or_default();
        self.fetch(kind, &filter).await;
    }

    async fn fetch(&self, kind: LookupKind, filter: &LookupFilter) -> BookOutcome {
        match self.api.list_lookups(kind, &filter.to_query(kind)).await {
            Ok(page) => {
                self.renderer.render_lookup_rows(kind, &page.results);
                BookOutcome::Listed(page.results)
            }
            Err(source) => {
                self.report(ClientError::read_failed(format!("{} entries", kind.label()), source));
                BookOutcome::Failed
            }
        }
    }

    fn report(&self, error: ClientError) {
        error!("{error}");
        self.renderer.notify(Severity::Danger, &error.user_message());
    }
}
