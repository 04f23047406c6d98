use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::api::{CashflowApi, Query};
use crate::cascade::{Epoch, Placement};
use crate::config::Settings;
use crate::filters::FilterState;
use crate::list::derive_page;
use crate::models::{ChildLookup, LookupItem, Paginated, Record, Summary};
use crate::reference::ReferenceSource;
use crate::render::{ConfirmGate, Level, Renderer, Severity};
use crate::types::{ApiError, ClientError, RecordId};

/// How one half of a page load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    Applied,
    /// A newer load started before this response arrived.
    Stale,
    Failed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadReport {
    pub records: LoadStatus,
    pub summary: LoadStatus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
    Failed
}

struct ListState {
    filters: FilterState,
    epoch: Epoch,
    current_page: u32,
    records_on_page: usize
}

/// The transactions list: one page of records, its pagination strip and the
/// summary figures for the active filters.
pub struct ListController<A, R, G> {
    api: Arc<A>,
    renderer: Arc<R>,
    gate: Arc<G>,
    settings: Settings,
    state: Mutex<ListState>
}

impl<A: CashflowApi, R: Renderer, G: ConfirmGate> ListController<A, R, G> {
    pub fn new(api: Arc<A>, renderer: Arc<R>, gate: Arc<G>, settings: Settings) -> Self {
        Self {
            api,
            renderer,
            gate,
            settings,
            state: Mutex::new(ListState {
                filters: FilterState::new(),
                epoch: Epoch::default(),
                current_page: 1,
                records_on_page: 0
            })
        }
    }

    /// Fills every filter select from the reference snapshot, then loads page 1.
    /// The category and subcategory filters offer the whole tree, not a cascade.
    pub async fn open(&self, reference: &ReferenceSource<A>) -> LoadReport {
        match reference.load().await {
            Ok(snapshot) => {
                let categories: Vec<LookupItem> = snapshot.categories.iter().map(ChildLookup::to_item).collect();
                let subcategories: Vec<LookupItem> = snapshot.subcategories.iter().map(ChildLookup::to_item).collect();

                self.render_filter(Level::Status, &snapshot.statuses);
                self.render_filter(Level::Type, &snapshot.types);
                self.render_filter(Level::Category, &categories);
                self.render_filter(Level::Subcategory, &subcategories);
            }
            Err(error) => {
                error!("{error}");
                for level in [Level::Status, Level::Type, Level::Category, Level::Subcategory] {
                    self.render_filter(level, &[]);
                }
                self.renderer.notify(Severity::Warning, &error.user_message());
            }
        }

        self.load(1).await
    }

    /// Requests `page` under the active filters. Records and summary are read
    /// concurrently and each is rendered as soon as it arrives.
    pub async fn load(&self, page: u32) -> LoadReport {
        let (epoch, filters) = {
            let mut state = self.state.lock().await;
            state.epoch = state.epoch.next();
            (state.epoch, state.filters.clone())
        };

        let query = page_query(&filters, page, self.settings.page_size);
        let summary_query = filters.to_query();

        let records = async {
            let result = self.api.list_transactions(&query).await;
            self.apply_records(epoch, result).await
        };
        let summary = async {
            let result = self.api.summary(&summary_query).await;
            self.apply_summary(epoch, result).await
        };

        let (records, summary) = tokio::join!(records, summary);

        LoadReport { records, summary }
    }

    /// Replaces the active filters without loading anything.
    pub async fn set_filters(&self, filters: FilterState) {
        debug!("Applying filters {:?}", filters.to_query());
        self.state.lock().await.filters = filters;
    }

    /// Replaces the active filters and loads page 1.
    pub async fn apply_filters(&self, filters: FilterState) -> LoadReport {
        self.set_filters(filters).await;
        self.load(1).await
    }

    pub async fn reset_filters(&self) -> LoadReport {
        self.state.lock().await.filters.reset();
        self.load(1).await
    }

    /// Deletes after confirmation and reloads the page that was showing. When
    /// that page held only the deleted record, the page before it is loaded.
    pub async fn delete(&self, id: RecordId) -> DeleteOutcome {
        // Loads finishing while the prompt is open must not move the reload target
        let (page, emptied) = {
            let state = self.state.lock().await;
            (state.current_page, state.records_on_page <= 1)
        };

        if !self.gate.confirm(&format!("Delete transaction [{id}]?")).await {
            debug!("Deletion of transaction [{id}] was declined");
            return DeleteOutcome::Declined;
        }

        if let Err(source) = self.api.delete_transaction(id).await {
            self.report(ClientError::write_rejected("delete the transaction", source));
            return DeleteOutcome::Failed;
        }

        info!("Deleted transaction [{id}]");
        self.renderer.notify(Severity::Success, "Transaction deleted");

        let target = if emptied && page > 1 { page - 1 } else { page };
        self.load(target).await;

        DeleteOutcome::Deleted
    }

    pub async fn current_page(&self) -> u32 {
        self.state.lock().await.current_page
    }

    pub async fn filters(&self) -> FilterState {
        self.state.lock().await.filters.clone()
    }

    async fn apply_records(&self, epoch: Epoch, result: Result<Paginated<Record>, ApiError>) -> LoadStatus {
        let mut state = self.state.lock().await;

        if state.epoch != epoch {
            debug!("Discarding stale transactions page");
            return LoadStatus::Stale;
        }

        match result {
            Ok(page) => {
                let derived = derive_page(page.count, self.settings.page_size, page.next.as_deref(), page.previous.as_deref());
                state.current_page = derived.current_page;
                state.records_on_page = page.results.len();

                self.renderer.render_records(&page.results);
                self.renderer.render_page_controls(&derived.controls(self.settings.page_window));
                LoadStatus::Applied
            }
            Err(source) => {
                self.report(ClientError::read_failed("transactions", source));
                LoadStatus::Failed
            }
        }
    }

    async fn apply_summary(&self, epoch: Epoch, result: Result<Summary, ApiError>) -> LoadStatus {
        let state = self.state.lock().await;

        if state.epoch != epoch {
            debug!("Discarding stale summary");
            return LoadStatus::Stale;
        }

        match result {
            Ok(summary) => {
                let totals = summary.totals(&self.settings.income_marker, &self.settings.expense_marker);
                self.renderer.render_summary(&totals);
                LoadStatus::Applied
            }
            Err(source) => {
                self.report(ClientError::read_failed("the summary", source));
                LoadStatus::Failed
            }
        }
    }

    fn render_filter(&self, level: Level, items: &[LookupItem]) {
        self.renderer.render_options(level, items, Placement::Filter.placeholder(level), !items.is_empty());
    }

    fn report(&self, error: ClientError) {
        error!("{error}");
        self.renderer.notify(Severity::Danger, &error.user_message());
    }
}

/// Canonical query of the filters plus paging, as sent for a page load.
pub fn page_query(filters: &FilterState, page: u32, page_size: u32) -> Query {
    let mut query = filters.to_query();
    query.insert("page".to_string(), page.max(1).to_string());
    query.insert("page_size".to_string(), page_size.to_string());
    query
}
