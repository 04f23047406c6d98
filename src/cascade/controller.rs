use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::api::CashflowApi;
use crate::cascade::{CascadePhase, CascadeSelection, LevelState, LevelStatus, Placement, StepOutcome};
use crate::models::{Category, LookupItem, Subcategory};
use crate::render::{Level, Renderer, Severity};
use crate::types::{ClientError, Identifier};

struct CascadeState {
    type_id: Option<Identifier>,
    categories: LevelState<Category>,
    subcategories: LevelState<Subcategory>
}

/// Drives the type → category → subcategory selects of one screen.
///
/// Every parent change empties and disables the levels below it before the
/// next read is issued. Responses are applied only while their level's epoch
/// is unchanged, so overlapping selections always settle on the latest one.
/// The state lock is never held across a request.
pub struct CascadeController<A, R> {
    api: Arc<A>,
    renderer: Arc<R>,
    placement: Placement,
    state: Mutex<CascadeState>
}

impl<A: CashflowApi, R: Renderer> CascadeController<A, R> {
    pub fn new(api: Arc<A>, renderer: Arc<R>, placement: Placement) -> Self {
        Self {
            api,
            renderer,
            placement,
            state: Mutex::new(CascadeState {
                type_id: None,
                categories: LevelState::new(Level::Category),
                subcategories: LevelState::new(Level::Subcategory)
            })
        }
    }

    pub async fn set_type(&self, type_id: Option<Identifier>) -> StepOutcome {
        let (type_id, epoch) = {
            let mut state = self.state.lock().await;
            state.type_id = type_id;
            state.subcategories.invalidate();
            self.render(Level::Subcategory, &[], false);

            let Some(type_id) = type_id else {
                state.categories.invalidate();
                self.render(Level::Category, &[], false);
                return StepOutcome::Cleared;
            };

            let epoch = state.categories.begin(type_id);
            self.render(Level::Category, &[], false);
            (type_id, epoch)
        };

        let result = self.api.categories_of_type(type_id).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(categories) => {
                if !state.categories.accept(epoch, categories) {
                    debug!("Discarding stale categories of type [{type_id}]");
                    return StepOutcome::Stale;
                }

                self.render(Level::Category, &state.categories.items(), state.categories.is_enabled());
                StepOutcome::Applied
            }
            Err(source) => {
                if !state.categories.fail(epoch) {
                    debug!("Discarding stale category failure for type [{type_id}]: {source}");
                    return StepOutcome::Stale;
                }

                self.render(Level::Category, &[], false);
                self.report(ClientError::reference_unavailable("categories", source));
                StepOutcome::Failed
            }
        }
    }

    /// Selects a category and reads its subcategories. `preset` is selected
    /// once that read has been applied, which is how edit forms restore a record.
    pub async fn set_category(&self, category_id: Option<Identifier>, preset: Option<Identifier>) -> StepOutcome {
        let (category_id, epoch) = {
            let mut state = self.state.lock().await;

            if !state.categories.select(category_id) {
                warn!("Ignoring category [{category_id:?}]: not among the offered options");
                return StepOutcome::Rejected;
            }

            let Some(category_id) = category_id else {
                state.subcategories.invalidate();
                self.render(Level::Subcategory, &[], false);
                return StepOutcome::Cleared;
            };

            let epoch = state.subcategories.begin(category_id);
            self.render(Level::Subcategory, &[], false);
            (category_id, epoch)
        };

        let result = self.api.subcategories_of_category(category_id).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(subcategories) => {
                if !state.subcategories.accept(epoch, subcategories) {
                    debug!("Discarding stale subcategories of category [{category_id}]");
                    return StepOutcome::Stale;
                }

                if preset.is_some() && !state.subcategories.select(preset) {
                    warn!("Preset subcategory [{preset:?}] is not offered for category [{category_id}]");
                }

                self.render(Level::Subcategory, &state.subcategories.items(), state.subcategories.is_enabled());
                StepOutcome::Applied
            }
            Err(source) => {
                if !state.subcategories.fail(epoch) {
                    debug!("Discarding stale subcategory failure for category [{category_id}]: {source}");
                    return StepOutcome::Stale;
                }

                self.render(Level::Subcategory, &[], false);
                self.report(ClientError::reference_unavailable("subcategories", source));
                StepOutcome::Failed
            }
        }
    }

    pub async fn set_subcategory(&self, subcategory_id: Option<Identifier>) -> StepOutcome {
        let mut state = self.state.lock().await;

        if !state.subcategories.select(subcategory_id) {
            debug!("Ignoring subcategory [{subcategory_id:?}]: level is disabled or the option is not offered");
            return StepOutcome::Rejected;
        }

        match subcategory_id {
            Some(_) => StepOutcome::Applied,
            None => StepOutcome::Cleared
        }
    }

    /// Restores `{type, category, subcategory}` one level at a time. A step
    /// that was superseded or failed ends the sequence with its outcome.
    pub async fn load_for_edit(&self, type_id: Identifier, category_id: Identifier, subcategory_id: Identifier) -> StepOutcome {
        match self.set_type(Some(type_id)).await {
            StepOutcome::Applied => {}
            outcome => return outcome
        }

        self.set_category(Some(category_id), Some(subcategory_id)).await
    }

    pub async fn selection(&self) -> CascadeSelection {
        let state = self.state.lock().await;

        CascadeSelection {
            type_id: state.type_id,
            category_id: state.categories.selected(),
            subcategory_id: state.subcategories.selected()
        }
    }

    pub async fn phase(&self) -> CascadePhase {
        let state = self.state.lock().await;

        if state.type_id.is_none() {
            return CascadePhase::Idle;
        }

        match state.categories.status() {
            LevelStatus::Loading => CascadePhase::CategoriesLoading,
            LevelStatus::Disabled | LevelStatus::Failed => CascadePhase::TypeSelected,
            LevelStatus::Loaded => match (state.categories.selected(), state.subcategories.status()) {
                (Some(_), LevelStatus::Loading) => CascadePhase::SubcategoriesLoading,
                (Some(_), LevelStatus::Loaded) => CascadePhase::SubcategoriesLoaded,
                _ => CascadePhase::CategoriesLoaded
            }
        }
    }

    /// Options currently offered at `level`. Status and type are not cascade levels.
    pub async fn options(&self, level: Level) -> Vec<LookupItem> {
        let state = self.state.lock().await;

        match level {
            Level::Category => state.categories.items(),
            Level::Subcategory => state.subcategories.items(),
            Level::Status | Level::Type => Vec::new()
        }
    }

    pub async fn is_enabled(&self, level: Level) -> bool {
        let state = self.state.lock().await;

        match level {
            Level::Category => state.categories.is_enabled(),
            Level::Subcategory => state.subcategories.is_enabled(),
            Level::Status | Level::Type => true
        }
    }

    fn render(&self, level: Level, items: &[LookupItem], enabled: bool) {
        self.renderer.render_options(level, items, self.placement.placeholder(level), enabled);
    }

    fn report(&self, error: ClientError) {
        error!("{error}");
        self.renderer.notify(Severity::Danger, &error.user_message());
    }
}
