use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::api::CashflowApi;
use crate::cascade::{CascadeController, Placement};
use crate::form::FormInputs;
use crate::models::{FieldError, Record};
use crate::reference::ReferenceSource;
use crate::render::{Level, Renderer, Severity};
use crate::types::{ClientError, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid(Vec<FieldError>),
    /// Reference data could not be loaded, so the form could not be checked.
    Unavailable,
    /// The service refused or failed the write.
    Rejected,
    Saved(Record)
}

/// The create/edit transaction form.
pub struct FormController<A, R> {
    api: Arc<A>,
    renderer: Arc<R>,
    reference: Arc<ReferenceSource<A>>,
    cascade: CascadeController<A, R>,
    editing: Mutex<Option<RecordId>>
}

impl<A: CashflowApi, R: Renderer> FormController<A, R> {
    pub fn new(api: Arc<A>, renderer: Arc<R>, reference: Arc<ReferenceSource<A>>) -> Self {
        Self {
            cascade: CascadeController::new(api.clone(), renderer.clone(), Placement::Form),
            api,
            renderer,
            reference,
            editing: Mutex::new(None)
        }
    }

    /// The type/category/subcategory selects of this form.
    pub fn cascade(&self) -> &CascadeController<A, R> {
        &self.cascade
    }

    /// Renders the status and type options, then for `id` loads the record and
    /// restores its cascade. Returns the values to prefill, `None` when loading failed.
    /// Submits update `id` only once its record has been read.
    pub async fn open(&self, id: Option<RecordId>) -> Option<FormInputs> {
        // Only a record that was actually loaded can be updated
        *self.editing.lock().await = None;

        let snapshot = match self.reference.load().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                error!("{error}");
                self.renderer.render_options(Level::Status, &[], Level::Status.select_placeholder(), false);
                self.renderer.render_options(Level::Type, &[], Level::Type.select_placeholder(), false);
                self.cascade.set_type(None).await;
                self.renderer.notify(Severity::Warning, &error.user_message());
                return None;
            }
        };

        self.renderer.render_options(Level::Status, &snapshot.statuses, Level::Status.select_placeholder(), !snapshot.statuses.is_empty());
        self.renderer.render_options(Level::Type, &snapshot.types, Level::Type.select_placeholder(), !snapshot.types.is_empty());

        let Some(id) = id else {
            self.cascade.set_type(None).await;
            return Some(FormInputs::default());
        };

        let record = match self.api.transaction(id).await {
            Ok(record) => record,
            Err(source) => {
                self.report(ClientError::read_failed("the transaction", source));
                return None;
            }
        };

        *self.editing.lock().await = Some(record.id);
        self.cascade.load_for_edit(record.type_id, record.category_id, record.subcategory_id).await;

        Some(FormInputs::from_record(&record))
    }

    /// Validates locally and, only when valid, creates or updates the record.
    pub async fn submit(&self, inputs: &FormInputs) -> SubmitOutcome {
        let snapshot = match self.reference.load().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                error!("{error}");
                self.renderer.notify(Severity::Warning, &error.user_message());
                return SubmitOutcome::Unavailable;
            }
        };

        let draft = match inputs.validate(&snapshot) {
            Ok(draft) => draft,
            Err(errors) => {
                let error = ClientError::ValidationRejected(errors.clone());
                warn!("{error}");
                self.renderer.notify(Severity::Warning, &error.user_message());
                return SubmitOutcome::Invalid(errors);
            }
        };

        let editing = *self.editing.lock().await;

        let result = match editing {
            Some(id) => self.api.update_transaction(id, &draft).await,
            None => self.api.create_transaction(&draft).await
        };

        match result {
            Ok(record) => {
                let message = if editing.is_some() { "Transaction updated" } else { "Transaction created" };
                info!("{message} [{}]", record.id);
                self.renderer.notify(Severity::Success, message);
                *self.editing.lock().await = Some(record.id);
                SubmitOutcome::Saved(record)
            }
            Err(source) => {
                self.report(ClientError::write_rejected("save the transaction", source));
                SubmitOutcome::Rejected
            }
        }
    }

    /// The record being edited, `None` while creating.
    pub async fn editing(&self) -> Option<RecordId> {
        *self.editing.lock().await
    }

    fn report(&self, error: ClientError) {
        error!("{error}");
        self.renderer.notify(Severity::Danger, &error.user_message());
    }
}
