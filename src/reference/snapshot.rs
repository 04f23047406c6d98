use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, warn};

use crate::api::CashflowApi;
use crate::models::ReferenceSnapshot;
use crate::types::{ApiError, ClientError};

/// Loads `reference-data/` at most once per screen.
///
/// Concurrent callers share the in-flight read. A failed read is not
/// cached, so the next `load` goes back to the service.
pub struct ReferenceSource<A> {
    api: Arc<A>,
    cache: Cache<(), Arc<ReferenceSnapshot>>
}

impl<A: CashflowApi> ReferenceSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cache: Cache::builder().max_capacity(1).build()
        }
    }

    pub async fn load(&self) -> Result<Arc<ReferenceSnapshot>, ClientError> {
        let api = self.api.clone();

        self.cache.try_get_with((), async move {
            let snapshot = api.reference_data().await?;

            for diagnostic in snapshot.diagnostics() {
                warn!("{diagnostic}");
            }

            debug!(
                "Loaded reference data: {} statuses, {} types, {} categories, {} subcategories",
                snapshot.statuses.len(), snapshot.types.len(), snapshot.categories.len(), snapshot.subcategories.len()
            );

            Ok::<_, ApiError>(Arc::new(snapshot))
        })
        .await
        .map_err(|error| ClientError::reference_unavailable("reference data", error))
    }

    /// The snapshot if one has already been loaded.
    pub async fn cached(&self) -> Option<Arc<ReferenceSnapshot>> {
        self.cache.get(&()).await
    }

    /// Drops the cached snapshot so the next `load` reads again.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}
