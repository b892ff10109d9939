use crate::catalog_store::CatalogStore;
use crate::rawg::RemoteCatalog;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared resources handed to jobs on execution.
#[derive(Clone)]
pub struct JobContext {
    /// Cancelled when the job (or the whole scheduler) should stop.
    pub cancellation_token: CancellationToken,
    pub catalog_store: Arc<dyn CatalogStore>,
    pub remote: Arc<dyn RemoteCatalog>,
}

impl JobContext {
    pub fn new(
        cancellation_token: CancellationToken,
        catalog_store: Arc<dyn CatalogStore>,
        remote: Arc<dyn RemoteCatalog>,
    ) -> Self {
        Self {
            cancellation_token,
            catalog_store,
            remote,
        }
    }
}
