use std::sync::Arc;

use tokio::time::Instant;

use crate::clients::CatalogTransport;
use crate::config::Config;
use crate::handlers::Row;
use crate::ids::{IdTranslator, ResourceId};
use crate::mapping::ProductMapper;
use crate::models::*;
use crate::sync::{Dispatcher, Reconciler};

/// Runs one import batch: build products from rows, optionally attach
/// existing remote ids, then upsert everything.
#[derive(Clone)]
pub struct ImportEngine {
    mapper: ProductMapper,
    reconciler: Reconciler,
    dispatcher: Dispatcher,
}

impl ImportEngine {
    pub fn new(transport: Arc<dyn CatalogTransport>, cfg: &Config) -> Self {
        Self::with_settings(
            transport,
            IdTranslator::new(cfg.gid_platform.clone()),
            cfg.shop_domain.clone(),
            cfg.pagination_max_size,
        )
    }

    pub fn with_settings(
        transport: Arc<dyn CatalogTransport>,
        ids: IdTranslator,
        shop_domain: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            mapper: ProductMapper::new(ids.clone()),
            reconciler: Reconciler::new(transport.clone(), ids.clone(), page_size),
            dispatcher: Dispatcher::new(transport, ids, shop_domain),
        }
    }

    /// Import `rows` and report one outcome per product, in first-seen order.
    ///
    /// Errors only for batch-level problems: invalid location or collection
    /// ids, conflicting option names, or a failed lookup while `overwrite`
    /// is on. Failures of individual upserts are reported in the outcomes.
    pub async fn import_batch<I>(
        &self,
        rows: I,
        location_id: Option<&ResourceId>,
        collection_id: Option<&ResourceId>,
        overwrite: bool,
    ) -> Result<Vec<ImportOutcome>>
    where
        I: IntoIterator<Item = Row>,
    {
        let started = Instant::now();
        let mut products = self.mapper.build(rows, location_id, collection_id)?;
        tracing::info!(products = products.len(), overwrite = overwrite, "import: products built");

        if overwrite && !products.is_empty() {
            self.reconciler.reconcile(&mut products).await?;
        }

        let outcomes = self.dispatcher.dispatch(products).await;
        tracing::info!(
            products = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.errors.is_some()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "import: batch finished"
        );
        Ok(outcomes)
    }
}
