use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::clients::{clean_input, CatalogTransport};
use crate::ids::{IdTranslator, ResourceId};
use crate::models::*;

/// Selection set requested from every upsert.
pub const RESULT_FIELDS: &str = "product { handle legacyResourceId }";

/// Sends one create or update per product and turns each reply into an
/// [`ImportOutcome`]. A failing product never affects its neighbours.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn CatalogTransport>,
    ids: IdTranslator,
    shop_domain: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn CatalogTransport>, ids: IdTranslator, shop_domain: impl Into<String>) -> Self {
        Self { transport, ids, shop_domain: shop_domain.into() }
    }

    /// Upsert every product concurrently. Outcomes are in `products` order.
    pub async fn dispatch(&self, products: ProductMap) -> Vec<ImportOutcome> {
        let total = products.len();
        let results = stream::iter(products.into_iter().map(|product| async move {
            let result = self.upsert(&product).await;
            (product, result)
        }))
        .buffered(total.max(1))
        .collect::<Vec<_>>()
        .await;

        let outcomes: Vec<ImportOutcome> = results
            .into_iter()
            .map(|(product, result)| self.outcome(product, result))
            .collect();
        let failed = outcomes.iter().filter(|o| o.errors.is_some()).count();
        tracing::info!(total = total, failed = failed, "dispatch: upserts finished");
        outcomes
    }

    async fn upsert(&self, product: &ProductInput) -> std::result::Result<Value, RemoteError> {
        let kind = if product.id.is_some() { UpsertKind::Update } else { UpsertKind::Create };
        let input = serde_json::to_value(product)
            .map_err(|e| RemoteError::with_message(None, format!("failed to encode product input: {}", e)))?;
        tracing::debug!(handle = %product.handle, mutation = kind.mutation_name(), variants = product.variants.len(), "dispatch: sending upsert");
        self.transport.upsert_product(kind, clean_input(input), RESULT_FIELDS).await
    }

    fn outcome(&self, product: ProductInput, result: std::result::Result<Value, RemoteError>) -> ImportOutcome {
        match result {
            Ok(fields) => {
                let id = fields
                    .get("legacyResourceId")
                    .and_then(|v| serde_json::from_value::<ResourceId>(v.clone()).ok())
                    .and_then(|v| self.ids.to_legacy_id(&v));
                let handle = fields
                    .get("handle")
                    .and_then(|h| h.as_str())
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .unwrap_or(product.handle);
                let url = id.map(|_| format!("https://{}/products/{}", self.shop_domain, handle));
                ImportOutcome { id, handle, url, errors: None }
            }
            Err(e) => {
                tracing::error!(handle = %product.handle, error = %e, "dispatch: upsert failed");
                ImportOutcome { id: None, handle: product.handle, url: None, errors: Some(e.outcome_message()) }
            }
        }
    }
}
