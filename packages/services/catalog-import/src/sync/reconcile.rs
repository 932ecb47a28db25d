use std::sync::Arc;

use crate::clients::CatalogTransport;
use crate::ids::{GlobalIdResource, IdTranslator};
use crate::models::*;

/// Counts gathered while attaching remote ids, logged per batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub fetched: usize,
    pub matched_products: usize,
    pub options_changed: usize,
    pub matched_variants: usize,
}

impl ReconcileSummary {
    fn absorb(&mut self, other: ReconcileSummary) {
        self.fetched += other.fetched;
        self.matched_products += other.matched_products;
        self.options_changed += other.options_changed;
        self.matched_variants += other.matched_variants;
    }
}

/// Looks up existing products by handle and ties them to the local graph so
/// the dispatcher updates instead of creating duplicates.
#[derive(Clone)]
pub struct Reconciler {
    transport: Arc<dyn CatalogTransport>,
    ids: IdTranslator,
    page_size: usize,
}

impl Reconciler {
    pub fn new(transport: Arc<dyn CatalogTransport>, ids: IdTranslator, page_size: usize) -> Self {
        Self { transport, ids, page_size: page_size.max(1) }
    }

    /// Fetch every handle in `products`, one page-sized chunk at a time, and
    /// attach remote ids. A failed fetch aborts the whole batch.
    pub async fn reconcile(&self, products: &mut ProductMap) -> Result<ReconcileSummary> {
        let handles: Vec<String> = products.handles().map(str::to_string).collect();
        let mut summary = ReconcileSummary::default();

        for (chunk_index, chunk) in handles.chunks(self.page_size).enumerate() {
            let remote = self
                .transport
                .fetch_products_by_handles(chunk, self.page_size)
                .await
                .map_err(|e| {
                    tracing::error!(chunk = chunk_index, handles = chunk.len(), error = %e, "reconcile: fetch failed");
                    e
                })?;
            tracing::debug!(chunk = chunk_index, requested = chunk.len(), fetched = remote.len(), "reconcile: chunk fetched");
            summary.absorb(match_existing(products, &remote, &self.ids));
        }

        tracing::info!(
            fetched = summary.fetched,
            matched_products = summary.matched_products,
            options_changed = summary.options_changed,
            matched_variants = summary.matched_variants,
            "reconcile: existing products matched"
        );
        Ok(summary)
    }
}

fn options_changed(local: &OptionSlots, remote: &[String]) -> bool {
    local.len() != remote.len()
        || remote.iter().enumerate().any(|(slot, name)| local.get(slot) != Some(name.as_str()))
}

/// Attach ids from `remote` onto matching entries of `products`.
///
/// Products match by handle. Variants match only when the option names are
/// unchanged: each remote variant claims the first id-less local variant with
/// the same option tuple. A changed option list leaves every variant new.
pub fn match_existing(products: &mut ProductMap, remote: &[RemoteProduct], ids: &IdTranslator) -> ReconcileSummary {
    let mut summary = ReconcileSummary { fetched: remote.len(), ..Default::default() };

    for existing in remote {
        let Some(local) = products.get_mut(&existing.handle) else {
            continue;
        };
        let Some(product_id) = ids.to_global_id(&existing.id, GlobalIdResource::Product) else {
            tracing::warn!(handle = %existing.handle, id = %existing.id, "reconcile: remote product id not translatable");
            continue;
        };
        local.id = Some(product_id);
        summary.matched_products += 1;

        if options_changed(&local.options, &existing.options) {
            tracing::debug!(handle = %existing.handle, "reconcile: option names changed, replacing variants");
            summary.options_changed += 1;
            continue;
        }

        let mut preserved_images = Vec::new();
        for remote_variant in &existing.variants {
            let tuple = remote_variant.option_tuple();
            let Some(variant) = local
                .variants
                .iter_mut()
                .find(|v| v.id.is_none() && v.options.tuple() == tuple)
            else {
                continue;
            };
            let Some(variant_id) = ids.to_global_id(&remote_variant.id, GlobalIdResource::ProductVariant) else {
                continue;
            };
            variant.id = Some(variant_id);
            summary.matched_variants += 1;

            if variant.image_src.is_some() {
                continue;
            }
            if let Some(image_id) = remote_variant
                .image_id
                .as_ref()
                .and_then(|id| ids.to_global_id(id, GlobalIdResource::ProductImage))
            {
                variant.image_id = Some(image_id.clone());
                preserved_images.push(ImageInput::Existing { id: image_id });
            }
        }
        local.images.extend(preserved_images);
    }

    summary
}
