#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use catalog_import::{
    CatalogTransport, IdTranslator, ImportEngine, RemoteError, RemoteProduct, RemoteVariant, ResourceId, UpsertKind,
    MAX_OPTIONS,
};

pub const SHOP: &str = "demo.myshopify.com";

pub const PRODUCTS_CSV: &str = "\
Handle,Title,Option1 Name,Option1 Value,Variant Price,Variant Inventory Qty,Image Src
a,Shirt,Size,M,10,3,https://cdn.example.com/a.png
a,,,L,12,,
b,Mug,Title,Default Title,5,1,
c,Hat,Color,Red,7,,
";

/// In-memory catalog that stores whatever is upserted and serves it back
/// from handle lookups.
pub struct MemoryCatalog {
    pub products: Mutex<Vec<RemoteProduct>>,
    pub next_id: AtomicI64,
    pub fail_handles: Vec<String>,
    pub fail_fetch: bool,
    pub fetch_calls: Mutex<Vec<usize>>,
    pub upserts: Mutex<Vec<(UpsertKind, Value)>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self {
            products: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            fail_handles: Vec::new(),
            fail_fetch: false,
            fetch_calls: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryCatalog {
    pub fn failing(handles: &[&str]) -> Self {
        Self { fail_handles: handles.iter().map(|h| h.to_string()).collect(), ..Default::default() }
    }

    fn next(&self) -> i64 { self.next_id.fetch_add(1, Ordering::SeqCst) }

    pub fn upserts(&self) -> Vec<(UpsertKind, Value)> { self.upserts.lock().unwrap().clone() }

    pub fn upsert_for(&self, handle: &str) -> Option<(UpsertKind, Value)> {
        self.upserts().into_iter().rev().find(|(_, input)| input["handle"] == handle)
    }

    /// Stored products sorted by handle.
    pub fn stored(&self) -> Vec<RemoteProduct> {
        let mut products = self.products.lock().unwrap().clone();
        products.sort_by(|a, b| a.handle.cmp(&b.handle));
        products
    }
}

fn option_slots(v: Option<&Value>) -> [Option<String>; MAX_OPTIONS] {
    let mut slots: [Option<String>; MAX_OPTIONS] = Default::default();
    for (i, value) in v.and_then(|o| o.as_array()).into_iter().flatten().take(MAX_OPTIONS).enumerate() {
        slots[i] = value.as_str().map(str::to_string);
    }
    slots
}

#[async_trait]
impl CatalogTransport for MemoryCatalog {
    async fn fetch_products_by_handles(
        &self,
        handles: &[String],
        limit: usize,
    ) -> Result<Vec<RemoteProduct>, RemoteError> {
        self.fetch_calls.lock().unwrap().push(handles.len());
        if self.fail_fetch {
            return Err(RemoteError::with_message(Some(503), "Service Unavailable"));
        }
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| handles.contains(&p.handle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn upsert_product(&self, kind: UpsertKind, input: Value, fields: &str) -> Result<Value, RemoteError> {
        assert!(fields.contains("legacyResourceId"));
        let handle = input["handle"].as_str().unwrap_or_default().to_string();
        self.upserts.lock().unwrap().push((kind, input.clone()));
        if self.fail_handles.contains(&handle) {
            return Err(RemoteError::with_errors(Some(500), json!(["Title can't be blank"])));
        }

        let product_id = match (kind, input.get("id").and_then(|v| v.as_str())) {
            (UpsertKind::Update, Some(gid)) => gid.to_string(),
            _ => format!("gid://shopify/Product/{}", self.next()),
        };
        let options = input
            .get("options")
            .and_then(|o| o.as_array())
            .into_iter()
            .flatten()
            .filter_map(|o| o.as_str().map(str::to_string))
            .collect();
        let variants = input
            .get("variants")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .map(|v| RemoteVariant {
                id: match v.get("id").and_then(|i| i.as_str()) {
                    Some(gid) => ResourceId::from(gid),
                    None => ResourceId::from(format!("gid://shopify/ProductVariant/{}", self.next())),
                },
                options: option_slots(v.get("options")),
                image_id: None,
            })
            .collect();

        let mut store = self.products.lock().unwrap();
        store.retain(|p| p.handle != handle);
        store.push(RemoteProduct { id: ResourceId::from(product_id.clone()), handle: handle.clone(), options, variants });

        let legacy = product_id.rsplit('/').next().unwrap_or_default().to_string();
        Ok(json!({ "handle": handle, "legacyResourceId": legacy }))
    }
}

pub fn engine(catalog: Arc<MemoryCatalog>, page_size: usize) -> ImportEngine {
    ImportEngine::with_settings(catalog, IdTranslator::default(), SHOP, page_size)
}
