use async_trait::async_trait;
use serde_json::Value;

use crate::models::{RemoteError, RemoteProduct, UpsertKind};

/// Remote catalog operations the import pipeline depends on.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Existing products whose handle is in `handles`, at most `limit` of them.
    async fn fetch_products_by_handles(
        &self,
        handles: &[String],
        limit: usize,
    ) -> std::result::Result<Vec<RemoteProduct>, RemoteError>;

    /// Create or update one product. `input` has already been through
    /// [`clean_input`]; the returned object holds the requested `fields`.
    async fn upsert_product(
        &self,
        kind: UpsertKind,
        input: Value,
        fields: &str,
    ) -> std::result::Result<Value, RemoteError>;
}

/// Drop `null` members and empty lists from every object in `input`.
///
/// Array elements are cleaned recursively but never removed, so positional
/// lists (option names, option values) keep their holes.
pub fn clean_input(input: Value) -> Value {
    match input {
        Value::Object(map) => {
            let cleaned = map
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::Null => None,
                    Value::Array(ref items) if items.is_empty() => None,
                    other => Some((k, clean_input(other))),
                })
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(clean_input).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nulls_and_empty_lists_recursively() {
        let input = json!({
            "handle": "a",
            "id": null,
            "images": [],
            "options": ["Color", null],
            "variants": [{"sku": null, "price": 10.0, "inventoryQuantities": []}],
            "published": false
        });
        assert_eq!(
            clean_input(input),
            json!({
                "handle": "a",
                "options": ["Color", null],
                "variants": [{"price": 10.0}],
                "published": false
            })
        );
    }

    #[test]
    fn product_input_serializes_clean() {
        let mut p = crate::models::ProductInput::new("a");
        p.title = Some("Shirt".into());
        let cleaned = clean_input(serde_json::to_value(&p).unwrap());
        assert_eq!(cleaned, json!({"handle": "a", "title": "Shirt"}));
    }
}
