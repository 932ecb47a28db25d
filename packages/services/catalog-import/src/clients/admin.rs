use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use crate::clients::CatalogTransport;
use crate::config::Config;
use crate::ids::ResourceId;
use crate::models::*;

const PRODUCTS_BY_HANDLE_QUERY: &str = r#"
    query ProductsByHandle($first: Int!, $query: String!) {
        products(first: $first, query: $query) {
            edges {
                node {
                    id
                    handle
                    options { name position }
                    variants(first: 100) {
                        edges {
                            node {
                                id
                                selectedOptions { name value }
                                image { id }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

/// GraphQL Admin API client for product lookups and upserts.
///
/// Requests are sent once; there is no retry or throttling here.
#[derive(Clone)]
pub struct AdminApiClient {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl AdminApiClient {
    pub fn new(endpoint: &str, timeout_ms: u64, user_agent: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ImportError::Configuration(format!("invalid Admin API endpoint {}: {}", endpoint, e)))?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(timeout_ms.min(10_000)))
            .build()?;
        Ok(Self { client, endpoint, access_token })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.admin_endpoint(), cfg.http_timeout_ms, &cfg.http_user_agent, cfg.admin_access_token.clone())
    }

    pub fn endpoint(&self) -> &Url { &self.endpoint }

    /// POST a GraphQL document and return its `data` object.
    async fn graphql(&self, query: &str, variables: Value) -> std::result::Result<Value, RemoteError> {
        let body = json!({ "query": query, "variables": variables });
        let mut rb = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(token) = &self.access_token {
            rb = rb.header("X-Shopify-Access-Token", token);
        }

        let response = rb
            .send()
            .await
            .map_err(|e| RemoteError::with_message(None, format!("Admin API request error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body_preview = %text.chars().take(200).collect::<String>(), "admin api: non-success response");
            let errors = serde_json::from_str::<Value>(&text).ok().and_then(|v| v.get("errors").cloned());
            return Err(match errors {
                Some(errors) => RemoteError::with_errors(Some(status.as_u16()), errors),
                None => RemoteError::with_message(
                    Some(status.as_u16()),
                    format!("Admin API request failed with status: {}", status),
                ),
            });
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::with_message(Some(500), format!("Admin API response decode error: {}", e)))?;
        parse_graphql_response(result)
    }
}

/// Top-level `data` of a GraphQL response, or its `errors` as a failure.
pub fn parse_graphql_response(result: Value) -> std::result::Result<Value, RemoteError> {
    if let Some(errors) = result.get("errors").and_then(|e| e.as_array()) {
        let messages: Vec<Value> = errors
            .iter()
            .map(|e| e.get("message").cloned().unwrap_or_else(|| e.clone()))
            .collect();
        tracing::error!(errors = ?messages, "admin api: graphql request error");
        return Err(RemoteError::with_errors(Some(500), Value::Array(messages)));
    }
    match result.get("data") {
        Some(data) if data.is_object() => Ok(data.clone()),
        _ => Err(RemoteError::with_message(Some(500), "Unexpected GraphQL response")),
    }
}

/// Pull the requested node out of a mutation payload.
///
/// `fields` is the selection set, e.g. `product { handle legacyResourceId }`;
/// its leading name is the node returned. `userErrors` become a failure.
pub fn parse_mutation_payload(data: &Value, mutation: &str, fields: &str) -> std::result::Result<Value, RemoteError> {
    let payload = data
        .get(mutation)
        .filter(|v| v.is_object())
        .ok_or_else(|| RemoteError::with_message(Some(500), "Unexpected GraphQL mutation response"))?;

    if let Some(user_errors) = payload.get("userErrors").and_then(|e| e.as_array()) {
        if !user_errors.is_empty() {
            let messages: Vec<Value> = user_errors
                .iter()
                .map(|e| e.get("message").cloned().unwrap_or_else(|| e.clone()))
                .collect();
            tracing::warn!(mutation = %mutation, errors = ?messages, "admin api: mutation user errors");
            return Err(RemoteError::with_errors(Some(500), Value::Array(messages)));
        }
    }

    let node_name: String = fields
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match payload.get(&node_name) {
        Some(node) if node.is_object() => Ok(node.clone()),
        Some(Value::Null) | None => Err(RemoteError::with_message(
            Some(500),
            "GraphQL mutation response missing required node",
        )),
        Some(_) => Err(RemoteError::with_message(
            Some(500),
            format!("GraphQL mutation response node [{}] is not an object", node_name),
        )),
    }
}

/// Admin search syntax matching any of `handles`.
pub fn handle_search_query(handles: &[String]) -> String {
    handles
        .iter()
        .map(|h| format!("handle:\"{}\"", h.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn edges(v: Option<&Value>) -> impl Iterator<Item = &Value> {
    v.and_then(|c| c.get("edges"))
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
        .filter_map(|edge| edge.get("node"))
}

/// Convert a product node from [`PRODUCTS_BY_HANDLE_QUERY`].
pub fn remote_product_from_node(node: &Value) -> Option<RemoteProduct> {
    let id = node.get("id").and_then(|v| v.as_str())?;
    let handle = node.get("handle").and_then(|v| v.as_str())?;

    let mut named: Vec<(i64, String)> = node
        .get("options")
        .and_then(|o| o.as_array())
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, o)| {
            let name = o.get("name")?.as_str()?.to_string();
            let position = o.get("position").and_then(|p| p.as_i64()).unwrap_or(i as i64 + 1);
            Some((position, name))
        })
        .collect();
    named.sort_by_key(|(position, _)| *position);
    let options: Vec<String> = named.into_iter().map(|(_, name)| name).collect();

    let variants = edges(node.get("variants"))
        .filter_map(|v| {
            let id = v.get("id").and_then(|i| i.as_str())?;
            let selected = v.get("selectedOptions").and_then(|s| s.as_array());
            let mut slots: [Option<String>; MAX_OPTIONS] = Default::default();
            for (slot, name) in options.iter().take(MAX_OPTIONS).enumerate() {
                slots[slot] = selected
                    .into_iter()
                    .flatten()
                    .find(|so| so.get("name").and_then(|n| n.as_str()) == Some(name.as_str()))
                    .and_then(|so| so.get("value"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            let image_id = v
                .get("image")
                .and_then(|i| i.get("id"))
                .and_then(|i| i.as_str())
                .map(ResourceId::from);
            Some(RemoteVariant { id: ResourceId::from(id), options: slots, image_id })
        })
        .collect();

    Some(RemoteProduct { id: ResourceId::from(id), handle: handle.to_string(), options, variants })
}

#[async_trait]
impl CatalogTransport for AdminApiClient {
    async fn fetch_products_by_handles(
        &self,
        handles: &[String],
        limit: usize,
    ) -> std::result::Result<Vec<RemoteProduct>, RemoteError> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(handles = handles.len(), limit = limit, "admin api: fetching products by handle");
        let variables = json!({ "first": limit, "query": handle_search_query(handles) });
        let data = self.graphql(PRODUCTS_BY_HANDLE_QUERY, variables).await?;
        let products: Vec<RemoteProduct> = edges(data.get("products")).filter_map(remote_product_from_node).collect();
        tracing::debug!(fetched = products.len(), "admin api: products fetched");
        Ok(products)
    }

    async fn upsert_product(
        &self,
        kind: UpsertKind,
        input: Value,
        fields: &str,
    ) -> std::result::Result<Value, RemoteError> {
        let name = kind.mutation_name();
        let mutation = format!(
            "mutation ($input: ProductInput!) {{ {name}(input: $input) {{ {fields} userErrors {{ field message }} }} }}",
            name = name,
            fields = fields
        );
        let data = self.graphql(&mutation, json!({ "input": input })).await?;
        parse_mutation_payload(&data, name, fields)
    }
}
