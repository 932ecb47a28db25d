use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};

use crate::config::Config;
use crate::handlers::{SheetFormat, Worksheet};
use crate::ids::ResourceId;
use crate::models::*;
use crate::sync::ImportEngine;

/// Multipart field carrying the sheet.
pub const UPLOAD_FIELD: &str = "products";

// room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: ImportEngine,
    pub default_location_id: Option<String>,
    pub upload_max_bytes: usize,
}

impl AppState {
    pub fn new(engine: ImportEngine, cfg: &Config) -> Self {
        Self {
            engine,
            default_location_id: cfg.default_location_id.clone(),
            upload_max_bytes: cfg.upload_max_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.upload_max_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/products/import", post(import_products))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO))
                .make_span_with(|req: &Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.path = %req.uri().path(),
                        user_agent = req.headers().get("user-agent").and_then(|v| v.to_str().ok()),
                    )
                }),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Failure rendered as `{"status", "data": {}, "errors": [...]}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    errors: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, errors: vec![message.into()] }
    }

    fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let errors = match &e {
            ImportError::Remote(remote) => remote.error_list(),
            other => vec![other.to_string()],
        };
        Self { status, errors }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), errors = ?self.errors, "request failed");
        } else {
            tracing::warn!(status = self.status.as_u16(), errors = ?self.errors, "request rejected");
        }
        let body = json!({ "status": self.status.as_u16(), "data": {}, "errors": self.errors });
        (self.status, Json(body)).into_response()
    }
}

fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(json!({ "status": 200, "data": data, "errors": [] }))).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    pub location_id: Option<String>,
    pub collection_id: Option<String>,
    pub overwrite: Option<String>,
}

impl ImportParams {
    fn overwrite(&self) -> bool {
        self.overwrite.as_deref().map(|v| v.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
    }

    fn location_id(&self, fallback: Option<&str>) -> Option<ResourceId> {
        self.location_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(fallback)
            .map(ResourceId::from)
    }

    fn collection_id(&self) -> Option<ResourceId> {
        self.collection_id.as_deref().filter(|v| !v.trim().is_empty()).map(ResourceId::from)
    }
}

struct Upload {
    file_name: String,
    format: SheetFormat,
    bytes: Vec<u8>,
}

/// The single `products` file of the form. A second file part is rejected.
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> std::result::Result<Upload, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        let is_upload = field.name() == Some(UPLOAD_FIELD);
        if upload.is_some() && (is_upload || field.file_name().is_some()) {
            return Err(ApiError::bad_request("Too many files."));
        }
        if !is_upload {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let format = SheetFormat::from_file_name(&file_name)
            .or_else(|| field.content_type().and_then(SheetFormat::from_content_type))
            .ok_or_else(|| ApiError::bad_request("Unsupport file type."))?;
        let bytes = field.bytes().await.map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        if bytes.len() > max_bytes {
            return Err(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "File too large"));
        }
        upload = Some(Upload { file_name, format, bytes: bytes.to_vec() });
    }
    upload.ok_or_else(|| ApiError::bad_request("Missing import file."))
}

async fn import_products(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "import: request is not multipart");
        ApiError::bad_request("Missing import file.")
    })?;
    let upload = read_upload(multipart, state.upload_max_bytes).await?;

    let worksheet = Worksheet::parse(&upload.bytes, upload.format, true)?;
    let location_id = params.location_id(state.default_location_id.as_deref());
    let collection_id = params.collection_id();
    tracing::info!(
        file_name = %upload.file_name,
        rows = worksheet.len(),
        location_id = ?location_id,
        collection_id = ?collection_id,
        overwrite = params.overwrite(),
        "import: upload received"
    );

    let products = state
        .engine
        .import_batch(worksheet, location_id.as_ref(), collection_id.as_ref(), params.overwrite())
        .await?;
    Ok(ok(json!({ "products": products })))
}
