mod common;

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use catalog_import::routes::{router, AppState};
use catalog_import::Config;
use common::{engine, MemoryCatalog, PRODUCTS_CSV};

async fn spawn(catalog: Arc<MemoryCatalog>, default_location_id: Option<&str>) -> String {
    spawn_with_limit(catalog, default_location_id, 64 * 1024).await
}

async fn spawn_with_limit(catalog: Arc<MemoryCatalog>, default_location_id: Option<&str>, upload_max_bytes: usize) -> String {
    let cfg = Config {
        default_location_id: default_location_id.map(str::to_string),
        upload_max_bytes,
        ..Default::default()
    };
    let app = router(AppState::new(engine(catalog, cfg.pagination_max_size), &cfg));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}

fn upload(name: &str, bytes: Vec<u8>) -> Form {
    Form::new().part("products", Part::bytes(bytes).file_name(name.to_string()))
}

async fn post(url: String, form: Form) -> (u16, Value) {
    let res = reqwest::Client::new().post(url).multipart(form).send().await.unwrap();
    let status = res.status().as_u16();
    (status, res.json::<Value>().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let base = spawn(Arc::new(MemoryCatalog::default()), None).await;
    let body = reqwest::get(format!("{}/health", base)).await.unwrap().text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_import_csv_upload() {
    let catalog = Arc::new(MemoryCatalog::failing(&["c"]));
    let base = spawn(catalog.clone(), Some("7")).await;

    let (status, body) = post(
        format!("{}/api/v1/products/import?overwrite=TRUE", base),
        upload("products.csv", PRODUCTS_CSV.as_bytes().to_vec()),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], 200);
    assert_eq!(body["errors"], json!([]));

    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["handle"], "a");
    assert!(products[0]["id"].is_u64());
    assert_eq!(products[0]["url"], "https://demo.myshopify.com/products/a");
    assert_eq!(products[0]["errors"], Value::Null);
    assert_eq!(products[2], json!({"id": null, "handle": "c", "url": null, "errors": "[\"Title can't be blank\"]"}));

    // configured default location used when the query omits one
    let (_, a) = catalog.upsert_for("a").unwrap();
    assert_eq!(a["variants"][0]["inventoryQuantities"][0]["locationId"], "gid://shopify/Location/7");
    assert_eq!(catalog.fetch_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_errors_use_error_envelope() {
    let catalog = Arc::new(MemoryCatalog::default());
    let base = spawn(catalog.clone(), None).await;

    let (status, body) = post(
        format!("{}/api/v1/products/import?location_id=abc", base),
        upload("products.csv", PRODUCTS_CSV.as_bytes().to_vec()),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"status": 400, "data": {}, "errors": ["Invalid location_id"]}));
    assert!(catalog.upserts().is_empty());
}

#[tokio::test]
async fn test_rejects_unsupported_and_missing_files() {
    let base = spawn(Arc::new(MemoryCatalog::default()), None).await;
    let url = format!("{}/api/v1/products/import", base);

    let (status, body) = post(url.clone(), upload("products.txt", b"Handle\na\n".to_vec())).await;
    assert_eq!(status, 400);
    assert_eq!(body["errors"], json!(["Unsupport file type."]));

    let (status, body) = post(url.clone(), Form::new().text("other", "value")).await;
    assert_eq!(status, 400);
    assert_eq!(body["errors"], json!(["Missing import file."]));

    let res = reqwest::Client::new().post(url).body("not multipart").send().await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], json!({}));
    assert_eq!(body["errors"], json!(["Missing import file."]));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let catalog = Arc::new(MemoryCatalog::default());
    let base = spawn_with_limit(catalog.clone(), None, 1024).await;

    let mut csv = String::from("Handle,Title,Option1 Name,Option1 Value\n");
    while csv.len() < 4 * 1024 {
        csv.push_str("big,Big,Size,M\n");
    }
    let res = reqwest::Client::new()
        .post(format!("{}/api/v1/products/import", base))
        .multipart(upload("products.csv", csv.into_bytes()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 413);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"], json!(["File too large"]));
    assert!(catalog.upserts().is_empty());
}

#[tokio::test]
async fn test_plain_text_upload_reads_as_csv() {
    let catalog = Arc::new(MemoryCatalog::default());
    let base = spawn(catalog.clone(), None).await;

    let part = Part::bytes(PRODUCTS_CSV.as_bytes().to_vec()).file_name("products").mime_str("text/plain").unwrap();
    let (status, body) = post(format!("{}/api/v1/products/import", base), Form::new().part("products", part)).await;
    assert_eq!(status, 200);
    let handles: Vec<&str> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["handle"].as_str().unwrap())
        .collect();
    assert_eq!(handles, vec!["a", "b", "c"]);
    assert_eq!(catalog.upserts().len(), 3);
}

#[tokio::test]
async fn test_second_file_is_rejected() {
    let catalog = Arc::new(MemoryCatalog::default());
    let base = spawn(catalog.clone(), None).await;
    let url = format!("{}/api/v1/products/import", base);

    let form = upload("products.csv", PRODUCTS_CSV.as_bytes().to_vec())
        .part("products", Part::bytes(b"Handle\nz\n".to_vec()).file_name("more.csv"));
    let (status, body) = post(url.clone(), form).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"status": 400, "data": {}, "errors": ["Too many files."]}));

    let form = upload("products.csv", PRODUCTS_CSV.as_bytes().to_vec())
        .part("extra", Part::bytes(b"x".to_vec()).file_name("extra.csv"));
    let (status, _) = post(url.clone(), form).await;
    assert_eq!(status, 400);
    assert!(catalog.upserts().is_empty());

    // plain text fields next to the file are fine
    let form = upload("products.csv", PRODUCTS_CSV.as_bytes().to_vec()).text("note", "weekly");
    let (status, _) = post(url, form).await;
    assert_eq!(status, 200);
}
