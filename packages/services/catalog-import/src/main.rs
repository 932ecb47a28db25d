use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use catalog_import::clients::AdminApiClient;
use catalog_import::config::Config;
use catalog_import::routes::{router, AppState};
use catalog_import::sync::ImportEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory, and override any pre-set envs
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(true)
        .init();

    let cfg = Config::from_env();
    tracing::info!(
        shop = %cfg.shop_domain,
        api_version = %cfg.admin_api_version,
        default_location = ?cfg.default_location_id,
        page_size = cfg.pagination_max_size,
        "Loaded configuration"
    );
    if cfg.admin_access_token.is_none() {
        tracing::warn!("ADMIN_ACCESS_TOKEN is not set; Admin API calls will be unauthenticated");
    }

    let admin_client = AdminApiClient::from_config(&cfg)?;
    tracing::info!(endpoint = %admin_client.endpoint(), "Admin API client ready");
    let engine = ImportEngine::new(Arc::new(admin_client), &cfg);
    let app = router(AppState::new(engine, &cfg));

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = cfg.port, "Port is already in use. Try changing PORT env var or stop the other process.");
            }
            return Err(e.into());
        }
    };
    tracing::info!(port = cfg.port, "Catalog import service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
