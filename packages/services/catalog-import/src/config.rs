use serde::{Deserialize, Serialize};

use crate::ids::DEFAULT_PLATFORM;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    // Store domain, e.g. example.myshopify.com
    pub shop_domain: String,
    pub admin_api_version: String,
    // Full GraphQL endpoint; overrides the one derived from the shop domain
    pub admin_api_url: Option<String>,
    pub admin_access_token: Option<String>,
    pub gid_platform: String,
    pub default_location_id: Option<String>,
    pub pagination_max_size: usize,
    pub http_timeout_ms: u64,
    pub http_user_agent: String,
    pub upload_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            shop_domain: "localhost".to_string(),
            admin_api_version: "2022-04".to_string(),
            admin_api_url: None,
            admin_access_token: None,
            gid_platform: DEFAULT_PLATFORM.to_string(),
            default_location_id: None,
            pagination_max_size: 250,
            http_timeout_ms: 60000,
            http_user_agent: "catalog-import/1.0".to_string(),
            upload_max_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let get = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port);
        let shop_domain = get("SHOP_DOMAIN").unwrap_or(defaults.shop_domain);
        let admin_api_version = get("ADMIN_API_VERSION").unwrap_or(defaults.admin_api_version);
        let admin_api_url = get("ADMIN_API_URL");
        let admin_access_token = get("ADMIN_ACCESS_TOKEN");
        let gid_platform = get("GID_PLATFORM").unwrap_or(defaults.gid_platform);
        let default_location_id = get("DEFAULT_LOCATION_ID");
        // never above the platform's page maximum of 250
        let pagination_max_size: usize = get("PAGINATION_MAX_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.pagination_max_size)
            .min(250);
        let http_timeout_ms: u64 = get("HTTP_TIMEOUT_MS").and_then(|s| s.parse().ok()).unwrap_or(defaults.http_timeout_ms);
        let http_user_agent = get("HTTP_USER_AGENT").unwrap_or(defaults.http_user_agent);
        let upload_max_bytes: usize = get("UPLOAD_MAX_BYTES").and_then(|s| s.parse().ok()).unwrap_or(defaults.upload_max_bytes);

        Self {
            port,
            shop_domain,
            admin_api_version,
            admin_api_url,
            admin_access_token,
            gid_platform,
            default_location_id,
            pagination_max_size,
            http_timeout_ms,
            http_user_agent,
            upload_max_bytes,
        }
    }

    /// GraphQL Admin API endpoint for the configured shop.
    pub fn admin_endpoint(&self) -> String {
        match &self.admin_api_url {
            Some(url) => url.clone(),
            None => format!("https://{}/admin/api/{}/graphql.json", self.shop_domain, self.admin_api_version),
        }
    }
}
