use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::suppliers::{unwrap_product_array, FeedError, SupplierFeed, SupplierKind};
use crate::util::env::{env_opt, env_parse, mask_secret};

const PRODUCTS_ENDPOINT: &str = "/gateway/products/2.0";
const TEST_BASE_URL: &str = "https://apitest.midocean.com";
const PRODUCTION_BASE_URL: &str = "https://api.midocean.com";

#[derive(Debug, Clone)]
pub struct MidoceanClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl MidoceanClient {
    /// Build from MIDOCEAN_API_KEY / MIDOCEAN_ENVIRONMENT (test|production) /
    /// MIDOCEAN_BASE_URL. The key is required; everything else has defaults.
    pub fn from_env() -> Result<Self, FeedError> {
        let api_key =
            env_opt("MIDOCEAN_API_KEY").ok_or_else(|| FeedError::Config("MIDOCEAN_API_KEY".into()))?;
        let environment = env_opt("MIDOCEAN_ENVIRONMENT").unwrap_or_else(|| "test".into());
        let base_url = env_opt("MIDOCEAN_BASE_URL").unwrap_or_else(|| {
            if environment.eq_ignore_ascii_case("production") {
                PRODUCTION_BASE_URL.to_string()
            } else {
                TEST_BASE_URL.to_string()
            }
        });
        Self::new(&base_url, &api_key)
    }

    pub fn new(base_url: &str, api_key: &str) -> Result<Self, FeedError> {
        let timeout_secs: u64 = env_parse("MIDOCEAN_TIMEOUT_SECS", 30u64);
        let http = Client::builder()
            .user_agent("catalog-sync/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SupplierFeed for MidoceanClient {
    fn kind(&self) -> SupplierKind {
        SupplierKind::Midocean
    }

    async fn fetch_products(&self) -> Result<Vec<Value>, FeedError> {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, PRODUCTS_ENDPOINT))
            .map_err(|e| FeedError::Config(format!("invalid midocean base url: {e}")))?;
        // The products endpoint only behaves with language=en; always force it.
        url.query_pairs_mut().append_pair("language", "en");

        info!(
            endpoint = PRODUCTS_ENDPOINT,
            api_key = %mask_secret(&self.api_key),
            "requesting midocean products"
        );
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header("x-Gateway-APIKey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "midocean feed returned non-success");
            return Err(FeedError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body).map_err(FeedError::Decode)?;
        let records = unwrap_product_array(data);
        info!(count = records.len(), "midocean feed fetched");
        Ok(records)
    }
}
