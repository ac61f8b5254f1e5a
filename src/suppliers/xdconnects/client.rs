use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::suppliers::{unwrap_product_array, FeedError, SupplierFeed, SupplierKind};
use crate::util::env::{env_opt, env_parse};

#[derive(Debug, Clone)]
pub struct XdConnectsClient {
    http: Client,
    product_data_url: String,
}

impl XdConnectsClient {
    /// Build from XD_CONNECTS_PRODUCT_DATA_URL. The feed URL embeds its access
    /// token, so there is no separate credential.
    pub fn from_env() -> Result<Self, FeedError> {
        let product_data_url = env_opt("XD_CONNECTS_PRODUCT_DATA_URL")
            .ok_or_else(|| FeedError::Config("XD_CONNECTS_PRODUCT_DATA_URL".into()))?;
        Self::new(&product_data_url)
    }

    pub fn new(product_data_url: &str) -> Result<Self, FeedError> {
        let timeout_secs: u64 = env_parse("XD_CONNECTS_TIMEOUT_SECS", 60u64);
        let http = Client::builder()
            .user_agent("catalog-sync/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            product_data_url: product_data_url.to_string(),
        })
    }
}

#[async_trait]
impl SupplierFeed for XdConnectsClient {
    fn kind(&self) -> SupplierKind {
        SupplierKind::XdConnects
    }

    async fn fetch_products(&self) -> Result<Vec<Value>, FeedError> {
        info!("requesting xd-connects product feed");
        let response = self
            .http
            .get(&self.product_data_url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "xd-connects feed returned non-success");
            return Err(FeedError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body).map_err(FeedError::Decode)?;
        let records = unwrap_product_array(data);
        info!(count = records.len(), "xd-connects feed fetched");
        Ok(records)
    }
}
