//! Supplier feed integrations. Each supplier module owns its HTTP client, a
//! strongly-typed view of its feed records, and the normalizer that turns one
//! raw record into the canonical Product/Variant/DigitalAsset triple.

pub mod midocean;
pub mod xdconnects;

use async_trait::async_trait;
use serde_json::Value;

use crate::database_ops::catalog::CanonicalRecord;

/// The upstream feeds this engine understands, identified by their stored
/// `source` tag. Identity resolution is always scoped to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplierKind {
    Midocean,
    XdConnects,
}

impl SupplierKind {
    pub const ALL: [SupplierKind; 2] = [SupplierKind::Midocean, SupplierKind::XdConnects];

    pub fn tag(self) -> &'static str {
        match self {
            SupplierKind::Midocean => "midocean",
            SupplierKind::XdConnects => "xd-connects",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "midocean" => Some(SupplierKind::Midocean),
            "xd-connects" | "xdconnects" | "xd" => Some(SupplierKind::XdConnects),
            _ => None,
        }
    }

    /// Dispatch to the supplier's normalizer. Normalization never fails: a
    /// malformed record degrades to placeholder fields rather than erroring.
    pub fn normalize(self, raw: &Value) -> CanonicalRecord {
        match self {
            SupplierKind::Midocean => midocean::normalize::normalize(raw),
            SupplierKind::XdConnects => xdconnects::normalize::normalize(raw),
        }
    }
}

impl std::fmt::Display for SupplierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Upstream feed failure. Fatal to the affected supplier's run only; the
/// orchestrator reports it per supplier and keeps the others going.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("feed payload was not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("missing feed configuration: {0}")]
    Config(String),
}

/// A configured upstream feed: knows which supplier it is and how to pull the
/// current full batch of raw product records.
#[async_trait]
pub trait SupplierFeed: Send + Sync {
    fn kind(&self) -> SupplierKind;

    async fn fetch_products(&self) -> Result<Vec<Value>, FeedError>;
}

/// Feeds have been observed returning a bare array, the array under one of
/// several wrapper keys, or a single record object. Accept all of them.
pub fn unwrap_product_array(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            for key in ["products", "data", "items", "results", "ProductList", "productList"] {
                if let Some(Value::Array(items)) = obj.remove(key) {
                    tracing::debug!(wrapper = key, count = items.len(), "unwrapped product array");
                    return items;
                }
            }
            // Single product object.
            vec![Value::Object(obj)]
        }
        _ => Vec::new(),
    }
}

/// Best-effort identifying code for error reports, probed from the raw record
/// so even records that failed normalization can be pointed at.
pub fn record_code_hint(raw: &Value) -> String {
    for key in [
        "master_code",
        "masterCode",
        "productCode",
        "ProductCode",
        "ItemCode",
        "code",
        "sku",
        "id",
    ] {
        if let Some(v) = raw.get(key) {
            match v {
                Value::String(s) if !s.trim().is_empty() => return s.trim().to_string(),
                Value::Number(n) => return n.to_string(),
                _ => {}
            }
        }
    }
    "unknown".to_string()
}
