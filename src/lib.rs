//! Multi-source product catalog ingestion and reconciliation.
//!
//! Two supplier feeds with incompatible schemas are normalized into one
//! canonical Product -> Variants -> DigitalAssets model and reconciled
//! against previously stored rows so repeated syncs are idempotent. A small
//! quote-simulation service compares price/delivery/reliability across
//! abstract providers in parallel.

#![recursion_limit = "256"]

pub mod database_ops;
pub mod ingest;
pub mod normalization;
pub mod quotes;
pub mod suppliers;
pub mod tracing;

pub mod util {
    pub mod env;
}

use std::sync::Arc;

use database_ops::db::Db;
use ingest::Ingestor;
use suppliers::{midocean::MidoceanClient, xdconnects::XdConnectsClient};

/// Build an ingestor with every supplier feed whose configuration is present.
/// Unconfigured feeds are skipped with a warning rather than failing startup,
/// so a single-supplier deployment works without dummy settings.
pub fn build_ingestor(db: Db) -> Ingestor {
    let mut ingestor = Ingestor::new(Arc::new(db));
    match MidoceanClient::from_env() {
        Ok(client) => ingestor.register_feed(Arc::new(client)),
        Err(e) => ::tracing::warn!(error = %e, "midocean feed not configured; skipping"),
    }
    match XdConnectsClient::from_env() {
        Ok(client) => ingestor.register_feed(Arc::new(client)),
        Err(e) => ::tracing::warn!(error = %e, "xd-connects feed not configured; skipping"),
    }
    ingestor
}
