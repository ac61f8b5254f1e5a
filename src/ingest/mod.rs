//! Ingestion orchestrator: fetches, normalizes, resolves, persists, and
//! synchronizes children per raw record, accumulating a structured report
//! instead of failing the batch. One bad record never aborts the run; only a
//! total feed fetch failure surfaces as a supplier-level error.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::database_ops::catalog::{CanonicalRecord, CatalogStore, ChildSyncOutcome};
use crate::suppliers::{record_code_hint, SupplierFeed, SupplierKind};

/// Detail entries kept per report; the counts keep counting past this cap.
const MAX_REPORTED_DETAILS: usize = 10;

#[derive(Debug, Default, Serialize)]
pub struct IngestionReport {
    pub source: String,
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
    pub errored: usize,
    pub variants_saved: usize,
    pub assets_saved: usize,
    pub errors: Vec<RecordFailure>,
    pub skips: Vec<RecordSkip>,
}

#[derive(Debug, Serialize)]
pub struct RecordFailure {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RecordSkip {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub imported: usize,
    pub errored: usize,
    pub suppliers: Vec<SupplierOutcome>,
}

#[derive(Debug, Serialize)]
pub struct SupplierOutcome {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IngestionReport>,
}

pub struct Ingestor {
    store: Arc<dyn CatalogStore>,
    feeds: Vec<Arc<dyn SupplierFeed>>,
}

impl Ingestor {
    /// The store handle is injected, never resolved from globals; construct it
    /// once at process start and hand it in.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            feeds: Vec::new(),
        }
    }

    pub fn with_feed(mut self, feed: Arc<dyn SupplierFeed>) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn register_feed(&mut self, feed: Arc<dyn SupplierFeed>) {
        self.feeds.push(feed);
    }

    /// Ingest a batch of raw records for one supplier. Records are processed
    /// sequentially so identity resolution observes earlier writes in the same
    /// run; `limit` truncates the batch for bounded test/demo runs.
    pub async fn ingest_records(
        &self,
        kind: SupplierKind,
        raw_records: &[Value],
        limit: Option<usize>,
    ) -> IngestionReport {
        let slice = match limit {
            Some(n) => &raw_records[..raw_records.len().min(n)],
            None => raw_records,
        };
        let mut report = IngestionReport {
            source: kind.tag().to_string(),
            total: slice.len(),
            ..Default::default()
        };

        for raw in slice {
            let record = kind.normalize(raw);

            // The normalizer guarantees a non-empty name, so hitting this
            // means the record is unsalvageable. Skip, don't error.
            if record.product.name.trim().is_empty() {
                let code = record
                    .product
                    .product_code
                    .clone()
                    .or_else(|| record.product.external_id.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                error!(source = %kind, code = %code, "normalized record has empty name; skipping");
                report.skipped += 1;
                if report.skips.len() < MAX_REPORTED_DETAILS {
                    report.skips.push(RecordSkip {
                        code,
                        reason: "name extraction failed".to_string(),
                    });
                }
                continue;
            }

            match self.persist_record(&record).await {
                Ok(children) => {
                    report.saved += 1;
                    report.variants_saved += children.variants_saved;
                    report.assets_saved += children.assets_saved;
                    for child_error in &children.errors {
                        warn!(source = %kind, error = %child_error, "child sync error");
                    }
                }
                Err(e) => {
                    let code = record_code_hint(raw);
                    error!(source = %kind, code = %code, error = %e, "record persistence failed");
                    report.errored += 1;
                    if report.errors.len() < MAX_REPORTED_DETAILS {
                        report.errors.push(RecordFailure {
                            code,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            source = %kind,
            total = report.total,
            saved = report.saved,
            skipped = report.skipped,
            errored = report.errored,
            "supplier batch finished"
        );
        report
    }

    /// Resolve, persist, and replace children for one normalized record.
    async fn persist_record(&self, record: &CanonicalRecord) -> anyhow::Result<ChildSyncOutcome> {
        let product = &record.product;
        let existing = self
            .store
            .find_existing(
                &product.source,
                product.external_id.as_deref(),
                product.product_code.as_deref(),
            )
            .await?;

        let stored = match existing {
            Some(found) => {
                debug!(product_id = %found.id, "matched existing product; updating");
                self.store.update_product(&found.id, product).await?;
                found
            }
            None => self.store.insert_product(product).await?,
        };

        self.store
            .replace_children(&stored.id, &record.variants, &record.assets)
            .await
    }

    /// Fetch-and-ingest for the selected suppliers (None = all configured).
    /// Supplier runs execute concurrently with each other and sequentially
    /// within. Concurrent syncs of the *same* supplier are not safe; callers
    /// must serialize those.
    pub async fn sync(
        &self,
        suppliers: Option<&[SupplierKind]>,
        limit: Option<usize>,
    ) -> SyncReport {
        let selected: Vec<&Arc<dyn SupplierFeed>> = self
            .feeds
            .iter()
            .filter(|feed| match suppliers {
                Some(set) => set.contains(&feed.kind()),
                None => true,
            })
            .collect();

        let runs = selected.into_iter().map(|feed| async move {
            let kind = feed.kind();
            match feed.fetch_products().await {
                Ok(records) => {
                    let report = self.ingest_records(kind, &records, limit).await;
                    SupplierOutcome {
                        source: kind.tag().to_string(),
                        feed_error: None,
                        report: Some(report),
                    }
                }
                Err(e) => {
                    error!(source = %kind, error = %e, "feed fetch failed");
                    SupplierOutcome {
                        source: kind.tag().to_string(),
                        feed_error: Some(e.to_string()),
                        report: None,
                    }
                }
            }
        });

        let outcomes = futures::future::join_all(runs).await;
        let mut report = SyncReport::default();
        for outcome in outcomes {
            if let Some(r) = &outcome.report {
                report.imported += r.saved;
                report.errored += r.errored;
            }
            if outcome.feed_error.is_some() {
                report.errored += 1;
            }
            report.suppliers.push(outcome);
        }
        report
    }

    /// Startup hook: when the store is empty, kick off a full sync on the
    /// runtime and hand back the task so the caller can await or drop it
    /// explicitly. Returns None when the store already has data.
    pub async fn spawn_initial_import(
        self: &Arc<Self>,
    ) -> anyhow::Result<Option<tokio::task::JoinHandle<SyncReport>>> {
        let existing = self.store.product_count(None).await?;
        if existing > 0 {
            debug!(existing, "store already populated; skipping initial import");
            return Ok(None);
        }
        info!("empty store detected; spawning initial import");
        let ingestor = Arc::clone(self);
        Ok(Some(tokio::spawn(
            async move { ingestor.sync(None, None).await },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::catalog::{NewAsset, NewProduct, NewVariant, StoredProduct};
    use crate::database_ops::db::Db;
    use crate::suppliers::FeedError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn mem_db() -> Arc<Db> {
        Arc::new(Db::connect("sqlite::memory:", 1).await.expect("connect"))
    }

    fn midocean_record(code: &str) -> Value {
        json!({
            "master_code": code,
            "master_id": format!("id-{code}"),
            "product_name": format!("Product {code}"),
            "variants": [
                {
                    "variant_id": format!("{code}-v1"),
                    "sku": format!("{code}-16"),
                    "digital_assets": [
                        {"url": format!("https://cdn.example/{code}.jpg"), "type": "image"}
                    ]
                }
            ]
        })
    }

    struct StubFeed {
        kind: SupplierKind,
        records: Vec<Value>,
        fail: bool,
    }

    #[async_trait]
    impl SupplierFeed for StubFeed {
        fn kind(&self) -> SupplierKind {
            self.kind
        }

        async fn fetch_products(&self) -> Result<Vec<Value>, FeedError> {
            if self.fail {
                return Err(FeedError::Status {
                    status: 503,
                    body: "upstream unavailable".into(),
                });
            }
            Ok(self.records.clone())
        }
    }

    /// Wraps the real store and fails a chosen insert to prove the batch
    /// continues past a persistence error.
    struct FailingStore {
        inner: Arc<Db>,
        fail_on_insert: usize,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for FailingStore {
        async fn find_existing(
            &self,
            source: &str,
            external_id: Option<&str>,
            product_code: Option<&str>,
        ) -> anyhow::Result<Option<StoredProduct>> {
            self.inner
                .find_existing(source, external_id, product_code)
                .await
        }

        async fn insert_product(&self, product: &NewProduct) -> anyhow::Result<StoredProduct> {
            let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on_insert {
                anyhow::bail!("injected constraint violation");
            }
            self.inner.insert_product(product).await
        }

        async fn update_product(&self, id: &str, product: &NewProduct) -> anyhow::Result<()> {
            self.inner.update_product(id, product).await
        }

        async fn replace_children(
            &self,
            product_id: &str,
            variants: &[NewVariant],
            assets: &[NewAsset],
        ) -> anyhow::Result<crate::database_ops::catalog::ChildSyncOutcome> {
            self.inner.replace_children(product_id, variants, assets).await
        }

        async fn product_count(&self, source: Option<&str>) -> anyhow::Result<i64> {
            self.inner.product_count(source).await
        }
    }

    #[tokio::test]
    async fn reingesting_the_same_record_is_idempotent() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone());

        let records = vec![midocean_record("AR1249")];
        let first = ingestor
            .ingest_records(SupplierKind::Midocean, &records, None)
            .await;
        assert_eq!(first.saved, 1);

        let second = ingestor
            .ingest_records(SupplierKind::Midocean, &records, None)
            .await;
        assert_eq!(second.saved, 1);

        assert_eq!(db.product_count(Some("midocean")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn same_code_from_another_supplier_creates_a_new_product() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone());

        ingestor
            .ingest_records(
                SupplierKind::Midocean,
                &[json!({"master_code": "SHARED-1", "name": "From midocean"})],
                None,
            )
            .await;
        ingestor
            .ingest_records(
                SupplierKind::XdConnects,
                &[json!({"ItemCode": "SHARED-1", "ItemName": "From xd"})],
                None,
            )
            .await;

        assert_eq!(db.product_count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reingestion_fully_replaces_variants() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone());

        let three = json!({
            "master_code": "AR1",
            "name": "Three variants",
            "variants": [
                {"variant_id": "v1"}, {"variant_id": "v2"}, {"variant_id": "v3"}
            ]
        });
        ingestor
            .ingest_records(SupplierKind::Midocean, &[three], None)
            .await;

        let one = json!({
            "master_code": "AR1",
            "name": "One variant now",
            "variants": [{"variant_id": "v9"}]
        });
        ingestor
            .ingest_records(SupplierKind::Midocean, &[one], None)
            .await;

        let stored = db
            .find_existing("midocean", None, Some("AR1"))
            .await
            .unwrap()
            .expect("product exists");
        assert_eq!(db.variant_count(&stored.id).await.unwrap(), 1);
        assert_eq!(stored.name, "One variant now");
    }

    #[tokio::test]
    async fn one_failing_record_does_not_abort_the_batch() {
        let db = mem_db().await;
        let store = Arc::new(FailingStore {
            inner: db.clone(),
            fail_on_insert: 5,
            inserts: AtomicUsize::new(0),
        });
        let ingestor = Ingestor::new(store);

        let records: Vec<Value> = (1..=10)
            .map(|i| midocean_record(&format!("AR{i:04}")))
            .collect();
        let report = ingestor
            .ingest_records(SupplierKind::Midocean, &records, None)
            .await;

        assert_eq!(report.total, 10);
        assert_eq!(report.saved, 9);
        assert_eq!(report.errored, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, "AR0005");
        // Records after the failure were still processed.
        assert_eq!(db.product_count(Some("midocean")).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn limit_truncates_the_batch() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone());

        let records: Vec<Value> = (1..=10)
            .map(|i| midocean_record(&format!("AR{i:04}")))
            .collect();
        let report = ingestor
            .ingest_records(SupplierKind::Midocean, &records, Some(3))
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.saved, 3);
        assert_eq!(db.product_count(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn feed_failure_stays_scoped_to_its_supplier() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone())
            .with_feed(Arc::new(StubFeed {
                kind: SupplierKind::Midocean,
                records: vec![midocean_record("AR1249"), midocean_record("AR1250")],
                fail: false,
            }))
            .with_feed(Arc::new(StubFeed {
                kind: SupplierKind::XdConnects,
                records: vec![],
                fail: true,
            }));

        let report = ingestor.sync(None, None).await;
        assert_eq!(report.imported, 2);
        assert_eq!(report.suppliers.len(), 2);

        let xd = report
            .suppliers
            .iter()
            .find(|s| s.source == "xd-connects")
            .unwrap();
        assert!(xd.feed_error.as_deref().unwrap().contains("503"));
        assert!(xd.report.is_none());

        let midocean = report
            .suppliers
            .iter()
            .find(|s| s.source == "midocean")
            .unwrap();
        assert!(midocean.feed_error.is_none());
        assert_eq!(midocean.report.as_ref().unwrap().saved, 2);
    }

    #[tokio::test]
    async fn sync_can_select_a_subset_of_suppliers() {
        let db = mem_db().await;
        let ingestor = Ingestor::new(db.clone())
            .with_feed(Arc::new(StubFeed {
                kind: SupplierKind::Midocean,
                records: vec![midocean_record("AR1249")],
                fail: false,
            }))
            .with_feed(Arc::new(StubFeed {
                kind: SupplierKind::XdConnects,
                records: vec![json!({"ItemCode": "P850.123"})],
                fail: false,
            }));

        let report = ingestor
            .sync(Some(&[SupplierKind::Midocean]), None)
            .await;
        assert_eq!(report.suppliers.len(), 1);
        assert_eq!(report.suppliers[0].source, "midocean");
        assert_eq!(db.product_count(Some("xd-connects")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn initial_import_runs_only_on_an_empty_store() {
        let db = mem_db().await;
        let ingestor = Arc::new(Ingestor::new(db.clone()).with_feed(Arc::new(StubFeed {
            kind: SupplierKind::Midocean,
            records: vec![midocean_record("AR1249")],
            fail: false,
        })));

        let handle = ingestor
            .spawn_initial_import()
            .await
            .unwrap()
            .expect("empty store spawns import");
        let report = handle.await.unwrap();
        assert_eq!(report.imported, 1);

        // Populated now, so the hook declines to run again.
        assert!(ingestor.spawn_initial_import().await.unwrap().is_none());
    }
}
