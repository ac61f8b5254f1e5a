//! Canonical catalog rows and the store operations the ingestion engine needs:
//! identity resolution across the two supplier-provided keys, product
//! insert/update, and full-replace synchronization of child collections.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::database_ops::db::Db;

/// Canonical product as produced by a supplier normalizer. `name` is always
/// non-empty by the time one of these exists.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub source: String,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub product_code: Option<String>,
    pub external_id: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub master_code: Option<String>,
    pub master_id: Option<String>,
    pub type_of_products: Option<String>,
    pub commodity_code: Option<String>,
    pub number_of_print_positions: Option<String>,
    pub product_name: Option<String>,
    pub category_code: Option<String>,
    pub product_class: Option<String>,
    pub length: Option<f64>,
    pub length_unit: Option<String>,
    pub width: Option<f64>,
    pub width_unit: Option<String>,
    pub height: Option<f64>,
    pub height_unit: Option<String>,
    pub dimensions: Option<String>,
    pub volume: Option<f64>,
    pub volume_unit: Option<String>,
    pub gross_weight: Option<f64>,
    pub gross_weight_unit: Option<String>,
    pub net_weight: Option<f64>,
    pub net_weight_unit: Option<String>,
    pub weight: Option<f64>,
    pub inner_carton_quantity: Option<i64>,
    pub outer_carton_quantity: Option<i64>,
    pub carton_length: Option<f64>,
    pub carton_length_unit: Option<String>,
    pub carton_width: Option<f64>,
    pub carton_width_unit: Option<String>,
    pub carton_height: Option<f64>,
    pub carton_height_unit: Option<String>,
    pub carton_volume: Option<f64>,
    pub carton_volume_unit: Option<String>,
    pub carton_gross_weight: Option<f64>,
    pub carton_gross_weight_unit: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub packaging_after_printing: Option<String>,
    pub printable: Option<String>,
    pub country_of_origin: Option<String>,
    pub ean_code: Option<String>,
    pub image_url: Option<String>,
    pub feed_timestamp: Option<DateTime<Utc>>,
    pub raw_data: Option<String>,
}

/// Variant as extracted from a feed record. `variant_id` is the
/// supplier-assigned identifier; rows without one are not persisted.
#[derive(Debug, Clone, Default)]
pub struct NewVariant {
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub discontinued_date: Option<DateTime<Utc>>,
    pub product_proposition_category: Option<String>,
    pub category_level1: Option<String>,
    pub category_level2: Option<String>,
    pub category_level3: Option<String>,
    pub color_description: Option<String>,
    pub color_group: Option<String>,
    pub color_code: Option<String>,
    pub pms_color: Option<String>,
    pub plc_status: Option<String>,
    pub plc_status_description: Option<String>,
    pub gtin: Option<String>,
}

/// Digital asset tagged with the *source-supplied* variant identifier; the
/// synchronizer maps it to a stored variant id (or product level for masters
/// and orphans) at insert time.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub source_variant_id: Option<String>,
    pub url: Option<String>,
    pub url_high_res: Option<String>,
    pub kind: String,
    pub subtype: Option<String>,
}

/// One normalized feed record: the product plus its full child sets.
#[derive(Debug, Clone, Default)]
pub struct CanonicalRecord {
    pub product: NewProduct,
    pub variants: Vec<NewVariant>,
    pub assets: Vec<NewAsset>,
}

/// Minimal stored-product view used by identity resolution.
#[derive(Debug, Clone, FromRow)]
pub struct StoredProduct {
    pub id: String,
    pub source: String,
    pub name: String,
    pub product_code: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ChildSyncOutcome {
    pub variants_saved: usize,
    pub assets_saved: usize,
    pub errors: Vec<String>,
}

/// Store operations the orchestrator depends on. Implemented by [`Db`];
/// injected explicitly so callers control construction and tests can wrap the
/// real store with failure-injecting doubles.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Identity resolution: exact `(source, external_id)` first, then
    /// `(source, product_code)`. Always scoped to one source tag.
    async fn find_existing(
        &self,
        source: &str,
        external_id: Option<&str>,
        product_code: Option<&str>,
    ) -> Result<Option<StoredProduct>>;

    async fn insert_product(&self, product: &NewProduct) -> Result<StoredProduct>;

    async fn update_product(&self, id: &str, product: &NewProduct) -> Result<()>;

    /// Full-replace synchronization of a product's variants and assets.
    /// Runs as one transaction; individual row failures inside it are
    /// tolerated and reported, never escalated.
    async fn replace_children(
        &self,
        product_id: &str,
        variants: &[NewVariant],
        assets: &[NewAsset],
    ) -> Result<ChildSyncOutcome>;

    async fn product_count(&self, source: Option<&str>) -> Result<i64>;
}

const SELECT_STORED: &str = "SELECT id, source, name, product_code, external_id FROM products";

#[async_trait]
impl CatalogStore for Db {
    async fn find_existing(
        &self,
        source: &str,
        external_id: Option<&str>,
        product_code: Option<&str>,
    ) -> Result<Option<StoredProduct>> {
        if let Some(ext) = external_id {
            let found: Option<StoredProduct> = sqlx::query_as(&format!(
                "{SELECT_STORED} WHERE source = ?1 AND external_id = ?2 LIMIT 1"
            ))
            .bind(source)
            .bind(ext)
            .fetch_optional(&self.pool)
            .await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        if let Some(code) = product_code {
            let found: Option<StoredProduct> = sqlx::query_as(&format!(
                "{SELECT_STORED} WHERE source = ?1 AND product_code = ?2 LIMIT 1"
            ))
            .bind(source)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    #[instrument(skip(self, product), fields(source = %product.source))]
    async fn insert_product(&self, product: &NewProduct) -> Result<StoredProduct> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        bind_product_values(
            sqlx::query(
                "INSERT INTO products (
                    id, source, name, description, brand, price, product_code, external_id,
                    category, sub_category, material, color,
                    master_code, master_id, type_of_products, commodity_code,
                    number_of_print_positions, product_name, category_code, product_class,
                    length, length_unit, width, width_unit, height, height_unit, dimensions,
                    volume, volume_unit,
                    gross_weight, gross_weight_unit, net_weight, net_weight_unit, weight,
                    inner_carton_quantity, outer_carton_quantity,
                    carton_length, carton_length_unit, carton_width, carton_width_unit,
                    carton_height, carton_height_unit, carton_volume, carton_volume_unit,
                    carton_gross_weight, carton_gross_weight_unit,
                    short_description, long_description, packaging_after_printing, printable,
                    country_of_origin, ean_code, image_url, feed_timestamp, raw_data,
                    created_at, updated_at
                 ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                    ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39, ?40, ?41, ?42, ?43, ?44,
                    ?45, ?46, ?47, ?48, ?49, ?50, ?51, ?52, ?53, ?54, ?55, ?56, ?57
                 )",
            )
            .bind(&id)
            .bind(&product.source)
            .bind(&product.name),
            product,
        )
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(StoredProduct {
            id,
            source: product.source.clone(),
            name: product.name.clone(),
            product_code: product.product_code.clone(),
            external_id: product.external_id.clone(),
        })
    }

    #[instrument(skip(self, product), fields(source = %product.source))]
    async fn update_product(&self, id: &str, product: &NewProduct) -> Result<()> {
        let now = Utc::now();
        bind_product_values(
            sqlx::query(
                "UPDATE products SET
                    name = ?3, description = ?4, brand = ?5, price = ?6,
                    product_code = ?7, external_id = ?8,
                    category = ?9, sub_category = ?10, material = ?11, color = ?12,
                    master_code = ?13, master_id = ?14, type_of_products = ?15,
                    commodity_code = ?16, number_of_print_positions = ?17,
                    product_name = ?18, category_code = ?19, product_class = ?20,
                    length = ?21, length_unit = ?22, width = ?23, width_unit = ?24,
                    height = ?25, height_unit = ?26, dimensions = ?27,
                    volume = ?28, volume_unit = ?29,
                    gross_weight = ?30, gross_weight_unit = ?31,
                    net_weight = ?32, net_weight_unit = ?33, weight = ?34,
                    inner_carton_quantity = ?35, outer_carton_quantity = ?36,
                    carton_length = ?37, carton_length_unit = ?38,
                    carton_width = ?39, carton_width_unit = ?40,
                    carton_height = ?41, carton_height_unit = ?42,
                    carton_volume = ?43, carton_volume_unit = ?44,
                    carton_gross_weight = ?45, carton_gross_weight_unit = ?46,
                    short_description = ?47, long_description = ?48,
                    packaging_after_printing = ?49, printable = ?50,
                    country_of_origin = ?51, ean_code = ?52, image_url = ?53,
                    feed_timestamp = ?54, raw_data = ?55,
                    updated_at = ?56
                 WHERE id = ?1",
            )
            .bind(id)
            .bind(&product.source)
            .bind(&product.name),
            product,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, variants, assets))]
    async fn replace_children(
        &self,
        product_id: &str,
        variants: &[NewVariant],
        assets: &[NewAsset],
    ) -> Result<ChildSyncOutcome> {
        let mut outcome = ChildSyncOutcome::default();
        let mut tx = self.pool.begin().await?;

        // Full replace: drop the previous sets first. A previously-empty
        // collection is a legitimate state, so delete failures are tolerated.
        if let Err(e) = sqlx::query("DELETE FROM digital_assets WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *tx)
            .await
        {
            warn!(product_id, error = %e, "failed to clear digital assets");
            outcome.errors.push(format!("delete assets: {e}"));
        }
        if let Err(e) = sqlx::query("DELETE FROM product_variants WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *tx)
            .await
        {
            warn!(product_id, error = %e, "failed to clear variants");
            outcome.errors.push(format!("delete variants: {e}"));
        }

        // Supplier variant id -> freshly assigned row id.
        let mut variant_ids: HashMap<String, String> = HashMap::new();
        let now = Utc::now();
        for variant in variants {
            let Some(source_variant_id) = variant.variant_id.as_deref() else {
                warn!(product_id, sku = ?variant.sku, "skipping variant without supplier variant id");
                continue;
            };
            let row_id = Uuid::new_v4().to_string();
            let inserted = sqlx::query(
                "INSERT INTO product_variants (
                    id, product_id, variant_id, sku, release_date, discontinued_date,
                    product_proposition_category, category_level1, category_level2,
                    category_level3, color_description, color_group, color_code, pms_color,
                    plc_status, plc_status_description, gtin, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            )
            .bind(&row_id)
            .bind(product_id)
            .bind(source_variant_id)
            .bind(&variant.sku)
            .bind(variant.release_date)
            .bind(variant.discontinued_date)
            .bind(&variant.product_proposition_category)
            .bind(&variant.category_level1)
            .bind(&variant.category_level2)
            .bind(&variant.category_level3)
            .bind(&variant.color_description)
            .bind(&variant.color_group)
            .bind(&variant.color_code)
            .bind(&variant.pms_color)
            .bind(&variant.plc_status)
            .bind(&variant.plc_status_description)
            .bind(&variant.gtin)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await;
            match inserted {
                Ok(_) => {
                    variant_ids.insert(source_variant_id.to_string(), row_id);
                    outcome.variants_saved += 1;
                }
                Err(e) => {
                    warn!(product_id, variant_id = source_variant_id, error = %e, "variant insert failed");
                    outcome
                        .errors
                        .push(format!("variant {source_variant_id}: {e}"));
                }
            }
        }

        for asset in assets {
            let Some(url) = asset.url.as_deref().filter(|u| !u.trim().is_empty()) else {
                debug!(product_id, subtype = ?asset.subtype, "skipping asset without url");
                continue;
            };
            // Orphans (assets naming a variant we did not store) stay attached
            // at the product level rather than being dropped.
            let db_variant_id = asset
                .source_variant_id
                .as_deref()
                .and_then(|sv| variant_ids.get(sv))
                .cloned();
            let inserted = sqlx::query(
                "INSERT INTO digital_assets (
                    id, product_id, variant_id, url, url_high_res, type, subtype, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(product_id)
            .bind(&db_variant_id)
            .bind(url)
            .bind(&asset.url_high_res)
            .bind(&asset.kind)
            .bind(&asset.subtype)
            .bind(now)
            .execute(&mut *tx)
            .await;
            match inserted {
                Ok(_) => outcome.assets_saved += 1,
                Err(e) => {
                    warn!(product_id, url, error = %e, "asset insert failed");
                    outcome.errors.push(format!("asset {url}: {e}"));
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn product_count(&self, source: Option<&str>) -> Result<i64> {
        let n: i64 = match source {
            Some(src) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE source = ?1")
                    .bind(src)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(n)
    }
}

/// Binds the shared tail of the product column list (?4..?55) onto a query
/// whose leading id/source/name binds the caller already pushed.
fn bind_product_values<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    p: &'q NewProduct,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&p.description)
        .bind(&p.brand)
        .bind(p.price)
        .bind(&p.product_code)
        .bind(&p.external_id)
        .bind(&p.category)
        .bind(&p.sub_category)
        .bind(&p.material)
        .bind(&p.color)
        .bind(&p.master_code)
        .bind(&p.master_id)
        .bind(&p.type_of_products)
        .bind(&p.commodity_code)
        .bind(&p.number_of_print_positions)
        .bind(&p.product_name)
        .bind(&p.category_code)
        .bind(&p.product_class)
        .bind(p.length)
        .bind(&p.length_unit)
        .bind(p.width)
        .bind(&p.width_unit)
        .bind(p.height)
        .bind(&p.height_unit)
        .bind(&p.dimensions)
        .bind(p.volume)
        .bind(&p.volume_unit)
        .bind(p.gross_weight)
        .bind(&p.gross_weight_unit)
        .bind(p.net_weight)
        .bind(&p.net_weight_unit)
        .bind(p.weight)
        .bind(p.inner_carton_quantity)
        .bind(p.outer_carton_quantity)
        .bind(p.carton_length)
        .bind(&p.carton_length_unit)
        .bind(p.carton_width)
        .bind(&p.carton_width_unit)
        .bind(p.carton_height)
        .bind(&p.carton_height_unit)
        .bind(p.carton_volume)
        .bind(&p.carton_volume_unit)
        .bind(p.carton_gross_weight)
        .bind(&p.carton_gross_weight_unit)
        .bind(&p.short_description)
        .bind(&p.long_description)
        .bind(&p.packaging_after_printing)
        .bind(&p.printable)
        .bind(&p.country_of_origin)
        .bind(&p.ean_code)
        .bind(&p.image_url)
        .bind(p.feed_timestamp)
        .bind(&p.raw_data)
}

/// Row shape for persisted provider quotes (see the quotes module for the
/// simulation that produces them).
#[derive(Debug, Clone, FromRow)]
pub struct QuoteRow {
    pub provider_name: String,
    pub price: f64,
    pub delivery_days: i64,
    pub reliability_score: f64,
    pub response_time_ms: i64,
}

impl Db {
    pub async fn insert_product_request(
        &self,
        product_id: &str,
        product_name: &str,
        quantity: f64,
        personalization_remarks: Option<&str>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO product_requests (
                id, product_id, product_name, quantity, personalization_remarks,
                status, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7)",
        )
        .bind(&id)
        .bind(product_id)
        .bind(product_name)
        .bind(quantity)
        .bind(personalization_remarks)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_provider_quotes(&self, request_id: &str, rows: &[QuoteRow]) -> Result<()> {
        let now = Utc::now();
        for row in rows {
            sqlx::query(
                "INSERT INTO provider_quotes (
                    id, request_id, provider_name, price, delivery_days,
                    reliability_score, response_time_ms, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(request_id)
            .bind(&row.provider_name)
            .bind(row.price)
            .bind(row.delivery_days)
            .bind(row.reliability_score)
            .bind(row.response_time_ms)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn quotes_for_request(&self, request_id: &str) -> Result<Vec<QuoteRow>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(
            "SELECT provider_name, price, delivery_days, reliability_score, response_time_ms
             FROM provider_quotes WHERE request_id = ?1 ORDER BY created_at",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Name and base price for a stored product, or None if it doesn't exist.
    pub async fn product_name_and_price(&self, id: &str) -> Result<Option<(String, Option<f64>)>> {
        let row: Option<(String, Option<f64>)> =
            sqlx::query_as("SELECT name, price FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn variant_count(&self, product_id: &str) -> Result<i64> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_variants WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(n)
    }

    /// Assets for a product as `(url, stored_variant_id)` pairs.
    pub async fn assets_for_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<(String, Option<String>)>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT url, variant_id FROM digital_assets WHERE product_id = ?1 ORDER BY url",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Row counts for the operational `counts` command.
    pub async fn table_counts(&self) -> Result<(i64, i64, i64)> {
        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let variants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_variants")
            .fetch_one(&self.pool)
            .await?;
        let assets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM digital_assets")
            .fetch_one(&self.pool)
            .await?;
        Ok((products, variants, assets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mem_db() -> Db {
        Db::connect("sqlite::memory:", 1).await.expect("connect")
    }

    fn product(source: &str, name: &str) -> NewProduct {
        NewProduct {
            source: source.to_string(),
            name: name.to_string(),
            ..NewProduct::default()
        }
    }

    fn variant(id: &str) -> NewVariant {
        NewVariant {
            variant_id: Some(id.to_string()),
            sku: Some(format!("{id}-sku")),
            ..NewVariant::default()
        }
    }

    fn image(url: &str, source_variant_id: Option<&str>) -> NewAsset {
        NewAsset {
            source_variant_id: source_variant_id.map(str::to_string),
            url: Some(url.to_string()),
            kind: "image".to_string(),
            ..NewAsset::default()
        }
    }

    #[tokio::test]
    async fn identity_prefers_external_id_then_product_code() {
        let db = mem_db().await;
        let mut by_ext = product("midocean", "With external id");
        by_ext.external_id = Some("40000011".into());
        by_ext.product_code = Some("AR1249".into());
        let stored = db.insert_product(&by_ext).await.unwrap();

        let hit = db
            .find_existing("midocean", Some("40000011"), Some("other-code"))
            .await
            .unwrap()
            .expect("external id match");
        assert_eq!(hit.id, stored.id);

        let hit = db
            .find_existing("midocean", Some("no-such-id"), Some("AR1249"))
            .await
            .unwrap()
            .expect("falls back to product code");
        assert_eq!(hit.id, stored.id);

        assert!(db
            .find_existing("midocean", Some("no-such-id"), Some("no-such-code"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn identity_never_crosses_sources() {
        let db = mem_db().await;
        let mut a = product("midocean", "Shared code, supplier A");
        a.product_code = Some("SHARED-1".into());
        db.insert_product(&a).await.unwrap();

        assert!(db
            .find_existing("xd-connects", None, Some("SHARED-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn child_replacement_discards_previous_set() {
        let db = mem_db().await;
        let stored = db.insert_product(&product("midocean", "P")).await.unwrap();

        let first = db
            .replace_children(
                &stored.id,
                &[variant("v1"), variant("v2"), variant("v3")],
                &[],
            )
            .await
            .unwrap();
        assert_eq!(first.variants_saved, 3);
        assert_eq!(db.variant_count(&stored.id).await.unwrap(), 3);

        let second = db
            .replace_children(&stored.id, &[variant("v9")], &[])
            .await
            .unwrap();
        assert_eq!(second.variants_saved, 1);
        assert_eq!(db.variant_count(&stored.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn variants_without_supplier_id_are_skipped() {
        let db = mem_db().await;
        let stored = db.insert_product(&product("midocean", "P")).await.unwrap();

        let no_id = NewVariant {
            sku: Some("sku-only".into()),
            ..NewVariant::default()
        };
        let outcome = db
            .replace_children(&stored.id, &[no_id, variant("v1")], &[])
            .await
            .unwrap();
        assert_eq!(outcome.variants_saved, 1);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn orphan_assets_stay_at_product_level() {
        let db = mem_db().await;
        let stored = db.insert_product(&product("midocean", "P")).await.unwrap();

        let outcome = db
            .replace_children(
                &stored.id,
                &[variant("v1")],
                &[
                    image("https://cdn.example/front.png", Some("v1")),
                    image("https://cdn.example/orphan.png", Some("vanished")),
                    image("https://cdn.example/master.pdf", None),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.assets_saved, 3);

        let assets = db.assets_for_product(&stored.id).await.unwrap();
        let by_url: std::collections::HashMap<_, _> = assets.into_iter().collect();
        assert!(by_url["https://cdn.example/front.png"].is_some());
        assert!(by_url["https://cdn.example/orphan.png"].is_none());
        assert!(by_url["https://cdn.example/master.pdf"].is_none());
    }

    #[tokio::test]
    async fn assets_without_url_are_dropped_silently() {
        let db = mem_db().await;
        let stored = db.insert_product(&product("midocean", "P")).await.unwrap();

        let url_less = NewAsset {
            kind: "image".into(),
            subtype: Some("item_picture_front".into()),
            ..NewAsset::default()
        };
        let outcome = db
            .replace_children(&stored.id, &[], &[url_less])
            .await
            .unwrap();
        assert_eq!(outcome.assets_saved, 0);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn request_and_quote_rows_round_trip() {
        let db = mem_db().await;
        let stored = db.insert_product(&product("midocean", "P")).await.unwrap();
        let request_id = db
            .insert_product_request(&stored.id, "P", 25.0, Some("engrave logo"))
            .await
            .unwrap();
        db.insert_provider_quotes(
            &request_id,
            &[QuoteRow {
                provider_name: "provider-a".into(),
                price: 237.5,
                delivery_days: 5,
                reliability_score: 91.25,
                response_time_ms: 734,
            }],
        )
        .await
        .unwrap();

        let rows = db.quotes_for_request(&request_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].provider_name, "provider-a");
        assert_eq!(rows[0].delivery_days, 5);
    }
}
