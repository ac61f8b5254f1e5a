//! Midocean record normalization: one raw feed record in, one canonical
//! Product + Variants + DigitalAssets triple out. Never fails; a record that
//! does not fit the typed shape degrades to placeholder fields.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::feed::{MidoceanAsset, MidoceanProduct};
use crate::database_ops::catalog::{CanonicalRecord, NewAsset, NewProduct, NewVariant};
use crate::normalization::coerce::{
    non_empty, raw_json_capped, to_datetime, to_f64, to_i64, to_text, truncate_with_ellipsis,
};
use crate::suppliers::SupplierKind;

const MAX_NAME_CHARS: usize = 255;

/// First present, non-empty value from a priority-ordered field chain.
fn first_str(chain: &[&Option<String>]) -> Option<String> {
    chain
        .iter()
        .filter_map(|field| field.as_deref())
        .find_map(non_empty)
}

fn asset_from(
    asset: &MidoceanAsset,
    source_variant_id: Option<String>,
    default_kind: &str,
) -> NewAsset {
    NewAsset {
        source_variant_id,
        url: asset.url.as_deref().and_then(non_empty),
        url_high_res: asset.url_highress.as_deref().and_then(non_empty),
        kind: asset
            .asset_type
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| default_kind.to_string()),
        subtype: asset.subtype.as_deref().and_then(non_empty),
    }
}

pub fn normalize(raw: &Value) -> CanonicalRecord {
    let record: MidoceanProduct = serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
        debug!(error = %e, "midocean record did not fit the typed shape; degrading");
        MidoceanProduct::default()
    });

    let master_code = record.master_code.as_deref().and_then(non_empty);
    let master_id = record.master_id.as_deref().and_then(non_empty);
    let product_code = master_code
        .clone()
        .or_else(|| first_str(&[&record.product_code, &record.code, &record.sku]));
    let external_id = master_id.clone().or_else(|| {
        [&record.id, &record.product_id, &record.external_id]
            .into_iter()
            .find_map(|v| to_text(v.as_ref()))
    });

    // Name policy: description/title chain, then code, then a supplier-tagged
    // id placeholder, then a synthesized unique one. Name is never empty.
    let name = first_str(&[
        &record.product_name,
        &record.name,
        &record.title,
        &record.short_description,
        &record.display_name,
    ])
    .or_else(|| product_code.clone())
    .or_else(|| external_id.as_ref().map(|ext| format!("Midocean Product {ext}")))
    .unwrap_or_else(|| format!("Product {}", Utc::now().timestamp_millis()));
    let name = truncate_with_ellipsis(&name, MAX_NAME_CHARS);

    let mut variants: Vec<NewVariant> = Vec::new();
    let mut assets: Vec<NewAsset> = Vec::new();
    for variant in &record.variants {
        let source_variant_id = to_text(variant.variant_id.as_ref());
        for asset in &variant.digital_assets {
            assets.push(asset_from(asset, source_variant_id.clone(), "image"));
        }
        variants.push(NewVariant {
            variant_id: source_variant_id,
            sku: variant.sku.as_deref().and_then(non_empty),
            release_date: to_datetime(variant.release_date.as_ref()),
            discontinued_date: to_datetime(variant.discontinued_date.as_ref()),
            product_proposition_category: to_text(variant.product_proposition_category.as_ref()),
            category_level1: variant.category_level1.as_deref().and_then(non_empty),
            category_level2: variant.category_level2.as_deref().and_then(non_empty),
            category_level3: variant.category_level3.as_deref().and_then(non_empty),
            color_description: variant.color_description.as_deref().and_then(non_empty),
            color_group: variant.color_group.as_deref().and_then(non_empty),
            color_code: to_text(variant.color_code.as_ref()),
            pms_color: variant.pms_color.as_deref().and_then(non_empty),
            plc_status: to_text(variant.plc_status.as_ref()),
            plc_status_description: variant
                .plc_status_description
                .as_deref()
                .and_then(non_empty),
            gtin: to_text(variant.gtin.as_ref()),
        });
    }
    // Master-level assets are certification/compliance documents.
    for asset in &record.digital_assets {
        assets.push(asset_from(asset, None, "document"));
    }

    // Main product image: front picture of the first variant, else whatever
    // flat image field the record carries.
    let image_url = record
        .variants
        .first()
        .and_then(|v| {
            v.digital_assets.iter().find_map(|a| {
                let front = matches!(
                    a.subtype.as_deref(),
                    Some("item_picture_front") | Some("itemPictureFront")
                );
                if front {
                    a.url.as_deref().and_then(non_empty)
                } else {
                    None
                }
            })
        })
        .or_else(|| first_str(&[&record.image_url, &record.image]));

    let product = NewProduct {
        source: SupplierKind::Midocean.tag().to_string(),
        name,
        description: first_str(&[&record.long_description, &record.description]),
        brand: record.brand.as_deref().and_then(non_empty),
        price: None,
        product_code,
        external_id,
        category: None,
        sub_category: None,
        material: record.material.as_deref().and_then(non_empty),
        color: None,
        master_code,
        master_id,
        type_of_products: record.type_of_products.as_deref().and_then(non_empty),
        commodity_code: record.commodity_code.as_deref().and_then(non_empty),
        number_of_print_positions: to_text(record.number_of_print_positions.as_ref()),
        product_name: record.product_name.as_deref().and_then(non_empty),
        category_code: record.category_code.as_deref().and_then(non_empty),
        product_class: record.product_class.as_deref().and_then(non_empty),
        length: to_f64(record.length.as_ref()),
        length_unit: record.length_unit.as_deref().and_then(non_empty),
        width: to_f64(record.width.as_ref()),
        width_unit: record.width_unit.as_deref().and_then(non_empty),
        height: to_f64(record.height.as_ref()),
        height_unit: record.height_unit.as_deref().and_then(non_empty),
        dimensions: record.dimensions.as_deref().and_then(non_empty),
        volume: to_f64(record.volume.as_ref()),
        volume_unit: record.volume_unit.as_deref().and_then(non_empty),
        gross_weight: to_f64(record.gross_weight.as_ref()),
        gross_weight_unit: record.gross_weight_unit.as_deref().and_then(non_empty),
        net_weight: to_f64(record.net_weight.as_ref()),
        net_weight_unit: record.net_weight_unit.as_deref().and_then(non_empty),
        // Kept alongside net_weight for callers that only know "weight".
        weight: to_f64(record.net_weight.as_ref()),
        inner_carton_quantity: to_i64(record.inner_carton_quantity.as_ref()),
        outer_carton_quantity: to_i64(record.outer_carton_quantity.as_ref()),
        carton_length: to_f64(record.carton_length.as_ref()),
        carton_length_unit: record.carton_length_unit.as_deref().and_then(non_empty),
        carton_width: to_f64(record.carton_width.as_ref()),
        carton_width_unit: record.carton_width_unit.as_deref().and_then(non_empty),
        carton_height: to_f64(record.carton_height.as_ref()),
        carton_height_unit: record.carton_height_unit.as_deref().and_then(non_empty),
        carton_volume: to_f64(record.carton_volume.as_ref()),
        carton_volume_unit: record.carton_volume_unit.as_deref().and_then(non_empty),
        carton_gross_weight: to_f64(record.carton_gross_weight.as_ref()),
        carton_gross_weight_unit: record
            .carton_gross_weight_unit
            .as_deref()
            .and_then(non_empty),
        short_description: record.short_description.as_deref().and_then(non_empty),
        long_description: record.long_description.as_deref().and_then(non_empty),
        packaging_after_printing: record
            .packaging_after_printing
            .as_deref()
            .and_then(non_empty),
        printable: to_text(record.printable.as_ref()),
        country_of_origin: record.country_of_origin.as_deref().and_then(non_empty),
        ean_code: None,
        image_url,
        feed_timestamp: to_datetime(record.timestamp.as_ref()),
        raw_data: raw_json_capped(raw),
    };

    CanonicalRecord {
        product,
        variants,
        assets,
    }
}
