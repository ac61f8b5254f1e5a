//! XD Connects record normalization. The feed is one flat record per sellable
//! item, so the canonical variant is synthesized from the item itself and the
//! image columns become master-level assets.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::feed::XdProduct;
use crate::database_ops::catalog::{CanonicalRecord, NewAsset, NewProduct, NewVariant};
use crate::normalization::coerce::{
    non_empty, parse_datetime_str, raw_json_capped, to_f64, to_i64, truncate_with_ellipsis,
};
use crate::suppliers::SupplierKind;

const MAX_NAME_CHARS: usize = 255;

// The feed encodes units in its column names; only record one when the value
// itself made it through coercion.
fn unit_for(value: Option<f64>, unit: &str) -> Option<String> {
    value.map(|_| unit.to_string())
}

fn image_asset(url: &Option<String>, subtype: &str) -> Option<NewAsset> {
    let url = url.as_deref().and_then(non_empty)?;
    Some(NewAsset {
        source_variant_id: None,
        url: Some(url),
        url_high_res: None,
        kind: "image".to_string(),
        subtype: Some(subtype.to_string()),
    })
}

pub fn normalize(raw: &Value) -> CanonicalRecord {
    let record: XdProduct = serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
        debug!(error = %e, "xd-connects record did not fit the typed shape; degrading");
        XdProduct::default()
    });

    let item_code = record.item_code.as_deref().and_then(non_empty);
    let model_code = record.model_code.as_deref().and_then(non_empty);

    // The feed carries no id separate from the item code, so identity rides
    // the product_code branch of the resolver. ModelCode is shared between
    // sibling items and must not be used as an identity key.
    let name = record
        .item_name
        .as_deref()
        .and_then(non_empty)
        .or_else(|| item_code.clone())
        .unwrap_or_else(|| format!("Product {}", Utc::now().timestamp_millis()));
    let name = truncate_with_ellipsis(&name, MAX_NAME_CHARS);

    let feed_timestamp = record
        .item_data_last_modified_date_time
        .as_deref()
        .and_then(parse_datetime_str)
        .or_else(|| {
            record
                .feed_created_date_time
                .as_deref()
                .and_then(parse_datetime_str)
        });

    let variants: Vec<NewVariant> = item_code
        .as_ref()
        .map(|code| {
            vec![NewVariant {
                variant_id: Some(code.clone()),
                sku: Some(code.clone()),
                release_date: record.intro_date.as_deref().and_then(parse_datetime_str),
                discontinued_date: None,
                product_proposition_category: None,
                category_level1: record.main_category.as_deref().and_then(non_empty),
                category_level2: record.sub_category.as_deref().and_then(non_empty),
                category_level3: None,
                color_description: record.color.as_deref().and_then(non_empty),
                color_group: None,
                color_code: record.hex_color1.as_deref().and_then(non_empty),
                pms_color: record.pms_color1.as_deref().and_then(non_empty),
                plc_status: record.product_life_cycle.as_deref().and_then(non_empty),
                plc_status_description: None,
                gtin: record.ean_code.as_deref().and_then(non_empty),
            }]
        })
        .unwrap_or_default();

    let assets: Vec<NewAsset> = [
        image_asset(&record.main_image, "main_image"),
        image_asset(&record.main_image_neutral, "main_image_neutral"),
        image_asset(&record.extra_image1, "extra_image1"),
        image_asset(&record.extra_image2, "extra_image2"),
        image_asset(&record.extra_image3, "extra_image3"),
        image_asset(&record.image_print, "image_print"),
    ]
    .into_iter()
    .flatten()
    .collect();

    let image_url = record
        .main_image
        .as_deref()
        .and_then(non_empty)
        .or_else(|| record.main_image_neutral.as_deref().and_then(non_empty));

    let product = NewProduct {
        source: SupplierKind::XdConnects.tag().to_string(),
        name,
        description: record.long_description.as_deref().and_then(non_empty),
        brand: record.brand.as_deref().and_then(non_empty),
        price: None,
        product_code: item_code,
        external_id: None,
        category: record.main_category.as_deref().and_then(non_empty),
        sub_category: record.sub_category.as_deref().and_then(non_empty),
        material: record.material.as_deref().and_then(non_empty),
        color: record.color.as_deref().and_then(non_empty),
        master_code: model_code,
        master_id: None,
        type_of_products: None,
        commodity_code: record.commodity_code.as_deref().and_then(non_empty),
        number_of_print_positions: None,
        product_name: record.item_name.as_deref().and_then(non_empty),
        category_code: None,
        product_class: None,
        length: to_f64(record.item_length_cm.as_ref()),
        length_unit: unit_for(to_f64(record.item_length_cm.as_ref()), "cm"),
        width: to_f64(record.item_width_cm.as_ref()),
        width_unit: unit_for(to_f64(record.item_width_cm.as_ref()), "cm"),
        height: to_f64(record.item_height_cm.as_ref()),
        height_unit: unit_for(to_f64(record.item_height_cm.as_ref()), "cm"),
        dimensions: record.item_dimensions.as_deref().and_then(non_empty),
        volume: None,
        volume_unit: None,
        gross_weight: to_f64(record.item_weight_gross_gr.as_ref()),
        gross_weight_unit: unit_for(to_f64(record.item_weight_gross_gr.as_ref()), "gr"),
        net_weight: to_f64(record.item_weight_net_gr.as_ref()),
        net_weight_unit: unit_for(to_f64(record.item_weight_net_gr.as_ref()), "gr"),
        weight: to_f64(record.item_weight_net_gr.as_ref()),
        inner_carton_quantity: to_i64(record.innerbox_qty.as_ref()),
        outer_carton_quantity: to_i64(record.outer_carton_qty.as_ref()),
        carton_length: to_f64(record.outer_carton_length_cm.as_ref()),
        carton_length_unit: unit_for(to_f64(record.outer_carton_length_cm.as_ref()), "cm"),
        carton_width: to_f64(record.outer_carton_width_cm.as_ref()),
        carton_width_unit: unit_for(to_f64(record.outer_carton_width_cm.as_ref()), "cm"),
        carton_height: to_f64(record.outer_carton_height_cm.as_ref()),
        carton_height_unit: unit_for(to_f64(record.outer_carton_height_cm.as_ref()), "cm"),
        carton_volume: None,
        carton_volume_unit: None,
        carton_gross_weight: to_f64(record.outer_carton_weight_gross_kg.as_ref()),
        carton_gross_weight_unit: unit_for(to_f64(record.outer_carton_weight_gross_kg.as_ref()), "kg"),
        short_description: None,
        long_description: record.long_description.as_deref().and_then(non_empty),
        packaging_after_printing: None,
        printable: None,
        country_of_origin: record.country_of_origin.as_deref().and_then(non_empty),
        ean_code: record.ean_code.as_deref().and_then(non_empty),
        image_url,
        feed_timestamp,
        raw_data: raw_json_capped(raw),
    };

    CanonicalRecord {
        product,
        variants,
        assets,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use serde_json::json;

    fn sample_record() -> serde_json::Value {
        json!({
            "FeedCreatedDateTime": "2024-05-02T04:00:00",
            "ItemDataLastModifiedDateTime": "2024-04-29T16:12:00",
            "ModelCode": "P850",
            "ItemCode": "P850.123",
            "ProductLifeCycle": "Active",
            "IntroDate": "2023-01-15",
            "ItemName": "Insulated bottle 500ml",
            "LongDescription": "Double-wall vacuum insulated bottle.",
            "Brand": "XD Collection",
            "MainCategory": "Drinkware",
            "SubCategory": "Bottles",
            "Material": "Stainless steel",
            "Color": "Navy",
            "PMSColor1": "2767C",
            "HexColor1": "#1F2A44",
            "ItemLengthCM": "7.2",
            "ItemWidthCM": 7.2,
            "ItemHeightCM": "22.8",
            "ItemDimensions": "7.2 x 22.8 cm",
            "ItemWeightNetGr": "312",
            "ItemWeightGrossGr": 348.4,
            "CountryOfOrigin": "CN",
            "CommodityCode": "9617 0000",
            "EANCode": "8714612097885",
            "InnerboxQty": 10.0,
            "OuterCartonQty": "40",
            "OuterCartonLengthCM": 38.0,
            "OuterCartonWeightGrossKG": "14.8",
            "Eco": true,
            "PVC free": 1,
            "PriceTier1Qty": 50,
            "PriceTier1Price": "8.95",
            "PriceTier2Qty": "250",
            "PriceTier2Price": 8.15,
            "MainImage": "https://cdn.example/p850-123.jpg",
            "MainImageNeutral": "https://cdn.example/p850-123-neutral.jpg",
            "ExtraImage1": "https://cdn.example/p850-123-detail.jpg",
            "USP": "Keeps drinks cold for 24h"
        })
    }

    #[test]
    fn maps_flat_pascal_case_fields() {
        let record = normalize(&sample_record());
        let p = &record.product;
        assert_eq!(p.source, "xd-connects");
        assert_eq!(p.name, "Insulated bottle 500ml");
        assert_eq!(p.product_code.as_deref(), Some("P850.123"));
        assert_eq!(p.external_id, None);
        assert_eq!(p.master_code.as_deref(), Some("P850"));
        assert_eq!(p.category.as_deref(), Some("Drinkware"));
        assert_eq!(p.length, Some(7.2));
        assert_eq!(p.length_unit.as_deref(), Some("cm"));
        assert_eq!(p.net_weight, Some(312.0));
        assert_eq!(p.net_weight_unit.as_deref(), Some("gr"));
        assert_eq!(p.inner_carton_quantity, Some(10));
        assert_eq!(p.outer_carton_quantity, Some(40));
        assert_eq!(p.carton_gross_weight, Some(14.8));
        assert_eq!(p.carton_gross_weight_unit.as_deref(), Some("kg"));
        assert_eq!(p.ean_code.as_deref(), Some("8714612097885"));
        assert!(p.feed_timestamp.is_some());
        assert!(p.raw_data.is_some());
    }

    #[test]
    fn synthesizes_the_item_as_a_variant() {
        let record = normalize(&sample_record());
        assert_eq!(record.variants.len(), 1);
        let v = &record.variants[0];
        assert_eq!(v.variant_id.as_deref(), Some("P850.123"));
        assert_eq!(v.sku.as_deref(), Some("P850.123"));
        assert_eq!(v.category_level1.as_deref(), Some("Drinkware"));
        assert_eq!(v.color_description.as_deref(), Some("Navy"));
        assert_eq!(v.plc_status.as_deref(), Some("Active"));
        assert_eq!(v.gtin.as_deref(), Some("8714612097885"));
        assert!(v.release_date.is_some());
    }

    #[test]
    fn image_columns_become_master_assets() {
        let record = normalize(&sample_record());
        assert_eq!(record.assets.len(), 3);
        assert!(record.assets.iter().all(|a| a.kind == "image"));
        assert!(record.assets.iter().all(|a| a.source_variant_id.is_none()));
        let subtypes: Vec<_> = record
            .assets
            .iter()
            .filter_map(|a| a.subtype.as_deref())
            .collect();
        assert_eq!(subtypes, ["main_image", "main_image_neutral", "extra_image1"]);
    }

    #[test]
    fn price_tiers_parse_from_field_pairs() {
        use crate::suppliers::xdconnects::feed::XdProduct;
        let record: XdProduct = serde_json::from_value(sample_record()).unwrap();
        let tiers = record.price_tiers();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].quantity, 50);
        assert_eq!(tiers[0].price, 8.95);
        assert_eq!(tiers[1].quantity, 250);
        assert_eq!(tiers[1].price, 8.15);
    }

    #[test]
    fn name_falls_back_to_item_code_then_placeholder() {
        let by_code = normalize(&json!({"ItemCode": "P850.123"}));
        assert_eq!(by_code.product.name, "P850.123");

        let placeholder = normalize(&json!({"Brand": "XD Collection"}));
        assert!(!placeholder.product.name.trim().is_empty());
        assert!(placeholder.variants.is_empty());
    }

    #[test]
    fn records_without_item_code_yield_no_variant() {
        let record = normalize(&json!({"ItemName": "Unkeyed item"}));
        assert!(record.variants.is_empty());
        assert_eq!(record.product.product_code, None);
        assert_eq!(record.product.name, "Unkeyed item");
    }
}
