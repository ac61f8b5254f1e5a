//! Typed view of one XD Connects feed record. The feed is flat PascalCase;
//! numeric fields arrive as numbers or strings and flags as booleans or 0/1,
//! so those stay raw [`Value`]s for the coercion pass. Price tiers come as
//! separate quantity/price field pairs.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XdProduct {
    pub feed_created_date_time: Option<String>,
    pub item_data_last_modified_date_time: Option<String>,
    pub model_code: Option<String>,
    pub item_code: Option<String>,
    pub product_life_cycle: Option<String>,
    pub intro_date: Option<String>,
    pub item_name: Option<String>,
    pub long_description: Option<String>,
    pub brand: Option<String>,
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "PMSColor1")]
    pub pms_color1: Option<String>,
    pub hex_color1: Option<String>,

    #[serde(rename = "ItemLengthCM")]
    pub item_length_cm: Option<Value>,
    #[serde(rename = "ItemWidthCM")]
    pub item_width_cm: Option<Value>,
    #[serde(rename = "ItemHeightCM")]
    pub item_height_cm: Option<Value>,
    pub item_dimensions: Option<String>,
    pub item_weight_net_gr: Option<Value>,
    pub item_weight_gross_gr: Option<Value>,

    pub country_of_origin: Option<String>,
    pub commodity_code: Option<String>,
    #[serde(rename = "EANCode")]
    pub ean_code: Option<String>,
    pub packaging_type_item: Option<String>,

    #[serde(rename = "OuterCartonLengthCM")]
    pub outer_carton_length_cm: Option<Value>,
    #[serde(rename = "OuterCartonWidthCM")]
    pub outer_carton_width_cm: Option<Value>,
    #[serde(rename = "OuterCartonHeightCM")]
    pub outer_carton_height_cm: Option<Value>,
    pub outer_carton_dimensions: Option<String>,
    #[serde(rename = "OuterCartonWeightNetKG")]
    pub outer_carton_weight_net_kg: Option<Value>,
    #[serde(rename = "OuterCartonWeightGrossKG")]
    pub outer_carton_weight_gross_kg: Option<Value>,
    pub innerbox_qty: Option<Value>,
    pub outer_carton_qty: Option<Value>,

    // Sustainability attributes; the boolean-ish ones arrive as bools or 0/1.
    pub compliance: Option<String>,
    pub certifications: Option<String>,
    pub social_audits: Option<String>,
    pub eco: Option<Value>,
    pub traceability: Option<String>,
    pub charity: Option<String>,
    #[serde(rename = "PVC free")]
    pub pvc_free: Option<Value>,
    #[serde(rename = "Digital passport")]
    pub digital_passport: Option<String>,
    #[serde(rename = "Leak Prevention")]
    pub leak_prevention: Option<String>,

    // Price tiers: quantity/price pairs, tier 1 through 5.
    pub price_tier1_qty: Option<Value>,
    pub price_tier1_price: Option<Value>,
    pub price_tier2_qty: Option<Value>,
    pub price_tier2_price: Option<Value>,
    pub price_tier3_qty: Option<Value>,
    pub price_tier3_price: Option<Value>,
    pub price_tier4_qty: Option<Value>,
    pub price_tier4_price: Option<Value>,
    pub price_tier5_qty: Option<Value>,
    pub price_tier5_price: Option<Value>,

    pub all_images: Option<String>,
    pub main_image: Option<String>,
    pub main_image_neutral: Option<String>,
    pub extra_image1: Option<String>,
    pub extra_image2: Option<String>,
    pub extra_image3: Option<String>,
    pub image_print: Option<String>,

    #[serde(rename = "USP")]
    pub usp: Option<String>,
}

/// One resolved price tier from the quantity/price field pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTier {
    pub quantity: i64,
    pub price: f64,
}

impl XdProduct {
    /// Collect the populated price tiers in tier order. Pairs missing either
    /// side are skipped.
    pub fn price_tiers(&self) -> Vec<PriceTier> {
        use crate::normalization::coerce::{to_f64, to_i64};
        let pairs = [
            (&self.price_tier1_qty, &self.price_tier1_price),
            (&self.price_tier2_qty, &self.price_tier2_price),
            (&self.price_tier3_qty, &self.price_tier3_price),
            (&self.price_tier4_qty, &self.price_tier4_price),
            (&self.price_tier5_qty, &self.price_tier5_price),
        ];
        pairs
            .into_iter()
            .filter_map(|(qty, price)| {
                Some(PriceTier {
                    quantity: to_i64(qty.as_ref())?,
                    price: to_f64(price.as_ref())?,
                })
            })
            .collect()
    }
}
