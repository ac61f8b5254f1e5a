//! Typed view of one midocean feed record. The feed has shipped the same
//! field under several casings over time; aliases cover the known spellings so
//! no dynamic key probing is needed downstream. Numeric-ish fields arrive as
//! either numbers or strings and are kept as raw [`Value`]s for the
//! normalizer's coercion pass.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MidoceanProduct {
    #[serde(alias = "masterCode")]
    pub master_code: Option<String>,
    #[serde(alias = "masterId", alias = "masterID")]
    pub master_id: Option<String>,
    #[serde(alias = "productCode", alias = "ProductCode")]
    pub product_code: Option<String>,
    #[serde(alias = "Code")]
    pub code: Option<String>,
    #[serde(alias = "SKU")]
    pub sku: Option<String>,
    #[serde(alias = "Id", alias = "ID")]
    pub id: Option<Value>,
    #[serde(alias = "productId", alias = "ProductId")]
    pub product_id: Option<Value>,
    #[serde(alias = "externalId", alias = "ExternalId")]
    pub external_id: Option<Value>,

    // Name-bearing fields, resolved in priority order by the normalizer.
    #[serde(alias = "productName", alias = "ProductName")]
    pub product_name: Option<String>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "shortDescription", alias = "ShortDescription")]
    pub short_description: Option<String>,
    #[serde(alias = "displayName", alias = "DisplayName")]
    pub display_name: Option<String>,

    #[serde(alias = "longDescription", alias = "LongDescription")]
    pub long_description: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    #[serde(alias = "typeOfProducts")]
    pub type_of_products: Option<String>,
    #[serde(alias = "commodityCode")]
    pub commodity_code: Option<String>,
    #[serde(alias = "numberOfPrintPositions")]
    pub number_of_print_positions: Option<Value>,
    #[serde(alias = "categoryCode")]
    pub category_code: Option<String>,
    #[serde(alias = "productClass")]
    pub product_class: Option<String>,
    pub material: Option<String>,

    pub length: Option<Value>,
    #[serde(alias = "lengthUnit")]
    pub length_unit: Option<String>,
    pub width: Option<Value>,
    #[serde(alias = "widthUnit")]
    pub width_unit: Option<String>,
    pub height: Option<Value>,
    #[serde(alias = "heightUnit")]
    pub height_unit: Option<String>,
    pub dimensions: Option<String>,
    pub volume: Option<Value>,
    #[serde(alias = "volumeUnit")]
    pub volume_unit: Option<String>,

    #[serde(alias = "grossWeight")]
    pub gross_weight: Option<Value>,
    #[serde(alias = "grossWeightUnit")]
    pub gross_weight_unit: Option<String>,
    #[serde(alias = "netWeight")]
    pub net_weight: Option<Value>,
    #[serde(alias = "netWeightUnit")]
    pub net_weight_unit: Option<String>,

    #[serde(alias = "innerCartonQuantity")]
    pub inner_carton_quantity: Option<Value>,
    #[serde(alias = "outerCartonQuantity")]
    pub outer_carton_quantity: Option<Value>,
    #[serde(alias = "cartonLength")]
    pub carton_length: Option<Value>,
    #[serde(alias = "cartonLengthUnit")]
    pub carton_length_unit: Option<String>,
    #[serde(alias = "cartonWidth")]
    pub carton_width: Option<Value>,
    #[serde(alias = "cartonWidthUnit")]
    pub carton_width_unit: Option<String>,
    #[serde(alias = "cartonHeight")]
    pub carton_height: Option<Value>,
    #[serde(alias = "cartonHeightUnit")]
    pub carton_height_unit: Option<String>,
    #[serde(alias = "cartonVolume")]
    pub carton_volume: Option<Value>,
    #[serde(alias = "cartonVolumeUnit")]
    pub carton_volume_unit: Option<String>,
    #[serde(alias = "cartonGrossWeight")]
    pub carton_gross_weight: Option<Value>,
    #[serde(alias = "cartonGrossWeightUnit")]
    pub carton_gross_weight_unit: Option<String>,

    #[serde(alias = "packagingAfterPrinting")]
    pub packaging_after_printing: Option<String>,
    pub printable: Option<Value>,
    #[serde(alias = "countryOfOrigin")]
    pub country_of_origin: Option<String>,
    pub timestamp: Option<Value>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    pub image: Option<String>,

    pub variants: Vec<MidoceanVariant>,
    #[serde(alias = "digitalAssets")]
    pub digital_assets: Vec<MidoceanAsset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MidoceanVariant {
    #[serde(alias = "variantId")]
    pub variant_id: Option<Value>,
    #[serde(alias = "SKU")]
    pub sku: Option<String>,
    #[serde(alias = "releaseDate")]
    pub release_date: Option<Value>,
    #[serde(alias = "discontinuedDate")]
    pub discontinued_date: Option<Value>,
    #[serde(alias = "productPropositionCategory")]
    pub product_proposition_category: Option<Value>,
    #[serde(alias = "categoryLevel1")]
    pub category_level1: Option<String>,
    #[serde(alias = "categoryLevel2")]
    pub category_level2: Option<String>,
    #[serde(alias = "categoryLevel3")]
    pub category_level3: Option<String>,
    #[serde(alias = "colorDescription")]
    pub color_description: Option<String>,
    #[serde(alias = "colorGroup")]
    pub color_group: Option<String>,
    #[serde(alias = "colorCode")]
    pub color_code: Option<Value>,
    #[serde(alias = "pmsColor")]
    pub pms_color: Option<String>,
    #[serde(alias = "plcStatus")]
    pub plc_status: Option<Value>,
    #[serde(alias = "plcStatusDescription")]
    pub plc_status_description: Option<String>,
    #[serde(alias = "GTIN")]
    pub gtin: Option<Value>,
    #[serde(alias = "digitalAssets")]
    pub digital_assets: Vec<MidoceanAsset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MidoceanAsset {
    pub url: Option<String>,
    // The feed really does spell it "url_highress".
    #[serde(alias = "urlHighRes", alias = "url_highres")]
    pub url_highress: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub subtype: Option<String>,
}
