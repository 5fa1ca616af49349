//! Catalog product as served by `/products.json`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Image shown when a product has no image of its own.
pub const NO_IMAGE_URL: &str = "/static/images/no-image.png";

/// A purchasable product.
///
/// Field names follow the catalog JSON: `name_hi` is the primary (Hindi)
/// name, `name_en` the secondary (English) one. `price` is a free-form
/// display string such as `"₹60 / 250g"`; `price_num` is the only value used
/// for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name_hi: String,
    #[serde(default)]
    pub name_en: String,
    /// Display price, presentational only.
    #[serde(default)]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price_num: Decimal,
    #[serde(default)]
    pub img: String,
}

impl Product {
    /// Primary name when present, otherwise the secondary one.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name_hi.trim().is_empty() {
            &self.name_en
        } else {
            &self.name_hi
        }
    }

    /// Image URL with the placeholder fallback applied.
    #[must_use]
    pub fn image_url(&self) -> &str {
        if self.img.trim().is_empty() {
            NO_IMAGE_URL
        } else {
            &self.img
        }
    }

    /// Canonical unit price.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::from_amount(self.price_num)
    }
}

/// Accept `60`, `60.5`, `"60"`, `""` and `null` for a decimal field.
///
/// Admin forms submit every field as text, so catalogs written by the admin
/// backend carry numeric strings. Blank and null mean "no price".
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(Decimal::ZERO),
        serde_json::Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(D::Error::custom),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}
