//! Admin input forms.
//!
//! Forms are plain structs validated before anything is sent, so a bad
//! price or a missing name is rejected locally instead of round-tripping.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;

/// Errors produced by form validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Neither name was filled in.
    #[error("Please enter product name")]
    MissingName,
    /// The numeric price does not parse.
    #[error("invalid numeric price: {0:?}")]
    InvalidPrice(String),
    /// The numeric price is below zero.
    #[error("price must not be negative")]
    NegativePrice,
    /// An update was requested without a product id.
    #[error("product id is required for updates")]
    MissingId,
    /// An inline edit with nothing to change.
    #[error("nothing to update")]
    EmptyEdit,
}

/// Product create/update form.
///
/// Field names match the multipart fields the admin API expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    pub id: Option<ProductId>,
    pub name_hi: String,
    pub name_en: String,
    /// Display price, e.g. `"₹60 / 250g"`.
    pub price: String,
    /// Numeric price as typed; blank means zero.
    pub price_num: String,
    /// Image URL or data URL.
    pub img: String,
}

impl ProductForm {
    /// Validate the fields shared by create and update.
    ///
    /// # Errors
    ///
    /// Returns `FormError::MissingName` when both names are blank and
    /// `FormError::InvalidPrice`/`NegativePrice` for a bad numeric price.
    pub fn validate(&self) -> Result<Decimal, FormError> {
        if self.name_hi.trim().is_empty() && self.name_en.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        self.numeric_price()
    }

    /// Validate for an update, which additionally needs an id.
    ///
    /// # Errors
    ///
    /// Returns `FormError::MissingId` when no id is set, otherwise the
    /// errors of [`ProductForm::validate`].
    pub fn validate_update(&self) -> Result<ProductId, FormError> {
        let id = self.id.ok_or(FormError::MissingId)?;
        self.validate()?;
        Ok(id)
    }

    /// Parse the numeric price; blank means zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a non-negative decimal.
    pub fn numeric_price(&self) -> Result<Decimal, FormError> {
        let raw = self.price_num.trim();
        if raw.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let value = raw
            .parse::<Decimal>()
            .map_err(|_| FormError::InvalidPrice(raw.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FormError::NegativePrice);
        }
        Ok(value)
    }

    /// Multipart field pairs in submission order.
    ///
    /// `id` is included only when set.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(6);
        if let Some(id) = self.id {
            fields.push(("id", id.to_string()));
        }
        fields.push(("name_hi", self.name_hi.clone()));
        fields.push(("name_en", self.name_en.clone()));
        fields.push(("price", self.price.clone()));
        fields.push(("price_num", self.price_num.trim().to_string()));
        fields.push(("img", self.img.clone()));
        fields
    }
}

/// Site settings form: field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings {
    pub fields: BTreeMap<String, String>,
}

impl SiteSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for SiteSettings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Single-field inline edit of a product's name and/or display price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl InlineEdit {
    /// Check that at least one field is being changed.
    ///
    /// # Errors
    ///
    /// Returns `FormError::EmptyEdit` when both fields are `None`.
    pub const fn validate(&self) -> Result<(), FormError> {
        if self.name.is_none() && self.price.is_none() {
            return Err(FormError::EmptyEdit);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            id: None,
            name_hi: "चाय".to_string(),
            name_en: "Tea".to_string(),
            price: "₹60 / 250g".to_string(),
            price_num: "60".to_string(),
            img: String::new(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        assert_eq!(form().validate().unwrap(), Decimal::from(60));
    }

    #[test]
    fn test_validate_requires_a_name() {
        let form = ProductForm {
            name_hi: " ".to_string(),
            name_en: String::new(),
            ..form()
        };
        assert_eq!(form.validate(), Err(FormError::MissingName));
        assert_eq!(FormError::MissingName.to_string(), "Please enter product name");
    }

    #[test]
    fn test_validate_one_name_is_enough() {
        let form = ProductForm {
            name_hi: String::new(),
            ..form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_numeric_price_rules() {
        let blank = ProductForm {
            price_num: "  ".to_string(),
            ..form()
        };
        assert_eq!(blank.numeric_price().unwrap(), Decimal::ZERO);

        let garbage = ProductForm {
            price_num: "sixty".to_string(),
            ..form()
        };
        assert_eq!(
            garbage.numeric_price(),
            Err(FormError::InvalidPrice("sixty".to_string()))
        );

        let negative = ProductForm {
            price_num: "-1".to_string(),
            ..form()
        };
        assert_eq!(negative.numeric_price(), Err(FormError::NegativePrice));
    }

    #[test]
    fn test_validate_update_requires_id() {
        assert_eq!(form().validate_update(), Err(FormError::MissingId));
        let with_id = ProductForm {
            id: Some(ProductId::new(3)),
            ..form()
        };
        assert_eq!(with_id.validate_update().unwrap(), ProductId::new(3));
    }

    #[test]
    fn test_fields_order_and_optional_id() {
        let names: Vec<&str> = form().fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["name_hi", "name_en", "price", "price_num", "img"]);

        let with_id = ProductForm {
            id: Some(ProductId::new(3)),
            ..form()
        };
        assert_eq!(with_id.fields()[0], ("id", "3".to_string()));
    }

    #[test]
    fn test_inline_edit_needs_a_field() {
        assert_eq!(InlineEdit::default().validate(), Err(FormError::EmptyEdit));
        let edit = InlineEdit {
            name: Some("Tea".to_string()),
            price: None,
        };
        assert!(edit.validate().is_ok());
        assert_eq!(serde_json::to_value(&edit).unwrap(), serde_json::json!({"name": "Tea"}));
    }

    #[test]
    fn test_site_settings_builder() {
        let settings = SiteSettings::new()
            .with("site_name", "Poojabdi")
            .with("phone", "+91 00000");
        assert_eq!(settings.fields.len(), 2);
        assert!(!settings.is_empty());
    }
}
