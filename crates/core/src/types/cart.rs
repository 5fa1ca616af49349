//! Cart types and the cart view projection.
//!
//! Two cart shapes exist:
//! - [`CartLineItem`] lists, persisted by the local cart store
//! - [`CartState`], the product id to quantity mapping held by the server session
//!
//! Both are rendered through [`CartView`], which is recomputed on every
//! render and never cached.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::id::ProductId;
use super::price::Price;
use super::product::{NO_IMAGE_URL, Product};

// =============================================================================
// Local Cart Line Items
// =============================================================================

/// One product's entry in the local cart.
///
/// Serialized as `{"id", "title", "price", "qty"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub title: String,
    #[serde(rename = "price", deserialize_with = "super::product::lenient_decimal")]
    pub unit_price: Decimal,
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartLineItem {
    /// New line item with quantity 1.
    #[must_use]
    pub fn new(product_id: ProductId, title: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            title: title.into(),
            unit_price,
            quantity: 1,
        }
    }
}

// =============================================================================
// Session Cart State
// =============================================================================

/// Product id to quantity mapping.
///
/// Only positive quantities are stored; zero means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    quantities: BTreeMap<ProductId, u32>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize the raw server mapping.
    ///
    /// Keys are product ids as strings. Entries with a quantity of zero or
    /// less are dropped, as are keys that do not parse as an id.
    #[must_use]
    pub fn from_raw(raw: &HashMap<String, i64>) -> Self {
        let mut state = Self::new();
        for (key, &quantity) in raw {
            let Ok(id) = key.parse::<ProductId>() else {
                warn!(key = %key, "Ignoring cart entry with non-numeric product id");
                continue;
            };
            if quantity <= 0 {
                continue;
            }
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            state.add(id, quantity);
        }
        state
    }

    /// Quantity for a product, zero when absent.
    #[must_use]
    pub fn quantity(&self, id: ProductId) -> u32 {
        self.quantities.get(&id).copied().unwrap_or(0)
    }

    /// Add to the quantity of a product.
    pub fn add(&mut self, id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.quantities.entry(id).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Set the quantity of a product; zero removes it.
    pub fn set(&mut self, id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(&id);
        } else {
            self.quantities.insert(id, quantity);
        }
    }

    /// Remove a product entirely.
    pub fn remove(&mut self, id: ProductId) -> Option<u32> {
        self.quantities.remove(&id)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.quantities
            .values()
            .fold(0u32, |sum, &q| sum.saturating_add(q))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Entries in product id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.quantities.iter().map(|(&id, &q)| (id, q))
    }

    /// The server wire form: string keys to quantities.
    #[must_use]
    pub fn to_raw(&self) -> HashMap<String, i64> {
        self.iter()
            .map(|(id, q)| (id.to_string(), i64::from(q)))
            .collect()
    }
}

impl From<&[CartLineItem]> for CartState {
    fn from(items: &[CartLineItem]) -> Self {
        let mut state = Self::new();
        for item in items {
            state.add(item.product_id, item.quantity);
        }
        state
    }
}

impl FromIterator<(ProductId, u32)> for CartState {
    fn from_iter<I: IntoIterator<Item = (ProductId, u32)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (id, q) in iter {
            state.add(id, q);
        }
        state
    }
}

// =============================================================================
// Cart View
// =============================================================================

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    /// The product's display price string, empty when unknown.
    pub display_price: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Cart display model: lines, subtotal and item count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Price,
    pub item_count: u32,
}

impl Default for CartView {
    fn default() -> Self {
        Self::empty()
    }
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            subtotal: Price::zero(),
            item_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join a cart against the catalog.
    ///
    /// Cart entries whose product is missing from the catalog (for example a
    /// deleted product) are skipped and contribute nothing to the subtotal.
    /// So are entries whose line total or running subtotal would overflow.
    #[must_use]
    pub fn project(cart: &CartState, catalog: &[Product]) -> Self {
        let lines: Vec<CartLineView> = cart
            .iter()
            .filter_map(|(id, quantity)| {
                let Some(product) = catalog.iter().find(|p| p.id == id) else {
                    debug!(product_id = %id, "Skipping cart entry missing from catalog");
                    return None;
                };
                let unit_price = product.unit_price();
                let line_total = checked_line_total(id, unit_price, quantity)?;
                Some(CartLineView {
                    product_id: id,
                    title: product.display_name().to_string(),
                    display_price: product.price.clone(),
                    image_url: product.image_url().to_string(),
                    quantity,
                    unit_price,
                    line_total,
                })
            })
            .collect();

        Self::from_lines(lines)
    }

    /// Render local line items using the title and price captured at add time.
    #[must_use]
    pub fn from_line_items(items: &[CartLineItem]) -> Self {
        let lines = items
            .iter()
            .filter(|item| item.quantity > 0)
            .filter_map(|item| {
                let unit_price = Price::from_amount(item.unit_price);
                let line_total = checked_line_total(item.product_id, unit_price, item.quantity)?;
                Some(CartLineView {
                    product_id: item.product_id,
                    title: item.title.clone(),
                    display_price: unit_price.display(),
                    image_url: NO_IMAGE_URL.to_string(),
                    quantity: item.quantity,
                    unit_price,
                    line_total,
                })
            })
            .collect();

        Self::from_lines(lines)
    }

    fn from_lines(lines: Vec<CartLineView>) -> Self {
        let mut view = Self::empty();
        for line in lines {
            let Some(subtotal) = view.subtotal.checked_add(line.line_total) else {
                warn!(product_id = %line.product_id, "Skipping cart line, subtotal overflows");
                continue;
            };
            view.subtotal = subtotal;
            view.item_count = view.item_count.saturating_add(line.quantity);
            view.lines.push(line);
        }
        view
    }
}

fn checked_line_total(id: ProductId, unit_price: Price, quantity: u32) -> Option<Price> {
    let total = unit_price.checked_times(quantity);
    if total.is_none() {
        warn!(product_id = %id, quantity, "Skipping cart line, total overflows");
    }
    total
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, name: &str, price_num: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name_hi: String::new(),
            name_en: name.to_string(),
            price: format!("₹{price_num}"),
            price_num: Decimal::from(price_num),
            img: String::new(),
        }
    }

    #[test]
    fn test_from_raw_drops_non_positive_and_bad_keys() {
        let raw: HashMap<String, i64> = [
            ("1".to_string(), 2),
            ("2".to_string(), 0),
            ("3".to_string(), -4),
            ("chai".to_string(), 9),
            (" 4".to_string(), 1),
        ]
        .into_iter()
        .collect();

        let state = CartState::from_raw(&raw);
        assert_eq!(state.len(), 2);
        assert_eq!(state.quantity(ProductId::new(1)), 2);
        assert_eq!(state.quantity(ProductId::new(4)), 1);
        assert_eq!(state.quantity(ProductId::new(2)), 0);
        assert_eq!(state.total_quantity(), 3);
    }

    #[test]
    fn test_set_zero_removes_entry() {
        let mut state = CartState::new();
        state.add(ProductId::new(1), 3);
        state.set(ProductId::new(1), 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_to_raw_uses_string_keys() {
        let state: CartState = [(ProductId::new(9), 2)].into_iter().collect();
        assert_eq!(state.to_raw().get("9"), Some(&2));
    }

    #[test]
    fn test_project_single_line_subtotal() {
        let catalog = vec![product(1, "Tea", 60), product(2, "Ghee", 30)];
        let cart: CartState = [(ProductId::new(1), 2)].into_iter().collect();

        let view = CartView::project(&cart, &catalog);

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.subtotal.amount, Decimal::from(120));
        assert_eq!(view.subtotal.display(), "₹120.00");
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_project_skips_products_missing_from_catalog() {
        let catalog = vec![product(1, "Tea", 60)];
        let cart: CartState = [(ProductId::new(1), 1), (ProductId::new(99), 5)]
            .into_iter()
            .collect();

        let view = CartView::project(&cart, &catalog);

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_id, ProductId::new(1));
        assert_eq!(view.subtotal.amount, Decimal::from(60));
        assert_eq!(view.item_count, 1);
    }

    #[test]
    fn test_project_subtotal_is_sum_of_line_totals() {
        let catalog = vec![product(1, "Tea", 60), product(2, "Ghee", 30), product(3, "Dhoop", 15)];
        let cart: CartState = [
            (ProductId::new(1), 1),
            (ProductId::new(2), 3),
            (ProductId::new(3), 2),
        ]
        .into_iter()
        .collect();

        let view = CartView::project(&cart, &catalog);

        let expected: Decimal = view.lines.iter().map(|l| l.line_total.amount).sum();
        assert_eq!(view.subtotal.amount, expected);
        assert_eq!(view.subtotal.amount, Decimal::from(180));
    }

    #[test]
    fn test_project_skips_overflowing_line() {
        let mut pricey = product(1, "Gold Leaf", 0);
        pricey.price_num = "100000000000000000000".parse().unwrap();
        let catalog = vec![pricey, product(2, "Ghee", 30)];
        let raw: HashMap<String, i64> = [("1".to_string(), 1_000_000_000), ("2".to_string(), 2)]
            .into_iter()
            .collect();

        let view = CartView::project(&CartState::from_raw(&raw), &catalog);

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_id, ProductId::new(2));
        assert_eq!(view.subtotal.amount, Decimal::from(60));
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_subtotal_overflow_skips_line() {
        let items = [
            CartLineItem::new(ProductId::new(1), "Huge", Decimal::MAX),
            CartLineItem::new(ProductId::new(2), "Again", Decimal::MAX),
        ];

        let view = CartView::from_line_items(&items);

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.subtotal.amount, Decimal::MAX);
        assert_eq!(view.item_count, 1);
    }

    #[test]
    fn test_project_empty_cart() {
        let view = CartView::project(&CartState::new(), &[product(1, "Tea", 60)]);
        assert!(view.is_empty());
        assert_eq!(view, CartView::empty());
    }

    #[test]
    fn test_from_line_items_uses_captured_prices() {
        let mut item = CartLineItem::new(ProductId::new(5), "Tea", Decimal::from(40));
        item.quantity = 2;

        let view = CartView::from_line_items(&[item]);

        assert_eq!(view.lines[0].title, "Tea");
        assert_eq!(view.subtotal.display(), "₹80.00");
    }

    #[test]
    fn test_line_item_wire_format() {
        let item = CartLineItem::new(ProductId::new(5), "Tea", Decimal::from(40));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["qty"], 1);
        assert_eq!(json["title"], "Tea");
    }
}
