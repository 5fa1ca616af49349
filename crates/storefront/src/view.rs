//! Cart rendering: joins a cart against a freshly loaded catalog.

use std::fmt::Write as _;

use tracing::instrument;

use poojabdi_core::{CartState, CartView};

use crate::cart::CartBackend;
use crate::catalog::{CatalogSource, CatalogView};
use crate::error::Result;

/// Renders carts against the catalog.
///
/// The catalog is re-fetched on every render.
#[derive(Debug, Clone)]
pub struct CartRenderer<C> {
    catalog: C,
}

impl<C: CatalogSource> CartRenderer<C> {
    #[must_use]
    pub const fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// The catalog this renderer reads from.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Project a cart onto the current catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    #[instrument(skip_all, fields(entries = cart.len()))]
    pub async fn render(&self, cart: &CartState) -> Result<CartView> {
        let products = self.catalog.products().await?;
        Ok(CartView::project(cart, &products))
    }

    /// Fetch the session cart and project it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or the catalog cannot be loaded.
    pub async fn render_from<B: CartBackend + ?Sized>(&self, backend: &B) -> Result<CartView> {
        let cart = backend.fetch().await?;
        self.render(&cart).await
    }
}

// =============================================================================
// Text Output
// =============================================================================

/// Plain-text cart listing.
#[must_use]
pub fn cart_text(view: &CartView) -> String {
    if view.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &view.lines {
        let _ = writeln!(
            out,
            "#{:<4} {:<32} {:>4} x {:>10} = {:>10}",
            line.product_id,
            line.title,
            line.quantity,
            line.unit_price.display(),
            line.line_total.display(),
        );
    }
    let _ = writeln!(
        out,
        "Subtotal ({} items): {}",
        view.item_count,
        view.subtotal.display()
    );
    out
}

/// Plain-text product grid.
#[must_use]
pub fn catalog_text(view: &CatalogView) -> String {
    if view.cards.is_empty() {
        return "No products\n".to_string();
    }

    let mut out = String::new();
    for card in &view.cards {
        let _ = writeln!(
            out,
            "#{:<4} {:<32} {:<16} {}",
            card.id, card.name, card.display_price, card.image_url
        );
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use poojabdi_core::{Product, ProductId};

    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: ProductId::new(1),
                name_hi: String::new(),
                name_en: "Tea".to_string(),
                price: "₹60".to_string(),
                price_num: Decimal::from(60),
                img: String::new(),
            },
            Product {
                id: ProductId::new(2),
                name_hi: String::new(),
                name_en: "Ghee".to_string(),
                price: "₹30".to_string(),
                price_num: Decimal::from(30),
                img: String::new(),
            },
        ]
    }

    #[tokio::test]
    async fn test_render_scenario_subtotal() {
        let renderer = CartRenderer::new(catalog());
        let cart: CartState = [(ProductId::new(1), 2)].into_iter().collect();

        let view = renderer.render(&cart).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.subtotal.display(), "₹120.00");
    }

    #[tokio::test]
    async fn test_render_skips_deleted_products() {
        let renderer = CartRenderer::new(catalog());
        let cart: CartState = [(ProductId::new(2), 1), (ProductId::new(42), 3)]
            .into_iter()
            .collect();

        let view = renderer.render(&cart).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.subtotal.amount, Decimal::from(30));
    }

    #[test]
    fn test_cart_text() {
        assert_eq!(cart_text(&CartView::empty()), "Cart is empty\n");

        let cart: CartState = [(ProductId::new(1), 2)].into_iter().collect();
        let text = cart_text(&CartView::project(&cart, &catalog()));
        assert!(text.contains("Tea"));
        assert!(text.contains("₹120.00"));
        assert!(text.ends_with("Subtotal (2 items): ₹120.00\n"));
    }

    #[test]
    fn test_catalog_text() {
        assert_eq!(catalog_text(&CatalogView::default()), "No products\n");
        let text = catalog_text(&CatalogView::new(&catalog()));
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Ghee"));
    }
}
