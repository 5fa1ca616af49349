//! Product catalog loader.
//!
//! The catalog is a static `/products.json` document. It is fetched fresh on
//! every call: the admin panel can change it at any time and a stale catalog
//! would price the cart wrongly.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

use poojabdi_core::{Product, ProductId};

use crate::client::ShopClient;
use crate::error::Result;

/// Catalog endpoint path.
pub const PRODUCTS_PATH: &str = "/products.json";

/// Anything that can produce the current product list.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load the full product list.
    async fn products(&self) -> Result<Vec<Product>>;
}

/// Client for the shop's catalog endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: ShopClient,
}

impl CatalogClient {
    #[must_use]
    pub const fn new(client: ShopClient) -> Self {
        Self { client }
    }

    /// Fetch the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<Product>> {
        let products: Vec<Product> = self.client.get_json(PRODUCTS_PATH).await?;
        info!(count = products.len(), "Loaded catalog");
        Ok(products)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn products(&self) -> Result<Vec<Product>> {
        self.fetch().await
    }
}

/// A fixed product list, for offline rendering.
#[async_trait]
impl CatalogSource for Vec<Product> {
    async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.clone())
    }
}

// =============================================================================
// Product Grid
// =============================================================================

/// One product card in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub display_price: String,
    pub image_url: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.display_name().to_string(),
            display_price: product.price.clone(),
            image_url: product.image_url().to_string(),
        }
    }
}

/// Product grid display model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    pub cards: Vec<ProductCard>,
}

impl CatalogView {
    /// Build the grid in catalog order.
    #[must_use]
    pub fn new(products: &[Product]) -> Self {
        Self {
            cards: products.iter().map(ProductCard::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i32, name_hi: &str, name_en: &str, img: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name_hi: name_hi.to_string(),
            name_en: name_en.to_string(),
            price: "₹60 / 250g".to_string(),
            price_num: Decimal::from(60),
            img: img.to_string(),
        }
    }

    #[test]
    fn test_catalog_view_cards() {
        let products = vec![
            product(1, "चाय", "Tea", "/img/tea.png"),
            product(2, "", "Ghee", ""),
        ];

        let view = CatalogView::new(&products);

        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.cards[0].name, "चाय");
        assert_eq!(view.cards[0].image_url, "/img/tea.png");
        assert_eq!(view.cards[1].name, "Ghee");
        assert_eq!(view.cards[1].image_url, poojabdi_core::NO_IMAGE_URL);
        assert_eq!(view.cards[1].display_price, "₹60 / 250g");
    }

    #[tokio::test]
    async fn test_static_catalog_source() {
        let products = vec![product(1, "चाय", "Tea", "")];
        let loaded = products.products().await.unwrap();
        assert_eq!(loaded, products);
    }
}
