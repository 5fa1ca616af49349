//! Catalog listing.

use poojabdi_storefront::view::catalog_text;
use poojabdi_storefront::{CatalogClient, CatalogView, ShopClient, StorefrontConfig};

use super::{CommandError, emit};

/// Fetch the catalog and print the product grid.
pub async fn show(config: &StorefrontConfig) -> Result<(), CommandError> {
    let catalog = CatalogClient::new(ShopClient::new(config)?);
    let products = catalog.fetch().await?;
    emit(&catalog_text(&CatalogView::new(&products)))?;
    Ok(())
}
