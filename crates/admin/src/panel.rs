//! Admin panel model.
//!
//! Holds the product list the panel shows. Any change the server applies is
//! followed by a full reload of the list rather than a local patch; a failed
//! or cancelled action leaves the list exactly as it was. A reload that fails
//! after an applied change is logged and the change is still reported as
//! applied, so callers never retry something the server already did.

use tracing::{info, instrument, warn};

use poojabdi_core::{InlineEdit, Product, ProductForm, ProductId, SiteSettings};
use poojabdi_storefront::CatalogSource;

use crate::client::{AdminClient, AdminOutcome};
use crate::error::Result;

/// Product list plus the client that mutates it.
#[derive(Debug)]
pub struct AdminPanel<C> {
    client: AdminClient,
    catalog: C,
    products: Vec<Product>,
}

impl<C: CatalogSource> AdminPanel<C> {
    /// Open the panel with a freshly loaded product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub async fn open(client: AdminClient, catalog: C) -> Result<Self> {
        let products = catalog.products().await?;
        Ok(Self {
            client,
            catalog,
            products,
        })
    }

    /// Products as of the last load.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Replace the product list with a fresh catalog load.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded; the old list is kept.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<()> {
        self.products = self.catalog.products().await?;
        info!(count = self.products.len(), "Admin product list reloaded");
        Ok(())
    }

    /// Create a product and reload.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::create_product`].
    pub async fn create(&mut self, form: &ProductForm) -> Result<AdminOutcome> {
        let outcome = self.client.create_product(form).await?;
        self.after(outcome).await
    }

    /// Update a product and reload.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::update_product`].
    pub async fn update(&mut self, form: &ProductForm) -> Result<AdminOutcome> {
        let outcome = self.client.update_product(form).await?;
        self.after(outcome).await
    }

    /// Delete a product after confirmation and reload.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::delete_product`].
    pub async fn delete<F>(&mut self, id: ProductId, confirm: F) -> Result<AdminOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        let outcome = self.client.delete_product(id, confirm).await?;
        self.after(outcome).await
    }

    /// Inline-edit a product and reload.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::update_product_field`].
    pub async fn edit(&mut self, id: ProductId, edit: &InlineEdit) -> Result<AdminOutcome> {
        let outcome = self.client.update_product_field(id, edit).await?;
        self.after(outcome).await
    }

    /// Save site settings. The product list is unaffected, so no reload.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::save_settings`].
    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<AdminOutcome> {
        self.client.save_settings(settings).await
    }

    async fn after(&mut self, outcome: AdminOutcome) -> Result<AdminOutcome> {
        if outcome == AdminOutcome::Applied
            && let Err(e) = self.reload().await
        {
            warn!(error = %e, "Change applied but product list reload failed; list is stale");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use poojabdi_storefront::ShopClient;
    use url::Url;

    use super::*;
    use crate::error::AdminError;

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[{"id":1,"name_en":"Tea","price_num":60},{"id":2,"name_en":"Ghee","price_num":30}]"#,
        )
        .unwrap()
    }

    async fn panel() -> AdminPanel<Vec<Product>> {
        let client =
            ShopClient::with_base_url(Url::parse("http://127.0.0.1:9/").unwrap(), None).unwrap();
        AdminPanel::open(AdminClient::with_client(client), catalog())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_loads_products() {
        assert_eq!(panel().await.products().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_delete_keeps_list() {
        let mut panel = panel().await;
        let outcome = panel.delete(ProductId::new(1), |_| false).await.unwrap();
        assert_eq!(outcome, AdminOutcome::Cancelled);
        assert_eq!(panel.products(), catalog().as_slice());
    }

    #[tokio::test]
    async fn test_failed_request_keeps_list() {
        let mut panel = panel().await;
        let err = panel.delete(ProductId::new(1), |_| true).await.unwrap_err();
        assert!(matches!(err, AdminError::Transport(_)));
        assert_eq!(panel.products(), catalog().as_slice());
    }
}
