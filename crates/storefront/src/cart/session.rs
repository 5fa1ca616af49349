//! Server-held session cart.
//!
//! The server owns the cart; this type never trusts a local copy. Counts and
//! views are always recomputed from a fresh fetch.
//!
//! # Quantity updates
//!
//! The API only offers "add N" (POST) and "remove entirely" (DELETE), so
//! setting a quantity is DELETE followed by POST. Between the two the server
//! holds zero of that product. Every mutation takes a per-product lock for
//! the duration of its requests, which keeps same-product mutations from one
//! client in issue order. Other clients sharing the session can still race.
//!
//! Refreshes run one at a time, each fetching and publishing under one lock,
//! so the last value published always comes from the most recent fetch.

use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{error, info, instrument, warn};

use poojabdi_core::{CartView, ProductId};

use super::backend::{CartBackend, HttpCartBackend};
use super::keyed_lock::KeyedLock;
use crate::catalog::{CatalogClient, CatalogSource};
use crate::client::ShopClient;
use crate::error::Result;
use crate::view::CartRenderer;

/// Client-side proxy for the session cart.
///
/// Cheaply cloneable; clones share the per-product locks and the published
/// count and view.
pub struct SessionCart<B = HttpCartBackend, C = CatalogClient> {
    inner: Arc<SessionCartInner<B, C>>,
}

struct SessionCartInner<B, C> {
    backend: B,
    renderer: CartRenderer<C>,
    locks: KeyedLock<ProductId>,
    refresh_lock: AsyncMutex<()>,
    count_tx: watch::Sender<u32>,
    view_tx: watch::Sender<Option<CartView>>,
}

impl<B, C> Clone for SessionCart<B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionCart<HttpCartBackend, CatalogClient> {
    /// Session cart and catalog over one shared HTTP client.
    #[must_use]
    pub fn over_http(client: &ShopClient) -> Self {
        Self::new(
            HttpCartBackend::new(client.clone()),
            CatalogClient::new(client.clone()),
        )
    }
}

impl<B: CartBackend, C: CatalogSource> SessionCart<B, C> {
    #[must_use]
    pub fn new(backend: B, catalog: C) -> Self {
        let (count_tx, _) = watch::channel(0);
        let (view_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionCartInner {
                backend,
                renderer: CartRenderer::new(catalog),
                locks: KeyedLock::new(),
                refresh_lock: AsyncMutex::new(()),
                count_tx,
                view_tx,
            }),
        }
    }

    /// Receiver for the item count badge.
    #[must_use]
    pub fn subscribe_count(&self) -> watch::Receiver<u32> {
        self.inner.count_tx.subscribe()
    }

    /// Receiver for the rendered cart; `None` until the first render.
    #[must_use]
    pub fn subscribe_view(&self) -> watch::Receiver<Option<CartView>> {
        self.inner.view_tx.subscribe()
    }

    /// The transport in use.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Add `quantity` units of a product, then refresh the count.
    ///
    /// Adding zero sends nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the POST fails.
    #[instrument(skip(self))]
    pub async fn add(&self, id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        {
            let _guard = self.inner.locks.lock(id).await;
            self.inner.backend.add(id, quantity).await?;
        }
        info!("Added to session cart");
        self.refresh_count().await;
        Ok(())
    }

    /// Remove a product entirely, then refresh the count and view.
    ///
    /// # Errors
    ///
    /// Returns an error if the DELETE fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: ProductId) -> Result<()> {
        let result = {
            let _guard = self.inner.locks.lock(id).await;
            self.inner.backend.delete(id).await
        };
        self.refresh().await;
        result?;
        info!("Removed from session cart");
        Ok(())
    }

    /// Set the quantity of a product.
    ///
    /// Zero or less behaves exactly like [`SessionCart::remove`]. Otherwise
    /// the entry is deleted and re-added with the new quantity, then the
    /// count and view are refreshed. The refresh also runs after a failure,
    /// since a failed POST leaves the product removed on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails. A failed DELETE skips the
    /// POST.
    #[instrument(skip(self))]
    pub async fn change_quantity(&self, id: ProductId, new_quantity: i64) -> Result<()> {
        if new_quantity <= 0 {
            return self.remove(id).await;
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let result = {
            let _guard = self.inner.locks.lock(id).await;
            self.replace(id, quantity).await
        };
        self.refresh().await;
        result?;
        info!(quantity, "Changed session cart quantity");
        Ok(())
    }

    async fn replace(&self, id: ProductId, quantity: u32) -> Result<()> {
        self.inner.backend.delete(id).await?;
        if let Err(e) = self.inner.backend.add(id, quantity).await {
            error!(error = %e, "Quantity update lost after delete; product is no longer in the cart");
            return Err(e);
        }
        Ok(())
    }

    /// Total quantity from a fresh fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    pub async fn count(&self) -> Result<u32> {
        Ok(self.inner.backend.fetch().await?.total_quantity())
    }

    /// Render the current cart against the current catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or the catalog cannot be fetched.
    pub async fn view(&self) -> Result<CartView> {
        self.inner.renderer.render_from(&self.inner.backend).await
    }

    /// Re-fetch and publish the count; failures keep the old value.
    pub async fn refresh_count(&self) {
        let _refresh = self.inner.refresh_lock.lock().await;
        match self.count().await {
            Ok(count) => {
                self.inner.count_tx.send_replace(count);
            }
            Err(e) => warn!(error = %e, "Failed to refresh cart count"),
        }
    }

    /// Re-render and publish the view; failures keep the old value.
    pub async fn refresh_view(&self) {
        let _refresh = self.inner.refresh_lock.lock().await;
        match self.view().await {
            Ok(view) => {
                self.inner.view_tx.send_replace(Some(view));
            }
            Err(e) => warn!(error = %e, "Failed to refresh cart view"),
        }
    }

    /// Refresh both the count and the view.
    pub async fn refresh(&self) {
        self.refresh_count().await;
        self.refresh_view().await;
    }
}
