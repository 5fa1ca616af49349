//! Session cart transport.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use poojabdi_core::{CartState, ProductId};

use crate::client::ShopClient;
use crate::error::Result;

/// Session cart endpoint path.
pub const CART_PATH: &str = "/api/cart";

/// The server's cart surface: read, add to, and delete entries.
///
/// There is deliberately no "set quantity" here because the server has none.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Read the whole cart.
    async fn fetch(&self) -> Result<CartState>;

    /// Add `quantity` to the existing quantity of `id`.
    async fn add(&self, id: ProductId, quantity: u32) -> Result<()>;

    /// Remove `id` entirely.
    async fn delete(&self, id: ProductId) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct AddBody {
    id: ProductId,
    qty: u32,
}

#[derive(Debug, Serialize)]
struct DeleteBody {
    id: ProductId,
}

/// [`CartBackend`] over `/api/cart`.
///
/// The session is carried by the client's cookie store.
#[derive(Debug, Clone)]
pub struct HttpCartBackend {
    client: ShopClient,
}

impl HttpCartBackend {
    #[must_use]
    pub const fn new(client: ShopClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartBackend for HttpCartBackend {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<CartState> {
        let raw: HashMap<String, i64> = self.client.get_json(CART_PATH).await?;
        Ok(CartState::from_raw(&raw))
    }

    #[instrument(skip(self))]
    async fn add(&self, id: ProductId, quantity: u32) -> Result<()> {
        let request = self
            .client
            .http()
            .post(self.client.url(CART_PATH)?)
            .json(&AddBody { id, qty: quantity });
        self.client.execute(request).await?;
        debug!("Posted cart quantity");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<()> {
        let request = self
            .client
            .http()
            .delete(self.client.url(CART_PATH)?)
            .json(&DeleteBody { id });
        self.client.execute(request).await?;
        debug!("Deleted cart entry");
        Ok(())
    }
}
