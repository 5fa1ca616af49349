//! Poojabdi Storefront client library.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`client`] - Shared HTTP client with a session cookie store
//! - [`catalog`] - Product catalog loader and product grid model
//! - [`cart`] - Local and session cart stores
//! - [`view`] - Cart rendering against the catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use poojabdi_core::ProductId;
//! use poojabdi_storefront::{SessionCart, ShopClient, StorefrontConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let client = ShopClient::new(&config)?;
//! let cart = SessionCart::over_http(&client);
//!
//! cart.add(ProductId::new(1), 1).await?;
//! cart.change_quantity(ProductId::new(1), 3).await?;
//! let view = cart.view().await?;
//! println!("{}", view.subtotal);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod view;

pub use cart::{
    CartBackend, HttpCartBackend, JsonFileStore, KeyValueStore, LocalCartStore, MemoryStore,
    SessionCart, SessionCookies,
};
pub use catalog::{CatalogClient, CatalogSource, CatalogView, ProductCard};
pub use client::ShopClient;
pub use config::{ConfigError, StorefrontConfig};
pub use error::{Result, StorefrontError};
pub use view::CartRenderer;
