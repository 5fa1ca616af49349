//! Poojabdi Core - Shared types library.
//!
//! This crate provides the types shared by every Poojabdi component:
//! - `storefront` - Catalog loader, cart stores and cart renderer
//! - `admin` - Admin API client for products and site settings
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The cart projection lives here because it is a pure join of a
//! cart against the catalog.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, products, carts, view models and admin forms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
