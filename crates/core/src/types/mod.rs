//! Core types for Poojabdi.
//!
//! This module provides type-safe wrappers for the shop's domain concepts.

pub mod cart;
pub mod form;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{CartLineItem, CartLineView, CartState, CartView};
pub use form::{FormError, InlineEdit, ProductForm, SiteSettings};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{NO_IMAGE_URL, Product};
