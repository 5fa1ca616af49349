//! Poojabdi Admin library.
//!
//! Client side of the admin panel: product create/update/delete, site
//! settings and inline edits, plus a panel model that reloads the product
//! list after every applied change.
//!
//! Admin authentication is handled outside this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod error;
pub mod panel;

pub use client::{AdminClient, AdminOutcome, DELETE_CONFIRMATION};
pub use error::{AdminError, Result};
pub use panel::AdminPanel;
