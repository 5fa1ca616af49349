//! Cart stores.
//!
//! # Variants
//!
//! - [`session`] - Server-held session cart behind `/api/cart` (primary)
//! - [`local`] - Cart persisted in a local key-value store (offline)
//!
//! [`session_cookies`] keeps the session cart's cookie across processes.
//!
//! The two never interoperate. Both can produce a
//! [`CartState`](poojabdi_core::CartState) that the
//! [`CartRenderer`](crate::view::CartRenderer) joins against the catalog.

pub mod backend;
pub mod keyed_lock;
pub mod local;
pub mod session;
pub mod session_cookies;
pub mod storage;

pub use backend::{CART_PATH, CartBackend, HttpCartBackend};
pub use keyed_lock::KeyedLock;
pub use local::{LOCAL_CART_KEY, LocalCartStore};
pub use session::SessionCart;
pub use session_cookies::{SESSION_COOKIE_KEY, SessionCookies};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
