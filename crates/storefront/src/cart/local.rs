//! Local cart persisted in a key-value store.
//!
//! The whole cart is one JSON array of line items under [`LOCAL_CART_KEY`].
//! There is no remove or decrement; the only way to shrink the cart is
//! [`LocalCartStore::checkout`], which clears it.

use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use poojabdi_core::{CartLineItem, CartState, CartView, ProductId};

use super::storage::KeyValueStore;
use crate::error::Result;

/// Storage key holding the serialized line items.
pub const LOCAL_CART_KEY: &str = "poojabdi_cart";

/// Cart store over a [`KeyValueStore`].
///
/// Every write publishes the new item count on a `watch` channel so that a
/// cart badge can re-render. Writers are serialized, so concurrent
/// [`add`](Self::add) calls never lose an increment.
#[derive(Debug)]
pub struct LocalCartStore<S> {
    store: S,
    count_tx: watch::Sender<u32>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> LocalCartStore<S> {
    /// Wrap a store, seeding the count from what it already holds.
    pub fn new(store: S) -> Self {
        let (count_tx, _) = watch::channel(0);
        let cart = Self {
            store,
            count_tx,
            write_lock: Mutex::new(()),
        };
        cart.count_tx.send_replace(total(&cart.get()));
        cart
    }

    /// Receiver for the item count badge.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.count_tx.subscribe()
    }

    /// Read the line items.
    ///
    /// An absent, unreadable or undecodable value yields an empty cart.
    /// Zero-quantity entries are dropped and duplicate ids are merged.
    #[must_use]
    pub fn get(&self) -> Vec<CartLineItem> {
        let raw = match self.store.get(LOCAL_CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read local cart, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
            Ok(items) => normalize(items),
            Err(e) => {
                warn!(error = %e, "Local cart is corrupted, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist the full list and publish the new count.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save(&self, items: &[CartLineItem]) -> Result<()> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_items(items)
    }

    /// Caller must hold `write_lock`.
    fn write_items(&self, items: &[CartLineItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.store.set(LOCAL_CART_KEY, &raw)?;
        self.count_tx.send_replace(total(items));
        Ok(())
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line item for `product_id`, or appends a new
    /// one with quantity 1. Title and price are only captured on first add.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self, title))]
    pub fn add(&self, product_id: ProductId, title: &str, unit_price: Decimal) -> Result<()> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.get();
        match items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => items.push(CartLineItem::new(product_id, title, unit_price)),
        }
        self.write_items(&items)?;
        debug!(lines = items.len(), "Added to local cart");
        Ok(())
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u32 {
        total(&self.get())
    }

    /// Submit the order (demo stub): clears the cart and keeps no history.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self))]
    pub fn checkout(&self) -> Result<()> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.remove(LOCAL_CART_KEY)?;
        self.count_tx.send_replace(0);
        Ok(())
    }

    /// Render with the titles and prices captured at add time.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::from_line_items(&self.get())
    }

    /// The cart as an id to quantity mapping, for catalog-joined rendering.
    #[must_use]
    pub fn state(&self) -> CartState {
        CartState::from(self.get().as_slice())
    }
}

fn total(items: &[CartLineItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |sum, item| sum.saturating_add(item.quantity))
}

/// Restore the one-line-per-product invariant on data read back from storage.
fn normalize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut merged: Vec<CartLineItem> = Vec::with_capacity(items.len());
    for item in items.into_iter().filter(|item| item.quantity > 0) {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(item),
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::cart::storage::tests::temp_path;
    use crate::cart::storage::{JsonFileStore, MemoryStore};

    fn store() -> LocalCartStore<MemoryStore> {
        LocalCartStore::new(MemoryStore::new())
    }

    #[test]
    fn test_add_same_product_twice_increments() {
        let cart = store();
        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();
        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();

        let items = cart.get();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(5));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price, Decimal::from(40));
    }

    #[test]
    fn test_add_sequences_never_duplicate_lines() {
        let cart = store();
        let sequence = [1, 2, 1, 3, 1, 2];
        for id in sequence {
            cart.add(ProductId::new(id), "Item", Decimal::from(10)).unwrap();
        }

        let items = cart.get();
        assert_eq!(items.len(), 3);
        for id in [1, 2, 3] {
            let expected = sequence.iter().filter(|&&s| s == id).count();
            let lines: Vec<_> = items
                .iter()
                .filter(|i| i.product_id == ProductId::new(id))
                .collect();
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].quantity as usize, expected);
        }
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let cart = store();
        cart.add(ProductId::new(3), "Dhoop", Decimal::from(15)).unwrap();
        cart.add(ProductId::new(1), "Tea", Decimal::from(60)).unwrap();
        let ids: Vec<i32> = cart.get().iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, [3, 1]);
    }

    #[test]
    fn test_concurrent_adds_are_all_counted() {
        let cart = Arc::new(store());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cart = Arc::clone(&cart);
                thread::spawn(move || {
                    for _ in 0..200 {
                        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(cart.count(), 1600);
        assert_eq!(cart.get().len(), 1);
        assert_eq!(*cart.subscribe().borrow(), 1600);
    }

    #[test]
    fn test_save_then_get_roundtrip() {
        let cart = store();
        let mut tea = CartLineItem::new(ProductId::new(1), "Tea", Decimal::new(605, 1));
        tea.quantity = 3;
        let items = vec![tea, CartLineItem::new(ProductId::new(2), "Ghee", Decimal::from(30))];

        cart.save(&items).unwrap();

        assert_eq!(cart.get(), items);
    }

    #[test]
    fn test_corrupted_value_is_empty_cart() {
        let memory = MemoryStore::new();
        memory.set(LOCAL_CART_KEY, "{definitely not a list").unwrap();
        let cart = LocalCartStore::new(memory);

        assert!(cart.get().is_empty());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_legacy_numeric_prices_decode() {
        let memory = MemoryStore::new();
        memory
            .set(LOCAL_CART_KEY, r#"[{"id":5,"title":"Tea","price":40,"qty":2}]"#)
            .unwrap();
        let cart = LocalCartStore::new(memory);

        assert_eq!(cart.count(), 2);
        assert_eq!(cart.view().subtotal.display(), "₹80.00");
    }

    #[test]
    fn test_get_merges_duplicate_and_zero_lines() {
        let memory = MemoryStore::new();
        memory
            .set(
                LOCAL_CART_KEY,
                r#"[{"id":5,"title":"Tea","price":40,"qty":1},{"id":5,"title":"Tea","price":40,"qty":2},{"id":6,"title":"X","price":1,"qty":0}]"#,
            )
            .unwrap();
        let cart = LocalCartStore::new(memory);

        let items = cart.get();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_count_is_published() {
        let cart = store();
        let rx = cart.subscribe();
        cart.add(ProductId::new(1), "Tea", Decimal::from(60)).unwrap();
        cart.add(ProductId::new(1), "Tea", Decimal::from(60)).unwrap();
        assert_eq!(*rx.borrow(), 2);

        cart.checkout().unwrap();
        assert_eq!(*rx.borrow(), 0);
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_initial_count_reflects_stored_cart() {
        let memory = MemoryStore::new();
        memory
            .set(LOCAL_CART_KEY, r#"[{"id":1,"title":"Tea","price":"60","qty":4}]"#)
            .unwrap();
        let cart = LocalCartStore::new(memory);
        assert_eq!(*cart.subscribe().borrow(), 4);
    }

    #[test]
    fn test_state_and_view() {
        let cart = store();
        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();
        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();

        assert_eq!(cart.state().quantity(ProductId::new(5)), 2);
        let view = cart.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.subtotal.amount, Decimal::from(80));
    }

    #[test]
    fn test_file_backed_cart_survives_reopen() {
        let path = temp_path("storage.json");
        let cart = LocalCartStore::new(JsonFileStore::new(&path));
        cart.add(ProductId::new(5), "Tea", Decimal::from(40)).unwrap();

        let reopened = LocalCartStore::new(JsonFileStore::new(&path));
        assert_eq!(reopened.count(), 1);
        reopened.checkout().unwrap();
        assert_eq!(LocalCartStore::new(JsonFileStore::new(&path)).count(), 0);
    }
}
