//! Session cookie persistence.
//!
//! The session cart lives on the server behind a cookie. A process that
//! wants to keep using the same cart after restarting saves the cookies the
//! shop sent for the cart endpoint and seeds a fresh client's jar with them.
//! Only `name=value` pairs are kept; the shop re-issues anything it no
//! longer accepts.

use tracing::{debug, instrument};

use super::backend::CART_PATH;
use super::storage::KeyValueStore;
use crate::client::ShopClient;
use crate::error::Result;

/// Storage key holding the saved `Cookie` header.
pub const SESSION_COOKIE_KEY: &str = "poojabdi_session";

/// Saves and restores a client's session cookies in a [`KeyValueStore`].
#[derive(Debug)]
pub struct SessionCookies<S> {
    store: S,
}

impl<S: KeyValueStore> SessionCookies<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Seed `client` with the saved cookies, if any.
    ///
    /// Returns whether anything was restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the cart URL is invalid.
    #[instrument(skip_all)]
    pub fn restore(&self, client: &ShopClient) -> Result<bool> {
        let Some(header) = self.store.get(SESSION_COOKIE_KEY)? else {
            return Ok(false);
        };
        client.add_cookies(&header, &client.url(CART_PATH)?);
        debug!("Restored session cookies");
        Ok(true)
    }

    /// Save the cookies `client` currently sends to the cart endpoint.
    ///
    /// A client holding none clears the saved value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written or the cart URL is
    /// invalid.
    #[instrument(skip_all)]
    pub fn persist(&self, client: &ShopClient) -> Result<()> {
        match client.cookie_header(&client.url(CART_PATH)?) {
            Some(header) => self.store.set(SESSION_COOKIE_KEY, &header),
            None => self.store.remove(SESSION_COOKIE_KEY),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::cart::LOCAL_CART_KEY;
    use crate::cart::storage::tests::temp_path;
    use crate::cart::storage::{JsonFileStore, MemoryStore};

    fn client() -> ShopClient {
        ShopClient::with_base_url(Url::parse("http://shop.test/").unwrap(), None).unwrap()
    }

    #[test]
    fn test_restore_without_saved_cookies() {
        let cookies = SessionCookies::new(MemoryStore::new());
        let client = client();

        assert!(!cookies.restore(&client).unwrap());
        assert_eq!(client.cookie_header(&client.url(CART_PATH).unwrap()), None);
    }

    #[test]
    fn test_persisted_cookies_reach_a_new_client() {
        let path = temp_path("storage.json");
        let first = client();
        first.add_cookies("session=abc", &first.url(CART_PATH).unwrap());
        SessionCookies::new(JsonFileStore::new(&path))
            .persist(&first)
            .unwrap();

        let second = client();
        assert!(
            SessionCookies::new(JsonFileStore::new(&path))
                .restore(&second)
                .unwrap()
        );

        let header = second.cookie_header(&second.url(CART_PATH).unwrap());
        assert_eq!(header.as_deref(), Some("session=abc"));
    }

    #[test]
    fn test_shares_file_with_local_cart() {
        let path = temp_path("storage.json");
        let store = JsonFileStore::new(&path);
        store.set(LOCAL_CART_KEY, "[]").unwrap();
        let client = client();
        client.add_cookies("session=abc", &client.url(CART_PATH).unwrap());

        SessionCookies::new(JsonFileStore::new(&path))
            .persist(&client)
            .unwrap();

        assert_eq!(store.get(LOCAL_CART_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(
            store.get(SESSION_COOKIE_KEY).unwrap().as_deref(),
            Some("session=abc")
        );
    }

    #[test]
    fn test_persist_without_cookies_clears() {
        let memory = MemoryStore::new();
        memory.set(SESSION_COOKIE_KEY, "session=old").unwrap();
        let cookies = SessionCookies::new(memory);

        cookies.persist(&client()).unwrap();

        assert!(!cookies.restore(&client()).unwrap());
    }
}
