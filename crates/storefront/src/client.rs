//! Shared HTTP client for the shop's JSON endpoints.
//!
//! One `reqwest::Client` with a cookie store is shared by every store, so
//! the server-side session that owns the cart survives across requests.
//! The jar can be read out and seeded again, which lets a session outlive
//! the process (see [`SessionCookies`](crate::cart::SessionCookies)).

use std::sync::Arc;
use std::time::Duration;

use reqwest::RequestBuilder;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};

/// Longest body excerpt written to logs.
const LOG_BODY_CHARS: usize = 500;

/// HTTP client bound to one shop origin.
///
/// Cheaply cloneable; clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

struct ShopClientInner {
    client: reqwest::Client,
    cookies: Arc<Jar>,
    base_url: Url,
}

impl ShopClient {
    /// Create a client for the configured shop origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        Self::with_base_url(config.base_url.clone(), config.http_timeout)
    }

    /// Create a client for an explicit origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder().cookie_provider(Arc::clone(&cookies));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(ShopClientInner {
                client,
                cookies,
                base_url,
            }),
        })
    }

    /// The shop origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The underlying `reqwest` client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Resolve a path against the origin.
    ///
    /// Leading slashes are ignored so that origins with a path prefix keep it.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Cookies the jar would send to `url`, as a `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let header = self.inner.cookies.cookies(url)?;
        header.to_str().ok().map(str::to_string)
    }

    /// Seed the jar from a `Cookie` header value, scoped to `url`.
    ///
    /// Each `name=value` pair becomes a cookie without expiry.
    pub fn add_cookies(&self, header: &str, url: &Url) {
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.inner.cookies.add_cookie_str(pair, url);
        }
    }

    /// GET a path and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        self.execute_json(self.inner.client.get(url)).await
    }

    /// Send a request and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or bad JSON.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.execute(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Failed to parse shop response"
            );
            StorefrontError::Parse(e)
        })
    }

    /// Send a request and return the body text of a successful response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                url = %url,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Shop returned non-success status"
            );
            return Err(StorefrontError::status(status, &body));
        }

        debug!(status = %status, url = %url, bytes = body.len(), "Shop request completed");
        Ok(body)
    }
}

impl std::fmt::Debug for ShopClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_path_prefix() {
        let client =
            ShopClient::with_base_url(Url::parse("http://shop.test/store/").unwrap(), None)
                .unwrap();
        assert_eq!(
            client.url("/api/cart").unwrap().as_str(),
            "http://shop.test/store/api/cart"
        );
        assert_eq!(
            client.url("products.json").unwrap().as_str(),
            "http://shop.test/store/products.json"
        );
    }

    #[test]
    fn test_cookies_added_are_sent_back() {
        let client =
            ShopClient::with_base_url(Url::parse("http://shop.test/").unwrap(), None).unwrap();
        let cart = client.url("/api/cart").unwrap();
        assert_eq!(client.cookie_header(&cart), None);

        client.add_cookies("session=abc; theme=dark; junk", &cart);

        let header = client.cookie_header(&cart).unwrap();
        let mut pairs: Vec<&str> = header.split("; ").collect();
        pairs.sort_unstable();
        assert_eq!(pairs, ["session=abc", "theme=dark"]);

        let other = Url::parse("http://elsewhere.test/api/cart").unwrap();
        assert_eq!(client.cookie_header(&other), None);
    }

    #[test]
    fn test_debug_shows_origin() {
        let client =
            ShopClient::with_base_url(Url::parse("http://shop.test/").unwrap(), None).unwrap();
        assert!(format!("{client:?}").contains("http://shop.test/"));
    }
}
