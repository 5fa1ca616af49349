//! Admin API client.
//!
//! # Endpoints
//!
//! - `POST /admin/api/product` (multipart) - create a product
//! - `PUT /admin/api/product` (multipart) - update a product
//! - `DELETE /admin/api/product` (JSON `{id}`) - delete a product
//! - `POST /admin/api/settings` (multipart) - save site settings
//! - `POST /api/update_product/{id}` (url-encoded) - inline edit
//!
//! Product and settings endpoints answer `{"ok": bool}`; the inline edit
//! answers `{"status": "ok"}` on success.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use poojabdi_core::{InlineEdit, ProductForm, ProductId, SiteSettings};
use poojabdi_storefront::{ShopClient, StorefrontConfig};

use crate::error::{AdminError, Result};

/// Product CRUD endpoint path.
pub const PRODUCT_PATH: &str = "/admin/api/product";
/// Site settings endpoint path.
pub const SETTINGS_PATH: &str = "/admin/api/settings";
/// Prompt shown before deleting a product.
pub const DELETE_CONFIRMATION: &str = "Delete product?";

/// Result of an admin action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    /// The server applied the change; the caller should reload.
    Applied,
    /// The user declined the confirmation; no request was sent.
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct OkResponse {
    #[serde(default)]
    ok: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct DeleteBody {
    id: ProductId,
}

/// Client for the admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: ShopClient,
}

impl AdminClient {
    /// Create a client for the configured admin origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let client = ShopClient::with_base_url(config.admin_url.clone(), config.http_timeout)?;
        Ok(Self { client })
    }

    /// Wrap an existing shop client.
    #[must_use]
    pub const fn with_client(client: ShopClient) -> Self {
        Self { client }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` without sending anything if the form
    /// is invalid, `AdminError::Rejected` on `{"ok": false}`, or a transport
    /// error.
    #[instrument(skip_all, fields(name = %form.name_en))]
    pub async fn create_product(&self, form: &ProductForm) -> Result<AdminOutcome> {
        form.validate()?;
        let create = ProductForm {
            id: None,
            ..form.clone()
        };
        let request = self
            .client
            .http()
            .post(self.client.url(PRODUCT_PATH)?)
            .multipart(multipart(create.fields()));
        self.expect_ok("Create product", request).await
    }

    /// Update a product; the form must carry an id.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` without sending anything if the form
    /// is invalid, `AdminError::Rejected` on `{"ok": false}`, or a transport
    /// error.
    #[instrument(skip_all, fields(id = ?form.id))]
    pub async fn update_product(&self, form: &ProductForm) -> Result<AdminOutcome> {
        form.validate_update()?;
        let request = self
            .client
            .http()
            .put(self.client.url(PRODUCT_PATH)?)
            .multipart(multipart(form.fields()));
        self.expect_ok("Update product", request).await
    }

    /// Delete a product after asking `confirm`.
    ///
    /// If `confirm` returns `false` nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Rejected` on `{"ok": false}` or a transport error.
    #[instrument(skip(self, confirm))]
    pub async fn delete_product<F>(&self, id: ProductId, confirm: F) -> Result<AdminOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(DELETE_CONFIRMATION) {
            info!("Delete cancelled");
            return Ok(AdminOutcome::Cancelled);
        }
        let request = self
            .client
            .http()
            .delete(self.client.url(PRODUCT_PATH)?)
            .json(&DeleteBody { id });
        self.expect_ok("Delete product", request).await
    }

    /// Save site settings.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Rejected` on `{"ok": false}` or a transport error.
    #[instrument(skip_all, fields(fields = settings.fields.len()))]
    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<AdminOutcome> {
        let fields = settings
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));
        let request = self
            .client
            .http()
            .post(self.client.url(SETTINGS_PATH)?)
            .multipart(multipart(fields));
        self.expect_ok("Save settings", request).await
    }

    /// Change a product's name and/or display price in place.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` for an empty edit,
    /// `AdminError::EditFailed` when the status is not `"ok"`, or a
    /// transport error.
    #[instrument(skip(self, edit))]
    pub async fn update_product_field(
        &self,
        id: ProductId,
        edit: &InlineEdit,
    ) -> Result<AdminOutcome> {
        edit.validate()?;
        let request = self
            .client
            .http()
            .post(self.client.url(&format!("/api/update_product/{id}"))?)
            .form(edit);
        let response: StatusResponse = self.client.execute_json(request).await?;
        if response.status != "ok" {
            warn!(status = %response.status, "Inline edit failed");
            return Err(AdminError::EditFailed(response.status));
        }
        info!("Inline edit applied");
        Ok(AdminOutcome::Applied)
    }

    async fn expect_ok(
        &self,
        action: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<AdminOutcome> {
        let response: OkResponse = self.client.execute_json(request).await?;
        if !response.ok {
            warn!(action, "Admin request rejected");
            return Err(AdminError::Rejected { action });
        }
        info!(action, "Admin request applied");
        Ok(AdminOutcome::Applied)
    }
}

fn multipart<K, V, I>(fields: I) -> Form
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<std::borrow::Cow<'static, str>>,
    V: Into<std::borrow::Cow<'static, str>>,
{
    fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}
