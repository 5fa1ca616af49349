//! Unified error handling for admin operations.
//!
//! No admin error is retried and none leaves a partial change behind: the
//! server either applied the whole request or nothing.

use thiserror::Error;

use poojabdi_core::FormError;
use poojabdi_storefront::StorefrontError;

/// Errors from admin API calls.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The form failed local validation; nothing was sent.
    #[error("Invalid form: {0}")]
    Validation(#[from] FormError),

    /// Transport failure, non-success status or unparseable body.
    #[error("Request failed: {0}")]
    Transport(#[from] StorefrontError),

    /// The server answered `{"ok": false}`.
    #[error("{action} was rejected by the server")]
    Rejected {
        /// What was attempted, e.g. "Delete product".
        action: &'static str,
    },

    /// Inline edit answered with a status other than `"ok"`.
    #[error("Inline edit failed with status {0:?}")]
    EditFailed(String),
}

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_display() {
        let err = AdminError::Rejected {
            action: "Delete product",
        };
        assert_eq!(err.to_string(), "Delete product was rejected by the server");

        let err = AdminError::from(FormError::MissingName);
        assert_eq!(err.to_string(), "Invalid form: Please enter product name");

        let err = AdminError::EditFailed("error".to_string());
        assert_eq!(err.to_string(), "Inline edit failed with status \"error\"");
    }
}
