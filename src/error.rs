//! Error taxonomy, one enum per layer.
//!
//! Transport problems surface as [`BackendError`] with messages already
//! phrased for display, the gateway splits them into read/write failures,
//! and the store adds its own precondition failures on top. Checkout
//! validation errors live in [`crate::checkout`] and are wrapped here so a
//! single error type crosses the store boundary.

use thiserror::Error;

use crate::checkout::CheckoutRejection;
use crate::model::OrderStatus;

// ---------------------------------------------------------------------------
// Backend (transport)
// ---------------------------------------------------------------------------

/// Failure talking to the hosted realtime database.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Cannot reach the store database at {url}")]
    Unreachable { url: String },

    #[error("Connection to {url} timed out")]
    Timeout { url: String },

    #[error("Invalid store database URL: {url}")]
    InvalidUrl { url: String },

    /// Non-success HTTP status, already phrased for display.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid JSON from the store database: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Network error communicating with {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl BackendError {
    /// Map a `reqwest::Error` onto a user-presentable variant.
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() {
            return BackendError::Unreachable {
                url: url.to_string(),
            };
        }
        if source.is_timeout() {
            return BackendError::Timeout {
                url: url.to_string(),
            };
        }
        if source.is_builder() {
            return BackendError::InvalidUrl {
                url: url.to_string(),
            };
        }
        BackendError::Network {
            url: url.to_string(),
            source,
        }
    }

    /// Map a non-success HTTP status onto a user-presentable variant.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        let code = status.as_u16();
        let message = match code {
            401 | 403 => "Access to the store database was denied".to_string(),
            404 => "Store database path not found".to_string(),
            s if s >= 500 => format!("Store database server error (HTTP {s})"),
            s => format!("Unexpected response from the store database (HTTP {s})"),
        };
        BackendError::Status {
            status: code,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Failure of a typed gateway operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A remote write did not complete. The caller must not assume anything
    /// was persisted.
    #[error("{0}")]
    RemoteWrite(#[source] BackendError),

    /// A remote read or subscription attach failed.
    #[error("{0}")]
    RemoteRead(#[source] BackendError),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Failure of a store operation. Validation and precondition failures are
/// local-only; gateway failures mean remote state is unchanged as far as
/// this client knows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No order {order_id} in the local cache")]
    UnknownOrder { order_id: String },

    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Admin PIN rejected")]
    AdminPinRejected,

    #[error(transparent)]
    Checkout(#[from] CheckoutRejection),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    DeviceStorage(#[from] DeviceStorageError),
}

// ---------------------------------------------------------------------------
// Device storage
// ---------------------------------------------------------------------------

/// Failure of the on-device key-value store. Readers treat these as
/// "value absent"; only writers surface them.
#[derive(Debug, Error)]
pub enum DeviceStorageError {
    #[error("device storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("device storage: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("device storage serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ===========================================================================
// Tests
// ===========================================================================
