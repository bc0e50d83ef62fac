//! The Small Storefront - ordering core.
//!
//! Client-side core of a restaurant ordering storefront: menu catalog,
//! cart, checkout, order lifecycle, admin triage, and realtime
//! synchronization against a hosted path-addressed JSON database. The
//! embedding application (desktop shell, kiosk, or server) wires these
//! pieces to its UI; nothing here renders.
//!
//! Construction order: [`logging::init`], then a [`StorefrontConfig`]
//! (usually [`StorefrontConfig::from_env`]), then [`Store::open`]. The
//! store restores device-persisted state on construction; subscriptions
//! deliver remote snapshots on background tasks and keep its caches
//! current until disposed.

pub mod admin;
pub mod backend;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod device;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod receipt;
pub mod store;

pub use config::StorefrontConfig;
pub use error::StoreError;
pub use gateway::{Gateway, Subscription};
pub use store::Store;
