//! Typed operations over the three remote collections: orders, products,
//! and the settings singleton.
//!
//! The gateway owns the wire shape (camelCase JSON records keyed by
//! push-style ids) and the ordering contract for order snapshots (newest
//! first). It performs no transition-legality checks; callers validate
//! before writing. Subscriptions run as background tasks handed back as
//! [`Subscription`] handles; dropping a handle without calling
//! [`Subscription::dispose`] leaves the listener running.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{RealtimeBackend, WatchStream};
use crate::error::GatewayError;
use crate::model::{
    MenuItem, Order, OrderDraft, OrderStatus, ProductDraft, SettingsPatch, StoreSettings,
};

const ORDERS: &str = "orders";
const PRODUCTS: &str = "products";
const SETTINGS: &str = "settings";

// ---------------------------------------------------------------------------
// Subscription handle
// ---------------------------------------------------------------------------

/// Handle to a live listener. The listener keeps delivering snapshots until
/// `dispose` is called or the underlying stream ends; there is deliberately
/// no `Drop` hook, so a handle dropped without `dispose` leaks the listener
/// for the lifetime of the stream.
pub struct Subscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivery and release the watch stream. Idempotent.
    pub fn dispose(&self) {
        self.token.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the listener task to exit. After this returns no further
    /// snapshot is delivered.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn RealtimeBackend>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn RealtimeBackend>) -> Self {
        Self { backend }
    }

    // -- Orders -------------------------------------------------------------

    /// Persist a new order in a single write and return it as stored.
    ///
    /// The gateway assigns the identifier, stamps `createdAt`, and sets the
    /// initial `pending` status. On error nothing was persisted as far as
    /// this client knows, and the caller must not assume otherwise.
    pub async fn create_order(&self, draft: OrderDraft) -> Result<Order, GatewayError> {
        let order = Order {
            id: self.backend.generate_key(),
            items: draft.items,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            customer_address: draft.customer_address,
            status: OrderStatus::Pending,
            total: draft.total,
            created_at: chrono::Utc::now().timestamp_millis(),
            updated_at: None,
            payment_method: draft.payment_method,
            receipt_image: draft.receipt_image,
        };
        let record = serde_json::to_value(&order).map_err(|e| GatewayError::RemoteWrite(e.into()))?;
        self.backend
            .set(&format!("{ORDERS}/{}", order.id), record)
            .await
            .map_err(GatewayError::RemoteWrite)?;
        info!(
            order_id = %order.id,
            total = order.total,
            items = order.items.len(),
            "order created"
        );
        Ok(order)
    }

    /// Merge `{status, updatedAt}` into an existing order record and return
    /// the stamp used, so callers can mirror it locally. No legality check
    /// here: the lifecycle table is enforced by the caller.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<i64, GatewayError> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        let patch = json!({ "status": status, "updatedAt": updated_at });
        self.backend
            .update(&format!("{ORDERS}/{order_id}"), patch)
            .await
            .map_err(GatewayError::RemoteWrite)?;
        info!(order_id, status = %status, "order status updated");
        Ok(updated_at)
    }

    /// Listen to the whole orders collection. Fires once immediately with
    /// the current snapshot (empty if absent), then on every remote change,
    /// always sorted by creation time descending.
    pub async fn subscribe_to_orders<F>(&self, on_snapshot: F) -> Result<Subscription, GatewayError>
    where
        F: Fn(Vec<Order>) + Send + 'static,
    {
        let stream = self
            .backend
            .watch(ORDERS)
            .await
            .map_err(GatewayError::RemoteRead)?;
        Ok(spawn_watch(stream, ORDERS, decode_orders, on_snapshot))
    }

    /// Listen to a single order record. Fires with `None` while the record
    /// is absent or undecodable.
    pub async fn subscribe_to_order<F>(
        &self,
        order_id: &str,
        on_snapshot: F,
    ) -> Result<Subscription, GatewayError>
    where
        F: Fn(Option<Order>) + Send + 'static,
    {
        let stream = self
            .backend
            .watch(&format!("{ORDERS}/{order_id}"))
            .await
            .map_err(GatewayError::RemoteRead)?;
        let order_id = order_id.to_string();
        Ok(spawn_watch(
            stream,
            ORDERS,
            move |snapshot| decode_order(snapshot, &order_id),
            on_snapshot,
        ))
    }

    // -- Products -----------------------------------------------------------

    pub async fn create_product(&self, draft: ProductDraft) -> Result<MenuItem, GatewayError> {
        let item = draft.into_item(self.backend.generate_key());
        let record = serde_json::to_value(&item).map_err(|e| GatewayError::RemoteWrite(e.into()))?;
        self.backend
            .set(&format!("{PRODUCTS}/{}", item.id), record)
            .await
            .map_err(GatewayError::RemoteWrite)?;
        info!(product_id = %item.id, name = %item.name, "product created");
        Ok(item)
    }

    /// Overwrite a catalog entry in place. There is no versioning.
    pub async fn update_product(&self, item: &MenuItem) -> Result<(), GatewayError> {
        let record = serde_json::to_value(item).map_err(|e| GatewayError::RemoteWrite(e.into()))?;
        self.backend
            .set(&format!("{PRODUCTS}/{}", item.id), record)
            .await
            .map_err(GatewayError::RemoteWrite)?;
        debug!(product_id = %item.id, "product updated");
        Ok(())
    }

    /// Flip only the availability flag, leaving the rest of the record
    /// untouched.
    pub async fn set_product_availability(
        &self,
        product_id: &str,
        is_available: bool,
    ) -> Result<(), GatewayError> {
        self.backend
            .update(
                &format!("{PRODUCTS}/{product_id}"),
                json!({ "isAvailable": is_available }),
            )
            .await
            .map_err(GatewayError::RemoteWrite)?;
        debug!(product_id, is_available, "product availability changed");
        Ok(())
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), GatewayError> {
        self.backend
            .remove(&format!("{PRODUCTS}/{product_id}"))
            .await
            .map_err(GatewayError::RemoteWrite)?;
        info!(product_id, "product deleted");
        Ok(())
    }

    /// Listen to the product catalog. Snapshot order follows the stored key
    /// order, which for push-style ids is creation order.
    pub async fn subscribe_to_products<F>(
        &self,
        on_snapshot: F,
    ) -> Result<Subscription, GatewayError>
    where
        F: Fn(Vec<MenuItem>) + Send + 'static,
    {
        let stream = self
            .backend
            .watch(PRODUCTS)
            .await
            .map_err(GatewayError::RemoteRead)?;
        Ok(spawn_watch(stream, PRODUCTS, decode_products, on_snapshot))
    }

    /// One-time catalog seed: inserts the given defaults only when the
    /// collection holds no products. Sequential, not atomic; a crash
    /// mid-seed leaves a partial catalog, acceptable for an administrative
    /// bootstrap. Returns whether seeding ran.
    pub async fn initialize_menu(&self, defaults: &[ProductDraft]) -> Result<bool, GatewayError> {
        let existing = self
            .backend
            .get(PRODUCTS)
            .await
            .map_err(GatewayError::RemoteRead)?;
        let empty = match existing.as_object() {
            Some(map) => map.is_empty(),
            None => existing.is_null(),
        };
        if !empty {
            return Ok(false);
        }
        info!(count = defaults.len(), "seeding empty product catalog");
        for draft in defaults {
            self.create_product(draft.clone()).await?;
        }
        Ok(true)
    }

    // -- Settings -----------------------------------------------------------

    /// Shallow-merge a partial settings update into the singleton record.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<(), GatewayError> {
        let record = serde_json::to_value(&patch).map_err(|e| GatewayError::RemoteWrite(e.into()))?;
        self.backend
            .update(SETTINGS, record)
            .await
            .map_err(GatewayError::RemoteWrite)?;
        info!(?patch, "store settings updated");
        Ok(())
    }

    /// Listen to the settings singleton. If the remote record is absent the
    /// defaults are written back once and delivered, so later readers
    /// observe a materialized record.
    pub async fn subscribe_to_settings<F>(
        &self,
        on_snapshot: F,
    ) -> Result<Subscription, GatewayError>
    where
        F: Fn(StoreSettings) + Send + 'static,
    {
        let stream = self
            .backend
            .watch(SETTINGS)
            .await
            .map_err(GatewayError::RemoteRead)?;
        let backend = Arc::clone(&self.backend);
        let token = CancellationToken::new();
        let watcher = token.clone();
        let task = tokio::spawn(async move {
            let mut stream = stream;
            let mut materialized = false;
            loop {
                let snapshot = tokio::select! {
                    _ = watcher.cancelled() => break,
                    next = stream.next() => match next {
                        Some(value) => value,
                        None => {
                            debug!(collection = SETTINGS, "watch stream ended");
                            break;
                        }
                    },
                };
                let settings = match decode_settings(&snapshot) {
                    Some(settings) => settings,
                    None => {
                        let defaults = StoreSettings::default();
                        if !materialized {
                            materialized = true;
                            match serde_json::to_value(&defaults) {
                                Ok(record) => match backend.update(SETTINGS, record).await {
                                    Ok(()) => info!("materialized default settings record"),
                                    Err(error) => {
                                        warn!(error = %error, "could not materialize default settings");
                                    }
                                },
                                Err(error) => {
                                    warn!(error = %error, "could not encode default settings");
                                }
                            }
                        }
                        defaults
                    }
                };
                on_snapshot(settings);
            }
        });
        Ok(Subscription { token, task })
    }
}

/// Drives one watch stream until disposal or stream end, decoding each
/// snapshot and handing it to the callback.
fn spawn_watch<T, D, F>(
    stream: WatchStream,
    collection: &'static str,
    decode: D,
    on_snapshot: F,
) -> Subscription
where
    T: Send + 'static,
    D: Fn(&Value) -> T + Send + 'static,
    F: Fn(T) + Send + 'static,
{
    let token = CancellationToken::new();
    let watcher = token.clone();
    let task = tokio::spawn(async move {
        let mut stream = stream;
        loop {
            let snapshot = tokio::select! {
                _ = watcher.cancelled() => break,
                next = stream.next() => match next {
                    Some(value) => value,
                    None => {
                        debug!(collection, "watch stream ended");
                        break;
                    }
                },
            };
            on_snapshot(decode(&snapshot));
        }
    });
    Subscription { token, task }
}

// ---------------------------------------------------------------------------
// Snapshot decoding
// ---------------------------------------------------------------------------

/// Decode an orders collection snapshot. The record's key wins over any
/// embedded id field, undecodable records are skipped with a warning, and
/// the result is sorted by creation time descending.
fn decode_orders(snapshot: &Value) -> Vec<Order> {
    let Some(map) = snapshot.as_object() else {
        return Vec::new();
    };
    let mut orders: Vec<Order> = Vec::with_capacity(map.len());
    for (id, raw) in map {
        match decode_order(raw, id) {
            Some(order) => orders.push(order),
            None => warn!(order_id = %id, "skipping undecodable order record"),
        }
    }
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

fn decode_order(snapshot: &Value, order_id: &str) -> Option<Order> {
    if snapshot.is_null() {
        return None;
    }
    let mut record = snapshot.clone();
    if let Value::Object(fields) = &mut record {
        fields.insert("id".to_string(), Value::String(order_id.to_string()));
    }
    match serde_json::from_value(record) {
        Ok(order) => Some(order),
        Err(error) => {
            debug!(order_id, error = %error, "order record did not decode");
            None
        }
    }
}

fn decode_products(snapshot: &Value) -> Vec<MenuItem> {
    let Some(map) = snapshot.as_object() else {
        return Vec::new();
    };
    let mut items: Vec<MenuItem> = Vec::with_capacity(map.len());
    for (id, raw) in map {
        let mut record = raw.clone();
        if let Value::Object(fields) = &mut record {
            fields.insert("id".to_string(), Value::String(id.clone()));
        }
        match serde_json::from_value(record) {
            Ok(item) => items.push(item),
            Err(error) => warn!(product_id = %id, error = %error, "skipping undecodable product record"),
        }
    }
    items
}

/// `None` means the record is absent and should be materialized; a present
/// but undecodable record falls back to defaults without a write-back.
fn decode_settings(snapshot: &Value) -> Option<StoreSettings> {
    if snapshot.is_null() {
        return None;
    }
    match serde_json::from_value(snapshot.clone()) {
        Ok(settings) => Some(settings),
        Err(error) => {
            warn!(error = %error, "undecodable settings record, using defaults");
            Some(StoreSettings::default())
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
