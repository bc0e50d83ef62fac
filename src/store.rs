//! Process-wide client state store.
//!
//! Owns the cart, the orders cache, the current (tracked) order, the
//! mirrored settings snapshot, the saved customer profile, and the admin
//! session flag, all behind one mutex. Gateway calls are async
//! suspension points; the lock is never held across an await. Operations
//! that combine local state and a remote call read under the lock, drop it,
//! await, then re-lock to commit, so a failed remote call leaves local
//! state untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::backend::{MemoryBackend, RealtimeBackend, RestBackend};
use crate::checkout::{self, CheckoutForm};
use crate::config::StorefrontConfig;
use crate::device::DeviceStorage;
use crate::error::StoreError;
use crate::gateway::{Gateway, Subscription};
use crate::model::{
    CartItem, Extra, MenuItem, Order, OrderDraft, OrderStatus, PaymentMethod, SavedUserInfo,
    StoreSettings,
};

#[derive(Default)]
struct StoreState {
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    current_order: Option<Order>,
    settings: StoreSettings,
    saved_user_info: Option<SavedUserInfo>,
    is_admin: bool,
    is_loading_orders: bool,
}

pub struct Store {
    gateway: Gateway,
    device: Arc<DeviceStorage>,
    admin_pin: String,
    state: Arc<Mutex<StoreState>>,
}

impl Store {
    /// Build a store on an existing gateway and device storage, restoring
    /// the persisted cart, saved user info, and admin session flag. All
    /// three tolerate absent or corrupt storage.
    pub fn new(gateway: Gateway, device: Arc<DeviceStorage>, admin_pin: impl Into<String>) -> Self {
        let cart = device.load_cart();
        let saved_user_info = device.load_user_info();
        let is_admin = device.load_admin_session();
        info!(
            cart_lines = cart.len(),
            has_saved_info = saved_user_info.is_some(),
            is_admin,
            "store initialized from device state"
        );
        Self {
            gateway,
            device,
            admin_pin: admin_pin.into(),
            state: Arc::new(Mutex::new(StoreState {
                cart,
                saved_user_info,
                is_admin,
                ..StoreState::default()
            })),
        }
    }

    /// Assemble a store from configuration: REST backend when a database
    /// URL is configured, in-memory otherwise.
    pub fn open(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let backend: Arc<dyn RealtimeBackend> = match &config.database_url {
            Some(url) => Arc::new(RestBackend::new(url, config.auth_token.clone())?),
            None => {
                warn!("no database URL configured, using in-memory backend");
                Arc::new(MemoryBackend::new())
            }
        };
        let device = Arc::new(DeviceStorage::open(&config.data_dir)?);
        Ok(Self::new(
            Gateway::new(backend),
            device,
            config.admin_pin.clone(),
        ))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort cart persistence: failure means the cart won't survive a
    /// restart, not that the mutation failed.
    fn persist_cart(&self, cart: &[CartItem]) {
        if let Err(error) = self.device.save_cart(cart) {
            warn!(error = %error, "could not persist cart");
        }
    }

    // -- Cart ----------------------------------------------------------------

    /// Append a new cart line. Always a new line with a fresh local id,
    /// even when an identical item/extras/notes combination already exists.
    pub fn add_to_cart(
        &self,
        item: MenuItem,
        quantity: u32,
        extras: Vec<Extra>,
        notes: impl Into<String>,
    ) -> CartItem {
        let line = CartItem {
            id: uuid::Uuid::new_v4().to_string(),
            menu_item: item,
            quantity,
            selected_extras: extras,
            special_notes: notes.into(),
        };
        let mut state = self.lock();
        state.cart.push(line.clone());
        debug!(cart_item_id = %line.id, quantity, "cart line added");
        self.persist_cart(&state.cart);
        line
    }

    pub fn remove_from_cart(&self, cart_item_id: &str) {
        let mut state = self.lock();
        state.cart.retain(|line| line.id != cart_item_id);
        self.persist_cart(&state.cart);
    }

    /// Set a line's quantity as given; callers clamp to ≥1 before calling.
    /// Unknown line ids are ignored.
    pub fn update_quantity(&self, cart_item_id: &str, quantity: u32) {
        let mut state = self.lock();
        if let Some(line) = state.cart.iter_mut().find(|line| line.id == cart_item_id) {
            line.quantity = quantity;
        }
        self.persist_cart(&state.cart);
    }

    pub fn clear_cart(&self) {
        let mut state = self.lock();
        state.cart.clear();
        self.persist_cart(&state.cart);
    }

    pub fn cart(&self) -> Vec<CartItem> {
        self.lock().cart.clone()
    }

    /// Σ over lines of (unit price + Σ extra prices) × quantity.
    pub fn cart_total(&self) -> f64 {
        self.lock().cart.iter().map(CartItem::line_total).sum()
    }

    /// Σ of quantities, not line count.
    pub fn cart_count(&self) -> u32 {
        self.lock().cart.iter().map(|line| line.quantity).sum()
    }

    // -- Orders --------------------------------------------------------------

    /// Run the checkout gate and submit the cart as a new order.
    ///
    /// All-or-nothing: the cart is cleared, the order cached, the current
    /// order set, and the customer info saved only after the gateway write
    /// succeeds. On any failure local state is exactly what it was.
    pub async fn create_order(
        &self,
        name: &str,
        phone: &str,
        address: &str,
        payment_method: PaymentMethod,
        receipt_image: Option<String>,
    ) -> Result<Order, StoreError> {
        let draft = {
            let state = self.lock();
            let form = CheckoutForm {
                name,
                phone,
                address,
                payment_method,
                receipt_image: receipt_image.as_deref(),
            };
            checkout::validate(&state.cart, &state.settings, &form)?;
            OrderDraft {
                items: state.cart.clone(),
                customer_name: name.trim().to_string(),
                customer_phone: phone.trim().to_string(),
                customer_address: address.trim().to_string(),
                total: state.cart.iter().map(CartItem::line_total).sum(),
                payment_method,
                receipt_image,
            }
        };

        let order = self.gateway.create_order(draft).await?;

        let saved = SavedUserInfo {
            name: order.customer_name.clone(),
            phone: order.customer_phone.clone(),
            address: order.customer_address.clone(),
        };
        {
            let mut state = self.lock();
            upsert_order(&mut state.orders, order.clone());
            state.current_order = Some(order.clone());
            state.saved_user_info = Some(saved.clone());
            state.cart.clear();
            self.persist_cart(&state.cart);
        }
        if let Err(error) = self.device.save_user_info(&saved) {
            warn!(error = %error, "could not persist saved user info");
        }
        info!(order_id = %order.id, total = order.total, "order submitted");
        Ok(order)
    }

    /// Move a cached order to a new status: validate the transition against
    /// the lifecycle table first, write remotely, then patch the cache
    /// optimistically. The patch is idempotent with the subscription echo.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        {
            let state = self.lock();
            let current = state
                .orders
                .iter()
                .find(|order| order.id == order_id)
                .or(state
                    .current_order
                    .as_ref()
                    .filter(|order| order.id == order_id))
                .map(|order| order.status)
                .ok_or_else(|| StoreError::UnknownOrder {
                    order_id: order_id.to_string(),
                })?;
            if !current.can_transition_to(status) {
                return Err(StoreError::IllegalTransition {
                    order_id: order_id.to_string(),
                    from: current,
                    to: status,
                });
            }
        }

        let updated_at = self.gateway.update_order_status(order_id, status).await?;

        let mut state = self.lock();
        if let Some(order) = state.orders.iter_mut().find(|order| order.id == order_id) {
            order.status = status;
            order.updated_at = Some(updated_at);
        }
        if let Some(current) = state
            .current_order
            .as_mut()
            .filter(|order| order.id == order_id)
        {
            current.status = status;
            current.updated_at = Some(updated_at);
        }
        Ok(())
    }

    /// Cancel an order; legal only while it is still pending.
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), StoreError> {
        self.update_order_status(order_id, OrderStatus::Cancelled).await
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    pub fn order_by_id(&self, order_id: &str) -> Option<Order> {
        self.lock()
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
    }

    pub fn current_order(&self) -> Option<Order> {
        self.lock().current_order.clone()
    }

    /// All cached orders with this exact customer phone, newest first,
    /// including cancelled ones.
    pub fn user_orders(&self, phone: &str) -> Vec<Order> {
        self.lock()
            .orders
            .iter()
            .filter(|order| order.customer_phone == phone)
            .cloned()
            .collect()
    }

    pub fn is_loading_orders(&self) -> bool {
        self.lock().is_loading_orders
    }

    // -- Subscriptions -------------------------------------------------------

    /// Mirror the whole orders collection into the cache. Every snapshot
    /// fully replaces the cached list; the loading flag is set now and
    /// cleared on the first delivery. Subscribing twice without disposing
    /// registers duplicate listeners.
    pub async fn subscribe_to_all_orders(&self) -> Result<Subscription, StoreError> {
        self.lock().is_loading_orders = true;
        let state = Arc::clone(&self.state);
        let subscription = self
            .gateway
            .subscribe_to_orders(move |orders| {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.orders = orders;
                state.is_loading_orders = false;
            })
            .await?;
        Ok(subscription)
    }

    /// Track one order: each delivered snapshot becomes the current order
    /// and replaces the matching cache entry if present. An absent record
    /// delivers nothing, leaving cached state as-is.
    pub async fn subscribe_to_order_updates(
        &self,
        order_id: &str,
    ) -> Result<Subscription, StoreError> {
        let state = Arc::clone(&self.state);
        let subscription = self
            .gateway
            .subscribe_to_order(order_id, move |order| {
                let Some(order) = order else {
                    return;
                };
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(slot) = state.orders.iter_mut().find(|o| o.id == order.id) {
                    *slot = order.clone();
                }
                state.current_order = Some(order);
            })
            .await?;
        Ok(subscription)
    }

    /// Mirror the settings record so the checkout gate reads a current
    /// snapshot without a remote round trip.
    pub async fn subscribe_to_settings(&self) -> Result<Subscription, StoreError> {
        let state = Arc::clone(&self.state);
        let subscription = self
            .gateway
            .subscribe_to_settings(move |settings| {
                state.lock().unwrap_or_else(PoisonError::into_inner).settings = settings;
            })
            .await?;
        Ok(subscription)
    }

    pub fn settings(&self) -> StoreSettings {
        self.lock().settings.clone()
    }

    pub fn saved_user_info(&self) -> Option<SavedUserInfo> {
        self.lock().saved_user_info.clone()
    }

    // -- Admin session -------------------------------------------------------

    /// Plaintext comparison against the configured PIN. A convenience gate,
    /// not a security control. On match the session flag is persisted so it
    /// survives restarts.
    pub fn login(&self, pin: &str) -> Result<(), StoreError> {
        if pin != self.admin_pin {
            warn!("admin login rejected");
            return Err(StoreError::AdminPinRejected);
        }
        self.lock().is_admin = true;
        if let Err(error) = self.device.save_admin_session(true) {
            warn!(error = %error, "could not persist admin session");
        }
        info!("admin session started");
        Ok(())
    }

    pub fn logout(&self) {
        self.lock().is_admin = false;
        if let Err(error) = self.device.save_admin_session(false) {
            warn!(error = %error, "could not clear admin session");
        }
        info!("admin session ended");
    }

    pub fn is_admin(&self) -> bool {
        self.lock().is_admin
    }
}

/// Replace by id, or insert keeping the newest-first ordering. The insert
/// path also covers a subscription echo landing before the create commit
/// re-acquires the lock.
fn upsert_order(orders: &mut Vec<Order>, order: Order) {
    match orders.iter_mut().find(|o| o.id == order.id) {
        Some(slot) => *slot = order,
        None => {
            orders.push(order);
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutRejection;
    use crate::error::BackendError;
    use crate::model::Category;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn store() -> (Arc<MemoryBackend>, Store) {
        let backend = Arc::new(MemoryBackend::new());
        let gateway = Gateway::new(backend.clone());
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        (backend, Store::new(gateway, device, "1234"))
    }

    fn item(name: &str, price: f64) -> MenuItem {
        MenuItem {
            id: format!("item-{name}"),
            name: name.to_string(),
            price,
            category: Category::Shawarma,
            ..MenuItem::default()
        }
    }

    fn extra(name: &str, price: f64) -> Extra {
        Extra {
            id: format!("extra-{name}"),
            name: name.to_string(),
            price,
        }
    }

    async fn eventually(check: impl Fn() -> bool) {
        for _ in 0..500 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not met in time");
    }

    /// Backend whose every operation fails, for all-or-nothing tests.
    struct FailingBackend;

    fn unreachable_err() -> BackendError {
        BackendError::Unreachable {
            url: "https://db.invalid".to_string(),
        }
    }

    #[async_trait]
    impl RealtimeBackend for FailingBackend {
        async fn get(&self, _path: &str) -> Result<Value, BackendError> {
            Err(unreachable_err())
        }
        async fn set(&self, _path: &str, _value: Value) -> Result<(), BackendError> {
            Err(unreachable_err())
        }
        async fn update(&self, _path: &str, _patch: Value) -> Result<(), BackendError> {
            Err(unreachable_err())
        }
        async fn remove(&self, _path: &str) -> Result<(), BackendError> {
            Err(unreachable_err())
        }
        async fn watch(&self, _path: &str) -> Result<crate::backend::WatchStream, BackendError> {
            Err(unreachable_err())
        }
    }

    fn failing_store() -> Store {
        let gateway = Gateway::new(Arc::new(FailingBackend));
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        Store::new(gateway, device, "1234")
    }

    #[test]
    fn store_restores_persisted_device_state() {
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        device
            .save_cart(&[CartItem {
                id: "line-1".to_string(),
                menu_item: item("Falafel", 3.0),
                quantity: 2,
                ..CartItem::default()
            }])
            .unwrap();
        device
            .save_user_info(&SavedUserInfo {
                name: "Returning Customer".to_string(),
                phone: "0512345678".to_string(),
                address: "14 Harbor Road, Old Town".to_string(),
            })
            .unwrap();
        device.save_admin_session(true).unwrap();

        let gateway = Gateway::new(Arc::new(MemoryBackend::new()));
        let store = Store::new(gateway, device, "1234");

        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart_count(), 2);
        assert!(store.saved_user_info().is_some());
        assert!(store.is_admin());
    }

    #[test]
    fn add_to_cart_always_appends_a_new_line() {
        let (_backend, store) = store();
        let first = store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        let second = store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");

        assert_ne!(first.id, second.id);
        assert_eq!(store.cart().len(), 2);
        assert_eq!(store.cart_count(), 2);
    }

    #[test]
    fn cart_mutations_persist_to_device() {
        let backend = Arc::new(MemoryBackend::new());
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        let store = Store::new(Gateway::new(backend), device.clone(), "1234");

        let line = store.add_to_cart(item("Shawarma", 5.0), 2, Vec::new(), "");
        assert_eq!(device.load_cart().len(), 1);

        store.update_quantity(&line.id, 5);
        assert_eq!(device.load_cart()[0].quantity, 5);

        store.remove_from_cart(&line.id);
        assert!(device.load_cart().is_empty());
    }

    #[test]
    fn cart_total_includes_extras_per_unit() {
        let (_backend, store) = store();
        store.add_to_cart(
            item("Shawarma", 5.0),
            2,
            vec![extra("Fries", 1.5)],
            "extra garlic",
        );
        store.add_to_cart(item("Cola", 1.0), 3, Vec::new(), "");
        // (5.0 + 1.5) * 2 + 1.0 * 3
        assert!((store.cart_total() - 16.0).abs() < f64::EPSILON);
        assert_eq!(store.cart_count(), 5);
    }

    #[test]
    fn update_quantity_ignores_unknown_lines() {
        let (_backend, store) = store();
        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        store.update_quantity("no-such-line", 9);
        assert_eq!(store.cart()[0].quantity, 1);
    }

    #[tokio::test]
    async fn create_order_commits_everything_on_success() {
        let backend = Arc::new(MemoryBackend::new());
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        let store = Store::new(Gateway::new(backend), device.clone(), "1234");

        store.add_to_cart(item("Shawarma", 5.0), 2, Vec::new(), "");
        let order = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!((order.total - 10.0).abs() < f64::EPSILON);

        // Cache, current order, saved info, and cart all committed at once.
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.current_order().unwrap().id, order.id);
        assert_eq!(
            store.saved_user_info().unwrap().phone,
            "0512345678".to_string()
        );
        assert!(store.cart().is_empty());
        assert!(device.load_cart().is_empty());
        assert_eq!(device.load_user_info().unwrap().name, "Walk-in Customer");
    }

    #[tokio::test]
    async fn create_order_rejects_before_any_remote_call() {
        // A failing backend proves rejection happens before the gateway:
        // a remote call would error differently.
        let store = failing_store();
        let err = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Checkout(CheckoutRejection::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn create_order_failure_leaves_state_untouched() {
        let store = failing_store();
        store.add_to_cart(item("Shawarma", 5.0), 2, Vec::new(), "");

        let err = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Gateway(_)));

        // No cache mutation, no cart clear, no saved-info update.
        assert_eq!(store.cart().len(), 1);
        assert!(store.orders().is_empty());
        assert!(store.current_order().is_none());
        assert!(store.saved_user_info().is_none());
    }

    #[tokio::test]
    async fn status_updates_validate_against_the_lifecycle_table() {
        let (_backend, store) = store();
        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        let order = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        // pending -> preparing is legal and patches the cache.
        store
            .update_order_status(&order.id, OrderStatus::Preparing)
            .await
            .unwrap();
        let cached = store.order_by_id(&order.id).unwrap();
        assert_eq!(cached.status, OrderStatus::Preparing);
        assert!(cached.updated_at.is_some());
        assert_eq!(
            store.current_order().unwrap().status,
            OrderStatus::Preparing
        );

        // preparing -> delivered skips a stage.
        let err = store
            .update_order_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));

        // Unknown order id.
        let err = store
            .update_order_status("no-such-order", OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownOrder { .. }));
    }

    #[tokio::test]
    async fn cancel_is_legal_only_while_pending() {
        let (_backend, store) = store();
        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        let order = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        store
            .update_order_status(&order.id, OrderStatus::Preparing)
            .await
            .unwrap();
        let err = store.cancel_order(&order.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::IllegalTransition {
                to: OrderStatus::Cancelled,
                ..
            }
        ));

        store.add_to_cart(item("Cola", 1.0), 25, Vec::new(), "");
        let fresh = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();
        store.cancel_order(&fresh.id).await.unwrap();
        assert_eq!(
            store.order_by_id(&fresh.id).unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn orders_subscription_mirrors_remote_snapshots() {
        let (backend, store) = store();
        backend.seed(
            "orders/seed-1",
            json!({
                "customerName": "Customer Number One",
                "customerPhone": "0511111111",
                "customerAddress": "1 First Street, Town",
                "total": 10.0,
                "status": "pending",
                "createdAt": 1_000i64
            }),
        );

        assert!(!store.is_loading_orders());
        let sub = store.subscribe_to_all_orders().await.unwrap();

        eventually(|| store.orders().len() == 1).await;
        assert!(!store.is_loading_orders());
        assert_eq!(store.orders()[0].id, "seed-1");

        // A remote status change arrives through the echo.
        backend
            .update("orders/seed-1", json!({"status": "preparing"}))
            .await
            .unwrap();
        eventually(|| store.orders()[0].status == OrderStatus::Preparing).await;

        sub.dispose();
    }

    #[tokio::test]
    async fn order_subscription_tracks_current_order() {
        let (backend, store) = store();
        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        let order = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        let sub = store.subscribe_to_order_updates(&order.id).await.unwrap();

        // Remote change lands in both the cache and the current order.
        backend
            .update(
                &format!("orders/{}", order.id),
                json!({"status": "preparing", "updatedAt": 2_000i64}),
            )
            .await
            .unwrap();
        eventually(|| store.current_order().unwrap().status == OrderStatus::Preparing).await;
        assert_eq!(
            store.order_by_id(&order.id).unwrap().status,
            OrderStatus::Preparing
        );

        sub.dispose();
    }

    #[tokio::test]
    async fn settings_subscription_feeds_the_checkout_gate() {
        let (backend, store) = store();
        backend.seed("settings", json!({"minOrderAmount": 50.0}));

        let sub = store.subscribe_to_settings().await.unwrap();
        eventually(|| (store.settings().min_order_amount - 50.0).abs() < f64::EPSILON).await;

        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        let err = store
            .create_order(
                "Walk-in Customer",
                "0512345678",
                "14 Harbor Road, Old Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Checkout(CheckoutRejection::BelowMinimum { .. })
        ));

        sub.dispose();
    }

    #[tokio::test]
    async fn user_orders_filter_by_exact_phone_newest_first() {
        let (_backend, store) = store();

        store.add_to_cart(item("Shawarma", 5.0), 3, Vec::new(), "");
        let first = store
            .create_order(
                "Customer Number One",
                "0511111111",
                "1 First Street, Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        store.add_to_cart(item("Cola", 1.0), 20, Vec::new(), "");
        store
            .create_order(
                "Customer Number Two",
                "0522222222",
                "2 Second Street, Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        store.add_to_cart(item("Grill", 14.0), 1, Vec::new(), "");
        let third = store
            .create_order(
                "Customer Number One",
                "0511111111",
                "1 First Street, Town",
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        // Cancelled orders stay visible in personal history.
        store.cancel_order(&first.id).await.unwrap();

        let history = store.user_orders("0511111111");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, third.id);
        assert_eq!(history[1].id, first.id);
        assert_eq!(history[1].status, OrderStatus::Cancelled);

        assert!(store.user_orders("0599999999").is_empty());
    }

    #[test]
    fn login_validates_pin_and_persists_the_session() {
        let backend = Arc::new(MemoryBackend::new());
        let device = Arc::new(DeviceStorage::open_in_memory().unwrap());
        let store = Store::new(Gateway::new(backend), device.clone(), "1234");

        let err = store.login("9999").unwrap_err();
        assert!(matches!(err, StoreError::AdminPinRejected));
        assert!(!store.is_admin());
        assert!(!device.load_admin_session());

        store.login("1234").unwrap();
        assert!(store.is_admin());
        assert!(device.load_admin_session());

        store.logout();
        assert!(!store.is_admin());
        assert!(!device.load_admin_session());
    }

    #[test]
    fn open_with_default_config_uses_memory_backend() {
        let dir = std::env::temp_dir().join("the-small-storefront-store-open-test");
        let _ = std::fs::remove_dir_all(&dir);

        let config = StorefrontConfig::new(None, None, &dir, "1234");
        let store = Store::open(&config).unwrap();
        store.add_to_cart(item("Shawarma", 5.0), 1, Vec::new(), "");
        assert_eq!(store.cart_count(), 1);

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn upsert_keeps_newest_first_ordering() {
        let mut orders = vec![
            Order {
                id: "newer".to_string(),
                created_at: 2_000,
                ..Order::default()
            },
            Order {
                id: "older".to_string(),
                created_at: 1_000,
                ..Order::default()
            },
        ];

        upsert_order(
            &mut orders,
            Order {
                id: "middle".to_string(),
                created_at: 1_500,
                ..Order::default()
            },
        );
        assert_eq!(
            orders.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            vec!["newer", "middle", "older"]
        );

        // Replacement keeps position.
        upsert_order(
            &mut orders,
            Order {
                id: "middle".to_string(),
                created_at: 1_500,
                status: OrderStatus::Preparing,
                ..Order::default()
            },
        );
        assert_eq!(orders[1].status, OrderStatus::Preparing);
    }
}
