//! Domain model for the storefront: catalog entries, cart lines, orders,
//! and the global settings record.
//!
//! Everything serializes to the camelCase JSON shape stored in the hosted
//! realtime database. Optional fields carry serde defaults so a partial
//! remote record decodes to something usable instead of poisoning a whole
//! snapshot.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Menu category. Closed set; unknown values fail decoding and the record
/// is skipped upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Shawarma,
    Grills,
    Sandwiches,
    GrillSandwiches,
    Italian,
    Desserts,
    HotDrinks,
    ColdDrinks,
    Salads,
}

impl Category {
    /// All categories in menu display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Shawarma,
            Category::Grills,
            Category::Sandwiches,
            Category::GrillSandwiches,
            Category::Italian,
            Category::Desserts,
            Category::HotDrinks,
            Category::ColdDrinks,
            Category::Salads,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Shawarma => "Shawarma",
            Category::Grills => "Grills",
            Category::Sandwiches => "Sandwiches",
            Category::GrillSandwiches => "Grill Sandwiches",
            Category::Italian => "Italian",
            Category::Desserts => "Desserts",
            Category::HotDrinks => "Hot Drinks",
            Category::ColdDrinks => "Cold Drinks",
            Category::Salads => "Salads",
        }
    }
}

/// Optional add-on owned by a menu item's extras list. Price 0 means free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Extra {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// Catalog entry. Edits overwrite in place; there is no versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

/// Fields of a menu item before the gateway has assigned an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl ProductDraft {
    /// Attach the gateway-assigned identifier, producing the stored item.
    pub fn into_item(self, id: String) -> MenuItem {
        MenuItem {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category: self.category,
            extras: self.extras,
            is_available: self.is_available,
        }
    }
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

/// One line in the in-progress cart.
///
/// Embeds a full copy of the menu item at the time of adding, so later
/// catalog edits never retroactively change an already-carted line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Locally generated line identifier, unique per addition.
    pub id: String,
    pub menu_item: MenuItem,
    pub quantity: u32,
    #[serde(default)]
    pub selected_extras: Vec<Extra>,
    #[serde(default)]
    pub special_notes: String,
}

impl CartItem {
    /// Unit price including selected extras.
    pub fn unit_price(&self) -> f64 {
        self.menu_item.price + self.selected_extras.iter().map(|e| e.price).sum::<f64>()
    }

    /// Line total: (unit price + extras) x quantity.
    pub fn line_total(&self) -> f64 {
        self.unit_price() * f64::from(self.quantity)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order status. Wire form is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Wire form, also used in human-readable messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays. Payment is settled offline; this is a label, not
/// a processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    MobileWallet,
}

impl PaymentMethod {
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash on delivery",
            PaymentMethod::BankTransfer => "Bank transfer",
            PaymentMethod::MobileWallet => "Mobile wallet",
        }
    }
}

/// A submitted purchase as stored under `orders/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Gateway-assigned identifier; also the customer-facing reference
    /// (last 6 characters shown).
    pub id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[serde(default)]
    pub status: OrderStatus,
    /// Subtotal excluding delivery fee, frozen at submission.
    pub total: f64,
    /// Milliseconds since epoch, stamped by the gateway at creation.
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
}

/// What checkout hands to the gateway: an order minus the fields the
/// gateway itself assigns (id, status, createdAt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub items: Vec<CartItem>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total: f64,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
}

// ---------------------------------------------------------------------------
// Settings and saved customer info
// ---------------------------------------------------------------------------

/// Global singleton settings record, lazily materialized with these defaults
/// on first read if absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub min_order_amount: f64,
    pub is_store_busy: bool,
    pub delivery_fee: f64,
    /// Manual/scheduled closure flag. Round-tripped for the embedding
    /// application; checkout does not gate on it.
    pub is_closed: bool,
}

/// Partial settings update, shallow-merged into the remote record. Absent
/// fields keep their stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_store_busy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

/// Last successful checkout contact details, cached on-device to pre-fill
/// the next checkout and to look up order history by phone. Not
/// authentication: any device holding the same phone string sees the same
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavedUserInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

// ===========================================================================
// Tests
// ===========================================================================
