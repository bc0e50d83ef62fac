//! Checkout gate: client-side validation run before an order leaves the
//! device. Nothing here touches the network; a rejection means no gateway
//! call was attempted.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::Serialize;
use thiserror::Error;

use crate::model::{CartItem, PaymentMethod, StoreSettings};

/// Largest accepted receipt attachment after base64 decoding (5 MiB).
pub const MAX_RECEIPT_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const NAME_MIN_CHARS: usize = 10;
const NAME_MAX_CHARS: usize = 50;
const ADDRESS_MIN_CHARS: usize = 10;
const PHONE_DIGITS: usize = 10;

/// Per-field messages for the checkout form. `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.receipt.is_none()
    }
}

/// Why checkout refused to submit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutRejection {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Minimum order is {min_order_amount:.2}, cart subtotal is {subtotal:.2}")]
    BelowMinimum {
        min_order_amount: f64,
        subtotal: f64,
    },

    #[error("Sorry, the store is not taking orders right now")]
    StoreBusy,

    #[error("Please fix the highlighted fields")]
    Fields(FieldErrors),
}

/// Raw checkout form input.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutForm<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub payment_method: PaymentMethod,
    pub receipt_image: Option<&'a str>,
}

/// Run the full checkout gate: cart preconditions first, then field
/// validation. Returns the first cart-level rejection, or the complete set
/// of field errors.
pub fn validate(
    cart: &[CartItem],
    settings: &StoreSettings,
    form: &CheckoutForm<'_>,
) -> Result<(), CheckoutRejection> {
    if cart.is_empty() {
        return Err(CheckoutRejection::EmptyCart);
    }

    let subtotal: f64 = cart.iter().map(CartItem::line_total).sum();
    if subtotal < settings.min_order_amount {
        return Err(CheckoutRejection::BelowMinimum {
            min_order_amount: settings.min_order_amount,
            subtotal,
        });
    }

    if settings.is_store_busy {
        return Err(CheckoutRejection::StoreBusy);
    }

    let errors = validate_fields(form);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckoutRejection::Fields(errors))
    }
}

/// Validate just the form fields, collecting every failure rather than
/// stopping at the first. Usable on its own for inline re-validation.
pub fn validate_fields(form: &CheckoutForm<'_>) -> FieldErrors {
    FieldErrors {
        name: validate_name(form.name),
        phone: validate_phone(form.phone),
        address: validate_address(form.address),
        receipt: validate_receipt(form.payment_method, form.receipt_image),
    }
}

fn validate_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Some("Name is required".to_string());
    }
    let count = trimmed.chars().count();
    if count < NAME_MIN_CHARS {
        return Some(format!("Name must be at least {NAME_MIN_CHARS} characters"));
    }
    if count > NAME_MAX_CHARS {
        return Some(format!("Name must not exceed {NAME_MAX_CHARS} characters"));
    }
    None
}

fn validate_phone(phone: &str) -> Option<String> {
    if phone.trim().is_empty() {
        return Some("Phone number is required".to_string());
    }
    // Non-digits are stripped before checking, so "05x-xxx-xxxx" style input
    // passes as long as the digits line up.
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.chars().count() != PHONE_DIGITS || !digits.starts_with("05") {
        return Some(format!(
            "Phone number is invalid (must start with 05 and be {PHONE_DIGITS} digits)"
        ));
    }
    None
}

fn validate_address(address: &str) -> Option<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Some("Address is required".to_string());
    }
    if trimmed.chars().count() < ADDRESS_MIN_CHARS {
        return Some(format!(
            "Address must be at least {ADDRESS_MIN_CHARS} characters"
        ));
    }
    None
}

fn validate_receipt(method: PaymentMethod, receipt_image: Option<&str>) -> Option<String> {
    if method.is_cash() {
        return None;
    }
    let Some(image) = receipt_image else {
        return Some("A transfer receipt image must be attached".to_string());
    };
    let Some(decoded_len) = decoded_data_url_len(image) else {
        return Some("Receipt image must be a PNG or JPG data URL".to_string());
    };
    if decoded_len > MAX_RECEIPT_IMAGE_BYTES {
        return Some("Receipt image must be 5MB or smaller".to_string());
    }
    None
}

/// Decoded byte length of a `data:*;base64,...` URL, or `None` if the
/// string is not one.
fn decoded_data_url_len(data_url: &str) -> Option<usize> {
    let rest = data_url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    BASE64_STANDARD.decode(payload).ok().map(|bytes| bytes.len())
}

// ===========================================================================
// Tests
// ===========================================================================
