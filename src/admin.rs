//! Admin console helpers: order triage and the product form.
//!
//! Pure functions over the store's caches. Cancelled orders are hidden from
//! triage entirely; customers still see them in their own history.

use thiserror::Error;

use crate::model::{Category, MenuItem, Order, OrderStatus, ProductDraft};

/// Fallback product photo for drafts saved without one.
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1529006557810-274b9b2fc783?w=400";

// ---------------------------------------------------------------------------
// Order triage
// ---------------------------------------------------------------------------

/// Which orders the triage board shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every non-cancelled order.
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == *wanted,
        }
    }
}

/// Triage board rows: cancelled orders dropped, the filter applied, newest
/// first. `Only(Cancelled)` therefore always yields an empty board.
pub fn visible_orders(orders: &[Order], filter: StatusFilter) -> Vec<Order> {
    let mut visible: Vec<Order> = orders
        .iter()
        .filter(|order| order.status != OrderStatus::Cancelled)
        .filter(|order| filter.matches(order.status))
        .cloned()
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// Badge numbers for the filter row. Cancelled orders count nowhere, `all`
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub preparing: usize,
    pub shipped: usize,
    pub delivered: usize,
}

pub fn status_counts(orders: &[Order]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for order in orders {
        match order.status {
            OrderStatus::Pending => counts.pending += 1,
            OrderStatus::Preparing => counts.preparing += 1,
            OrderStatus::Shipped => counts.shipped += 1,
            OrderStatus::Delivered => counts.delivered += 1,
            OrderStatus::Cancelled => continue,
        }
        counts.all += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Product form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductFormError {
    #[error("Product name is required")]
    MissingName,
    #[error("Product price must be zero or positive")]
    InvalidPrice,
}

/// Raw add/edit product form input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub image: String,
}

impl ProductForm {
    /// Prefill the form for editing an existing product.
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            category: item.category,
            image: item.image.clone(),
        }
    }

    /// Validate and convert into a draft ready for the gateway.
    ///
    /// Text fields are trimmed; a blank image falls back to
    /// [`DEFAULT_PRODUCT_IMAGE`]. The form cannot edit extras, so the draft
    /// carries none, and new products always start available.
    pub fn into_draft(self) -> Result<ProductDraft, ProductFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProductFormError::MissingName);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ProductFormError::InvalidPrice);
        }
        let image = self.image.trim();
        Ok(ProductDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            image: if image.is_empty() {
                DEFAULT_PRODUCT_IMAGE.to_string()
            } else {
                image.to_string()
            },
            category: self.category,
            extras: Vec::new(),
            is_available: true,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, status: OrderStatus, created_at: i64) -> Order {
        Order {
            id: id.to_string(),
            status,
            created_at,
            ..Order::default()
        }
    }

    fn board() -> Vec<Order> {
        vec![
            order("a", OrderStatus::Pending, 3_000),
            order("b", OrderStatus::Cancelled, 5_000),
            order("c", OrderStatus::Preparing, 1_000),
            order("d", OrderStatus::Pending, 4_000),
            order("e", OrderStatus::Delivered, 2_000),
        ]
    }

    #[test]
    fn all_filter_hides_cancelled_and_sorts_newest_first() {
        let visible = visible_orders(&board(), StatusFilter::All);
        let ids: Vec<&str> = visible.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "e", "c"]);
    }

    #[test]
    fn single_status_filter_keeps_only_that_status() {
        let visible = visible_orders(&board(), StatusFilter::Only(OrderStatus::Pending));
        let ids: Vec<&str> = visible.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a"]);

        assert!(visible_orders(&board(), StatusFilter::Only(OrderStatus::Cancelled)).is_empty());
    }

    #[test]
    fn counts_exclude_cancelled_everywhere() {
        let counts = status_counts(&board());
        assert_eq!(
            counts,
            StatusCounts {
                all: 4,
                pending: 2,
                preparing: 1,
                shipped: 0,
                delivered: 1,
            }
        );
    }

    #[test]
    fn form_trims_and_applies_defaults() {
        let form = ProductForm {
            name: "  Chicken Shawarma  ".to_string(),
            description: " Classic wrap ".to_string(),
            price: 5.5,
            category: Category::Shawarma,
            image: "   ".to_string(),
        };
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.name, "Chicken Shawarma");
        assert_eq!(draft.description, "Classic wrap");
        assert_eq!(draft.image, DEFAULT_PRODUCT_IMAGE);
        assert!(draft.extras.is_empty());
        assert!(draft.is_available);
    }

    #[test]
    fn form_rejects_blank_name_and_bad_price() {
        let blank = ProductForm {
            name: "   ".to_string(),
            price: 5.0,
            ..ProductForm::default()
        };
        assert_eq!(blank.into_draft(), Err(ProductFormError::MissingName));

        let negative = ProductForm {
            name: "Cola".to_string(),
            price: -1.0,
            ..ProductForm::default()
        };
        assert_eq!(negative.into_draft(), Err(ProductFormError::InvalidPrice));

        let nan = ProductForm {
            name: "Cola".to_string(),
            price: f64::NAN,
            ..ProductForm::default()
        };
        assert_eq!(nan.into_draft(), Err(ProductFormError::InvalidPrice));
    }

    #[test]
    fn edit_prefill_round_trips_through_the_form() {
        let item = MenuItem {
            id: "prod-1".to_string(),
            name: "Mixed Grill".to_string(),
            description: "For two".to_string(),
            price: 22.0,
            image: "https://cdn.example/grill.jpg".to_string(),
            category: Category::Grills,
            ..MenuItem::default()
        };
        let draft = ProductForm::from_item(&item).into_draft().unwrap();
        assert_eq!(draft.name, "Mixed Grill");
        assert_eq!(draft.price, 22.0);
        assert_eq!(draft.category, Category::Grills);
        assert_eq!(draft.image, "https://cdn.example/grill.jpg");
    }
}
