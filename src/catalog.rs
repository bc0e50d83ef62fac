//! Built-in starter catalog.
//!
//! A small menu for bootstrapping a fresh database through
//! [`Gateway::initialize_menu`](crate::gateway::Gateway::initialize_menu).
//! Stores replace it from the admin console; nothing else depends on its
//! contents.

use crate::admin::DEFAULT_PRODUCT_IMAGE;
use crate::model::{Category, Extra, ProductDraft};

fn extra(id: &str, name: &str, price: f64) -> Extra {
    Extra {
        id: id.to_string(),
        name: name.to_string(),
        price,
    }
}

fn product(
    name: &str,
    description: &str,
    price: f64,
    category: Category,
    extras: Vec<Extra>,
) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        description: description.to_string(),
        price,
        image: DEFAULT_PRODUCT_IMAGE.to_string(),
        category,
        extras,
        is_available: true,
    }
}

/// One item per category at minimum, with extras on the headline items.
pub fn starter_menu() -> Vec<ProductDraft> {
    vec![
        product(
            "Chicken Shawarma Wrap",
            "Marinated chicken off the spit, garlic sauce, and pickles in saj bread",
            5.5,
            Category::Shawarma,
            vec![
                extra("extra-garlic", "Garlic sauce", 0.5),
                extra("extra-fries-in", "Fries in the wrap", 1.5),
                extra("extra-cheese", "Cheese", 1.0),
            ],
        ),
        product(
            "Beef Shawarma Plate",
            "Sliced beef shawarma over rice with tahini and grilled tomato",
            9.0,
            Category::Shawarma,
            vec![extra("extra-garlic", "Garlic sauce", 0.5)],
        ),
        product(
            "Mixed Grill Platter",
            "Kofta, shish tawook, and lamb cubes with grilled vegetables",
            22.0,
            Category::Grills,
            Vec::new(),
        ),
        product(
            "Shish Tawook Skewers",
            "Two skewers of marinated chicken with garlic dip and bread",
            14.0,
            Category::Grills,
            Vec::new(),
        ),
        product(
            "Falafel Sandwich",
            "Crisp falafel with salad, pickles, and tahini",
            3.0,
            Category::Sandwiches,
            vec![extra("extra-fries-in", "Fries in the wrap", 1.5)],
        ),
        product(
            "Kofta Grill Sandwich",
            "Charcoal kofta with onions, parsley, and sumac",
            6.5,
            Category::GrillSandwiches,
            Vec::new(),
        ),
        product(
            "Margherita Pizza",
            "Tomato, mozzarella, and basil on a thin crust",
            8.0,
            Category::Italian,
            vec![extra("extra-cheese", "Cheese", 1.0)],
        ),
        product(
            "Kunafa",
            "Warm cheese kunafa with syrup and crushed pistachio",
            5.0,
            Category::Desserts,
            Vec::new(),
        ),
        product(
            "Turkish Coffee",
            "Small pot, medium sweetness",
            2.0,
            Category::HotDrinks,
            Vec::new(),
        ),
        product(
            "Mint Lemonade",
            "Fresh lemon blended with mint over ice",
            2.5,
            Category::ColdDrinks,
            Vec::new(),
        ),
        product(
            "Fattoush Salad",
            "Seasonal greens with fried bread and pomegranate dressing",
            4.0,
            Category::Salads,
            Vec::new(),
        ),
    ]
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn starter_menu_covers_every_category() {
        let menu = starter_menu();
        for category in Category::all() {
            assert!(
                menu.iter().any(|item| item.category == *category),
                "no starter item for {category:?}"
            );
        }
    }

    #[test]
    fn starter_items_are_well_formed() {
        let menu = starter_menu();
        let mut names = HashSet::new();
        for item in &menu {
            assert!(!item.name.trim().is_empty());
            assert!(item.price > 0.0);
            assert!(item.is_available);
            assert!(!item.image.is_empty());
            assert!(names.insert(item.name.clone()), "duplicate {}", item.name);
        }
    }
}
