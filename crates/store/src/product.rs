//! Catalog product records.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog entry.
///
/// Mutated only by admin actions, with one exception: `stock` is
/// decremented by order placement through a conditional update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in cents; never negative.
    pub price: Money,
    pub category: String,
    pub stock: u32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new catalog entry.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        stock: u32,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
            stock,
            image_url: image_url.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_naming_is_camel_case() {
        let product = Product::new("Milk 1L", "Fresh milk", Money::from_cents(350), "milk", 10, "");
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["price"], 350);
    }
}
