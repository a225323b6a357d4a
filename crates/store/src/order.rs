//! Order records.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// A flat allow-list rather than a transition graph: the admin workflow may
/// move any status to any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every status the admin workflow accepts.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Parses a status string against the allow-list.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Returns the status name as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the buyer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    Card,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns the method name as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cashOnDelivery",
        }
    }

    /// Parses a stored payment method string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentMethod::Card),
            "cashOnDelivery" => Some(PaymentMethod::CashOnDelivery),
            _ => None,
        }
    }

    /// The status a freshly placed order is seeded with: card payments go
    /// straight to processing, everything else waits as pending.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::Card => OrderStatus::Processing,
            PaymentMethod::CashOnDelivery => OrderStatus::Pending,
        }
    }
}

/// Shipping address snapshot captured at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// One line of an order.
///
/// Name and unit price are captured from the live product at placement and
/// never re-read, so later catalog edits leave past orders untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Returns the total price for this line (quantity × unit price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order snapshot.
///
/// Immutable once created except for `status`, which only the admin
/// workflow rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    /// Server-computed sum of the line totals, in cents.
    pub total: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Client-generated checkout token; resubmitting it returns this order
    /// instead of creating a duplicate.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sums the line totals.
    pub fn items_total(items: &[OrderItem]) -> Money {
        items.iter().map(OrderItem::total_price).sum()
    }
}
