use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};

use crate::{
    CartItem, CategorySales, Order, OrderStatus, Product, Result, SalesBucket, SalesGranularity,
    User,
};

/// Outcome of an order placement.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    /// The order on record after the call: the newly placed one, or the
    /// previously placed one when the idempotency key had been seen before.
    pub order: Order,
    /// False when the placement was absorbed by an earlier submission.
    pub created: bool,
}

/// Store operations on user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user record.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Retrieves a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Retrieves a user by unique username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Retrieves a user by unique email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Rewrites an existing user record.
    ///
    /// Returns false if no user with that id exists.
    async fn update_user(&self, user: &User) -> Result<bool>;

    /// Replaces the user's embedded cart.
    ///
    /// Returns false if no user with that id exists.
    async fn set_cart(&self, id: UserId, cart: &[CartItem]) -> Result<bool>;

    /// Returns true if any account has the admin role.
    async fn admin_exists(&self) -> Result<bool>;
}

/// Store operations on catalog products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a new catalog entry.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Retrieves a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists the catalog, newest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Rewrites an existing catalog entry.
    ///
    /// Returns false if no product with that id exists.
    async fn update_product(&self, product: &Product) -> Result<bool>;

    /// Deletes a catalog entry.
    ///
    /// Returns false if no product with that id exists.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Counts catalog entries.
    async fn count_products(&self) -> Result<u64>;
}

/// Store operations on orders, including the reporting queries.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Places an order atomically.
    ///
    /// In one transaction: conditionally decrements each line item's stock
    /// (`stock >= quantity`, so concurrent placements cannot oversell),
    /// inserts the order, and clears the buyer's cart. Any failure rolls
    /// the whole placement back.
    ///
    /// Fails with [`StoreError::ProductNotFound`] when a line references a
    /// missing product and [`StoreError::InsufficientStock`] when the
    /// condition does not hold, reporting the quantity still available.
    ///
    /// When the order carries an idempotency key already on record for the
    /// same buyer, nothing is written and the original order is returned
    /// with `created: false`.
    ///
    /// [`StoreError::ProductNotFound`]: crate::StoreError::ProductNotFound
    /// [`StoreError::InsufficientStock`]: crate::StoreError::InsufficientStock
    async fn place_order(&self, order: &Order) -> Result<PlacedOrder>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Lists the most recent orders, newest first.
    async fn list_recent_orders(&self, limit: u32) -> Result<Vec<Order>>;

    /// Overwrites an order's status and returns the updated order.
    ///
    /// Returns None if no order with that id exists. Status is the only
    /// mutable field post-creation; cancelling does not restock.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>>;

    /// Sums `total` over completed orders, optionally only those created
    /// at or after `start`.
    async fn completed_total_since(&self, start: Option<DateTime<Utc>>) -> Result<Money>;

    /// Counts orders of any status created at or after `start`.
    async fn count_orders_since(&self, start: DateTime<Utc>) -> Result<u64>;

    /// Counts orders with the given status, regardless of date.
    async fn count_orders_with_status(&self, status: OrderStatus) -> Result<u64>;

    /// Groups completed orders created at or after `start` into date
    /// buckets, ascending by bucket key.
    async fn sales_buckets(
        &self,
        start: DateTime<Utc>,
        granularity: SalesGranularity,
    ) -> Result<Vec<SalesBucket>>;

    /// Groups completed-order line items created at or after `start` by the
    /// referenced product's category, descending by sales. Lines whose
    /// product has since been deleted are omitted.
    async fn sales_by_category(&self, start: DateTime<Utc>) -> Result<Vec<CategorySales>>;
}

/// A complete backing store.
pub trait Store:
    UserStore + ProductStore + OrderStore + Clone + Send + Sync + 'static
{
}

impl<T: UserStore + ProductStore + OrderStore + Clone + Send + Sync + 'static> Store for T {}
