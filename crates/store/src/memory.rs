//! In-memory store implementation for tests and store-less runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    CartItem, CategorySales, Order, OrderStatus, PlacedOrder, Product, Result, SalesBucket,
    SalesGranularity, StoreError, User,
    store::{OrderStore, ProductStore, UserStore},
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

/// In-memory store.
///
/// Keeps every collection behind one lock so multi-record operations (order
/// placement in particular) observe the same atomicity as the PostgreSQL
/// implementation. Records are held in insertion order; "newest first"
/// listings iterate in reverse.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.users.clear();
        state.products.clear();
        state.orders.clear();
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.state.write().await.users.push(user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_cart(&self, id: UserId, cart: &[CartItem]) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.cart = cart.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn admin_exists(&self) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.users.iter().any(User::is_admin))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.state.write().await.products.push(product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().rev().cloned().collect())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() < before)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.state.read().await.products.len() as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, order: &Order) -> Result<PlacedOrder> {
        let mut state = self.state.write().await;

        if let Some(key) = order.idempotency_key.as_deref() {
            let existing = state
                .orders
                .iter()
                .find(|o| o.user_id == order.user_id && o.idempotency_key.as_deref() == Some(key));
            if let Some(existing) = existing {
                return Ok(PlacedOrder {
                    order: existing.clone(),
                    created: false,
                });
            }
        }

        // Walk the lines against a scratch stock map first so repeated
        // lines for the same product drain it sequentially, then commit.
        // Nothing is written unless every line fits.
        let mut new_stocks: HashMap<ProductId, u32> = HashMap::new();
        for item in &order.items {
            let available = match new_stocks.get(&item.product_id) {
                Some(stock) => *stock,
                None => state
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .ok_or(StoreError::ProductNotFound(item.product_id))?
                    .stock,
            };
            if available < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available,
                });
            }
            new_stocks.insert(item.product_id, available - item.quantity);
        }

        for (id, stock) in &new_stocks {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == *id) {
                product.stock = *stock;
            }
        }
        if let Some(user) = state.users.iter_mut().find(|u| u.id == order.user_id) {
            user.cart.clear();
        }
        state.orders.push(order.clone());

        Ok(PlacedOrder {
            order: order.clone(),
            created: true,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().rev().cloned().collect())
    }

    async fn list_recent_orders(&self, limit: u32) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                Ok(Some(order.clone()))
            }
            None => Ok(None),
        }
    }

    async fn completed_total_since(&self, start: Option<DateTime<Utc>>) -> Result<Money> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .filter(|o| start.is_none_or(|s| o.created_at >= s))
            .map(|o| o.total)
            .sum())
    }

    async fn count_orders_since(&self, start: DateTime<Utc>) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.created_at >= start).count() as u64)
    }

    async fn count_orders_with_status(&self, status: OrderStatus) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.status == status).count() as u64)
    }

    async fn sales_buckets(
        &self,
        start: DateTime<Utc>,
        granularity: SalesGranularity,
    ) -> Result<Vec<SalesBucket>> {
        let state = self.state.read().await;
        let mut buckets: BTreeMap<String, (Money, u64)> = BTreeMap::new();
        for order in state
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed && o.created_at >= start)
        {
            let key = order
                .created_at
                .format(granularity.chrono_format())
                .to_string();
            let entry = buckets.entry(key).or_insert((Money::zero(), 0));
            entry.0 += order.total;
            entry.1 += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(date, (sales, count))| SalesBucket { date, sales, count })
            .collect())
    }

    async fn sales_by_category(&self, start: DateTime<Utc>) -> Result<Vec<CategorySales>> {
        let state = self.state.read().await;
        let mut totals: HashMap<String, Money> = HashMap::new();
        for order in state
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed && o.created_at >= start)
        {
            for item in &order.items {
                let Some(product) = state.products.iter().find(|p| p.id == item.product_id) else {
                    continue;
                };
                *totals.entry(product.category.clone()).or_insert(Money::zero()) +=
                    item.total_price();
            }
        }
        let mut rows: Vec<CategorySales> = totals
            .into_iter()
            .map(|(category, sales)| CategorySales { category, sales })
            .collect();
        rows.sort_by(|a, b| b.sales.cmp(&a.sales).then(a.category.cmp(&b.category)));
        Ok(rows)
    }
}
