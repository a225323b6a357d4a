//! Order placement, retrieval, and the admin status workflow.

use std::collections::HashMap;

use chrono::Utc;
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use store::{
    Order, OrderItem, OrderStatus, PaymentMethod, Product, ShippingAddress, Store, StoreError,
    User,
};

use crate::error::DomainError;
use crate::notify::{Mailer, OutboundMail};

/// Country stamped on every shipping snapshot; the shop only ships
/// domestically.
const DEFAULT_COUNTRY: &str = "Sri Lanka";

/// Allowed drift between the client-submitted total and the
/// server-computed one, forgiving client-side float rounding only.
const TOTAL_TOLERANCE_CENTS: i64 = 1;

/// One line of a placement request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Shipping fields as submitted at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// An order placement command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<PlaceOrderItem>,
    /// Client-computed total, in cents; validated against the
    /// server-computed one.
    pub total_amount: Money,
    pub shipping_details: ShippingDetails,
    pub payment_method: PaymentMethod,
    /// Client-generated checkout token; optional, but resubmitting it
    /// never creates a second order.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// An order line with the live catalog entry joined in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    /// Current catalog entry; None when the product has been deleted.
    pub product: Option<Product>,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order as served to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemView>,
    pub total: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<Utc>,
}

/// Buyer identity joined onto admin order listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// An order as served to the back-office, with the buyer joined in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    /// Buyer identity; None when the account no longer resolves.
    pub user: Option<BuyerSummary>,
    #[serde(flatten)]
    pub order: OrderView,
}

/// The canonical order component.
///
/// Owns the placement contract end to end: validation, stock-checked
/// atomic placement through the store, and the best-effort operator
/// notification. Route handlers only translate HTTP to these calls.
pub struct OrderService<S: Store, M: Mailer> {
    store: S,
    mailer: M,
}

impl<S: Store, M: Mailer> OrderService<S, M> {
    /// Creates a new order service over the given collaborators.
    pub fn new(store: S, mailer: M) -> Self {
        Self { store, mailer }
    }

    /// Places an order for `user`.
    ///
    /// Validates the payload, captures each line's name and unit price
    /// from the live product, recomputes the total, and commits stock
    /// decrements + order insert + cart clear atomically. Card payments
    /// seed the order as `processing`, everything else as `pending`. The
    /// operator notification is best-effort: a send failure is logged and
    /// swallowed.
    #[tracing::instrument(skip(self, user, cmd), fields(user_id = %user.id))]
    pub async fn place_order(&self, user: &User, cmd: PlaceOrder) -> Result<Order, DomainError> {
        if cmd.items.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        for line in &cmd.items {
            if line.quantity == 0 {
                return Err(DomainError::InvalidQuantity { quantity: 0 });
            }
        }
        if cmd.shipping_details.address.trim().is_empty() {
            return Err(DomainError::MissingField("shippingDetails.address"));
        }
        if cmd.shipping_details.city.trim().is_empty() {
            return Err(DomainError::MissingField("shippingDetails.city"));
        }
        if cmd.shipping_details.postal_code.trim().is_empty() {
            return Err(DomainError::MissingField("shippingDetails.postalCode"));
        }

        // Capture name and unit price from the live catalog; past orders
        // must not change when the catalog does.
        let mut items = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound(line.product_id))?;
            items.push(OrderItem {
                product_id: product.id,
                product_name: product.name,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let computed = Order::items_total(&items);
        if computed.abs_diff(cmd.total_amount) > TOTAL_TOLERANCE_CENTS {
            return Err(DomainError::TotalMismatch {
                submitted: cmd.total_amount,
                computed,
            });
        }

        let order = Order {
            id: OrderId::new(),
            user_id: user.id,
            items,
            total: computed,
            shipping_address: ShippingAddress {
                street: cmd.shipping_details.address,
                city: cmd.shipping_details.city,
                postal_code: cmd.shipping_details.postal_code,
                country: DEFAULT_COUNTRY.to_string(),
            },
            payment_method: cmd.payment_method,
            status: cmd.payment_method.initial_status(),
            idempotency_key: cmd.idempotency_key,
            created_at: Utc::now(),
        };

        let placed = match self.store.place_order(&order).await {
            Ok(placed) => placed,
            Err(StoreError::ProductNotFound(id)) => return Err(DomainError::ProductNotFound(id)),
            Err(StoreError::InsufficientStock {
                product_id,
                available,
                ..
            }) => {
                let name = order
                    .items
                    .iter()
                    .find(|item| item.product_id == product_id)
                    .map(|item| item.product_name.clone())
                    .unwrap_or_else(|| product_id.to_string());
                return Err(DomainError::InsufficientStock { name, available });
            }
            Err(e) => return Err(e.into()),
        };

        if placed.created {
            if let Err(e) = self.mailer.send(order_notice(&placed.order, user)).await {
                tracing::warn!(
                    order_id = %placed.order.id,
                    error = %e,
                    "order notification failed"
                );
            }
            tracing::info!(order_id = %placed.order.id, total = %placed.order.total, "order placed");
        } else {
            tracing::info!(order_id = %placed.order.id, "placement absorbed by idempotency key");
        }

        Ok(placed.order)
    }

    /// Lists the user's orders, newest first, with product details joined.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderView>, DomainError> {
        let orders = self.store.list_orders_for_user(user_id).await?;
        let products = self.product_map(&orders).await?;
        Ok(orders
            .into_iter()
            .map(|o| order_view(o, &products))
            .collect())
    }

    /// Fetches one of the user's orders.
    ///
    /// An order that exists but belongs to someone else is reported as
    /// not found, never leaked.
    #[tracing::instrument(skip(self))]
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<OrderView, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let products = self.product_map(std::slice::from_ref(&order)).await?;
        Ok(order_view(order, &products))
    }

    /// Lists every order for the back-office, newest first, with buyer and
    /// product details joined.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<AdminOrderView>, DomainError> {
        let orders = self.store.list_orders().await?;
        self.admin_views(orders).await
    }

    /// Fetches one order for the back-office.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<AdminOrderView, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let mut views = self.admin_views(vec![order]).await?;
        views.pop().ok_or(DomainError::OrderNotFound(order_id))
    }

    /// Overwrites an order's status.
    ///
    /// The target status is validated against the flat allow-list; any
    /// member may move to any other member. Cancelling does not restock.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order, DomainError> {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| DomainError::InvalidStatus(status.to_string()))?;
        let updated = self
            .store
            .set_order_status(order_id, status)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        tracing::info!(%order_id, %status, "order status updated");
        Ok(updated)
    }

    async fn admin_views(&self, orders: Vec<Order>) -> Result<Vec<AdminOrderView>, DomainError> {
        let products = self.product_map(&orders).await?;
        let mut buyers: HashMap<UserId, Option<BuyerSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let buyer = match buyers.get(&order.user_id) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = self.store.get_user(order.user_id).await?.map(|u| {
                        BuyerSummary {
                            id: u.id,
                            username: u.username,
                            email: u.email,
                        }
                    });
                    buyers.insert(order.user_id, summary.clone());
                    summary
                }
            };
            views.push(AdminOrderView {
                user: buyer,
                order: order_view(order, &products),
            });
        }
        Ok(views)
    }

    async fn product_map(
        &self,
        orders: &[Order],
    ) -> Result<HashMap<ProductId, Product>, DomainError> {
        let mut products = HashMap::new();
        for order in orders {
            for item in &order.items {
                if products.contains_key(&item.product_id) {
                    continue;
                }
                if let Some(product) = self.store.get_product(item.product_id).await? {
                    products.insert(item.product_id, product);
                }
            }
        }
        Ok(products)
    }
}

fn order_view(order: Order, products: &HashMap<ProductId, Product>) -> OrderView {
    let items = order
        .items
        .into_iter()
        .map(|item| OrderItemView {
            product: products.get(&item.product_id).cloned(),
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();
    OrderView {
        id: order.id,
        user_id: order.user_id,
        items,
        total: order.total,
        shipping_address: order.shipping_address,
        payment_method: order.payment_method,
        status: order.status,
        created_at: order.created_at,
    }
}

/// Composes the operator notification for a freshly placed order.
fn order_notice(order: &Order, buyer: &User) -> OutboundMail {
    let mut lines = String::new();
    for item in &order.items {
        lines.push_str(&format!(
            "<li>{} &times; {} @ {} = {}</li>",
            item.product_name,
            item.quantity,
            item.unit_price,
            item.total_price()
        ));
    }
    let address = &order.shipping_address;
    OutboundMail {
        subject: format!("New Order Received - {}", order.id),
        html_body: format!(
            "<h2>New Order</h2>\
             <p><strong>Order:</strong> {}</p>\
             <p><strong>Buyer:</strong> {} ({})</p>\
             <ul>{lines}</ul>\
             <p><strong>Total:</strong> {}</p>\
             <p><strong>Payment:</strong> {}</p>\
             <p><strong>Ship to:</strong> {}, {}, {}, {}</p>",
            order.id,
            buyer.username,
            buyer.email,
            order.total,
            order.payment_method.as_str(),
            address.street,
            address.city,
            address.postal_code,
            address.country,
        ),
        reply_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::InMemoryMailer;
    use common::Money;
    use store::{MemoryStore, OrderStore, ProductStore, UserStore};

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            address: "1 Dairy Lane".into(),
            city: "Colombo".into(),
            postal_code: "00100".into(),
        }
    }

    fn place_cmd(lines: &[(&Product, u32)], total: i64) -> PlaceOrder {
        PlaceOrder {
            items: lines
                .iter()
                .map(|(p, quantity)| PlaceOrderItem {
                    product_id: p.id,
                    quantity: *quantity,
                })
                .collect(),
            total_amount: Money::from_cents(total),
            shipping_details: shipping(),
            payment_method: PaymentMethod::CashOnDelivery,
            idempotency_key: None,
        }
    }

    async fn setup() -> (OrderService<MemoryStore, InMemoryMailer>, MemoryStore, InMemoryMailer, User)
    {
        let store = MemoryStore::new();
        let mailer = InMemoryMailer::new();
        let mut user = User::new("alice", "alice@example.com", Some("hash".into()));
        user.cart.push(store::CartItem {
            product_id: ProductId::new(),
            quantity: 1,
        });
        store.insert_user(&user).await.unwrap();
        (
            OrderService::new(store.clone(), mailer.clone()),
            store,
            mailer,
            user,
        )
    }

    async fn seed_product(store: &MemoryStore, name: &str, price: i64, stock: u32) -> Product {
        let product = Product::new(name, "", Money::from_cents(price), "milk", stock, "");
        store.insert_product(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_writes() {
        let (service, store, mailer, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;

        let err = service
            .place_order(&user, place_cmd(&[], 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::EmptyCart));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn blank_shipping_fields_are_rejected() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;

        let mut cmd = place_cmd(&[(&milk, 1)], 350);
        cmd.shipping_details.city = "  ".into();

        let err = service.place_order(&user, cmd).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingField("shippingDetails.city")));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;

        let err = service
            .place_order(&user, place_cmd(&[(&milk, 0)], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity { quantity: 0 }));
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_product_and_leaves_stock() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 2).await;

        let err = service
            .place_order(&user, place_cmd(&[(&milk, 3)], 1050))
            .await
            .unwrap_err();

        match err {
            DomainError::InsufficientStock { name, available } => {
                assert_eq!(name, "Milk 1L");
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 2);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn successful_placement_decrements_clears_and_notifies() {
        let (service, store, mailer, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        let butter = seed_product(&store, "Butter 250g", 900, 3).await;

        let order = service
            .place_order(&user, place_cmd(&[(&milk, 2), (&butter, 1)], 1600))
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 1600);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_name, "Milk 1L");
        assert_eq!(order.items[0].unit_price.cents(), 350);
        assert_eq!(order.shipping_address.country, "Sri Lanka");

        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(store.get_product(butter.id).await.unwrap().unwrap().stock, 2);
        assert!(store.get_user(user.id).await.unwrap().unwrap().cart.is_empty());
        assert_eq!(store.order_count().await, 1);

        assert_eq!(mailer.sent_count(), 1);
        let mail = &mailer.sent()[0];
        assert!(mail.subject.contains(&order.id.to_string()));
        assert!(mail.html_body.contains("alice"));
        assert!(mail.html_body.contains("Milk 1L"));
    }

    #[tokio::test]
    async fn card_orders_seed_processing_cash_seeds_pending() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 10).await;

        let mut card = place_cmd(&[(&milk, 1)], 350);
        card.payment_method = PaymentMethod::Card;
        let card_order = service.place_order(&user, card).await.unwrap();
        assert_eq!(card_order.status, OrderStatus::Processing);

        let cash_order = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();
        assert_eq!(cash_order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn total_mismatch_is_rejected_before_any_write() {
        let (service, store, mailer, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;

        let err = service
            .place_order(&user, place_cmd(&[(&milk, 2)], 500))
            .await
            .unwrap_err();

        match err {
            DomainError::TotalMismatch { submitted, computed } => {
                assert_eq!(submitted.cents(), 500);
                assert_eq!(computed.cents(), 700);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn one_cent_rounding_drift_is_forgiven() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 333, 5).await;

        let order = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 334))
            .await
            .unwrap();
        // The stored total is the server-computed one.
        assert_eq!(order.total.cents(), 333);
    }

    #[tokio::test]
    async fn mailer_failure_does_not_fail_placement() {
        let (service, store, mailer, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        mailer.set_fail_on_send(true);

        let order = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 350);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn idempotent_resubmission_returns_original_and_sends_once() {
        let (service, store, mailer, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;

        let mut cmd = place_cmd(&[(&milk, 2)], 700);
        cmd.idempotency_key = Some("checkout-1".into());
        let first = service.place_order(&user, cmd.clone()).await.unwrap();
        let second = service.place_order(&user, cmd).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_stock_fails_the_follow_up_order() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 2).await;

        service
            .place_order(&user, place_cmd(&[(&milk, 2)], 700))
            .await
            .unwrap();

        let err = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap_err();

        match err {
            DomainError::InsufficientStock { available, .. } => assert_eq!(available, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn users_cannot_read_each_others_orders() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        let order = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();

        let other = User::new("bob", "bob@example.com", Some("hash".into()));
        store.insert_user(&other).await.unwrap();

        let err = service.get_for_user(order.id, other.id).await.unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound(id) if id == order.id));

        // The owner still sees it, with the catalog entry joined.
        let view = service.get_for_user(order.id, user.id).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product.as_ref().unwrap().id, milk.id);
    }

    #[tokio::test]
    async fn listing_joins_products_and_orders_newest_first() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 10).await;

        let first = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();
        let second = service
            .place_order(&user, place_cmd(&[(&milk, 2)], 700))
            .await
            .unwrap();

        let views = service.list_for_user(user.id).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, second.id);
        assert_eq!(views[1].id, first.id);
        assert!(views[0].items[0].product.is_some());
    }

    #[tokio::test]
    async fn admin_listing_joins_buyers() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();

        let views = service.list_all().await.unwrap();
        assert_eq!(views.len(), 1);
        let buyer = views[0].user.as_ref().unwrap();
        assert_eq!(buyer.username, "alice");
        assert_eq!(buyer.email, "alice@example.com");
    }

    #[tokio::test]
    async fn invalid_status_is_rejected_and_stored_status_unchanged() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        let order = service
            .place_order(&user, place_cmd(&[(&milk, 1)], 350))
            .await
            .unwrap();

        let err = service.update_status(order.id, "refunded").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatus(ref s) if s == "refunded"));
        assert_eq!(
            store.get_order(order.id).await.unwrap().unwrap().status,
            OrderStatus::Pending
        );

        let updated = service.update_status(order.id, "shipped").await.unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        let err = service.update_status(OrderId::new(), "shipped").await.unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn cancelling_does_not_restock() {
        let (service, store, _, user) = setup().await;
        let milk = seed_product(&store, "Milk 1L", 350, 5).await;
        let order = service
            .place_order(&user, place_cmd(&[(&milk, 2)], 700))
            .await
            .unwrap();

        service.update_status(order.id, "cancelled").await.unwrap();
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 3);
    }
}
