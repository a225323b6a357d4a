//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{Money, OrderId, ProductId};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    CartItem, Order, OrderItem, OrderStatus, OrderStore, PaymentMethod, PostgresStore, Product,
    ProductStore, SalesGranularity, ShippingAddress, StoreError, User, UserStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_shop_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE orders, users, products")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn test_user(username: &str) -> User {
    let mut user = User::new(username, format!("{username}@example.com"), Some("h".into()));
    user.cart.push(CartItem {
        product_id: ProductId::new(),
        quantity: 1,
    });
    user
}

fn test_product(name: &str, category: &str, price: i64, stock: u32) -> Product {
    Product::new(name, "a dairy product", Money::from_cents(price), category, stock, "")
}

fn test_order(user: &User, lines: &[(&Product, u32)]) -> Order {
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|(p, quantity)| OrderItem {
            product_id: p.id,
            product_name: p.name.clone(),
            quantity: *quantity,
            unit_price: p.price,
        })
        .collect();
    let total = Order::items_total(&items);
    Order {
        id: OrderId::new(),
        user_id: user.id,
        items,
        total,
        shipping_address: ShippingAddress {
            street: "1 Dairy Lane".into(),
            city: "Colombo".into(),
            postal_code: "00100".into(),
            country: "Sri Lanka".into(),
        },
        payment_method: PaymentMethod::CashOnDelivery,
        status: OrderStatus::Pending,
        idempotency_key: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn user_roundtrip_preserves_cart_and_role() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();

    // created_at is compared field-free: postgres keeps microseconds,
    // chrono produces nanoseconds.
    let loaded = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(loaded.username, user.username);
    assert_eq!(loaded.email, user.email);
    assert_eq!(loaded.password_hash, user.password_hash);
    assert_eq!(loaded.role, user.role);
    assert_eq!(loaded.cart, user.cart);

    let by_name = store.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);
    let by_email = store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(!store.admin_exists().await.unwrap());
}

#[tokio::test]
#[serial]
async fn product_crud_roundtrip() {
    let store = get_test_store().await;
    let mut milk = test_product("Milk 1L", "milk", 350, 10);
    store.insert_product(&milk).await.unwrap();

    let loaded = store.get_product(milk.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, milk.name);
    assert_eq!(loaded.price, milk.price);
    assert_eq!(loaded.category, milk.category);
    assert_eq!(loaded.stock, milk.stock);

    milk.stock = 7;
    milk.price = Money::from_cents(375);
    assert!(store.update_product(&milk).await.unwrap());
    let reloaded = store.get_product(milk.id).await.unwrap().unwrap();
    assert_eq!(reloaded.stock, 7);
    assert_eq!(reloaded.price.cents(), 375);

    assert_eq!(store.count_products().await.unwrap(), 1);
    assert!(store.delete_product(milk.id).await.unwrap());
    assert!(!store.delete_product(milk.id).await.unwrap());
    assert_eq!(store.count_products().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn place_order_decrements_stock_and_clears_cart() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 5);
    store.insert_product(&milk).await.unwrap();

    let placed = store
        .place_order(&test_order(&user, &[(&milk, 2)]))
        .await
        .unwrap();

    assert!(placed.created);
    assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 3);
    assert!(store.get_user(user.id).await.unwrap().unwrap().cart.is_empty());

    let loaded = store.get_order(placed.order.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, placed.order.id);
    assert_eq!(loaded.items, placed.order.items);
    assert_eq!(loaded.total, placed.order.total);
    assert_eq!(loaded.shipping_address, placed.order.shipping_address);
    assert_eq!(loaded.payment_method, placed.order.payment_method);
    assert_eq!(loaded.status, placed.order.status);
}

#[tokio::test]
#[serial]
async fn insufficient_stock_rolls_back_every_line() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 5);
    let butter = test_product("Butter 250g", "butter", 900, 1);
    store.insert_product(&milk).await.unwrap();
    store.insert_product(&butter).await.unwrap();

    let err = store
        .place_order(&test_order(&user, &[(&milk, 2), (&butter, 3)]))
        .await
        .unwrap_err();

    match err {
        StoreError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            assert_eq!(product_id, butter.id);
            assert_eq!(requested, 3);
            assert_eq!(available, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The milk decrement from the first line was rolled back.
    assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 5);
    assert_eq!(store.get_product(butter.id).await.unwrap().unwrap().stock, 1);
    assert!(store.list_orders().await.unwrap().is_empty());
    assert!(!store.get_user(user.id).await.unwrap().unwrap().cart.is_empty());
}

#[tokio::test]
#[serial]
async fn missing_product_fails_placement() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let ghost = test_product("Ghost", "milk", 100, 1);

    let err = store
        .place_order(&test_order(&user, &[(&ghost, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::ProductNotFound(id) if id == ghost.id));
}

#[tokio::test]
#[serial]
async fn idempotency_key_returns_existing_order() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 5);
    store.insert_product(&milk).await.unwrap();

    let mut order = test_order(&user, &[(&milk, 2)]);
    order.idempotency_key = Some("checkout-1".into());
    let first = store.place_order(&order).await.unwrap();
    assert!(first.created);

    let mut retry = test_order(&user, &[(&milk, 2)]);
    retry.idempotency_key = Some("checkout-1".into());
    let second = store.place_order(&retry).await.unwrap();

    assert!(!second.created);
    assert_eq!(second.order.id, first.order.id);
    assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock, 3);
    assert_eq!(store.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn listings_are_newest_first() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 10);
    store.insert_product(&milk).await.unwrap();

    let mut early = test_order(&user, &[(&milk, 1)]);
    early.created_at = Utc::now() - Duration::hours(2);
    let late = test_order(&user, &[(&milk, 1)]);
    store.place_order(&early).await.unwrap();
    let late_placed = store.place_order(&late).await.unwrap();

    let listed = store.list_orders_for_user(user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, late_placed.order.id);

    let recent = store.list_recent_orders(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, late_placed.order.id);
}

#[tokio::test]
#[serial]
async fn status_update_overwrites_and_returns() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 5);
    store.insert_product(&milk).await.unwrap();
    let placed = store
        .place_order(&test_order(&user, &[(&milk, 1)]))
        .await
        .unwrap();

    let updated = store
        .set_order_status(placed.order.id, OrderStatus::Delivered)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Delivered);

    assert!(
        store
            .set_order_status(OrderId::new(), OrderStatus::Delivered)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn reporting_queries_aggregate_completed_orders() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 100);
    let cheese = test_product("Cheese 500g", "cheese", 2000, 100);
    store.insert_product(&milk).await.unwrap();
    store.insert_product(&cheese).await.unwrap();

    let start = Utc::now() - Duration::days(6);

    let mut inside = test_order(&user, &[(&milk, 2), (&cheese, 1)]);
    inside.status = OrderStatus::Completed;
    store.place_order(&inside).await.unwrap();

    let mut outside = test_order(&user, &[(&milk, 1)]);
    outside.status = OrderStatus::Completed;
    outside.created_at = Utc::now() - Duration::days(30);
    store.place_order(&outside).await.unwrap();

    let pending = test_order(&user, &[(&cheese, 1)]);
    store.place_order(&pending).await.unwrap();

    let in_range = store.completed_total_since(Some(start)).await.unwrap();
    assert_eq!(in_range.cents(), 2 * 350 + 2000);
    let all_time = store.completed_total_since(None).await.unwrap();
    assert_eq!(all_time.cents(), 2 * 350 + 2000 + 350);

    assert_eq!(store.count_orders_since(start).await.unwrap(), 2);
    assert_eq!(
        store
            .count_orders_with_status(OrderStatus::Pending)
            .await
            .unwrap(),
        1
    );

    let buckets = store
        .sales_buckets(start, SalesGranularity::Daily)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, Utc::now().format("%Y-%m-%d").to_string());
    assert_eq!(buckets[0].sales.cents(), 2 * 350 + 2000);
    assert_eq!(buckets[0].count, 1);

    let categories = store.sales_by_category(start).await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].category, "cheese");
    assert_eq!(categories[0].sales.cents(), 2000);
    assert_eq!(categories[1].category, "milk");
    assert_eq!(categories[1].sales.cents(), 700);
}

#[tokio::test]
#[serial]
async fn monthly_buckets_group_by_month() {
    let store = get_test_store().await;
    let user = test_user("alice");
    store.insert_user(&user).await.unwrap();
    let milk = test_product("Milk 1L", "milk", 350, 100);
    store.insert_product(&milk).await.unwrap();

    let mut order = test_order(&user, &[(&milk, 1)]);
    order.status = OrderStatus::Completed;
    store.place_order(&order).await.unwrap();

    let buckets = store
        .sales_buckets(Utc::now() - Duration::days(1), SalesGranularity::Monthly)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, Utc::now().format("%Y-%m").to_string());
}
