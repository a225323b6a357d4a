//! PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartItem, CategorySales, Order, OrderStatus, PaymentMethod, PlacedOrder, Product, Result,
    Role, SalesBucket, SalesGranularity, StoreError, User,
    store::{OrderStore, ProductStore, UserStore},
};

const ORDER_COLUMNS: &str =
    "id, user_id, items, total_cents, shipping_address, payment_method, status, \
     idempotency_key, created_at";

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, category, stock, image_url, created_at";

const USER_COLUMNS: &str = "id, username, email, password_hash, role, cart, created_at";

/// PostgreSQL-backed store.
///
/// Users keep their cart as a JSONB column and orders store their line
/// items and shipping snapshot the same way, so records round-trip in the
/// embedded-document shape they are served in.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store on an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let role_str: String = row.try_get("role")?;
        let role = Role::parse(&role_str).ok_or_else(|| StoreError::Decode {
            field: "role",
            value: role_str.clone(),
        })?;
        let cart: Vec<CartItem> = serde_json::from_value(row.try_get("cart")?)?;

        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            cart,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            category: row.try_get("category")?,
            stock: row.try_get::<i32, _>("stock")? as u32,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let payment_str: String = row.try_get("payment_method")?;
        let payment_method =
            PaymentMethod::parse(&payment_str).ok_or_else(|| StoreError::Decode {
                field: "payment_method",
                value: payment_str.clone(),
            })?;
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str).ok_or_else(|| StoreError::Decode {
            field: "status",
            value: status_str.clone(),
        })?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items: serde_json::from_value(row.try_get("items")?)?,
            total: Money::from_cents(row.try_get("total_cents")?),
            shipping_address: serde_json::from_value(row.try_get("shipping_address")?)?,
            payment_method,
            status,
            idempotency_key: row.try_get("idempotency_key")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn get_order_by_idempotency_key(
        &self,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND idempotency_key = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, cart, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_deref())
        .bind(user.role.as_str())
        .bind(serde_json::to_value(&user.cart)?)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, role = $5, cart = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_deref())
        .bind(user.role.as_str())
        .bind(serde_json::to_value(&user.cart)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_cart(&self, id: UserId, cart: &[CartItem]) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET cart = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(serde_json::to_value(cart)?)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn admin_exists(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price_cents, category, stock, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.category)
        .bind(product.stock as i32)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, category = $5,
                stock = $6, image_url = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.category)
        .bind(product.stock as i32)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, order: &Order) -> Result<PlacedOrder> {
        let mut tx = self.pool.begin().await?;

        if let Some(key) = order.idempotency_key.as_deref() {
            let row = sqlx::query(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND idempotency_key = $2"
            ))
            .bind(order.user_id.as_uuid())
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = row {
                return Ok(PlacedOrder {
                    order: Self::row_to_order(row)?,
                    created: false,
                });
            }
        }

        for item in &order.items {
            // Conditional decrement: zero rows back means the stock check
            // failed inside the database, so no oversell window exists.
            let remaining: Option<i32> = sqlx::query_scalar(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 \
                 RETURNING stock",
            )
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .fetch_optional(&mut *tx)
            .await?;

            if remaining.is_none() {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(item.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;

                // Dropping the transaction rolls back earlier decrements.
                return Err(match available {
                    None => StoreError::ProductNotFound(item.product_id),
                    Some(available) => StoreError::InsufficientStock {
                        product_id: item.product_id,
                        requested: item.quantity,
                        available: available as u32,
                    },
                });
            }
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, items, total_cents, shipping_address, payment_method,
                 status, idempotency_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.total.cents())
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.idempotency_key.as_deref())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            // A concurrent submission with the same key won the race: back
            // out the decrements and return its order.
            let duplicate_key = matches!(
                &e,
                sqlx::Error::Database(db) if db.constraint() == Some("orders_user_idempotency_key")
            );
            if duplicate_key {
                tracing::warn!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    "concurrent submission won the idempotency race, returning its order"
                );
                tx.rollback().await?;
                if let Some(key) = order.idempotency_key.as_deref() {
                    if let Some(existing) =
                        self.get_order_by_idempotency_key(order.user_id, key).await?
                    {
                        return Ok(PlacedOrder {
                            order: existing,
                            created: false,
                        });
                    }
                }
            }
            return Err(StoreError::Database(e));
        }

        sqlx::query("UPDATE users SET cart = '[]'::jsonb WHERE id = $1")
            .bind(order.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PlacedOrder {
            order: order.clone(),
            created: true,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_recent_orders(&self, limit: u32) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn completed_total_since(&self, start: Option<DateTime<Utc>>) -> Result<Money> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)::bigint
            FROM orders
            WHERE status = 'completed'
              AND ($1::timestamptz IS NULL OR created_at >= $1)
            "#,
        )
        .bind(start)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total))
    }

    async fn count_orders_since(&self, start: DateTime<Utc>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(start)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn count_orders_with_status(&self, status: OrderStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn sales_buckets(
        &self,
        start: DateTime<Utc>,
        granularity: SalesGranularity,
    ) -> Result<Vec<SalesBucket>> {
        let rows = sqlx::query(
            r#"
            SELECT to_char(created_at AT TIME ZONE 'UTC', $2) AS date,
                   SUM(total_cents)::bigint AS sales,
                   COUNT(*) AS count
            FROM orders
            WHERE status = 'completed' AND created_at >= $1
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(start)
        .bind(granularity.key_format())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SalesBucket {
                    date: row.try_get("date")?,
                    sales: Money::from_cents(row.try_get("sales")?),
                    count: row.try_get::<i64, _>("count")? as u64,
                })
            })
            .collect()
    }

    async fn sales_by_category(&self, start: DateTime<Utc>) -> Result<Vec<CategorySales>> {
        let rows = sqlx::query(
            r#"
            SELECT p.category AS category,
                   SUM((item->>'quantity')::bigint * (item->>'unitPrice')::bigint)::bigint
                       AS sales
            FROM orders o
            CROSS JOIN LATERAL jsonb_array_elements(o.items) AS item
            JOIN products p ON p.id = (item->>'productId')::uuid
            WHERE o.status = 'completed' AND o.created_at >= $1
            GROUP BY p.category
            ORDER BY sales DESC, category ASC
            "#,
        )
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CategorySales {
                    category: row.try_get("category")?,
                    sales: Money::from_cents(row.try_get("sales")?),
                })
            })
            .collect()
    }
}
