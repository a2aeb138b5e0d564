//! Postgres-backed store implementation.
//!
//! ## Error mapping
//!
//! SQLx errors are mapped through [`StoreError::from`]:
//!
//! | PostgreSQL error code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` (unique violation) | `Domain(Conflict)` | Duplicate username/email |
//! | anything else | `Database` | Connection/query failures |
//!
//! ## Atomic order placement
//!
//! `place_order` runs as a single transaction:
//! 1. `SELECT … FOR UPDATE` on the referenced product rows (sorted by id so
//!    two concurrent placements acquire locks in the same order),
//! 2. price the request against the locked snapshot,
//! 3. insert the order and its line items,
//! 4. decrement stock with a `stock >= quantity` guard,
//! 5. commit.
//!
//! Any failure before the commit rolls everything back, so an order either
//! lands with all of its line items and stock decrements or not at all. The
//! row locks serialize concurrent placements for the same product, and the
//! guarded update plus the `stock >= 0` check constraint make a negative
//! stock value impossible.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use tienda_auth::{NewUser, Role, User};
use tienda_catalog::{NewProduct, Product, ProductPatch};
use tienda_core::{DomainError, LineItemId, OrderId, ProductId, UserId};
use tienda_orders::{LineItem, Order, OrderStatus, PlacedOrder, RequestedLine, price_order};

use crate::{Store, StoreError};

/// Postgres [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema (idempotent `CREATE TABLE IF NOT EXISTS`).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(include_str!("../sql/schema.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            StoreError::Domain(DomainError::invariant(format!(
                "unknown role {:?} stored for user {}",
                row.role, row.id
            )))
        })?;
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            role,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    price: Decimal,
    stock: i64,
    condition: String,
    image: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            stock: row.stock,
            condition: row.condition,
            image: row.image,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    placed_at: DateTime<Utc>,
    status: String,
    total: Decimal,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Domain(DomainError::invariant(format!(
                "unknown status {:?} stored for order {}",
                row.status, row.id
            )))
        })?;
        Ok(Order {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            placed_at: row.placed_at,
            status,
            total: row.total,
        })
    }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i64,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        LineItem {
            id: LineItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, email, first_name, last_name, password_hash, role
    FROM users
"#;

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, description, category, price, stock, condition, image
    FROM products
"#;

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self, new), fields(username = %new.username), err)]
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, password_hash, role
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), err)]
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        // Username takes precedence over email, matching the login contract.
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "{SELECT_USER} WHERE username = $1 OR email = $1 ORDER BY (username = $1) DESC LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, category, price, stock, condition, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, category, price, stock, condition, image
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.price)
        .bind(new.stock)
        .bind(&new.condition)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = $1 FOR UPDATE"))
                .bind(id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;
        let current: Product = row
            .map(Product::from)
            .ok_or_else(|| DomainError::not_found(format!("product {id} not found")))?;

        let updated = current.apply_patch(patch)?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, category = $4, price = $5,
                stock = $6, condition = $7, image = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(&updated.category)
        .bind(updated.price)
        .bind(updated.stock)
        .bind(&updated.condition)
        .bind(&updated.image)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(
        skip(self, requested),
        fields(user_id = %user_id, line_count = requested.len()),
        err
    )]
    async fn place_order(
        &self,
        user_id: UserId,
        requested: &[RequestedLine],
    ) -> Result<PlacedOrder, StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(user_id.as_i64())
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(DomainError::not_found(format!("user {user_id} not found")).into());
        }

        // Lock referenced products in id order so concurrent placements
        // acquire row locks consistently.
        let mut ids: Vec<i64> = requested.iter().map(|l| l.product_id.as_i64()).collect();
        ids.sort_unstable();
        ids.dedup();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{SELECT_PRODUCT} WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let snapshot: HashMap<ProductId, Product> = rows
            .into_iter()
            .map(Product::from)
            .map(|p| (p.id, p))
            .collect();

        // Dropping the transaction on error rolls everything back.
        let priced = price_order(requested, &snapshot)?;

        let placed_at = Utc::now();
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, placed_at, status, total)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id.as_i64())
        .bind(placed_at)
        .bind(OrderStatus::Pending.as_str())
        .bind(priced.total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items
                    (order_id, product_id, product_name, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(line.product_id.as_i64())
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .fetch_one(&mut *tx)
            .await?;

            // Guarded decrement; the rows are locked, but the floor guard
            // still backs the `stock >= 0` invariant.
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(line.product_id.as_i64())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() != 1 {
                return Err(DomainError::conflict(format!(
                    "insufficient stock for product {}",
                    line.product_id
                ))
                .into());
            }

            items.push(LineItem {
                id: LineItemId::new(item_id),
                order_id: OrderId::new(order_id),
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        tx.commit().await?;

        let order = Order {
            id: OrderId::new(order_id),
            user_id,
            placed_at,
            status: OrderStatus::Pending,
            total: priced.total,
        };
        tracing::info!(order_id, "order placed");
        Ok(PlacedOrder { order, items })
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<PlacedOrder>, StoreError> {
        let order_rows: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, placed_at, status, total
            FROM orders
            WHERE user_id = $1
            ORDER BY placed_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let order_ids: Vec<i64> = order_rows.iter().map(|o| o.id).collect();
        let item_rows: Vec<LineItemRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<i64, Vec<LineItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.into());
        }

        let mut placed = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            placed.push(PlacedOrder {
                order: row.try_into()?,
                items,
            });
        }
        Ok(placed)
    }
}
