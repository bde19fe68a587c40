//! Postgres-backed market store.
//!
//! Schema lives in `schema.sql` at the crate root. The interesting part is
//! [`PostgresStore::commit_order`]: one transaction that, per reservation,
//! re-reads the product row, re-runs the stock ledger classification, and
//! guards the decrement with a conditional update on the observed version —
//! `UPDATE products SET stock = stock - q, version = version + 1 WHERE id = $1
//! AND version = $2`. A zero-row update means another writer committed between
//! our read and our write, which is a conflict, never a silent overwrite.
//!
//! ## Error mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx error | PostgreSQL code | StoreError | Scenario |
//! |------------|-----------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Concurrent insert of the same keyed row (e.g. cart entry per user/product) |
//! | Database (check violation) | `23514` | `Backend` | Row data violating schema constraints (should not pass domain validation) |
//! | Database (other) | any other | `Backend` | Other database errors |
//! | PoolClosed / RowNotFound / rest | n/a | `Backend` | Environmental failures |

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;

use bazaar_cart::{CartEntry, CartEntryId};
use bazaar_catalog::{Product, ProductFilter, ProductId, StockReservation};
use bazaar_core::{EntityId, UserId, Version};
use bazaar_orders::{Order, OrderId, OrderLine};
use bazaar_reviews::{Review, ReviewId};

use super::{CartStore, OrderStore, Pagination, ProductStore, ReviewStore, StoreError};

/// Postgres-backed market store.
///
/// Shares its SQLx connection pool across clones; all multi-row writes run in
/// transactions.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, description, price, stock, category, image_url, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(product.id.0))
        .bind(Uuid::from(product.seller_id))
        .bind(&product.name)
        .bind(&product.description)
        .bind(to_db_amount(product.price)?)
        .bind(i64::from(product.stock))
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(to_db_version(product.version)?)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(Uuid::from(id.0))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;

        row.map(|row| ProductRow::from_row(&row).map_err(corrupt_row)?.try_into())
            .transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, expected = %expected), err)]
    async fn update_product(&self, product: &Product, expected: Version) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, stock = $5, category = $6,
                image_url = $7, version = $8
            WHERE id = $1 AND version = $9
            "#,
        )
        .bind(Uuid::from(product.id.0))
        .bind(&product.name)
        .bind(&product.description)
        .bind(to_db_amount(product.price)?)
        .bind(i64::from(product.stock))
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(to_db_version(product.version)?)
        .bind(to_db_version(expected)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            // Zero rows: either the row is gone or someone else moved it on.
            let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
                .bind(Uuid::from(product.id.0))
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_product", e))?
                .is_some();
            return Err(if exists {
                StoreError::Conflict(format!(
                    "product {}: stale version (observed {expected})",
                    product.id
                ))
            } else {
                StoreError::NotFound(format!("product {}", product.id))
            });
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(Uuid::from(id.0))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        let min_price = filter.min_price.map(to_db_amount).transpose()?;
        let max_price = filter.max_price.map(to_db_amount).transpose()?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::bigint IS NULL OR price >= $2)
              AND ($3::bigint IS NULL OR price <= $3)
            ORDER BY created_at DESC, id DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(&filter.category)
        .bind(min_price)
        .bind(max_price)
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(|row| ProductRow::from_row(row).map_err(corrupt_row)?.try_into())
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(
        skip(self, order, reservations),
        fields(order_id = %order.id(), buyer = %order.buyer_id(), line_count = order.lines().len()),
        err
    )]
    async fn commit_order(
        &self,
        order: Order,
        reservations: Vec<StockReservation>,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for reservation in &reservations {
            // Re-read inside the transaction and classify with the same
            // decision the in-memory backend uses: stale version → Conflict,
            // short stock → InsufficientStock.
            let row = sqlx::query("SELECT stock, version FROM products WHERE id = $1")
                .bind(Uuid::from(reservation.product_id.0))
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("commit_order", e))?
                .ok_or_else(|| {
                    StoreError::NotFound(format!("product {}", reservation.product_id))
                })?;

            let stock = from_db_count(row.try_get("stock").map_err(corrupt_row)?)?;
            let stored = from_db_version(row.try_get("version").map_err(corrupt_row)?)?;
            reservation.check_against(stock, stored)?;

            // The conditional update is the authoritative guard: a writer that
            // committed between our read and this write takes zero rows here.
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, version = version + 1
                WHERE id = $1 AND version = $3
                "#,
            )
            .bind(Uuid::from(reservation.product_id.0))
            .bind(i64::from(reservation.quantity))
            .bind(to_db_version(reservation.expected_version)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_order", e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Conflict(format!(
                    "product {}: stale version (observed {})",
                    reservation.product_id, reservation.expected_version
                )));
            }
        }

        sqlx::query("INSERT INTO orders (id, buyer_id, placed_at) VALUES ($1, $2, $3)")
            .bind(Uuid::from(order.id().0))
            .bind(Uuid::from(order.buyer_id()))
            .bind(order.placed_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_order", e))?;

        for (line_no, line) in order.lines().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, line_no, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::from(order.id().0))
            .bind(line_no as i32)
            .bind(Uuid::from(line.product_id.0))
            .bind(i64::from(line.quantity))
            .bind(to_db_amount(line.unit_price)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_order", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.buyer_id, o.placed_at, l.line_no, l.product_id, l.quantity, l.unit_price
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE o.id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(Uuid::from(id.0))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order", e))?;

        let mut orders = group_order_rows(&rows)?;
        Ok(orders.pop())
    }

    async fn orders_for(&self, buyer: UserId, page: Pagination) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.buyer_id, o.placed_at, l.line_no, l.product_id, l.quantity, l.unit_price
            FROM (
                SELECT id, buyer_id, placed_at FROM orders
                WHERE buyer_id = $1
                ORDER BY placed_at DESC, id DESC
                OFFSET $2 LIMIT $3
            ) o
            JOIN order_lines l ON l.order_id = o.id
            ORDER BY o.placed_at DESC, o.id DESC, l.line_no
            "#,
        )
        .bind(Uuid::from(buyer))
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for", e))?;

        group_order_rows(&rows)
    }

    async fn has_purchased(&self, buyer: UserId, product: ProductId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM orders o
                JOIN order_lines l ON l.order_id = o.id
                WHERE o.buyer_id = $1 AND l.product_id = $2
            ) AS purchased
            "#,
        )
        .bind(Uuid::from(buyer))
        .bind(Uuid::from(product.0))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("has_purchased", e))?;

        row.try_get("purchased").map_err(corrupt_row)
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn insert_cart_entry(&self, entry: CartEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cart_entries (id, user_id, product_id, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::from(entry.id.0))
        .bind(Uuid::from(entry.user_id))
        .bind(Uuid::from(entry.product_id.0))
        .bind(i64::from(entry.quantity))
        .bind(entry.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_cart_entry", e))?;
        Ok(())
    }

    async fn update_cart_entry(&self, entry: &CartEntry) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE cart_entries SET quantity = $2 WHERE id = $1")
            .bind(Uuid::from(entry.id.0))
            .bind(i64::from(entry.quantity))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_cart_entry", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cart entry {}", entry.id)));
        }
        Ok(())
    }

    async fn cart_entry(&self, id: CartEntryId) -> Result<Option<CartEntry>, StoreError> {
        let row = sqlx::query("SELECT * FROM cart_entries WHERE id = $1")
            .bind(Uuid::from(id.0))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart_entry", e))?;

        row.map(|row| CartEntryRow::from_row(&row).map_err(corrupt_row)?.try_into())
            .transpose()
    }

    async fn cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartEntry>, StoreError> {
        let row = sqlx::query("SELECT * FROM cart_entries WHERE user_id = $1 AND product_id = $2")
            .bind(Uuid::from(user))
            .bind(Uuid::from(product.0))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart_entry_for_product", e))?;

        row.map(|row| CartEntryRow::from_row(&row).map_err(corrupt_row)?.try_into())
            .transpose()
    }

    async fn cart_entries_for(&self, user: UserId) -> Result<Vec<CartEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM cart_entries WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(Uuid::from(user))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart_entries_for", e))?;

        rows.iter()
            .map(|row| CartEntryRow::from_row(row).map_err(corrupt_row)?.try_into())
            .collect()
    }

    async fn delete_cart_entry(&self, id: CartEntryId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_entries WHERE id = $1")
            .bind(Uuid::from(id.0))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_cart_entry", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_cart_entry_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = $1 AND product_id = $2")
            .bind(Uuid::from(user))
            .bind(Uuid::from(product.0))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_cart_entry_for_product", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    async fn insert_review(&self, review: Review) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, author_id, rating, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::from(review.id.0))
        .bind(Uuid::from(review.product_id.0))
        .bind(Uuid::from(review.author_id))
        .bind(i32::from(review.rating))
        .bind(&review.content)
        .bind(review.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_review", e))?;
        Ok(())
    }

    async fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query("SELECT * FROM reviews WHERE id = $1")
            .bind(Uuid::from(id.0))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("review", e))?;

        row.map(|row| ReviewRow::from_row(&row).map_err(corrupt_row)?.try_into())
            .transpose()
    }

    async fn update_review(&self, review: &Review) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE reviews SET rating = $2, content = $3 WHERE id = $1")
            .bind(Uuid::from(review.id.0))
            .bind(i32::from(review.rating))
            .bind(&review.content)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("review {}", review.id)));
        }
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(Uuid::from(id.0))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_product(
        &self,
        product: ProductId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(Uuid::from(product.0))
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews_for_product", e))?;

        rows.iter()
            .map(|row| ReviewRow::from_row(row).map_err(corrupt_row)?.try_into())
            .collect()
    }

    async fn reviews_by_author(
        &self,
        author: UserId,
        page: Pagination,
    ) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(Uuid::from(author))
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews_by_author", e))?;

        rows.iter()
            .map(|row| ReviewRow::from_row(row).map_err(corrupt_row)?.try_into())
            .collect()
    }
}

struct ProductRow {
    id: Uuid,
    seller_id: Uuid,
    name: String,
    description: String,
    price: i64,
    stock: i64,
    category: String,
    image_url: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            seller_id: row.try_get("seller_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            image_url: row.try_get("image_url")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::new(EntityId::from(row.id)),
            seller_id: UserId::from(row.seller_id),
            name: row.name,
            description: row.description,
            price: from_db_amount(row.price)?,
            stock: from_db_count(row.stock)?,
            category: row.category,
            image_url: row.image_url,
            version: from_db_version(row.version)?,
            created_at: row.created_at,
        })
    }
}

struct CartEntryRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CartEntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CartEntryRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<CartEntryRow> for CartEntry {
    type Error = StoreError;

    fn try_from(row: CartEntryRow) -> Result<Self, Self::Error> {
        Ok(CartEntry {
            id: CartEntryId::new(EntityId::from(row.id)),
            user_id: UserId::from(row.user_id),
            product_id: ProductId::new(EntityId::from(row.product_id)),
            quantity: from_db_count(row.quantity)?,
            created_at: row.created_at,
        })
    }
}

struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    author_id: Uuid,
    rating: i32,
    content: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ReviewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            author_id: row.try_get("author_id")?,
            rating: row.try_get("rating")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: ReviewId::new(EntityId::from(row.id)),
            product_id: ProductId::new(EntityId::from(row.product_id)),
            author_id: UserId::from(row.author_id),
            rating: u8::try_from(row.rating)
                .map_err(|_| StoreError::Backend("rating out of range".to_string()))?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

/// Group joined order/line rows into orders, preserving the row order.
fn group_order_rows(rows: &[PgRow]) -> Result<Vec<Order>, StoreError> {
    let mut orders: Vec<Order> = Vec::new();
    let mut current: Option<(OrderId, Uuid, DateTime<Utc>, Vec<OrderLine>)> = None;

    for row in rows {
        let id = OrderId::new(EntityId::from(row.try_get::<Uuid, _>("id").map_err(corrupt_row)?));
        let buyer_id: Uuid = row.try_get("buyer_id").map_err(corrupt_row)?;
        let placed_at: DateTime<Utc> = row.try_get("placed_at").map_err(corrupt_row)?;
        let line = OrderLine {
            product_id: ProductId::new(EntityId::from(
                row.try_get::<Uuid, _>("product_id").map_err(corrupt_row)?,
            )),
            quantity: from_db_count(row.try_get("quantity").map_err(corrupt_row)?)?,
            unit_price: from_db_amount(row.try_get("unit_price").map_err(corrupt_row)?)?,
        };

        match &mut current {
            Some((current_id, _, _, lines)) if *current_id == id => lines.push(line),
            _ => {
                if let Some(done) = current.take() {
                    orders.push(assemble_order(done)?);
                }
                current = Some((id, buyer_id, placed_at, vec![line]));
            }
        }
    }
    if let Some(done) = current.take() {
        orders.push(assemble_order(done)?);
    }
    Ok(orders)
}

fn assemble_order(
    (id, buyer_id, placed_at, lines): (OrderId, Uuid, DateTime<Utc>, Vec<OrderLine>),
) -> Result<Order, StoreError> {
    Order::new(id, UserId::from(buyer_id), lines, placed_at)
        .map_err(|e| StoreError::Backend(format!("corrupt order row: {e}")))
}

fn to_db_amount(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Backend("amount out of range".to_string()))
}

fn from_db_amount(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Backend("negative amount in row".to_string()))
}

fn from_db_count(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Backend("count out of range in row".to_string()))
}

fn to_db_version(version: Version) -> Result<i64, StoreError> {
    i64::try_from(version.value())
        .map_err(|_| StoreError::Backend("version out of range".to_string()))
}

fn from_db_version(value: i64) -> Result<Version, StoreError> {
    u64::try_from(value)
        .map(Version::new)
        .map_err(|_| StoreError::Backend("negative version in row".to_string()))
}

fn corrupt_row(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to deserialize row: {err}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Unique violation: a concurrent insert of the same keyed row.
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Backend(format!("unexpected row not found in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
