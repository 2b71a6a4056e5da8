//! # Order Repository
//!
//! The reservation ledger: orders, their items, and the aggregation the
//! availability calculator runs against them.
//!
//! ## Overlap Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Query window            [ start ........ end ]                         │
//! │                                                                         │
//! │  item A        [ s .. e ]                       e >= start  ✓ counts    │
//! │  item B                        [ s .. e ]       inside      ✓ counts    │
//! │  item C                                  [ s ...... e ]     ✓ counts    │
//! │  item D  [ s. e ]                               e < start   ✗           │
//! │                                                                         │
//! │  SUM(quantity) WHERE start_date <= :end AND end_date >= :start          │
//! │                 AND order.status IN (:active statuses)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rental_core::{DateRange, Order, OrderItem, OrderStatus, Reservation};

/// A line to reserve when creating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub range: DateRange,
}

/// Repository for the reservation ledger.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order and its items in one transaction.
    ///
    /// No availability check happens here: reserving is the caller's
    /// decision, made after an availability check.
    pub async fn create_order(
        &self,
        status: OrderStatus,
        items: &[NewOrderItem],
    ) -> DbResult<(Order, Vec<OrderItem>)> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            status,
            created_at: now,
            updated_at: now,
        };

        debug!(order_id = %order.id, status = %status, items = items.len(), "Creating order");

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO orders (id, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&order.id)
            .bind(order.status)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            let row = OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                start_date: item.range.start(),
                end_date: item.range.end(),
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&row.id)
            .bind(&row.order_id)
            .bind(&row.product_id)
            .bind(row.quantity)
            .bind(row.start_date)
            .bind(row.end_date)
            .execute(&mut *tx)
            .await?;

            stored.push(row);
        }

        tx.commit().await?;
        Ok((order, stored))
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, status, created_at, updated_at FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Moves an order forward in its lifecycle.
    ///
    /// The allowed predecessors are part of the WHERE clause, so two racing
    /// transitions cannot both apply.
    ///
    /// ## Returns
    /// * `Ok(Some(order))` - Transition applied
    /// * `Ok(None)` - Current status does not allow `next`
    /// * `Err(DbError::NotFound)` - No such order
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> DbResult<Option<Order>> {
        let predecessors = OrderStatus::predecessors(next);
        if predecessors.is_empty() {
            return match self.get_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(DbError::not_found("Order", id)),
            };
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE orders SET status = ");
        qb.push_bind(next);
        qb.push(", updated_at = ").push_bind(Utc::now());
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND status IN (");
        let mut statuses = qb.separated(", ");
        for status in predecessors {
            statuses.push_bind(status);
        }
        statuses.push_unseparated(") RETURNING id, status, created_at, updated_at");

        let updated = qb
            .build_query_as::<Order>()
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(order) => {
                debug!(order_id = %id, status = %next, "Order status updated");
                Ok(Some(order))
            }
            None => match self.get_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(DbError::not_found("Order", id)),
            },
        }
    }

    /// Sum of quantities reserved against `product_id` by items overlapping
    /// `range` whose order status is in `statuses`. Bounds are inclusive.
    pub async fn reserved_quantity(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> DbResult<i64> {
        if statuses.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT COALESCE(SUM(oi.quantity), 0) FROM order_items oi \
             INNER JOIN orders o ON o.id = oi.order_id WHERE oi.product_id = ",
        );
        push_overlap_filter(&mut qb, product_id, range, statuses);

        let reserved: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        debug!(product_id = %product_id, reserved = reserved, "Aggregated reservations");
        Ok(reserved)
    }

    /// The individual reservations behind [`Self::reserved_quantity`],
    /// ordered by start date.
    pub async fn reservations(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> DbResult<Vec<Reservation>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT oi.order_id, oi.product_id, oi.quantity, oi.start_date, oi.end_date, o.status \
             FROM order_items oi INNER JOIN orders o ON o.id = oi.order_id WHERE oi.product_id = ",
        );
        push_overlap_filter(&mut qb, product_id, range, statuses);
        qb.push(" ORDER BY oi.start_date, oi.id");

        let rows = qb
            .build_query_as::<Reservation>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

/// Appends `:product AND overlap AND status IN (...)` to a query whose text
/// ends with `oi.product_id = `.
fn push_overlap_filter<'args>(
    qb: &mut QueryBuilder<'args, Sqlite>,
    product_id: &'args str,
    range: &DateRange,
    statuses: &[OrderStatus],
) {
    qb.push_bind(product_id);
    qb.push(" AND oi.start_date <= ").push_bind(range.end());
    qb.push(" AND oi.end_date >= ").push_bind(range.start());
    qb.push(" AND o.status IN (");
    let mut separated = qb.separated(", ");
    for status in statuses {
        separated.push_bind(*status);
    }
    separated.push_unseparated(")");
}
