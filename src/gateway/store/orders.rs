//! Order operations: `/orders/` group.
//!
//! Checkout is the canonical creation path: one transaction reads the locked
//! cart, copies its items, computes totals from the enriched prices, writes
//! the initial `pending` history row and clears the cart. Direct creation is
//! identical except items come from the request. Status changes flow through
//! the transition table only, and every accepted change appends one history
//! row; nothing else ever touches `orders.status`.
//!
use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::QueryBuilder;

use crate::error::{ErrorKind, Result, TimeleError};
use crate::gateway::models::{
    CartItemSpec, DeliveryInfo, EnrichedItem, NewOrder, OrderPage, OrderRow, OrderStatus,
    OrderView, StatusChange, StatusHistoryEntry, StatusHistoryRow, TrackingInfo,
};
use crate::gateway::store::carts::{lock_cart_for_user, merge_item_specs, validate_products};
use crate::gateway::store::{parse_external_id, resolve_user, Store};

const ORDER_COLUMNS: &str =
    "o.id, u.external_id AS user_external_id, o.order_number, o.status, o.delivery_name, \
     o.phone, o.street, o.city, o.postal_code, o.country, o.tracking_number, o.carrier, \
     o.tracking_url, o.invoice, o.total_items, o.total_price, o.created_at, o.updated_at";

const ORDER_ITEMS_SQL: &str =
    "SELECT oi.order_id, oi.product_id, p.product_name, oi.quantity, oi.add_to_cart_order, \
         oi.reordered, pe.description, pe.price, pe.image_url, a.aisle, d.department \
     FROM order_items oi \
     JOIN products p ON p.product_id = oi.product_id \
     JOIN aisles a ON a.aisle_id = p.aisle_id \
     JOIN departments d ON d.department_id = p.department_id \
     LEFT JOIN product_enriched pe ON pe.product_id = oi.product_id \
     WHERE oi.order_id = ANY($1) \
     ORDER BY oi.add_to_cart_order ASC, oi.product_id ASC";

/// An order item row tagged with its order id, used to group bulk item reads
/// without per-order queries.
#[derive(sqlx::FromRow)]
struct TaggedItemRow {
    order_id: i64,
    #[sqlx(flatten)]
    item: EnrichedItem,
}

/// A raw cart/order line used while building an order.
#[derive(sqlx::FromRow)]
struct SourceLine {
    product_id: i32,
    quantity: i32,
    add_to_cart_order: i32,
    reordered: bool,
    price: Option<Decimal>,
}

/// Order operations.
///
pub struct Orders<'s> {
    store: &'s Store,
}

impl<'s> Orders<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Converts the user's cart into an order.
    ///
    /// Fails with `EmptyCart` when the cart is missing or holds no items.
    /// Atomic: any failure rolls back the order, its items, the history row
    /// and the cart clearing together.
    pub async fn checkout(&self, raw_external_id: &str, delivery: &DeliveryInfo) -> Result<OrderView> {
        let external_id = parse_external_id(raw_external_id)?;
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        // Lock the user row first, then the cart row; the same order as
        // direct creation, so the two paths cannot deadlock each other.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let cart_id = lock_cart_for_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| TimeleError::service(ErrorKind::EmptyCart, "cart has no items"))?;

        let lines: Vec<SourceLine> = sqlx::query_as(
            "SELECT ci.product_id, ci.quantity, ci.add_to_cart_order, ci.reordered, pe.price \
             FROM cart_items ci \
             LEFT JOIN product_enriched pe ON pe.product_id = ci.product_id \
             WHERE ci.cart_id = $1 \
             ORDER BY ci.add_to_cart_order ASC, ci.product_id ASC",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;
        if lines.is_empty() {
            return Err(TimeleError::service(ErrorKind::EmptyCart, "cart has no items"));
        }

        let order_id = insert_order(&mut tx, user_id, &lines, delivery, now).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE carts SET updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.get(order_id).await
    }

    /// Creates an order directly from request items; the cart is untouched.
    pub async fn create(&self, request: &NewOrder) -> Result<OrderView> {
        let now = Utc::now();
        let items = merge_item_specs(&request.items)?;
        if items.is_empty() {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "order requires at least one item",
            ));
        }
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, request.user_id).await?;
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        validate_products(&mut tx, &items).await?;
        let lines = build_lines(&mut tx, user_id, &items).await?;
        let order_id = insert_order(&mut tx, user_id, &lines, &request.delivery, now).await?;
        tx.commit().await?;
        self.get(order_id).await
    }

    /// Applies one status transition through the state machine, appending the
    /// history row that records it.
    pub async fn transition(&self, order_id: i64, change: &StatusChange) -> Result<OrderView> {
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (current,) =
            current.ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "order not found"))?;
        let current: OrderStatus = current.parse()?;
        if !current.can_transition_to(change.status) {
            return Err(TimeleError::service(
                ErrorKind::IllegalTransition,
                format!("cannot transition from {current} to {}", change.status),
            ));
        }
        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(change.status.as_str())
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        if let Some(tracking) = &change.tracking {
            sqlx::query(
                "UPDATE orders SET tracking_number = $1, carrier = $2, tracking_url = $3 \
                 WHERE id = $4",
            )
            .bind(&tracking.tracking_number)
            .bind(&tracking.carrier)
            .bind(&tracking.tracking_url)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query(
            "INSERT INTO order_status_history (order_id, status, changed_at, changed_by, note) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(change.status.as_str())
        .bind(now)
        .bind(change.changed_by.as_deref().unwrap_or("system"))
        .bind(&change.note)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        self.get(order_id).await
    }

    /// Fetches the full order: enriched items and the complete status history
    /// ascending by change time.
    pub async fn get(&self, order_id: i64) -> Result<OrderView> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o \
             LEFT JOIN users u ON u.id = o.user_id \
             WHERE o.id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.store.pool())
        .await?;
        let row = row.ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "order not found"))?;

        let items: Vec<TaggedItemRow> = sqlx::query_as(ORDER_ITEMS_SQL)
            .bind(vec![order_id])
            .fetch_all(self.store.pool())
            .await?;
        let history: Vec<StatusHistoryRow> = sqlx::query_as(
            "SELECT history_id, order_id, status, changed_at, changed_by, note \
             FROM order_status_history \
             WHERE order_id = $1 \
             ORDER BY changed_at ASC, history_id ASC",
        )
        .bind(order_id)
        .fetch_all(self.store.pool())
        .await?;

        let history = history
            .into_iter()
            .map(history_entry)
            .collect::<Result<Vec<_>>>()?;
        order_view(row, items.into_iter().map(|t| t.item).collect(), history)
    }

    /// Paginates one user's orders, newest first, each with enriched items.
    pub async fn list_for_user(
        &self,
        raw_external_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<OrderPage> {
        let external_id = parse_external_id(raw_external_id)?;
        let user_id = resolve_user(self.store.pool(), external_id).await?;
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.store.pool())
            .await?;
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o \
             LEFT JOIN users u ON u.id = o.user_id \
             WHERE o.user_id = $1 \
             ORDER BY o.created_at DESC, o.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.store.pool())
        .await?;

        // One bulk item fetch for the whole page; grouping happens in memory.
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut grouped: HashMap<i64, Vec<EnrichedItem>> = HashMap::new();
        if !ids.is_empty() {
            let tagged: Vec<TaggedItemRow> = sqlx::query_as(ORDER_ITEMS_SQL)
                .bind(&ids)
                .fetch_all(self.store.pool())
                .await?;
            for t in tagged {
                grouped.entry(t.order_id).or_default().push(t.item);
            }
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = grouped.remove(&row.id).unwrap_or_default();
                order_view(row, items, vec![])
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OrderPage {
            orders,
            total,
            limit,
            offset,
        })
    }
}

/// Builds order lines from request items: positions follow the request
/// order, and the reordered flag reflects whether the user has bought the
/// product before.
async fn build_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    items: &[CartItemSpec],
) -> Result<Vec<SourceLine>> {
    let ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let prices: Vec<(i32, Option<Decimal>)> = sqlx::query_as(
        "SELECT p.product_id, pe.price FROM products p \
         LEFT JOIN product_enriched pe ON pe.product_id = p.product_id \
         WHERE p.product_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;
    let prices: HashMap<i32, Option<Decimal>> = prices.into_iter().collect();

    let previously_ordered: Vec<(i32,)> = sqlx::query_as(
        "SELECT DISTINCT oi.product_id FROM order_items oi \
         JOIN orders o ON o.id = oi.order_id \
         WHERE o.user_id = $1 AND oi.product_id = ANY($2)",
    )
    .bind(user_id)
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;
    let previously_ordered: std::collections::HashSet<i32> =
        previously_ordered.into_iter().map(|r| r.0).collect();

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| SourceLine {
            product_id: item.product_id,
            quantity: item.quantity,
            add_to_cart_order: i as i32 + 1,
            reordered: previously_ordered.contains(&item.product_id),
            price: prices.get(&item.product_id).cloned().flatten(),
        })
        .collect())
}

/// Inserts the order row, its items and the initial `pending` history entry,
/// all stamped with the same instant.
async fn insert_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    lines: &[SourceLine],
    delivery: &DeliveryInfo,
    now: chrono::DateTime<Utc>,
) -> Result<i64> {
    let total_items: i64 = lines.iter().map(|l| i64::from(l.quantity)).sum();
    let total_price: Decimal = lines
        .iter()
        .map(|l| Decimal::from(l.quantity) * l.price.unwrap_or_default())
        .sum();

    let (order_number,): (i32,) = sqlx::query_as(
        "SELECT COALESCE(MAX(order_number), 0) + 1 FROM orders WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    let (order_id,): (i64,) = sqlx::query_as(
        "INSERT INTO orders (user_id, order_number, status, delivery_name, phone, street, \
             city, postal_code, country, total_items, total_price, created_at, updated_at) \
         VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
         RETURNING id",
    )
    .bind(user_id)
    .bind(order_number)
    .bind(&delivery.name)
    .bind(&delivery.phone)
    .bind(&delivery.street)
    .bind(&delivery.city)
    .bind(&delivery.postal_code)
    .bind(&delivery.country)
    .bind(total_items as i32)
    .bind(total_price)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    let mut qb = QueryBuilder::new(
        "INSERT INTO order_items (order_id, product_id, quantity, add_to_cart_order, reordered) ",
    );
    qb.push_values(lines.iter(), |mut b, line| {
        b.push_bind(order_id)
            .push_bind(line.product_id)
            .push_bind(line.quantity)
            .push_bind(line.add_to_cart_order)
            .push_bind(line.reordered);
    });
    qb.build().execute(&mut **tx).await?;

    sqlx::query(
        "INSERT INTO order_status_history (order_id, status, changed_at, changed_by, note) \
         VALUES ($1, 'pending', $2, NULL, 'Order created')",
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(order_id)
}

fn history_entry(row: StatusHistoryRow) -> Result<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
        history_id: row.history_id,
        order_id: row.order_id,
        status: row.status.parse()?,
        changed_at: row.changed_at,
        changed_by: row.changed_by,
        note: row.note,
    })
}

fn order_view(
    row: OrderRow,
    items: Vec<EnrichedItem>,
    status_history: Vec<StatusHistoryEntry>,
) -> Result<OrderView> {
    Ok(OrderView {
        order_id: row.id,
        user_id: row.user_external_id,
        order_number: row.order_number,
        status: row.status.parse()?,
        total_items: row.total_items,
        total_price: row.total_price,
        delivery: DeliveryInfo {
            name: row.delivery_name,
            phone: row.phone,
            street: row.street,
            city: row.city,
            postal_code: row.postal_code,
            country: row.country,
        },
        tracking: TrackingInfo {
            tracking_number: row.tracking_number,
            carrier: row.carrier,
            tracking_url: row.tracking_url,
        },
        invoice: row.invoice,
        created_at: row.created_at,
        updated_at: row.updated_at,
        items,
        status_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(quantity: i32, price: Option<&str>) -> SourceLine {
        SourceLine {
            product_id: 1,
            quantity,
            add_to_cart_order: 1,
            reordered: false,
            price: price.map(|p| p.parse().unwrap()),
        }
    }

    #[test]
    fn test_totals_use_enriched_price_or_zero() {
        let lines = vec![line(2, Some("4.99")), line(3, None), line(1, Some("0.50"))];
        let total_items: i64 = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let total_price: Decimal = lines
            .iter()
            .map(|l| Decimal::from(l.quantity) * l.price.unwrap_or_default())
            .sum();
        assert_eq!(total_items, 6);
        assert_eq!(total_price, "10.48".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_order_view_parses_stored_status() {
        let row = OrderRow {
            id: 3_422_001,
            user_external_id: Some(Uuid::nil()),
            order_number: 1,
            status: "shipped".into(),
            delivery_name: None,
            phone: None,
            street: None,
            city: None,
            postal_code: None,
            country: None,
            tracking_number: Some("TRK-1".into()),
            carrier: None,
            tracking_url: None,
            invoice: None,
            total_items: 1,
            total_price: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = order_view(row, vec![], vec![]).unwrap();
        assert_eq!(view.status, OrderStatus::Shipped);
        assert_eq!(view.tracking.tracking_number.as_deref(), Some("TRK-1"));
    }
}
