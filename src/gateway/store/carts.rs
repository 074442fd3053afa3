//! Cart operations: `/carts/` group.
//!
//! Every mutation runs in one transaction holding a row-level lock on the
//! cart row, so concurrent modifications by the same user serialize. All
//! mutation paths stamp `updated_at` with the transaction's start instant,
//! and every read serializes items by `add_to_cart_order` ascending with
//! `product_id` as the tiebreak.
//!
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

use crate::error::{ErrorKind, Result, TimeleError};
use crate::gateway::models::{CartItemSpec, CartView, EnrichedItem, NewCart};
use crate::gateway::store::{is_unique_violation, parse_external_id, resolve_user, Store};

const CART_ITEMS_SQL: &str =
    "SELECT ci.product_id, p.product_name, ci.quantity, ci.add_to_cart_order, ci.reordered, \
         pe.description, pe.price, pe.image_url, a.aisle, d.department \
     FROM cart_items ci \
     JOIN products p ON p.product_id = ci.product_id \
     JOIN aisles a ON a.aisle_id = p.aisle_id \
     JOIN departments d ON d.department_id = p.department_id \
     LEFT JOIN product_enriched pe ON pe.product_id = ci.product_id \
     WHERE ci.cart_id = $1 \
     ORDER BY ci.add_to_cart_order ASC, ci.product_id ASC";

/// Cart operations.
///
pub struct Carts<'s> {
    store: &'s Store,
}

impl<'s> Carts<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Reads a user's cart with enriched items.
    ///
    /// A user without a cart gets an empty representation stamped with the
    /// current instant; no row is created by reading.
    pub async fn get(&self, raw_external_id: &str) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        let user_id = resolve_user(self.store.pool(), external_id).await?;
        let cart: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, updated_at FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.store.pool())
                .await?;
        match cart {
            Some((cart_id, updated_at)) => {
                let items: Vec<EnrichedItem> = sqlx::query_as(CART_ITEMS_SQL)
                    .bind(cart_id)
                    .fetch_all(self.store.pool())
                    .await?;
                Ok(CartView {
                    cart_id: Some(cart_id),
                    user_id: external_id,
                    items,
                    updated_at,
                })
            }
            None => Ok(CartView {
                cart_id: None,
                user_id: external_id,
                items: vec![],
                updated_at: Utc::now(),
            }),
        }
    }

    /// Creates a cart for a user; conflicts if one already exists.
    pub async fn create(&self, request: &NewCart) -> Result<CartView> {
        let now = Utc::now();
        let items = merge_item_specs(&request.items)?;
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, request.user_id).await?;
        validate_products(&mut tx, &items).await?;

        let inserted: std::result::Result<(i64,), sqlx::Error> =
            sqlx::query_as("INSERT INTO carts (user_id, updated_at) VALUES ($1, $2) RETURNING id")
                .bind(user_id)
                .bind(now)
                .fetch_one(&mut *tx)
                .await;
        let cart_id = match inserted {
            Ok((id,)) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(TimeleError::service(
                    ErrorKind::Conflict,
                    "user already has a cart",
                ));
            }
            Err(e) => return Err(e.into()),
        };
        insert_items(&mut tx, cart_id, &items, 0).await?;
        tx.commit().await?;
        self.get(&request.user_id.to_string()).await
    }

    /// Replaces the full item set, creating the cart if absent.
    pub async fn replace(&self, raw_external_id: &str, items: &[CartItemSpec]) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        let now = Utc::now();
        let items = merge_item_specs(items)?;
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        validate_products(&mut tx, &items).await?;
        let cart_id = upsert_and_lock_cart(&mut tx, user_id, now).await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, cart_id, &items, 0).await?;
        tx.commit().await?;
        self.get(raw_external_id).await
    }

    /// Adds an item, incrementing the quantity when the product is already in
    /// the cart. The cart row is created on first use.
    pub async fn add_item(
        &self,
        raw_external_id: &str,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        if quantity < 1 {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "quantity must be a positive integer",
            ));
        }
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        validate_products(&mut tx, &[CartItemSpec { product_id, quantity }]).await?;
        let cart_id = upsert_and_lock_cart(&mut tx, user_id, now).await?;
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, add_to_cart_order, reordered) \
             SELECT $1, $2, $3, COALESCE(MAX(add_to_cart_order), 0) + 1, FALSE \
             FROM cart_items WHERE cart_id = $1 \
             ON CONFLICT (cart_id, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        self.get(raw_external_id).await
    }

    /// Sets an item's quantity; zero or less removes the item.
    pub async fn set_item_quantity(
        &self,
        raw_external_id: &str,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        let cart_id = lock_existing_cart(&mut tx, user_id, now).await?;
        if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let updated =
                sqlx::query("UPDATE cart_items SET quantity = $1 WHERE cart_id = $2 AND product_id = $3")
                    .bind(quantity)
                    .bind(cart_id)
                    .bind(product_id)
                    .execute(&mut *tx)
                    .await?;
            if updated.rows_affected() == 0 {
                return Err(TimeleError::service(
                    ErrorKind::NotFound,
                    "product is not in the cart",
                ));
            }
        }
        tx.commit().await?;
        self.get(raw_external_id).await
    }

    /// Removes an item. Removing an absent item is a no-op.
    pub async fn remove_item(&self, raw_external_id: &str, product_id: i32) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        let cart_id = lock_existing_cart(&mut tx, user_id, now).await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.get(raw_external_id).await
    }

    /// Empties the cart, keeping the row.
    pub async fn clear(&self, raw_external_id: &str) -> Result<CartView> {
        let external_id = parse_external_id(raw_external_id)?;
        let now = Utc::now();
        let mut tx = self.store.pool().begin().await?;
        let user_id = resolve_user(&mut *tx, external_id).await?;
        let cart_id = lock_existing_cart(&mut tx, user_id, now).await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.get(raw_external_id).await
    }

    /// Deletes the cart row and its items.
    pub async fn delete(&self, raw_external_id: &str) -> Result<()> {
        let external_id = parse_external_id(raw_external_id)?;
        let user_id = resolve_user(self.store.pool(), external_id).await?;
        let deleted = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(self.store.pool())
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(TimeleError::service(ErrorKind::NotFound, "cart not found"));
        }
        Ok(())
    }
}

/// Collapses duplicate product ids in an incoming item list, summing their
/// quantities while keeping the first occurrence's position. Rejects
/// non-positive quantities.
pub(crate) fn merge_item_specs(items: &[CartItemSpec]) -> Result<Vec<CartItemSpec>> {
    let mut merged: Vec<CartItemSpec> = Vec::with_capacity(items.len());
    let mut index: HashMap<i32, usize> = HashMap::new();
    for item in items {
        if item.quantity < 1 {
            return Err(TimeleError::service(
                ErrorKind::InvalidInput,
                "quantity must be a positive integer",
            ));
        }
        match index.get(&item.product_id) {
            Some(&i) => merged[i].quantity += item.quantity,
            None => {
                index.insert(item.product_id, merged.len());
                merged.push(item.clone());
            }
        }
    }
    Ok(merged)
}

/// Verifies every referenced product exists; unknown ids are an input error,
/// reported by id for the client's benefit.
pub(crate) async fn validate_products(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    items: &[CartItemSpec],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let known: Vec<(i32,)> =
        sqlx::query_as("SELECT product_id FROM products WHERE product_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut **tx)
            .await?;
    if known.len() != ids.len() {
        let known: std::collections::HashSet<i32> = known.into_iter().map(|r| r.0).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !known.contains(id))
            .map(|id| id.to_string())
            .collect();
        return Err(TimeleError::service(
            ErrorKind::InvalidInput,
            format!("unknown product id(s): {}", missing.join(", ")),
        ));
    }
    Ok(())
}

/// Inserts item rows starting at `base_position + 1`.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart_id: i64,
    items: &[CartItemSpec],
    base_position: i32,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::new(
        "INSERT INTO cart_items (cart_id, product_id, quantity, add_to_cart_order, reordered) ",
    );
    qb.push_values(items.iter().enumerate(), |mut b, (i, item)| {
        b.push_bind(cart_id)
            .push_bind(item.product_id)
            .push_bind(item.quantity)
            .push_bind(base_position + i as i32 + 1)
            .push_bind(false);
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

/// Creates-or-touches the cart row and takes its row lock, serializing every
/// concurrent mutation for the same user.
async fn upsert_and_lock_cart(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let (cart_id,): (i64,) = sqlx::query_as(
        "INSERT INTO carts (user_id, updated_at) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET updated_at = EXCLUDED.updated_at \
         RETURNING id",
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(cart_id)
}

/// Locks an existing cart row, stamping `updated_at`; missing cart is
/// `NotFound`.
async fn lock_existing_cart(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    let (cart_id,) =
        locked.ok_or_else(|| TimeleError::service(ErrorKind::NotFound, "cart not found"))?;
    sqlx::query("UPDATE carts SET updated_at = $1 WHERE id = $2")
        .bind(now)
        .bind(cart_id)
        .execute(&mut **tx)
        .await?;
    Ok(cart_id)
}

// Used by checkout to read the raw cart rows under the same lock discipline.
pub(crate) async fn lock_cart_for_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
) -> Result<Option<i64>> {
    let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(locked.map(|r| r.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_item_specs_sums_duplicates_in_place() {
        let merged = merge_item_specs(&[
            CartItemSpec { product_id: 1, quantity: 2 },
            CartItemSpec { product_id: 2, quantity: 1 },
            CartItemSpec { product_id: 1, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].product_id, 1);
        assert_eq!(merged[0].quantity, 5);
        assert_eq!(merged[1].product_id, 2);
    }

    #[test]
    fn test_merge_item_specs_rejects_non_positive_quantity() {
        let err = merge_item_specs(&[CartItemSpec { product_id: 1, quantity: 0 }]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }
}
