//! PostgreSQL implementation of the engine store contracts.
//!
//! Every method is a single statement (or one transaction for catalog
//! edits), so each keeps the atomicity the engine relies on. Stock and the
//! settings record change only through conditional `UPDATE ... RETURNING`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use stockroom_engine::error::StoreResult;
use stockroom_engine::settings::SLEEP_MODE_SETTING;
use stockroom_engine::{
    Cart, CartLine, CartStore, CustomerId, InventoryStore, Order, OrderStatus, OrderStore,
    Product, SettingsStore, SleepMode, StoreError, Timestamp,
};

use super::rows::{CustomerRow, FlavorRow, OrderRow, ProductRow};

/// Normalize a driver error so it never crosses into the engine.
fn store_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(e.to_string())
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn status_names(statuses: &[OrderStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Shop store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load products matching an optional category, with their variants.
    async fn load_products(&self, category: Option<&str>) -> Result<Vec<Product>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, category
            FROM products
            WHERE $1::TEXT IS NULL OR category = $1
            ORDER BY category ASC, name ASC
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let flavors = sqlx::query_as::<_, FlavorRow>(
            r#"
            SELECT product_id, name, quantity
            FROM product_flavors
            WHERE product_id = ANY($1)
            ORDER BY product_id ASC, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<String, Vec<FlavorRow>> = HashMap::new();
        for flavor in flavors {
            by_product
                .entry(flavor.product_id.clone())
                .or_default()
                .push(flavor);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let flavors = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(flavors)
            })
            .collect())
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, category FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let flavors = sqlx::query_as::<_, FlavorRow>(
            r#"
            SELECT product_id, name, quantity
            FROM product_flavors
            WHERE product_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(Some(row.into_product(flavors)))
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        self.load_products(None).await.map_err(store_err)
    }

    async fn products_in_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        self.load_products(Some(category)).await.map_err(store_err)
    }

    async fn categories(&self) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM products ORDER BY category ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, category)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                category = EXCLUDED.category
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(to_db(product.price))
        .bind(&product.category)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let names: Vec<String> = product.flavors.iter().map(|f| f.name.clone()).collect();
        sqlx::query("DELETE FROM product_flavors WHERE product_id = $1 AND NOT (name = ANY($2))")
            .bind(&product.id)
            .bind(&names)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        // Surviving variants keep their live stock; only the order changes
        for (position, flavor) in product.flavors.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO product_flavors (product_id, name, quantity, position)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (product_id, name) DO UPDATE SET
                    position = EXCLUDED.position
                "#,
            )
            .bind(&product.id)
            .bind(&flavor.name)
            .bind(flavor.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(
        &self,
        product_id: &str,
        flavor: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE product_flavors
            SET quantity = quantity + $3
            WHERE product_id = $1 AND name = $2
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(flavor)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|(quantity,)| quantity))
    }

    async fn variant_stock(&self, product_id: &str, flavor: &str) -> StoreResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT quantity FROM product_flavors WHERE product_id = $1 AND name = $2",
        )
        .bind(product_id)
        .bind(flavor)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|(quantity,)| quantity))
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn load_cart(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, cart, cart_expires_at FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row
            .map(CustomerRow::into_cart)
            .unwrap_or_else(|| Cart::empty(customer_id)))
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, cart, cart_expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                cart = EXCLUDED.cart,
                cart_expires_at = EXCLUDED.cart_expires_at
            "#,
        )
        .bind(cart.customer_id)
        .bind(Json(&cart.lines))
        .bind(cart.expires_at.map(to_db))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn expired_carts(&self, now: Timestamp) -> StoreResult<Vec<Cart>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, cart, cart_expires_at
            FROM customers
            WHERE cart_expires_at IS NOT NULL AND cart_expires_at < $1
            ORDER BY id ASC
            "#,
        )
        .bind(to_db(now))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(CustomerRow::into_cart).collect())
    }

    async fn customers(&self) -> StoreResult<Vec<CustomerId>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM customers ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

const ORDER_COLUMNS: &str = "id, user_id, items, status, created_at";

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: Vec<CartLine>,
        now: Timestamp,
    ) -> StoreResult<Order> {
        let id = uuid::Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (id, user_id, items, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(customer_id)
        .bind(Json(&items))
        .bind(OrderStatus::Pending.as_str())
        .bind(to_db(now))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.into_order()
    }

    async fn order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ANY($1) \
             ORDER BY created_at ASC, seq ASC"
        ))
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn count_orders(&self, statuses: &[OrderStatus]) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = ANY($1)")
            .bind(status_names(statuses))
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(count.max(0) as u64)
    }

    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn pending_orders_before(&self, before: Timestamp) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 AND created_at < $2 \
             ORDER BY created_at ASC, seq ASC"
        ))
        .bind(OrderStatus::Pending.as_str())
        .bind(to_db(before))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn sleep_mode(&self) -> StoreResult<SleepMode> {
        let row: Option<(bool, Option<String>, i64)> =
            sqlx::query_as("SELECT enabled, end_time, version FROM settings WHERE key = $1")
                .bind(SLEEP_MODE_SETTING)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(match row {
            Some((enabled, end_time, version)) => SleepMode {
                enabled,
                end_time,
                version: version.max(0) as u64,
            },
            None => SleepMode::initial(),
        })
    }

    async fn update_sleep_mode(
        &self,
        expected_version: u64,
        enabled: bool,
        end_time: Option<String>,
    ) -> StoreResult<bool> {
        // Inserts the record when it was never written and version 0 is expected
        let result = sqlx::query(
            r#"
            INSERT INTO settings (key, enabled, end_time, version)
            VALUES ($1, $2, $3, $4 + 1)
            ON CONFLICT (key) DO UPDATE SET
                enabled = EXCLUDED.enabled,
                end_time = EXCLUDED.end_time,
                version = settings.version + 1
            WHERE settings.version = $4
            "#,
        )
        .bind(SLEEP_MODE_SETTING)
        .bind(enabled)
        .bind(end_time)
        .bind(to_db(expected_version))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_corrupt() {
        let err = store_err(sqlx::Error::Decode("bad json".into()));
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn other_errors_are_unavailable() {
        let err = store_err(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn status_filter_uses_stored_names() {
        assert_eq!(
            status_names(&OrderStatus::OPEN),
            vec!["pending".to_string(), "confirmed".to_string()]
        );
    }

    #[test]
    fn timestamps_saturate() {
        assert_eq!(to_db(u64::MAX), i64::MAX);
        assert_eq!(to_db(1_706_745_600_000), 1_706_745_600_000);
    }
}
