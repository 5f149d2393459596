//! Row types and their conversion to engine types.

use sqlx::types::Json;
use sqlx::Row;
use stockroom_engine::{Cart, CartLine, Order, OrderStatus, Product, StoreError, Variant};

/// A stored product row, without its variants.
#[derive(Debug)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub category: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ProductRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            category: row.try_get("category")?,
        })
    }
}

/// A stored variant row.
#[derive(Debug)]
pub struct FlavorRow {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for FlavorRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(FlavorRow {
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl ProductRow {
    /// Assemble a product from its row and its variant rows, in order.
    pub fn into_product(self, flavors: Vec<FlavorRow>) -> Product {
        Product::new(
            self.id,
            self.name,
            self.price.max(0) as u64,
            self.category,
            flavors
                .into_iter()
                .map(|f| Variant::new(f.name, f.quantity))
                .collect(),
        )
    }
}

/// A stored customer row.
#[derive(Debug)]
pub struct CustomerRow {
    pub id: i64,
    pub cart: Json<Vec<CartLine>>,
    pub cart_expires_at: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CustomerRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            cart: row.try_get("cart")?,
            cart_expires_at: row.try_get("cart_expires_at")?,
        })
    }
}

impl CustomerRow {
    pub fn into_cart(self) -> Cart {
        Cart {
            customer_id: self.id,
            lines: self.cart.0,
            expires_at: self.cart_expires_at.map(|at| at.max(0) as u64),
        }
    }
}

/// A stored order row.
#[derive(Debug)]
pub struct OrderRow {
    pub id: String,
    pub user_id: i64,
    pub items: Json<Vec<CartLine>>,
    pub status: String,
    pub created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for OrderRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            items: row.try_get("items")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl OrderRow {
    /// Convert to an engine order. An unknown status marks the row corrupt.
    pub fn into_order(self) -> Result<Order, StoreError> {
        let status: OrderStatus = self.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("order {} has status '{}'", self.id, self.status))
        })?;

        Ok(Order {
            id: self.id,
            customer_id: self.user_id,
            items: self.items.0,
            status,
            created_at: self.created_at.max(0) as u64,
        })
    }
}
