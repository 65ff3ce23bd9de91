// apps/basket_server/src/db/pg_gateway.rs

//! `RemoteCartGateway` over Postgres with runtime-checked queries.

use async_trait::async_trait;
use basket::{
  CartItem, GatewayError, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, ProductSnapshot,
  RemoteCartGateway,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../schema.sql");

#[derive(Debug, FromRow)]
struct CartItemRow {
  id: Uuid,
  product_id: Uuid,
  quantity: i32,
  product_name: String,
  price_cents: i64,
  image_url: Option<String>,
}

impl From<CartItemRow> for CartItem {
  fn from(row: CartItemRow) -> Self {
    CartItem {
      id: row.id,
      product_id: row.product_id,
      quantity: row.quantity,
      product: ProductSnapshot {
        id: row.product_id,
        name: row.product_name,
        price_cents: row.price_cents,
        image_url: row.image_url,
      },
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: Uuid,
  total_amount_cents: i64,
  status: String,
  created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = GatewayError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = row
      .status
      .parse::<OrderStatus>()
      .map_err(|e| GatewayError::Backend(anyhow::anyhow!("order {}: {}", row.id, e)))?;
    Ok(Order {
      id: row.id,
      user_id: row.user_id,
      total_amount_cents: row.total_amount_cents,
      status,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: Uuid,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  price_at_purchase_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: row.quantity,
      price_at_purchase_cents: row.price_at_purchase_cents,
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
  id: Uuid,
  product_id: Uuid,
  quantity: i32,
  price_at_purchase_cents: i64,
  product_name: String,
  image_url: Option<String>,
}

impl From<OrderLineRow> for OrderLine {
  fn from(row: OrderLineRow) -> Self {
    OrderLine {
      id: row.id,
      product_id: row.product_id,
      quantity: row.quantity,
      price_at_purchase_cents: row.price_at_purchase_cents,
      product_name: row.product_name,
      image_url: row.image_url,
    }
  }
}

/// Maps a driver error onto the gateway taxonomy. Constraint violations are `Rejected`,
/// connection-level failures are `Unavailable`.
fn map_sqlx(collection: &'static str) -> impl Fn(sqlx::Error) -> GatewayError {
  move |err| match err {
    sqlx::Error::Database(db)
      if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() =>
    {
      GatewayError::Rejected {
        collection,
        message: db.message().to_string(),
      }
    }
    unavailable @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
      GatewayError::Unavailable(unavailable.to_string())
    }
    other => GatewayError::Backend(anyhow::Error::new(other).context(format!("query on {}", collection))),
  }
}

#[derive(Clone)]
pub struct PgCartGateway {
  pool: PgPool,
}

impl PgCartGateway {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Creates the tables if they do not exist yet.
  pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl RemoteCartGateway for PgCartGateway {
  #[instrument(name = "pg::fetch_cart", skip(self))]
  async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, GatewayError> {
    let rows: Vec<CartItemRow> = sqlx::query_as(
      "SELECT ci.id, ci.product_id, ci.quantity, p.name AS product_name, p.price_cents, p.image_url \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.user_id = $1 ORDER BY ci.added_at ASC, ci.id ASC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(map_sqlx("cart_items"))?;
    Ok(rows.into_iter().map(CartItem::from).collect())
  }

  #[instrument(name = "pg::insert_cart_item", skip(self))]
  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem, GatewayError> {
    let row: CartItemRow = sqlx::query_as(
      "WITH inserted AS ( \
         INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
         RETURNING id, product_id, quantity \
       ) \
       SELECT i.id, i.product_id, i.quantity, p.name AS product_name, p.price_cents, p.image_url \
       FROM inserted i JOIN products p ON p.id = i.product_id",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(map_sqlx("cart_items"))?;
    Ok(row.into())
  }

  #[instrument(name = "pg::update_cart_item_quantity", skip(self))]
  async fn update_cart_item_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<bool, GatewayError> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $2 AND user_id = $1")
      .bind(user_id)
      .bind(item_id)
      .bind(quantity)
      .execute(&self.pool)
      .await
      .map_err(map_sqlx("cart_items"))?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "pg::delete_cart_item", skip(self))]
  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, GatewayError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $2 AND user_id = $1")
      .bind(user_id)
      .bind(item_id)
      .execute(&self.pool)
      .await
      .map_err(map_sqlx("cart_items"))?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "pg::delete_cart_items", skip(self))]
  async fn delete_cart_items(&self, user_id: Uuid) -> Result<(), GatewayError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(map_sqlx("cart_items"))?;
    Ok(())
  }

  #[instrument(name = "pg::insert_order", skip(self))]
  async fn insert_order(&self, order: NewOrder) -> Result<Order, GatewayError> {
    let row: OrderRow = sqlx::query_as(
      "INSERT INTO orders (user_id, total_amount_cents, status) VALUES ($1, $2, $3) \
       RETURNING id, user_id, total_amount_cents, status, created_at",
    )
    .bind(order.user_id)
    .bind(order.total_amount_cents)
    .bind(order.status.as_str())
    .fetch_one(&self.pool)
    .await
    .map_err(map_sqlx("orders"))?;
    row.try_into()
  }

  #[instrument(name = "pg::insert_order_items", skip_all, fields(count = items.len()))]
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, GatewayError> {
    if items.is_empty() {
      return Ok(Vec::new());
    }
    let mut order_ids = Vec::with_capacity(items.len());
    let mut product_ids = Vec::with_capacity(items.len());
    let mut quantities = Vec::with_capacity(items.len());
    let mut prices = Vec::with_capacity(items.len());
    for item in &items {
      order_ids.push(item.order_id);
      product_ids.push(item.product_id);
      quantities.push(item.quantity);
      prices.push(item.price_at_purchase_cents);
    }

    // One statement, so the batch lands all-or-nothing.
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase_cents) \
       SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::int4[], $4::int8[]) \
       RETURNING id, order_id, product_id, quantity, price_at_purchase_cents",
    )
    .bind(order_ids)
    .bind(product_ids)
    .bind(quantities)
    .bind(prices)
    .fetch_all(&self.pool)
    .await
    .map_err(map_sqlx("order_items"))?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
  }

  #[instrument(name = "pg::delete_order_items", skip(self))]
  async fn delete_order_items(&self, order_id: Uuid) -> Result<(), GatewayError> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(map_sqlx("order_items"))?;
    Ok(())
  }

  #[instrument(name = "pg::delete_order", skip(self))]
  async fn delete_order(&self, order_id: Uuid) -> Result<(), GatewayError> {
    sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(map_sqlx("orders"))?;
    Ok(())
  }

  #[instrument(name = "pg::list_orders", skip(self))]
  async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, GatewayError> {
    let rows: Vec<OrderRow> = sqlx::query_as(
      "SELECT id, user_id, total_amount_cents, status, created_at FROM orders \
       WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(map_sqlx("orders"))?;
    rows.into_iter().map(Order::try_from).collect()
  }

  #[instrument(name = "pg::list_order_lines", skip(self))]
  async fn list_order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, GatewayError> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(
      "SELECT oi.id, oi.product_id, oi.quantity, oi.price_at_purchase_cents, \
              p.name AS product_name, p.image_url \
       FROM order_items oi JOIN products p ON p.id = oi.product_id \
       WHERE oi.order_id = $1 ORDER BY p.name ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(map_sqlx("order_items"))?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
  }
}
