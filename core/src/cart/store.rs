// basket/src/cart/store.rs

use crate::core::context_data::ContextData;
use crate::error::{BasketError, BasketResult, GatewayError};
use crate::gateway::{RemoteCartGateway, RemoteOp};
use crate::model::{self, CartItem};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{event, instrument, Level};
use uuid::Uuid;

/// Where the local replica stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaStatus {
  /// Never loaded, or reset because nobody is signed in.
  #[default]
  Idle,
  Loading,
  Ready,
  /// The last load failed; the item set was emptied.
  Degraded,
}

#[derive(Debug, Default)]
struct CartReplica {
  user_id: Option<Uuid>,
  items: Vec<CartItem>,
  status: ReplicaStatus,
}

/// Owner of one signed-in user's cart: the local replica plus the calls that keep it in
/// step with the remote store.
///
/// Every mutation holds the cart's write gate for its whole remote-then-local sequence, so
/// concurrent calls on one cart run one after another. Local state changes only after the
/// store confirmed the write; a failed write leaves the replica as it was.
pub struct CartStore {
  gateway: Arc<dyn RemoteCartGateway>,
  replica: ContextData<CartReplica>,
  write_gate: Mutex<()>,
}

impl CartStore {
  pub fn new(gateway: Arc<dyn RemoteCartGateway>) -> Self {
    Self {
      gateway,
      replica: ContextData::new(CartReplica::default()),
      write_gate: Mutex::new(()),
    }
  }

  pub fn gateway(&self) -> Arc<dyn RemoteCartGateway> {
    Arc::clone(&self.gateway)
  }

  pub fn user_id(&self) -> Option<Uuid> {
    self.replica.with(|r| r.user_id)
  }

  pub fn status(&self) -> ReplicaStatus {
    self.replica.with(|r| r.status)
  }

  /// A copy of the current items, in store order.
  pub fn items(&self) -> Vec<CartItem> {
    self.replica.with(|r| r.items.clone())
  }

  pub fn item(&self, item_id: Uuid) -> Option<CartItem> {
    self.replica.with(|r| r.items.iter().find(|i| i.id == item_id).cloned())
  }

  pub fn item_for_product(&self, product_id: Uuid) -> Option<CartItem> {
    self
      .replica
      .with(|r| r.items.iter().find(|i| i.product_id == product_id).cloned())
  }

  pub fn is_empty(&self) -> bool {
    self.replica.with(|r| r.items.is_empty())
  }

  /// Σ quantity, computed from the replica on every call.
  pub fn total_items(&self) -> i64 {
    self.replica.with(|r| model::total_items(&r.items))
  }

  /// Σ quantity × snapshot price, computed from the replica on every call.
  pub fn total_price_cents(&self) -> i64 {
    self.replica.with(|r| model::total_price_cents(&r.items))
  }

  /// Replaces the replica with `user_id`'s cart. `None` resets to an empty, idle cart.
  ///
  /// A failed fetch also ends with an empty item set; `status()` reports `Degraded` in
  /// that case and the failure is logged, but no error is returned.
  #[instrument(name = "CartStore::load", skip(self), fields(user_id = ?user_id))]
  pub async fn load(&self, user_id: Option<Uuid>) {
    let _gate = self.write_gate.lock().await;
    let Some(user_id) = user_id else {
      self.replica.update(|r| *r = CartReplica::default());
      event!(Level::DEBUG, "No signed-in user; cart reset.");
      return;
    };

    self.replica.update(|r| {
      r.user_id = Some(user_id);
      r.status = ReplicaStatus::Loading;
    });
    if let Err(e) = self.reload_locked(user_id).await {
      event!(Level::WARN, error = %e, "Cart fetch failed; showing an empty cart.");
      self.replica.update(|r| {
        r.items.clear();
        r.status = ReplicaStatus::Degraded;
      });
    }
  }

  /// Re-reads the signed-in user's cart. Unlike `load`, a failed fetch is returned and the
  /// replica is left as it was.
  #[instrument(name = "CartStore::refresh", skip(self), err(Display))]
  pub async fn refresh(&self) -> BasketResult<()> {
    let _gate = self.write_gate.lock().await;
    let user_id = self.require_user("refresh the cart")?;
    self.reload_locked(user_id).await
  }

  /// Adds one unit of `product_id`. An existing line is incremented; otherwise a new line
  /// with quantity 1 is inserted and appended from the row the store returned.
  ///
  /// A rejected insert reloads the cart first: if the line exists remotely after all, it is
  /// incremented instead. A line already at `i32::MAX` fails with `QuantityOutOfRange`.
  #[instrument(name = "CartStore::add", skip(self), err(Display))]
  pub async fn add(&self, product_id: Uuid) -> BasketResult<CartItem> {
    let _gate = self.write_gate.lock().await;
    let user_id = self.require_user("add items to the cart")?;

    if let Some((item_id, quantity)) = self.local_line(product_id) {
      return self.increment_locked(user_id, item_id, quantity).await;
    }

    let inserted = match self.gateway.insert_cart_item(user_id, product_id, 1).await {
      Ok(inserted) => inserted,
      Err(source @ GatewayError::Rejected { .. }) => {
        // The line may have been added from another session since the last load.
        event!(Level::WARN, error = %source, "Insert rejected; resynchronizing.");
        self.reload_locked(user_id).await?;
        return match self.local_line(product_id) {
          Some((item_id, quantity)) => self.increment_locked(user_id, item_id, quantity).await,
          None => Err(BasketError::RemoteWrite {
            op: RemoteOp::InsertCartItem,
            source,
          }),
        };
      }
      Err(e) => return Err(BasketError::write(RemoteOp::InsertCartItem)(e)),
    };

    let accepted = self.replica.update(|r| {
      let matches = inserted.product_id == product_id
        && inserted.quantity == 1
        && !r.items.iter().any(|i| i.id == inserted.id || i.product_id == product_id);
      if matches {
        r.items.push(inserted.clone());
      }
      matches
    });
    if accepted {
      event!(Level::INFO, item_id = %inserted.id, "Cart line created.");
      return Ok(inserted);
    }

    event!(Level::WARN, item_id = %inserted.id, "Inserted row does not match the request; resynchronizing.");
    self.reload_locked(user_id).await?;
    self.item_for_product(product_id).ok_or_else(|| {
      BasketError::Internal(format!("product {} missing from cart after insert", product_id))
    })
  }

  /// Deletes the line remotely, then drops it from the replica.
  #[instrument(name = "CartStore::remove", skip(self), err(Display))]
  pub async fn remove(&self, item_id: Uuid) -> BasketResult<()> {
    let _gate = self.write_gate.lock().await;
    let user_id = self.require_user("remove items from the cart")?;
    self.remove_locked(user_id, item_id).await
  }

  /// Sets a line's quantity. A quantity below 1 removes the line and returns `None`.
  #[instrument(name = "CartStore::set_quantity", skip(self), err(Display))]
  pub async fn set_quantity(&self, item_id: Uuid, quantity: i32) -> BasketResult<Option<CartItem>> {
    let _gate = self.write_gate.lock().await;
    let user_id = self.require_user("change cart quantities")?;
    if quantity < 1 {
      self.remove_locked(user_id, item_id).await?;
      return Ok(None);
    }
    self.update_quantity_locked(user_id, item_id, quantity).await.map(Some)
  }

  /// Deletes every remote line of the signed-in user, then empties the replica.
  #[instrument(name = "CartStore::clear", skip(self), err(Display))]
  pub async fn clear(&self) -> BasketResult<()> {
    let _gate = self.write_gate.lock().await;
    let user_id = self.require_user("clear the cart")?;
    self.clear_locked(user_id).await
  }

  /// Takes the write gate. Checkout holds it from snapshot to clear.
  pub(crate) async fn write_lock(&self) -> MutexGuard<'_, ()> {
    self.write_gate.lock().await
  }

  /// Caller must hold the write gate.
  pub(crate) async fn clear_locked(&self, user_id: Uuid) -> BasketResult<()> {
    self
      .gateway
      .delete_cart_items(user_id)
      .await
      .map_err(BasketError::write(RemoteOp::ClearCart))?;
    self.replica.update(|r| {
      if r.user_id == Some(user_id) {
        r.items.clear();
        r.status = ReplicaStatus::Ready;
      }
    });
    event!(Level::INFO, %user_id, "Cart cleared.");
    Ok(())
  }

  fn require_user(&self, operation: &'static str) -> BasketResult<Uuid> {
    self
      .user_id()
      .ok_or(BasketError::Unauthorized { operation })
  }

  fn local_line(&self, product_id: Uuid) -> Option<(Uuid, i32)> {
    self
      .replica
      .with(|r| r.items.iter().find(|i| i.product_id == product_id).map(|i| (i.id, i.quantity)))
  }

  async fn increment_locked(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> BasketResult<CartItem> {
    let next = quantity
      .checked_add(1)
      .ok_or(BasketError::QuantityOutOfRange { item_id, quantity })?;
    self.update_quantity_locked(user_id, item_id, next).await
  }

  fn ensure_local(&self, item_id: Uuid) -> BasketResult<()> {
    if self.replica.with(|r| r.items.iter().any(|i| i.id == item_id)) {
      Ok(())
    } else {
      Err(BasketError::ItemNotFound { item_id })
    }
  }

  async fn reload_locked(&self, user_id: Uuid) -> BasketResult<()> {
    let items = self
      .gateway
      .fetch_cart(user_id)
      .await
      .map_err(BasketError::read(RemoteOp::FetchCart))?;
    self.replica.update(|r| {
      if r.user_id == Some(user_id) {
        event!(Level::DEBUG, item_count = items.len(), "Cart replica replaced.");
        r.items = items;
        r.status = ReplicaStatus::Ready;
      }
    });
    Ok(())
  }

  async fn update_quantity_locked(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> BasketResult<CartItem> {
    self.ensure_local(item_id)?;
    let found = self
      .gateway
      .update_cart_item_quantity(user_id, item_id, quantity)
      .await
      .map_err(BasketError::write(RemoteOp::UpdateCartItem))?;
    if !found {
      event!(Level::WARN, %item_id, "Cart line no longer exists remotely; resynchronizing.");
      self.reload_locked(user_id).await?;
      return Err(BasketError::ItemNotFound { item_id });
    }

    self
      .replica
      .update(|r| {
        r.items.iter_mut().find(|i| i.id == item_id).map(|i| {
          i.quantity = quantity;
          i.clone()
        })
      })
      .ok_or(BasketError::ItemNotFound { item_id })
  }

  async fn remove_locked(&self, user_id: Uuid, item_id: Uuid) -> BasketResult<()> {
    self.ensure_local(item_id)?;
    let existed = self
      .gateway
      .delete_cart_item(user_id, item_id)
      .await
      .map_err(BasketError::write(RemoteOp::DeleteCartItem))?;
    if !existed {
      event!(Level::DEBUG, %item_id, "Cart line was already gone remotely.");
    }
    self.replica.update(|r| r.items.retain(|i| i.id != item_id));
    Ok(())
  }
}
