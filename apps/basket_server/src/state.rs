// apps/basket_server/src/state.rs

use crate::config::AppConfig;
use basket::{CartStore, OrderHistoryReader, RemoteCartGateway, ReplicaStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One `CartStore` replica per signed-in user, created on first use.
pub struct CartDirectory {
  gateway: Arc<dyn RemoteCartGateway>,
  carts: Mutex<HashMap<Uuid, Arc<CartStore>>>,
}

impl CartDirectory {
  pub fn new(gateway: Arc<dyn RemoteCartGateway>) -> Self {
    Self {
      gateway,
      carts: Mutex::new(HashMap::new()),
    }
  }

  /// The user's replica, loaded if it has not been yet or its last load failed.
  pub async fn cart_for(&self, user_id: Uuid) -> Arc<CartStore> {
    let cart = self.entry(user_id);
    if cart.user_id() != Some(user_id) || cart.status() == ReplicaStatus::Degraded {
      cart.load(Some(user_id)).await;
    }
    cart
  }

  /// The user's replica, re-read from the store.
  pub async fn reloaded(&self, user_id: Uuid) -> Arc<CartStore> {
    let cart = self.entry(user_id);
    cart.load(Some(user_id)).await;
    cart
  }

  /// Drops the user's replica once it is empty and no request holds it any more. Callers
  /// release their own handle first. The next request for that user starts from a fresh load.
  pub fn release_if_empty(&self, user_id: Uuid) {
    let mut carts = self.carts.lock();
    let idle = carts
      .get(&user_id)
      .is_some_and(|cart| cart.is_empty() && Arc::strong_count(cart) == 1);
    if idle {
      carts.remove(&user_id);
    }
  }

  pub fn len(&self) -> usize {
    self.carts.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.carts.lock().is_empty()
  }

  fn entry(&self, user_id: Uuid) -> Arc<CartStore> {
    self
      .carts
      .lock()
      .entry(user_id)
      .or_insert_with(|| Arc::new(CartStore::new(Arc::clone(&self.gateway))))
      .clone()
  }
}

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub carts: Arc<CartDirectory>,
  pub history: Arc<OrderHistoryReader>,
}

impl AppState {
  pub fn new(config: AppConfig, gateway: Arc<dyn RemoteCartGateway>) -> Self {
    Self {
      config: Arc::new(config),
      carts: Arc::new(CartDirectory::new(Arc::clone(&gateway))),
      history: Arc::new(OrderHistoryReader::new(gateway)),
    }
  }
}
