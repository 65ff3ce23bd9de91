// basket/src/cart/mod.rs

//! The signed-in user's cart and its synchronization with the remote store.

pub mod store;

pub use store::{CartStore, ReplicaStatus};
