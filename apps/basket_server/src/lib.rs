// apps/basket_server/src/lib.rs

pub mod config;
pub mod db;
pub mod errors;
pub mod seed;
pub mod state;
pub mod web;
