// apps/basket_server/src/db/mod.rs

pub mod pg_gateway;

pub use pg_gateway::PgCartGateway;
