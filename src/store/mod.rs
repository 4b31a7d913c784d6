pub mod gateway;
pub mod postgres_gateway;

pub use gateway::{DigestSpec, StoreGateway};
pub use postgres_gateway::PostgresGateway;
