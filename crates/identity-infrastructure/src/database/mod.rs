//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod schema;
pub mod postgres;

pub use connection::create_pool;
pub use schema::ensure_schema;
pub use postgres::PgIdentityContext;
