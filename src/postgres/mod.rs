// ABOUTME: PostgreSQL backend module
// ABOUTME: Exports connection management and the PostgreSQL AttributeStore

pub mod connection;
pub mod store;

pub use connection::{connect, connect_with_retry};
pub use store::PgStore;
