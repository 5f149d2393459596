//! Database module for PostgreSQL persistence.

mod pool;
mod rows;
mod store;

pub use pool::*;
pub use store::PgStore;
