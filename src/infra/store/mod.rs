//! Collection store adapters.

mod memory;
mod postgres;
mod value_order;

pub use memory::MemoryStore;
pub use postgres::{PostgresStore, map_sqlx_error};
