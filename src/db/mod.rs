pub mod pool;
pub mod queries;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use pool::create_pool;
pub use store::{PgStore, ReviewStore};
