//! Database connection pool and embedded migrations.

mod migrate;
mod pool;
#[cfg(test)]
pub mod testing;

pub use migrate::{pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{
    AsyncDbPool, DbConnection, MIGRATIONS, establish_async_connection_pool, get_connection,
};

#[cfg(test)]
pub use pool::lazy_pool;
