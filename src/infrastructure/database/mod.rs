pub mod connection_pool;
pub mod migrator;

pub use connection_pool::ConnectionPool;
pub use migrator::{MigrationReport, run_migrations};
