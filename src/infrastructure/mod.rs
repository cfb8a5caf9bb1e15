pub mod database;
pub mod notifications;
pub mod storage;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use notifications::EventBusNotifier;
pub use storage::InMemoryRepositoryProvider;
