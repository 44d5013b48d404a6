/// Database layer for the config service
///
/// This module provides connection pooling and the migration runner.
///
/// # Modules
///
/// - `pool`: [`DatabaseManager`](pool::DatabaseManager), the bounded pool and
///   its query/execute/transaction primitives
/// - `migrations`: forward-only SQL script runner with a tracking table
/// - Entity mapping lives in the `repositories` module at crate root level
///
/// # Example
///
/// ```no_run
/// use configsvc_shared::db::pool::{DatabaseConfig, DatabaseManager};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let manager = DatabaseManager::new(config);
///     manager.initialize().await?;
///     manager.close().await;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
