pub mod config;
mod db;
pub mod migration;
pub mod store;

pub use config::{
    AssetConfig, CONFIG_FILE, DatabaseConfig, PoolConfig, ReconcileConfig, SQLITE_FILE,
    SeedConfig,
};
pub use store::SeedStore;
