pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoCatalog, SeedResult, TableSeedInfo, VerificationResult};
pub use repositories::{ProductRepository, RepositoryError, SqlCatalogGateway, SqlProductRepository};
