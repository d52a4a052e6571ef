use async_trait::async_trait;
use thiserror::Error;

use shelfpick_core::domain::product::{Product, ProductId, StoreId};
use shelfpick_core::errors::CatalogError;

pub mod catalog;
pub mod product;

pub use catalog::SqlCatalogGateway;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CatalogError {
    fn from(error: RepositoryError) -> Self {
        CatalogError::Unavailable(error.to_string())
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products for `ids` with prices indexed in `store_id`, in the order of `ids`.
    async fn find_by_ids(
        &self,
        store_id: StoreId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use shelfpick_core::errors::CatalogError;

    use super::RepositoryError;

    #[test]
    fn repository_failures_surface_as_unavailable_catalog() {
        let error: CatalogError = RepositoryError::Decode("bad visibility".to_string()).into();
        assert_eq!(error, CatalogError::Unavailable("decode error: bad visibility".to_string()));
    }
}
