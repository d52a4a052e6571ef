use async_trait::async_trait;

use crate::domain::product::{CategoryId, ProductId};
use crate::errors::CatalogError;
use crate::query::ProductQuery;

/// Executes a [`ProductQuery`] against the catalog store.
#[async_trait]
pub trait ProductQueryExecutor: Send + Sync {
    /// Ids matching `query`, in the query's order and bounded by its limit.
    async fn materialize_ids(&self, query: &ProductQuery) -> Result<Vec<ProductId>, CatalogError>;
}

#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, CatalogError>;
}

/// Resolves composite products (configurable, bundle) from their components.
#[async_trait]
pub trait ProductLinkResolver: Send + Sync {
    /// Distinct parents listing any of `children` as a component.
    async fn children_to_parents(
        &self,
        children: &[ProductId],
    ) -> Result<Vec<ProductId>, CatalogError>;
}

/// Everything the selection engine reads from the catalog.
pub trait CatalogGateway: ProductQueryExecutor + CategoryLookup + ProductLinkResolver {}

impl<T> CatalogGateway for T where T: ProductQueryExecutor + CategoryLookup + ProductLinkResolver {}
