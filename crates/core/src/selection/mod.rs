//! Product selection engine.
//!
//! A [`SelectionDispatcher`] routes a [`SelectionRequest`](crate::domain::selection::SelectionRequest)
//! to one [`SelectionStrategy`]. Strategies build a [`ProductQuery`] from the request
//! parameters and let the catalog collaborator execute it.
//!
//! Outcomes follow a best-effort widget contract:
//! - `Ok(None)`: the request is misconfigured for its strategy (missing period, no ids,
//!   no current product, unknown category) and the widget should render nothing.
//! - `Ok(Some(result))`: a valid ordered selection, possibly empty.
//! - `Err(_)`: the catalog store failed.

mod dispatcher;
mod random;
mod related;
mod strategies;

pub use dispatcher::SelectionDispatcher;
pub use random::{sample_without_replacement, RandomStrategy};
pub use related::RelatedSetResolver;
pub use strategies::{
    BestSellerStrategy, CategoryStrategy, DiscountStrategy, FeaturedStrategy,
    MostViewedStrategy, NewArrivalsStrategy, NewUpdatedStrategy, NewestStrategy,
    TopRatedStrategy,
};

use async_trait::async_trait;
use tracing::info;

use crate::catalog::CatalogGateway;
use crate::domain::selection::{OrderedIdResult, SelectionContext, SelectionParams};
use crate::errors::SelectionError;
use crate::query::{ProductQuery, SortKey};

pub type SelectionOutcome = Result<Option<OrderedIdResult>, SelectionError>;

/// Normalized input handed to a strategy.
#[derive(Clone, Copy, Debug)]
pub struct StrategyInput<'a> {
    pub params: &'a SelectionParams,
    pub limit: u32,
    pub context: &'a SelectionContext,
}

impl StrategyInput<'_> {
    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    /// Store-scoped, catalog-visible query carrying the request's category filter.
    pub fn base_query(&self) -> ProductQuery {
        let query = ProductQuery::base(self.context.store_id);
        match self.params.category_filter() {
            Some(ids) => query.filter_by_category_ids(ids),
            None => query,
        }
    }
}

#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome;
}

/// Runs `query` and wraps the ids as a bounded result.
pub(crate) async fn fetch_ranked(
    catalog: &dyn CatalogGateway,
    query: ProductQuery,
    limit: usize,
) -> SelectionOutcome {
    let ids = catalog.materialize_ids(&query).await?;
    Ok(Some(OrderedIdResult::from_ids(ids, limit)))
}

pub(crate) fn not_applicable(
    strategy: &'static str,
    context: &SelectionContext,
    reason: &'static str,
) -> SelectionOutcome {
    info!(
        event_name = "selection.configuration_gap",
        correlation_id = %context.correlation_id,
        strategy,
        reason,
        "selection not applicable; widget renders nothing"
    );
    Ok(None)
}

pub(crate) fn relevance_query(input: &StrategyInput<'_>) -> ProductQuery {
    input.base_query().order_by(SortKey::Relevance)
}
