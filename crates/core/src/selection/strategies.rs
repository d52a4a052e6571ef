use async_trait::async_trait;
use tracing::debug;

use crate::catalog::CatalogGateway;
use crate::domain::selection::OrderedIdResult;
use crate::domain::window::{start_of_day, AggregationWindow};
use crate::query::{
    Aggregate, AttributeFilter, DateAttribute, Direction, PriceFilter, ProductQuery, SortKey,
    VisibilityFilter,
};

use super::{
    fetch_ranked, not_applicable, relevance_query, SelectionOutcome, SelectionStrategy,
    StrategyInput,
};

/// Plain category listing in the catalog's relevance order. The dispatcher resolves
/// the category and passes it as the only entry of `category_ids`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryStrategy;

#[async_trait]
impl SelectionStrategy for CategoryStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        if input.params.category_filter().is_none() {
            return not_applicable("category", input.context, "no category to list");
        }
        let query = relevance_query(&input).limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Hand-picked products shown in exactly the order they were listed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeaturedStrategy;

#[async_trait]
impl SelectionStrategy for FeaturedStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let product_ids = match input.params.product_ids.as_deref() {
            Some(ids) if !ids.is_empty() => ids,
            _ => return not_applicable("featured", input.context, "product_ids missing or empty"),
        };

        let ranked = OrderedIdResult::from_ids(product_ids.iter().copied(), product_ids.len()).ids();

        // The explicit list replaces any category filter.
        let query = ProductQuery::base(input.context.store_id)
            .filter_by_ids(&ranked)
            .order_by(SortKey::ExplicitRank(ranked.clone()))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Most recently created products. Also the fallback for unknown modes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewestStrategy;

#[async_trait]
impl SelectionStrategy for NewestStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let query = input
            .base_query()
            .order_by(SortKey::Attribute(DateAttribute::CreatedAt, Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Products flagged "new" today: `news_from <= today` and `news_to` unset or not
/// yet passed, latest `news_from` first.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewArrivalsStrategy;

#[async_trait]
impl SelectionStrategy for NewArrivalsStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let today = start_of_day(input.context.now.date());
        let query = input
            .base_query()
            .filter_by_attribute(AttributeFilter::range(
                DateAttribute::NewsFromDate,
                None,
                Some(today),
            ))
            .filter_by_attribute(
                AttributeFilter::range(DateAttribute::NewsToDate, Some(today), None).or_null(),
            )
            .order_by(SortKey::Attribute(DateAttribute::NewsFromDate, Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NewUpdatedStrategy;

#[async_trait]
impl SelectionStrategy for NewUpdatedStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let query = input
            .base_query()
            .order_by(SortKey::Attribute(DateAttribute::UpdatedAt, Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Ranks by quantity sold in the requested period.
#[derive(Clone, Debug)]
pub struct BestSellerStrategy {
    order_status: String,
}

impl BestSellerStrategy {
    pub fn new(order_status: impl Into<String>) -> Self {
        Self { order_status: order_status.into() }
    }
}

impl Default for BestSellerStrategy {
    fn default() -> Self {
        Self::new("complete")
    }
}

#[async_trait]
impl SelectionStrategy for BestSellerStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let Some(period) = input.params.period else {
            return not_applicable("bestseller", input.context, "period missing");
        };
        let Some(window) = AggregationWindow::for_period(period, input.context.now) else {
            return not_applicable("bestseller", input.context, "period outside calendar range");
        };

        debug!(
            event_name = "selection.bestseller.window",
            correlation_id = %input.context.correlation_id,
            period = period.as_str(),
            from = ?window.from(),
            to = %window.to(),
            "aggregating order lines"
        );

        let query = input
            .base_query()
            .join_aggregate(Aggregate::OrderedQuantity {
                window,
                order_status: self.order_status.clone(),
            })
            .order_by(SortKey::Aggregate(Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Discounted products together with the composite parents of discounted variants,
/// newest first.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscountStrategy;

#[async_trait]
impl SelectionStrategy for DiscountStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        // Variants are usually not visible on their own, so the first pass ignores visibility.
        let unrestricted = input.base_query().with_visibility(VisibilityFilter::Any);

        let discounted = catalog
            .materialize_ids(
                &unrestricted
                    .clone()
                    .filter_by_price(PriceFilter::FinalBelowRegular)
                    .order_by(SortKey::Relevance)
                    .limit(input.limit),
            )
            .await?;
        if discounted.is_empty() {
            return Ok(Some(OrderedIdResult::empty()));
        }

        let parents = catalog.children_to_parents(&discounted).await?;
        let candidates = OrderedIdResult::from_ids(
            discounted.iter().chain(parents.iter()).copied(),
            discounted.len() + parents.len(),
        )
        .ids();

        debug!(
            event_name = "selection.discount.candidates",
            correlation_id = %input.context.correlation_id,
            discounted = discounted.len(),
            parents = parents.len(),
            "resolved discounted products and their parents"
        );

        let query = unrestricted
            .with_visibility(VisibilityFilter::Catalog)
            .filter_by_ids(&candidates)
            .order_by(SortKey::Attribute(DateAttribute::CreatedAt, Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

/// Most viewed in the current store. Visibility is not applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct MostViewedStrategy;

#[async_trait]
impl SelectionStrategy for MostViewedStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let query = input
            .base_query()
            .with_visibility(VisibilityFilter::Any)
            .join_aggregate(Aggregate::ViewCount)
            .order_by(SortKey::Aggregate(Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TopRatedStrategy;

#[async_trait]
impl SelectionStrategy for TopRatedStrategy {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let query = input
            .base_query()
            .join_aggregate(Aggregate::RatingTotal)
            .order_by(SortKey::Aggregate(Direction::Desc))
            .limit(input.limit);
        fetch_ranked(catalog, query, input.limit()).await
    }
}
