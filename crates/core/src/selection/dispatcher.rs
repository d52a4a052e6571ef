use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::CatalogGateway;
use crate::config::SelectionConfig;
use crate::domain::product::{CategoryId, LinkKind};
use crate::domain::selection::{
    CategoryRef, CurrentProductContext, SelectionContext, SelectionMode, SelectionParams,
    SelectionRequest, SelectionScope,
};
use crate::errors::SelectionError;

use super::{
    not_applicable, BestSellerStrategy, CategoryStrategy, DiscountStrategy, FeaturedStrategy,
    MostViewedStrategy, NewArrivalsStrategy, NewUpdatedStrategy, NewestStrategy, RandomStrategy,
    RelatedSetResolver, SelectionOutcome, SelectionStrategy, StrategyInput, TopRatedStrategy,
};

/// Routes selection requests to the strategy registered for their mode.
pub struct SelectionDispatcher<C> {
    catalog: C,
    category: CategoryStrategy,
    strategies: BTreeMap<SelectionMode, Box<dyn SelectionStrategy>>,
    max_limit: u32,
}

impl<C> SelectionDispatcher<C>
where
    C: CatalogGateway + 'static,
{
    /// Dispatcher with every built-in strategy registered.
    pub fn new(catalog: C, config: &SelectionConfig) -> Self {
        Self::empty(catalog, config.max_limit)
            .register(SelectionMode::Featured, FeaturedStrategy)
            .register(SelectionMode::NewFromDate, NewArrivalsStrategy)
            .register(SelectionMode::NewUpdated, NewUpdatedStrategy)
            .register(SelectionMode::BestSeller, BestSellerStrategy::new(&config.order_status))
            .register(SelectionMode::Discount, DiscountStrategy)
            .register(SelectionMode::Related, RelatedSetResolver::new(LinkKind::Related))
            .register(SelectionMode::Upsell, RelatedSetResolver::new(LinkKind::Upsell))
            .register(SelectionMode::MostViewed, MostViewedStrategy)
            .register(SelectionMode::Rating, TopRatedStrategy)
            .register(SelectionMode::Random, RandomStrategy::new())
            .register(SelectionMode::Newest, NewestStrategy)
    }

    pub fn empty(catalog: C, max_limit: u32) -> Self {
        Self { catalog, category: CategoryStrategy, strategies: BTreeMap::new(), max_limit }
    }

    /// Registers `strategy` for `mode`, replacing any earlier registration.
    pub fn register(mut self, mode: SelectionMode, strategy: impl SelectionStrategy + 'static) -> Self {
        self.strategies.insert(mode, Box::new(strategy));
        self
    }

    pub fn registered_modes(&self) -> Vec<SelectionMode> {
        self.strategies.keys().copied().collect()
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn select(
        &self,
        request: &SelectionRequest,
        context: &SelectionContext,
    ) -> SelectionOutcome {
        let limit = self.clamp(request.limit);

        let outcome = match &request.scope {
            SelectionScope::Category(category) => {
                debug!(
                    event_name = "selection.dispatch",
                    correlation_id = %context.correlation_id,
                    mode = "category",
                    limit,
                    "dispatching category selection"
                );
                let Some(category_id) = self.resolve_category(category).await? else {
                    return not_applicable("category", context, "category not found");
                };
                let params = SelectionParams::default().with_category_ids(vec![category_id]);
                self.category
                    .evaluate(&self.catalog, StrategyInput { params: &params, limit, context })
                    .await?
            }
            SelectionScope::General(mode) => {
                let Some((mode, strategy)) = self.strategy_for(*mode) else {
                    return not_applicable("dispatcher", context, "no strategy registered");
                };
                debug!(
                    event_name = "selection.dispatch",
                    correlation_id = %context.correlation_id,
                    mode = mode.as_str(),
                    limit,
                    "dispatching selection"
                );
                strategy
                    .evaluate(
                        &self.catalog,
                        StrategyInput { params: &request.params, limit, context },
                    )
                    .await?
            }
        };

        if let Some(result) = &outcome {
            debug!(
                event_name = "selection.completed",
                correlation_id = %context.correlation_id,
                result_count = result.len(),
                "selection completed"
            );
        }
        Ok(outcome)
    }

    /// Related or upsell selection for an explicitly supplied product.
    pub async fn select_related(
        &self,
        kind: LinkKind,
        product: &CurrentProductContext,
        limit: u32,
        context: &SelectionContext,
    ) -> SelectionOutcome {
        RelatedSetResolver::new(kind)
            .resolve(&self.catalog, Some(product), context.store_id, self.clamp(limit), context)
            .await
    }

    fn clamp(&self, limit: u32) -> u32 {
        limit.min(self.max_limit)
    }

    /// Strategy for `mode`, falling back to the newest-first strategy.
    fn strategy_for(&self, mode: SelectionMode) -> Option<(SelectionMode, &dyn SelectionStrategy)> {
        self.strategies
            .get(&mode)
            .map(|strategy| (mode, strategy.as_ref()))
            .or_else(|| {
                self.strategies
                    .get(&SelectionMode::Newest)
                    .map(|strategy| (SelectionMode::Newest, strategy.as_ref()))
            })
    }

    async fn resolve_category(
        &self,
        category: &CategoryRef,
    ) -> Result<Option<CategoryId>, SelectionError> {
        match category {
            CategoryRef::Loaded(category) => Ok(Some(category.id)),
            CategoryRef::Raw(raw) => {
                let Ok(id) = raw.trim().parse::<i64>() else {
                    return Ok(None);
                };
                if id <= 0 {
                    return Ok(None);
                }
                let id = CategoryId(id);
                Ok(self.catalog.category_exists(id).await?.then_some(id))
            }
        }
    }
}
