use async_trait::async_trait;

use crate::catalog::CatalogGateway;
use crate::domain::product::{LinkKind, StoreId};
use crate::domain::selection::{CurrentProductContext, OrderedIdResult, SelectionContext};
use crate::query::{ProductQuery, SortKey};

use super::{not_applicable, SelectionOutcome, SelectionStrategy, StrategyInput};

/// Related or upsell products curated on the product being rendered.
///
/// Every returned item is flagged to skip the category context, so links rendered
/// for it never carry the current page's category.
#[derive(Clone, Copy, Debug)]
pub struct RelatedSetResolver {
    kind: LinkKind,
}

impl RelatedSetResolver {
    pub fn new(kind: LinkKind) -> Self {
        Self { kind }
    }

    pub async fn resolve(
        &self,
        catalog: &dyn CatalogGateway,
        product: Option<&CurrentProductContext>,
        store_id: StoreId,
        limit: u32,
        context: &SelectionContext,
    ) -> SelectionOutcome {
        let Some(product) = product else {
            return not_applicable(self.kind.as_str(), context, "no current product");
        };

        let linked = product.linked_ids(self.kind);
        if linked.is_empty() {
            return Ok(Some(OrderedIdResult::empty()));
        }

        let query = ProductQuery::base(store_id)
            .filter_by_ids(linked)
            .order_by(SortKey::ExplicitRank(linked.to_vec()))
            .limit(limit);
        let ids = catalog.materialize_ids(&query).await?;

        Ok(Some(OrderedIdResult::from_ids(ids, limit as usize).skipping_category_context()))
    }
}

#[async_trait]
impl SelectionStrategy for RelatedSetResolver {
    async fn evaluate(
        &self,
        catalog: &dyn CatalogGateway,
        input: StrategyInput<'_>,
    ) -> SelectionOutcome {
        let context = input.context;
        self.resolve(catalog, context.current_product.as_ref(), context.store_id, input.limit, context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::RelatedSetResolver;
    use crate::domain::product::{LinkKind, ProductId};
    use crate::domain::selection::{CurrentProductContext, SelectionParams};
    use crate::query::{SortKey, VisibilityFilter};
    use crate::selection::testing::{context, ids, RecordingCatalog};
    use crate::selection::{SelectionStrategy, StrategyInput};

    #[tokio::test]
    async fn missing_current_product_is_not_applicable() {
        let catalog = RecordingCatalog::default();
        let params = SelectionParams::default();
        let context = context();

        let outcome = RelatedSetResolver::new(LinkKind::Related)
            .evaluate(&catalog, StrategyInput { params: &params, limit: 4, context: &context })
            .await
            .expect("related");

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn upsell_uses_stored_position_and_flags_items() {
        let catalog = RecordingCatalog::answering(vec![vec![8, 6]]);
        let params = SelectionParams::default();
        let context = context().with_current_product(CurrentProductContext::new(
            ProductId(1),
            ids(&[2, 3]),
            ids(&[8, 7, 6]),
        ));

        let result = RelatedSetResolver::new(LinkKind::Upsell)
            .evaluate(&catalog, StrategyInput { params: &params, limit: 4, context: &context })
            .await
            .expect("upsell")
            .expect("applicable");

        assert_eq!(result.ids(), ids(&[8, 6]));
        assert!(result.items().iter().all(|item| item.skip_category_context));
        let query = &catalog.recorded()[0];
        assert_eq!(query.visibility(), VisibilityFilter::Catalog);
        assert_eq!(query.order(), &[SortKey::ExplicitRank(ids(&[8, 7, 6]))]);
    }

    #[tokio::test]
    async fn product_without_links_yields_empty_selection() {
        let catalog = RecordingCatalog::default();
        let params = SelectionParams::default();
        let context = context()
            .with_current_product(CurrentProductContext::new(ProductId(1), Vec::new(), Vec::new()));

        let result = RelatedSetResolver::new(LinkKind::Related)
            .evaluate(&catalog, StrategyInput { params: &params, limit: 4, context: &context })
            .await
            .expect("related")
            .expect("applicable");

        assert!(result.is_empty());
        assert!(catalog.recorded().is_empty());
    }
}
