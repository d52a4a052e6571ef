use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::trace;

use shelfpick_core::catalog::{CategoryLookup, ProductLinkResolver, ProductQueryExecutor};
use shelfpick_core::domain::product::{CategoryId, ProductId, Visibility};
use shelfpick_core::domain::selection::CurrentProductContext;
use shelfpick_core::errors::CatalogError;
use shelfpick_core::query::{
    Aggregate, AttributeFilter, Direction, PriceFilter, ProductQuery, SortKey, VisibilityFilter,
};

use super::RepositoryError;
use crate::DbPool;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Catalog collaborator backed by the SQLite catalog schema.
#[derive(Clone)]
pub struct SqlCatalogGateway {
    pool: DbPool,
}

impl SqlCatalogGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Related and upsell links of `product_id` in stored position order, or `None`
    /// when the product does not exist.
    pub async fn load_product_context(
        &self,
        product_id: ProductId,
    ) -> Result<Option<CurrentProductContext>, RepositoryError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM catalog_product WHERE id = ?1)")
                .bind(product_id.0)
                .fetch_one(&self.pool)
                .await?;
        if exists == 0 {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT linked_product_id, link_type
             FROM catalog_product_link
             WHERE product_id = ?1
             ORDER BY position ASC, linked_product_id ASC",
        )
        .bind(product_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut related = Vec::new();
        let mut upsell = Vec::new();
        for row in rows {
            let linked: i64 = row
                .try_get("linked_product_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let link_type: String =
                row.try_get("link_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            match link_type.as_str() {
                "related" => related.push(ProductId(linked)),
                "upsell" => upsell.push(ProductId(linked)),
                other => {
                    return Err(RepositoryError::Decode(format!("unknown link type `{other}`")))
                }
            }
        }

        Ok(Some(CurrentProductContext::new(product_id, related, upsell)))
    }
}

#[async_trait]
impl ProductQueryExecutor for SqlCatalogGateway {
    async fn materialize_ids(&self, query: &ProductQuery) -> Result<Vec<ProductId>, CatalogError> {
        let mut builder = build_select(query);
        trace!(
            event_name = "catalog.query",
            store_id = query.store_id().0,
            sql = builder.sql(),
            "materializing product ids"
        );

        let ids: Vec<i64> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(ids.into_iter().map(ProductId).collect())
    }
}

#[async_trait]
impl CategoryLookup for SqlCatalogGateway {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, CatalogError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM catalog_category WHERE id = ?1)")
                .bind(id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from)?;
        Ok(exists == 1)
    }
}

#[async_trait]
impl ProductLinkResolver for SqlCatalogGateway {
    async fn children_to_parents(
        &self,
        children: &[ProductId],
    ) -> Result<Vec<ProductId>, CatalogError> {
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT DISTINCT parent_id FROM catalog_product_super_link WHERE product_id IN (",
        );
        push_id_list(&mut builder, children.iter().map(|id| id.0));
        builder.push(") ORDER BY parent_id ASC");

        let parents: Vec<i64> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(parents.into_iter().map(ProductId).collect())
    }
}

/// Compiles `query` into a single `SELECT e.id` statement. Rows tie on `e.id ASC`
/// after every requested sort key.
pub(crate) fn build_select(query: &ProductQuery) -> QueryBuilder<'static, Sqlite> {
    let store_id = query.store_id().0;
    let mut builder = QueryBuilder::new(
        "SELECT e.id FROM catalog_product e \
         JOIN product_store ps ON ps.product_id = e.id AND ps.store_id = ",
    );
    builder.push_bind(store_id);

    let category_ids = query.category_ids().filter(|ids| !ids.is_empty());
    let by_category = category_ids.is_some();
    if let Some(ids) = category_ids {
        builder.push(
            " JOIN (SELECT product_id, MIN(position) AS position \
             FROM catalog_category_product WHERE category_id IN (",
        );
        push_id_list(&mut builder, ids.iter().map(|id| id.0));
        builder.push(") GROUP BY product_id) cat ON cat.product_id = e.id");
    }

    if let Some(PriceFilter::FinalBelowRegular) = query.price_filter() {
        builder.push(
            " JOIN catalog_product_price_index pi ON pi.product_id = e.id AND pi.store_id = ",
        );
        builder.push_bind(store_id);
        builder.push(" AND pi.final_price < pi.price");
    }

    if let Some(aggregate) = query.aggregate() {
        push_aggregate_join(&mut builder, aggregate, store_id);
    }

    builder.push(" WHERE 1 = 1");

    if matches!(query.category_ids(), Some([])) {
        builder.push(" AND 0 = 1");
    }

    if query.visibility() == VisibilityFilter::Catalog {
        builder.push(" AND e.visibility IN (");
        push_id_list(&mut builder, Visibility::visible_in_catalog().iter().map(Visibility::code));
        builder.push(")");
    }

    match query.product_ids() {
        Some([]) => {
            builder.push(" AND 0 = 1");
        }
        Some(ids) => {
            builder.push(" AND e.id IN (");
            push_id_list(&mut builder, ids.iter().map(|id| id.0));
            builder.push(")");
        }
        None => {}
    }

    for filter in query.attribute_filters() {
        push_attribute_filter(&mut builder, filter);
    }

    builder.push(" ORDER BY ");
    for key in query.order() {
        match key {
            SortKey::Attribute(attribute, direction) => {
                builder.push(format!("e.{} {}, ", attribute.column(), keyword(*direction)));
            }
            SortKey::Aggregate(direction) if query.aggregate().is_some() => {
                builder.push(format!("agg.score {}, ", keyword(*direction)));
            }
            SortKey::Aggregate(_) => {}
            SortKey::ExplicitRank(ids) if !ids.is_empty() => {
                builder.push("CASE e.id");
                for (rank, id) in ids.iter().enumerate() {
                    builder.push(" WHEN ");
                    builder.push_bind(id.0);
                    builder.push(format!(" THEN {rank}"));
                }
                builder.push(format!(" ELSE {} END ASC, ", ids.len()));
            }
            SortKey::ExplicitRank(_) => {}
            SortKey::Relevance if by_category => {
                builder.push("cat.position ASC, ");
            }
            SortKey::Relevance => {}
        }
    }
    builder.push("e.id ASC");

    if let Some(limit) = query.limit_value() {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }

    builder
}

fn push_aggregate_join(
    builder: &mut QueryBuilder<'static, Sqlite>,
    aggregate: &Aggregate,
    store_id: i64,
) {
    match aggregate {
        Aggregate::OrderedQuantity { window, order_status } => {
            builder.push(
                " JOIN (SELECT oi.product_id, SUM(oi.qty_ordered) AS score \
                 FROM sales_order_item oi JOIN sales_order o ON o.id = oi.order_id \
                 WHERE o.status = ",
            );
            builder.push_bind(order_status.clone());
            if let Some(from) = window.from() {
                builder.push(" AND oi.created_at >= ");
                builder.push_bind(timestamp(from));
            }
            builder.push(" AND oi.created_at < ");
            builder.push_bind(timestamp(window.to()));
            builder.push(" GROUP BY oi.product_id) agg ON agg.product_id = e.id");
        }
        Aggregate::RatingTotal => {
            builder.push(
                " JOIN (SELECT entity_pk_value AS product_id, SUM(percent_approved) AS score \
                 FROM rating_vote_aggregated WHERE store_id = ",
            );
            builder.push_bind(store_id);
            builder.push(" GROUP BY entity_pk_value) agg ON agg.product_id = e.id");
        }
        Aggregate::ViewCount => {
            builder.push(
                " JOIN (SELECT object_id AS product_id, COUNT(*) AS score \
                 FROM report_viewed_event WHERE store_id = ",
            );
            builder.push_bind(store_id);
            builder.push(" GROUP BY object_id) agg ON agg.product_id = e.id");
        }
    }
}

fn push_attribute_filter(builder: &mut QueryBuilder<'static, Sqlite>, filter: &AttributeFilter) {
    let column = filter.attribute.column();
    builder.push(" AND ((");
    match (filter.from, filter.to) {
        (Some(from), Some(to)) => {
            builder.push(format!("e.{column} >= "));
            builder.push_bind(timestamp(from));
            builder.push(format!(" AND e.{column} <= "));
            builder.push_bind(timestamp(to));
        }
        (Some(from), None) => {
            builder.push(format!("e.{column} >= "));
            builder.push_bind(timestamp(from));
        }
        (None, Some(to)) => {
            builder.push(format!("e.{column} <= "));
            builder.push_bind(timestamp(to));
        }
        (None, None) => {
            builder.push(format!("e.{column} IS NOT NULL"));
        }
    }
    builder.push(")");
    if filter.or_null {
        builder.push(format!(" OR e.{column} IS NULL"));
    }
    builder.push(")");
}

fn push_id_list(builder: &mut QueryBuilder<'static, Sqlite>, ids: impl IntoIterator<Item = i64>) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
}

fn keyword(direction: Direction) -> &'static str {
    match direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    }
}

pub(crate) fn timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}
