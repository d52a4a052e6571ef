//! Immutable product query specification.
//!
//! Strategies describe what they want by transforming a [`ProductQuery`] value; every
//! builder method consumes the query and returns a new one, so a strategy can keep an
//! earlier stage around (the discount lookup re-filters its unbounded base query) without
//! sharing mutable state. A [`crate::catalog::ProductQueryExecutor`] turns the finished
//! value into an ordered id list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::product::{CategoryId, ProductId, StoreId};
use crate::domain::window::AggregationWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityFilter {
    /// Only products visible in catalog listings.
    Catalog,
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAttribute {
    CreatedAt,
    UpdatedAt,
    NewsFromDate,
    NewsToDate,
}

impl DateAttribute {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::NewsFromDate => "news_from_date",
            Self::NewsToDate => "news_to_date",
        }
    }
}

/// Inclusive range over a date attribute. With `or_null` set, products whose
/// attribute is unset also match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub attribute: DateAttribute,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub or_null: bool,
}

impl AttributeFilter {
    pub fn range(
        attribute: DateAttribute,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Self {
        Self { attribute, from, to, or_null: false }
    }

    pub fn or_null(mut self) -> Self {
        self.or_null = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFilter {
    /// Indexed final price strictly below the regular price.
    FinalBelowRegular,
}

/// Per-product aggregate joined onto the query. Products without an aggregate
/// row are excluded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    /// Sum of ordered quantity over order lines inside `window`, counting only
    /// orders in `order_status`.
    OrderedQuantity { window: AggregationWindow, order_status: String },
    /// Sum of approved rating percentage in the query's store.
    RatingTotal,
    /// Number of view events in the query's store.
    ViewCount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Attribute(DateAttribute, Direction),
    /// The joined aggregate value.
    Aggregate(Direction),
    /// Position of the id in the given list; ids not listed sort last.
    ExplicitRank(Vec<ProductId>),
    /// Catalog default order: category position, then product id.
    Relevance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    store_id: StoreId,
    visibility: VisibilityFilter,
    category_ids: Option<Vec<CategoryId>>,
    product_ids: Option<Vec<ProductId>>,
    attribute_filters: Vec<AttributeFilter>,
    price_filter: Option<PriceFilter>,
    aggregate: Option<Aggregate>,
    order: Vec<SortKey>,
    limit: Option<u32>,
}

impl ProductQuery {
    /// Store-scoped, catalog-visible product query with no other restriction.
    pub fn base(store_id: StoreId) -> Self {
        Self {
            store_id,
            visibility: VisibilityFilter::Catalog,
            category_ids: None,
            product_ids: None,
            attribute_filters: Vec::new(),
            price_filter: None,
            aggregate: None,
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn with_visibility(mut self, visibility: VisibilityFilter) -> Self {
        self.visibility = visibility;
        self
    }

    /// `IN` membership over `ids`. An empty slice matches nothing.
    pub fn filter_by_category_ids(mut self, ids: &[CategoryId]) -> Self {
        self.category_ids = Some(ids.to_vec());
        self
    }

    /// Restricts to exactly `ids`. An empty list matches nothing.
    pub fn filter_by_ids(mut self, ids: &[ProductId]) -> Self {
        self.product_ids = Some(ids.to_vec());
        self
    }

    pub fn filter_by_attribute(mut self, filter: AttributeFilter) -> Self {
        self.attribute_filters.push(filter);
        self
    }

    pub fn filter_by_price(mut self, filter: PriceFilter) -> Self {
        self.price_filter = Some(filter);
        self
    }

    pub fn join_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order.push(key);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.limit = None;
        self
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn visibility(&self) -> VisibilityFilter {
        self.visibility
    }

    pub fn category_ids(&self) -> Option<&[CategoryId]> {
        self.category_ids.as_deref()
    }

    pub fn product_ids(&self) -> Option<&[ProductId]> {
        self.product_ids.as_deref()
    }

    pub fn attribute_filters(&self) -> &[AttributeFilter] {
        &self.attribute_filters
    }

    pub fn price_filter(&self) -> Option<PriceFilter> {
        self.price_filter
    }

    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::{DateAttribute, Direction, ProductQuery, SortKey, VisibilityFilter};
    use crate::domain::product::{CategoryId, ProductId, StoreId};

    #[test]
    fn builder_returns_new_values_and_leaves_the_original_intact() {
        let base = ProductQuery::base(StoreId(1)).filter_by_category_ids(&[CategoryId(4)]);
        let bounded = base.clone().limit(5).order_by(SortKey::Relevance);

        assert_eq!(base.limit_value(), None);
        assert!(base.order().is_empty());
        assert_eq!(bounded.limit_value(), Some(5));
        assert_eq!(bounded.category_ids(), Some([CategoryId(4)].as_slice()));
        assert_eq!(bounded.visibility(), VisibilityFilter::Catalog);
    }

    #[test]
    fn id_filter_and_order_keys_accumulate_in_call_order() {
        let query = ProductQuery::base(StoreId(2))
            .filter_by_ids(&[ProductId(3), ProductId(1)])
            .order_by(SortKey::Attribute(DateAttribute::CreatedAt, Direction::Desc))
            .order_by(SortKey::Relevance)
            .limit(3)
            .unbounded();

        assert_eq!(query.product_ids(), Some([ProductId(3), ProductId(1)].as_slice()));
        assert_eq!(query.order().len(), 2);
        assert_eq!(query.limit_value(), None);
    }

    #[test]
    fn empty_category_filter_is_kept_as_a_filter() {
        let query = ProductQuery::base(StoreId(1)).filter_by_category_ids(&[]);

        assert_eq!(query.category_ids(), Some(&[] as &[CategoryId]));
        assert_eq!(ProductQuery::base(StoreId(1)).category_ids(), None);
    }
}
