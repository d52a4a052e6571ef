use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Category, CategoryId, CustomerId, LinkKind, ProductId, StoreId};
use crate::domain::window::Period;

/// Named selection strategy for parameter-driven widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    Featured,
    NewFromDate,
    NewUpdated,
    BestSeller,
    Discount,
    Related,
    Upsell,
    MostViewed,
    Rating,
    Random,
    Newest,
}

impl SelectionMode {
    pub const ALL: [SelectionMode; 11] = [
        Self::Featured,
        Self::NewFromDate,
        Self::NewUpdated,
        Self::BestSeller,
        Self::Discount,
        Self::Related,
        Self::Upsell,
        Self::MostViewed,
        Self::Rating,
        Self::Random,
        Self::Newest,
    ];

    /// Maps a widget sub-type name to its mode. Unknown names select `Newest`.
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "featured" => Self::Featured,
            "newfromdate" => Self::NewFromDate,
            "newupdated" => Self::NewUpdated,
            "bestseller" => Self::BestSeller,
            "discount" => Self::Discount,
            "related" => Self::Related,
            "upsell" => Self::Upsell,
            "mostviewed" => Self::MostViewed,
            "rating" => Self::Rating,
            "random" => Self::Random,
            _ => Self::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::NewFromDate => "newfromdate",
            Self::NewUpdated => "newupdated",
            Self::BestSeller => "bestseller",
            Self::Discount => "discount",
            Self::Related => "related",
            Self::Upsell => "upsell",
            Self::MostViewed => "mostviewed",
            Self::Rating => "rating",
            Self::Random => "random",
            Self::Newest => "newest",
        }
    }

    pub fn link_kind(&self) -> Option<LinkKind> {
        match self {
            Self::Related => Some(LinkKind::Related),
            Self::Upsell => Some(LinkKind::Upsell),
            _ => None,
        }
    }
}

/// Category named by a category-scoped widget, either already loaded or raw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryRef {
    Loaded(Category),
    Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionScope {
    Category(CategoryRef),
    General(SelectionMode),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionParams {
    pub category_ids: Option<Vec<CategoryId>>,
    pub product_ids: Option<Vec<ProductId>>,
    pub period: Option<Period>,
    pub customer_id: Option<CustomerId>,
}

impl SelectionParams {
    pub fn with_category_ids(mut self, ids: Vec<CategoryId>) -> Self {
        self.category_ids = Some(ids);
        self
    }

    pub fn with_product_ids(mut self, ids: Vec<ProductId>) -> Self {
        self.product_ids = Some(ids);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_customer_id(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Category filter, if one was supplied. A supplied list with no usable ids still
    /// filters, and matches no product.
    pub fn category_filter(&self) -> Option<&[CategoryId]> {
        self.category_ids.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    pub scope: SelectionScope,
    pub params: SelectionParams,
    pub limit: u32,
}

impl SelectionRequest {
    pub fn new(scope: SelectionScope, params: SelectionParams, limit: u32) -> Self {
        Self { scope, params, limit }
    }

    /// Builds a request from the `(type, value)` pair a widget block is configured with:
    /// type `category` treats `value` as a category reference, anything else treats
    /// `value` as the selection sub-type.
    pub fn from_parts(kind: &str, value: &str, params: SelectionParams, limit: u32) -> Self {
        let scope = if kind.trim().eq_ignore_ascii_case("category") {
            SelectionScope::Category(CategoryRef::Raw(value.trim().to_string()))
        } else {
            SelectionScope::General(SelectionMode::from_name(value))
        };
        Self::new(scope, params, limit)
    }
}

/// Curated associations of the product currently being rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentProductContext {
    pub product_id: Option<ProductId>,
    related: Vec<ProductId>,
    upsell: Vec<ProductId>,
}

impl CurrentProductContext {
    /// Link lists are expected in stored position order.
    pub fn new(product_id: ProductId, related: Vec<ProductId>, upsell: Vec<ProductId>) -> Self {
        Self { product_id: Some(product_id), related, upsell }
    }

    pub fn related_ids(&self) -> &[ProductId] {
        &self.related
    }

    pub fn upsell_ids(&self) -> &[ProductId] {
        &self.upsell
    }

    pub fn linked_ids(&self, kind: LinkKind) -> &[ProductId] {
        match kind {
            LinkKind::Related => self.related_ids(),
            LinkKind::Upsell => self.upsell_ids(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContents {
    product_ids: Vec<ProductId>,
}

impl CartContents {
    pub fn new(product_ids: Vec<ProductId>) -> Self {
        Self { product_ids }
    }

    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }
}

/// Request-scoped ambient state a selection may read. Constructed per call.
#[derive(Clone, Debug)]
pub struct SelectionContext {
    pub store_id: StoreId,
    pub now: NaiveDateTime,
    pub correlation_id: String,
    pub current_product: Option<CurrentProductContext>,
    pub cart: CartContents,
}

impl SelectionContext {
    pub fn at(store_id: StoreId, now: NaiveDateTime) -> Self {
        Self {
            store_id,
            now,
            correlation_id: "unassigned".to_string(),
            current_product: None,
            cart: CartContents::default(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_current_product(mut self, product: CurrentProductContext) -> Self {
        self.current_product = Some(product);
        self
    }

    pub fn with_cart(mut self, cart: CartContents) -> Self {
        self.cart = cart;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedProduct {
    pub id: ProductId,
    /// Rendering must not carry the current category into this item's links.
    pub skip_category_context: bool,
}

/// Display-ranked product ids. Never longer than the limit it was built with and
/// never holding the same id twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedIdResult {
    items: Vec<SelectedProduct>,
}

impl OrderedIdResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keeps the first occurrence of each id, in input order, up to `limit` entries.
    pub fn from_ids(ids: impl IntoIterator<Item = ProductId>, limit: usize) -> Self {
        let mut seen = HashSet::new();
        let items = ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .take(limit)
            .map(|id| SelectedProduct { id, skip_category_context: false })
            .collect();
        Self { items }
    }

    pub fn skipping_category_context(mut self) -> Self {
        for item in &mut self.items {
            item.skip_category_context = true;
        }
        self
    }

    pub fn items(&self) -> &[SelectedProduct] {
        &self.items
    }

    pub fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cache tags for every selected product.
    pub fn identities(&self) -> Vec<String> {
        self.items.iter().map(|item| format!("catalog_product_{}", item.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CategoryRef, CurrentProductContext, OrderedIdResult, SelectionMode, SelectionParams,
        SelectionRequest, SelectionScope,
    };
    use crate::domain::product::{CategoryId, LinkKind, ProductId};

    fn ids(raw: &[i64]) -> Vec<ProductId> {
        raw.iter().copied().map(ProductId).collect()
    }

    #[test]
    fn ordered_result_dedups_and_respects_limit() {
        let result = OrderedIdResult::from_ids(ids(&[5, 3, 5, 9, 3, 1]), 3);
        assert_eq!(result.ids(), ids(&[5, 3, 9]));

        let none = OrderedIdResult::from_ids(ids(&[5, 3]), 0);
        assert!(none.is_empty());
    }

    #[test]
    fn skipping_category_context_marks_every_item() {
        let result = OrderedIdResult::from_ids(ids(&[2, 4]), 10).skipping_category_context();
        assert!(result.items().iter().all(|item| item.skip_category_context));
        assert_eq!(result.identities(), vec!["catalog_product_2", "catalog_product_4"]);
    }

    #[test]
    fn unknown_mode_names_select_newest() {
        assert_eq!(SelectionMode::from_name("bestseller"), SelectionMode::BestSeller);
        assert_eq!(SelectionMode::from_name("RATING"), SelectionMode::Rating);
        assert_eq!(SelectionMode::from_name("trending"), SelectionMode::Newest);
        assert_eq!(SelectionMode::from_name(""), SelectionMode::Newest);
    }

    #[test]
    fn category_kind_keeps_value_as_raw_reference() {
        let request = SelectionRequest::from_parts("category", " 12 ", SelectionParams::default(), 4);
        assert_eq!(request.scope, SelectionScope::Category(CategoryRef::Raw("12".to_string())));

        let general = SelectionRequest::from_parts("product", "upsell", SelectionParams::default(), 4);
        assert_eq!(general.scope, SelectionScope::General(SelectionMode::Upsell));
    }

    #[test]
    fn current_product_exposes_links_by_kind() {
        let context = CurrentProductContext::new(ProductId(1), ids(&[3, 2]), ids(&[8]));
        assert_eq!(context.linked_ids(LinkKind::Related), ids(&[3, 2]).as_slice());
        assert_eq!(context.linked_ids(LinkKind::Upsell), ids(&[8]).as_slice());
    }

    #[test]
    fn empty_category_list_still_filters() {
        let params = SelectionParams::default().with_category_ids(Vec::new());
        assert_eq!(params.category_filter(), Some(&[] as &[CategoryId]));
        assert!(SelectionParams::default().category_filter().is_none());
    }
}
