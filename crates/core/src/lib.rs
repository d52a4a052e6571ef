pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod query;
pub mod selection;
pub mod widget;

pub use catalog::{CatalogGateway, CategoryLookup, ProductLinkResolver, ProductQueryExecutor};
pub use domain::product::{
    Category, CategoryId, CustomerId, LinkKind, Product, ProductId, ProductType, StoreId,
    Visibility,
};
pub use domain::selection::{
    CartContents, CategoryRef, CurrentProductContext, OrderedIdResult, SelectedProduct,
    SelectionContext, SelectionMode, SelectionParams, SelectionRequest, SelectionScope,
};
pub use domain::window::{AggregationWindow, Period};
pub use errors::{CatalogError, SelectionError};
pub use query::ProductQuery;
pub use selection::{SelectionDispatcher, SelectionOutcome, SelectionStrategy};
pub use widget::WidgetSettings;
