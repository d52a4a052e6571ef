use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SelectionConfig;
use crate::domain::product::{CategoryId, CustomerId, ProductId};
use crate::domain::selection::{SelectionParams, SelectionRequest};
use crate::domain::window::Period;

/// Raw settings of a product widget block, as stored by the page editor.
///
/// Every field is free text. Id lists are comma separated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
    pub period: Option<String>,
    pub category_ids: Option<String>,
    pub product_ids: Option<String>,
    pub customer_id: Option<String>,
}

impl WidgetSettings {
    pub fn to_request(&self, config: &SelectionConfig) -> SelectionRequest {
        let limit = present(&self.limit)
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(config.default_limit);

        let mut params = SelectionParams::default();
        if let Some(raw) = present(&self.category_ids) {
            params = params.with_category_ids(parse_ids(raw).into_iter().map(CategoryId).collect());
        }
        if let Some(raw) = present(&self.product_ids) {
            params = params.with_product_ids(parse_ids(raw).into_iter().map(ProductId).collect());
        }
        if let Some(raw) = present(&self.period) {
            params = params.with_period(Period::parse(raw));
        }
        if let Some(customer_id) = present(&self.customer_id).and_then(|raw| raw.parse().ok()) {
            params = params.with_customer_id(CustomerId(customer_id));
        }

        let product_type = present(&self.product_type).unwrap_or_default();
        if product_type.eq_ignore_ascii_case("category") {
            let category = present(&self.category).unwrap_or_default();
            SelectionRequest::from_parts("category", category, params, limit)
        } else {
            SelectionRequest::from_parts("product", product_type, params, limit)
        }
    }

    /// Stable identifier of this widget configuration, `widgetplus-<hash>`.
    pub fn widget_id(&self) -> String {
        let canonical = json!({
            "product_type": self.product_type,
            "category": self.category,
            "limit": self.limit,
            "period": self.period,
            "category_ids": self.category_ids,
            "product_ids": self.product_ids,
            "customer_id": self.customer_id,
        });
        let digest = blake3::hash(canonical.to_string().as_bytes());
        format!("widgetplus-{}", &digest.to_hex()[..8])
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Integer tokens of a comma separated list; anything else is dropped.
pub fn parse_ids(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|token| token.trim().parse::<i64>().ok()).collect()
}
