use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::commands::{build_runtime, load_config, CommandResult};
use shelfpick_core::domain::product::{Product, ProductId, StoreId};
use shelfpick_core::domain::selection::{CartContents, SelectionContext, SelectionScope};
use shelfpick_core::selection::SelectionDispatcher;
use shelfpick_core::widget::{parse_ids, WidgetSettings};
use shelfpick_db::{connect_with_config, ProductRepository, SqlCatalogGateway, SqlProductRepository};

const AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Args)]
pub struct SelectArgs {
    #[arg(help = "Selection sub-type (featured, bestseller, discount, ...) or a category id with --category")]
    pub value: String,
    #[arg(long, help = "Treat VALUE as a category id")]
    pub category: bool,
    #[arg(long, help = "Maximum number of products; defaults to selection.default_limit")]
    pub limit: Option<String>,
    #[arg(long, help = "Best-seller period: current_year, last_year, current_month, last_month, yesterday")]
    pub period: Option<String>,
    #[arg(long = "category-ids", help = "Comma separated category filter")]
    pub category_ids: Option<String>,
    #[arg(long = "product-ids", help = "Comma separated product ids for featured lists")]
    pub product_ids: Option<String>,
    #[arg(long = "customer-id")]
    pub customer_id: Option<String>,
    #[arg(long, help = "Product being viewed, for related and upsell selections")]
    pub product: Option<i64>,
    #[arg(long, help = "Comma separated product ids currently in the cart")]
    pub cart: Option<String>,
    #[arg(long, help = "Store to select in; defaults to selection.store_id")]
    pub store: Option<i64>,
    #[arg(long, help = "Store-local time to select at (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    pub at: Option<String>,
}

impl SelectArgs {
    pub fn widget_settings(&self) -> WidgetSettings {
        let (product_type, category) = if self.category {
            ("category".to_string(), Some(self.value.clone()))
        } else {
            (self.value.clone(), None)
        };

        WidgetSettings {
            product_type: Some(product_type),
            category,
            limit: self.limit.clone(),
            period: self.period.clone(),
            category_ids: self.category_ids.clone(),
            product_ids: self.product_ids.clone(),
            customer_id: self.customer_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SelectReport {
    widget_id: String,
    request_id: String,
    store_id: i64,
    mode: String,
    limit: u32,
    applicable: bool,
    cart_product_ids: Vec<i64>,
    product_ids: Vec<i64>,
    identities: Vec<String>,
    products: Vec<Product>,
}

pub fn run(args: SelectArgs) -> CommandResult {
    let config = match load_config("select") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let now = match parse_at(args.at.as_deref()) {
        Ok(now) => now,
        Err(message) => return CommandResult::failure("select", "invalid_argument", message, 2),
    };
    let runtime = match build_runtime("select") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let settings = args.widget_settings();
    let request = settings.to_request(&config.selection);
    let widget_id = settings.widget_id();
    let request_id = Uuid::new_v4().to_string();
    let store_id = args.store.map(StoreId).unwrap_or_else(|| config.selection.store());
    let mode = match &request.scope {
        SelectionScope::Category(_) => "category".to_string(),
        SelectionScope::General(mode) => mode.as_str().to_string(),
    };

    tracing::info!(
        event_name = "cli.select.started",
        correlation_id = %widget_id,
        request_id = %request_id,
        store_id = store_id.0,
        mode = %mode,
        "running widget selection"
    );

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let gateway = SqlCatalogGateway::new(pool.clone());

        let mut context = SelectionContext::at(store_id, now).with_correlation_id(widget_id.clone());
        if let Some(product_id) = args.product {
            let product = gateway
                .load_product_context(ProductId(product_id))
                .await
                .map_err(|error| ("db_query", error.to_string(), 4u8))?;
            if let Some(product) = product {
                context = context.with_current_product(product);
            }
        }
        if let Some(cart) = args.cart.as_deref() {
            let ids = parse_ids(cart).into_iter().map(ProductId).collect();
            context = context.with_cart(CartContents::new(ids));
        }
        let cart_product_ids: Vec<i64> =
            context.cart.product_ids().iter().map(|id| id.0).collect();

        let dispatcher = SelectionDispatcher::new(gateway, &config.selection);
        let outcome = dispatcher
            .select(&request, &context)
            .await
            .map_err(|error| (error.error_class(), error.to_string(), 6u8))?;

        let products = match &outcome {
            Some(selected) => SqlProductRepository::new(pool.clone())
                .find_by_ids(store_id, &selected.ids())
                .await
                .map_err(|error| ("db_query", error.to_string(), 4u8))?,
            None => Vec::new(),
        };

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>((outcome, products, cart_product_ids))
    });

    match result {
        Ok((outcome, products, cart_product_ids)) => {
            let applicable = outcome.is_some();
            let selected = outcome.unwrap_or_default();
            let message = if applicable {
                format!("selected {} products", selected.len())
            } else {
                "selection not applicable for this widget configuration".to_string()
            };
            let report = SelectReport {
                widget_id,
                request_id,
                store_id: store_id.0,
                mode,
                limit: request.limit.min(config.selection.max_limit),
                applicable,
                cart_product_ids,
                product_ids: selected.ids().into_iter().map(|id| id.0).collect(),
                identities: selected.identities(),
                products,
            };
            match serde_json::to_value(&report) {
                Ok(data) => CommandResult::success_with_data("select", message, Some(data)),
                Err(error) => CommandResult::failure("select", "serialization", error.to_string(), 3),
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("select", error_class, message, exit_code)
        }
    }
}

fn parse_at(raw: Option<&str>) -> Result<NaiveDateTime, String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Local::now().naive_local());
    };

    NaiveDateTime::parse_from_str(raw, AT_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| format!("invalid --at value `{raw}`; expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_at, SelectArgs};

    #[test]
    fn category_flag_moves_value_into_category_setting() {
        let args = SelectArgs { value: "10".to_string(), category: true, ..SelectArgs::default() };
        let settings = args.widget_settings();

        assert_eq!(settings.product_type.as_deref(), Some("category"));
        assert_eq!(settings.category.as_deref(), Some("10"));
    }

    #[test]
    fn at_accepts_dates_and_timestamps() {
        let midnight = NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("date");

        assert_eq!(parse_at(Some("2026-10-18")), Ok(midnight));
        assert_eq!(
            parse_at(Some("2026-10-18 15:45:00")).map(|at| at.to_string()),
            Ok("2026-10-18 15:45:00".to_string())
        );
        assert!(parse_at(Some("yesterday")).is_err());
    }
}
