use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use shelfpick_cli::commands::select::SelectArgs;
use shelfpick_cli::commands::{migrate, seed, select};

const SELECTION_TIME: &str = "2026-10-18 15:45:00";

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("SHELFPICK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("SHELFPICK_DATABASE_URL", "postgres://localhost/catalog")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_every_loaded_table() {
    with_env(&[("SHELFPICK_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected demo catalog seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("demo catalog loaded:"));
        assert!(message.contains("  - catalog_product: 10 rows"));
        assert!(message.contains("  - catalog_product_link: 6 rows"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("SHELFPICK_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn select_returns_best_sellers_for_the_current_month() {
    with_seeded_database(|| {
        let result = select::run(SelectArgs {
            value: "bestseller".to_string(),
            period: Some("current_month".to_string()),
            at: Some(SELECTION_TIME.to_string()),
            ..SelectArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected selection success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "select");
        assert_eq!(payload["data"]["mode"], "bestseller");
        assert_eq!(payload["data"]["applicable"], true);
        assert_eq!(product_ids(&payload), vec![5, 9, 1, 8]);

        let products = payload["data"]["products"].as_array().cloned().unwrap_or_default();
        assert_eq!(products.len(), 4);
        assert_eq!(products[0]["id"], 5);
    });
}

#[test]
fn select_uses_links_of_the_viewed_product() {
    with_seeded_database(|| {
        let result = select::run(SelectArgs {
            value: "related".to_string(),
            product: Some(1),
            cart: Some("3, gift-card, 5".to_string()),
            at: Some(SELECTION_TIME.to_string()),
            ..SelectArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected selection success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(product_ids(&payload), vec![8, 5]);
        assert_eq!(payload["data"]["cart_product_ids"], serde_json::json!([3, 5]));
    });
}

#[test]
fn select_defaults_to_the_configured_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    with_env(
        &[("SHELFPICK_DATABASE_URL", url.as_str()), ("SHELFPICK_SELECTION_STORE_ID", "2")],
        || {
            let seeded = seed::run();
            assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);

            let result = select::run(SelectArgs {
                value: "newest".to_string(),
                at: Some(SELECTION_TIME.to_string()),
                ..SelectArgs::default()
            });
            assert_eq!(result.exit_code, 0, "expected selection success: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["data"]["store_id"], 2);
            assert_eq!(product_ids(&payload), vec![10, 5, 1]);
        },
    );
}

#[test]
fn select_lists_category_products_by_position() {
    with_seeded_database(|| {
        let result = select::run(SelectArgs {
            value: "10".to_string(),
            category: true,
            at: Some(SELECTION_TIME.to_string()),
            ..SelectArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected selection success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["mode"], "category");
        assert_eq!(product_ids(&payload), vec![2, 1, 3]);
    });
}

#[test]
fn select_reports_configuration_gaps_as_not_applicable() {
    with_seeded_database(|| {
        let result = select::run(SelectArgs {
            value: "featured".to_string(),
            at: Some(SELECTION_TIME.to_string()),
            ..SelectArgs::default()
        });
        assert_eq!(result.exit_code, 0, "a configuration gap is not a failure");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["applicable"], false);
        assert_eq!(product_ids(&payload), Vec::<i64>::new());
    });
}

#[test]
fn select_rejects_unparseable_selection_time() {
    with_env(&[("SHELFPICK_DATABASE_URL", "sqlite::memory:")], || {
        let result = select::run(SelectArgs {
            value: "newest".to_string(),
            at: Some("next tuesday".to_string()),
            ..SelectArgs::default()
        });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_argument");
    });
}

fn with_seeded_database(test_fn: impl FnOnce()) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    with_env(&[("SHELFPICK_DATABASE_URL", url.as_str())], || {
        let seeded = seed::run();
        assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);
        test_fn();
    });
}

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("catalog.db").display())
}

fn product_ids(payload: &Value) -> Vec<i64> {
    payload["data"]["product_ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SHELFPICK_DATABASE_URL",
        "SHELFPICK_DATABASE_MAX_CONNECTIONS",
        "SHELFPICK_DATABASE_TIMEOUT_SECS",
        "SHELFPICK_SELECTION_STORE_ID",
        "SHELFPICK_SELECTION_DEFAULT_LIMIT",
        "SHELFPICK_SELECTION_MAX_LIMIT",
        "SHELFPICK_SELECTION_ORDER_STATUS",
        "SHELFPICK_LOGGING_LEVEL",
        "SHELFPICK_LOGGING_FORMAT",
        "SHELFPICK_LOG_LEVEL",
        "SHELFPICK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
