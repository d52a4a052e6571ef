use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use shelfpick_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields = [
        (
            "database.url",
            config.database.url.clone(),
            source("database.url", &["SHELFPICK_DATABASE_URL"]),
        ),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            source("database.max_connections", &["SHELFPICK_DATABASE_MAX_CONNECTIONS"]),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            source("database.timeout_secs", &["SHELFPICK_DATABASE_TIMEOUT_SECS"]),
        ),
        (
            "selection.store_id",
            config.selection.store_id.to_string(),
            source("selection.store_id", &["SHELFPICK_SELECTION_STORE_ID"]),
        ),
        (
            "selection.default_limit",
            config.selection.default_limit.to_string(),
            source("selection.default_limit", &["SHELFPICK_SELECTION_DEFAULT_LIMIT"]),
        ),
        (
            "selection.max_limit",
            config.selection.max_limit.to_string(),
            source("selection.max_limit", &["SHELFPICK_SELECTION_MAX_LIMIT"]),
        ),
        (
            "selection.order_status",
            config.selection.order_status.clone(),
            source("selection.order_status", &["SHELFPICK_SELECTION_ORDER_STATUS"]),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", &["SHELFPICK_LOGGING_LEVEL", "SHELFPICK_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            source("logging.format", &["SHELFPICK_LOGGING_FORMAT", "SHELFPICK_LOG_FORMAT"]),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|(key, value, source)| render_line(key, value, source)));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("shelfpick.toml"), PathBuf::from("config/shelfpick.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use toml::Value;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn nested_keys_are_found_in_the_file_document() {
        let doc: Value = "[selection]\nmax_limit = 40\n".parse().expect("toml");

        assert!(contains_path(&doc, "selection.max_limit"));
        assert!(!contains_path(&doc, "selection.store_id"));
        assert_eq!(
            field_source("selection.max_limit", &[], Some(&doc), Some(Path::new("shelfpick.toml"))),
            "file (shelfpick.toml)"
        );
        assert_eq!(field_source("logging.level", &[], Some(&doc), None), "default");
    }

    #[test]
    fn lines_name_their_source() {
        assert_eq!(
            render_line("selection.store_id", "1", "default"),
            "- selection.store_id = 1 (source: default)"
        );
    }
}
