use crate::commands::{build_runtime, load_config, CommandResult};
use shelfpick_db::{connect_with_config, migrations, DemoCatalog, TableSeedInfo};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 5u8))?;

        let run_result: Result<Vec<TableSeedInfo>, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(seed_result.tables_seeded)
            } else {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_failure_message(&failed_checks), 5u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(tables) => CommandResult::success("seed", seed_summary(&tables)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_summary(tables: &[TableSeedInfo]) -> String {
    let lines: Vec<String> =
        tables.iter().map(|info| format!("  - {}: {} rows", info.table, info.rows)).collect();
    format!("demo catalog loaded:\n{}", lines.join("\n"))
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "some demo catalog rows failed to load".to_string()
    } else {
        format!("demo catalog verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{seed_summary, verification_failure_message};
    use shelfpick_db::TableSeedInfo;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_failure_message(&["catalog_product", "related-and-upsell-links"]),
            "demo catalog verification failed for checks: catalog_product, related-and-upsell-links"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_failure_message(&[]), "some demo catalog rows failed to load");
    }

    #[test]
    fn summary_lists_each_table() {
        let summary = seed_summary(&[
            TableSeedInfo { table: "catalog_category", rows: 3 },
            TableSeedInfo { table: "catalog_product", rows: 10 },
        ]);
        assert_eq!(
            summary,
            "demo catalog loaded:\n  - catalog_category: 3 rows\n  - catalog_product: 10 rows"
        );
    }
}
