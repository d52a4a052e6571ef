use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Row counts the demo catalog contributes, in load order.
const SEED_TABLES: &[SeedTableContract] = &[
    SeedTableContract { table: "catalog_category", rows: 3 },
    SeedTableContract { table: "catalog_product", rows: 10 },
    SeedTableContract { table: "product_store", rows: 12 },
    SeedTableContract { table: "catalog_product_price_index", rows: 12 },
    SeedTableContract { table: "catalog_category_product", rows: 10 },
    SeedTableContract { table: "catalog_product_super_link", rows: 3 },
    SeedTableContract { table: "catalog_product_link", rows: 6 },
    SeedTableContract { table: "sales_order", rows: 6 },
    SeedTableContract { table: "sales_order_item", rows: 8 },
    SeedTableContract { table: "rating_vote_aggregated", rows: 7 },
    SeedTableContract { table: "report_viewed_event", rows: 12 },
];

/// Deterministic demo catalog: three categories, simple, configurable and bundle
/// products, orders across several periods, ratings, views and curated links.
///
/// Dates are store-local and clustered around 2026-10-18, so tests pin "now" to
/// that day.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Loads the demo catalog. Loading twice is a no-op.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let tables_seeded = SEED_TABLES
            .iter()
            .map(|contract| TableSeedInfo { table: contract.table, rows: contract.rows })
            .collect::<Vec<_>>();

        Ok(SeedResult { tables_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for contract in SEED_TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {}", contract.table))
                .fetch_one(pool)
                .await?;
            checks.push((contract.table, count >= contract.rows));
        }

        let discounted_variant: i64 = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM catalog_product_price_index pi
                 JOIN catalog_product_super_link sl ON sl.product_id = pi.product_id
                 WHERE pi.final_price < pi.price
             )",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("discounted-variant-with-parent", discounted_variant == 1));

        let curated_links: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT link_type) FROM catalog_product_link WHERE product_id = 1",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("related-and-upsell-links", curated_links == 2));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes every catalog row. Only meant for throwaway databases.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for contract in SEED_TABLES.iter().rev() {
            sqlx::query(&format!("DELETE FROM {}", contract.table)).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedTableContract {
    table: &'static str,
    rows: i64,
}

#[derive(Debug)]
pub struct SeedResult {
    pub tables_seeded: Vec<TableSeedInfo>,
}

#[derive(Debug)]
pub struct TableSeedInfo {
    pub table: &'static str,
    pub rows: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(DemoCatalog::SQL.contains("INSERT OR IGNORE INTO catalog_product"));
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoCatalog::load(&pool).await.expect("load demo catalog");
        let first_verification = DemoCatalog::verify(&pool).await.expect("verify demo catalog");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.tables_seeded.len(), SEED_TABLES.len());

        DemoCatalog::load(&pool).await.expect("reload demo catalog");
        let products: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM catalog_product")
            .fetch_one(&pool)
            .await
            .expect("count products");
        assert_eq!(products, 10);
    }

    #[tokio::test]
    async fn clean_empties_the_catalog() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoCatalog::load(&pool).await.expect("load demo catalog");

        DemoCatalog::clean(&pool).await.expect("clean demo catalog");

        let verification = DemoCatalog::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, ok)| !ok));
    }
}
