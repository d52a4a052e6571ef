use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use shelfpick_core::domain::product::{Product, ProductId, ProductType, StoreId, Visibility};

use super::catalog::TIMESTAMP_FORMAT;
use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_err(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| RepositoryError::Decode(format!("timestamp `{value}`: {e}")))
}

fn parse_price(value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|e| RepositoryError::Decode(format!("price `{value}`: {e}")))
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let sku: String = row.try_get("sku").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let type_id: String = row.try_get("type_id").map_err(decode_err)?;
    let visibility_code: i64 = row.try_get("visibility").map_err(decode_err)?;
    let price: String = row.try_get("price").map_err(decode_err)?;
    let final_price: String = row.try_get("final_price").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;
    let news_from_date: Option<String> = row.try_get("news_from_date").map_err(decode_err)?;
    let news_to_date: Option<String> = row.try_get("news_to_date").map_err(decode_err)?;

    let product_type = ProductType::parse(&type_id)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown product type `{type_id}`")))?;
    let visibility = Visibility::from_code(visibility_code).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown visibility code `{visibility_code}`"))
    })?;

    Ok(Product {
        id: ProductId(id),
        sku,
        name,
        product_type,
        visibility,
        price: parse_price(&price)?,
        final_price: parse_price(&final_price)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        news_from_date: news_from_date.as_deref().map(parse_timestamp).transpose()?,
        news_to_date: news_to_date.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_ids(
        &self,
        store_id: StoreId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT e.id, e.sku, e.name, e.type_id, e.visibility,
                    CAST(pi.price AS TEXT) AS price, CAST(pi.final_price AS TEXT) AS final_price,
                    e.created_at, e.updated_at, e.news_from_date, e.news_to_date
             FROM catalog_product e
             JOIN catalog_product_price_index pi ON pi.product_id = e.id AND pi.store_id = ",
        );
        builder.push_bind(store_id.0);
        builder.push(" WHERE e.id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.0);
        }
        separated.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut by_id = rows
            .iter()
            .map(|row| row_to_product(row).map(|product| (product.id, product)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use shelfpick_core::domain::product::{ProductId, ProductType, StoreId, Visibility};

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations, DemoCatalog};

    #[tokio::test]
    async fn products_come_back_in_requested_order_with_store_prices() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        DemoCatalog::load(&pool).await.expect("seed");

        let repository = SqlProductRepository::new(pool);
        let products = repository
            .find_by_ids(StoreId(1), &[ProductId(3), ProductId(404), ProductId(2)])
            .await
            .expect("products");

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku, "JKT-DOWN-M");
        assert!(products[0].is_discounted());
        assert_eq!(products[0].final_price, Decimal::new(199, 0));
        assert_eq!(products[1].product_type, ProductType::Configurable);
        assert_eq!(products[1].visibility, Visibility::Both);
    }
}
