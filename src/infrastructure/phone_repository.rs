//! SQLite implementation of the durable storage capability
//!
//! Natural keys throughout: brands by `name`, phones by `(brand_id, slug)`,
//! specs by `phone_id`. All writes are idempotent upserts — re-applying the
//! same key overwrites with the newest values, never duplicates.

use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::domain::entities::{slugify, Phone, SpecRecord};
use crate::domain::errors::PersistenceError;
use crate::domain::repositories::SpecStore;

static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*([\d,]+(?:\.\d+)?)").expect("price pattern is valid"));

/// Parse a USD amount out of a free-form price field like "$ 1,199.99 / €1,249".
fn parse_price_usd(price_field: &str) -> Option<f64> {
    let caps = PRICE_PATTERN.captures(price_field)?;
    caps[1].replace(',', "").parse::<f64>().ok()
}

#[derive(Clone)]
pub struct SqliteSpecStore {
    pool: SqlitePool,
}

impl SqliteSpecStore {
    /// Connect (creating the database file if needed) and ensure the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Primary store ready: {database_url}");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS brands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS phones (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brand_id INTEGER NOT NULL REFERENCES brands(id),
                model TEXT NOT NULL,
                slug TEXT NOT NULL,
                image_url TEXT,
                price_usd REAL,
                source_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(brand_id, slug)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS phone_specs (
                phone_id INTEGER PRIMARY KEY REFERENCES phones(id),
                specs TEXT NOT NULL,
                scraped_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SpecStore for SqliteSpecStore {
    async fn find_or_create_brand(&self, name: &str, slug: &str) -> Result<i64, PersistenceError> {
        if let Some(row) = sqlx::query("SELECT id FROM brands WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(row.get("id"));
        }

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO brands (name, slug, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn upsert_phone(
        &self,
        brand_id: i64,
        phone: &Phone,
        record: &SpecRecord,
    ) -> Result<i64, PersistenceError> {
        let model = record.display_name(&phone.name).to_string();
        let slug = slugify(&model);
        let price_usd = record.fields.get("price").and_then(|p| parse_price_usd(p));
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO phones (brand_id, model, slug, image_url, price_usd, source_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(brand_id, slug) DO UPDATE SET
                model = excluded.model,
                image_url = excluded.image_url,
                price_usd = excluded.price_usd,
                source_url = excluded.source_url,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(brand_id)
        .bind(&model)
        .bind(&slug)
        .bind(&phone.image)
        .bind(price_usd)
        .bind(&phone.detail_url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        let phone_id: i64 = row.get("id");

        let specs_json = serde_json::to_string(&record.fields)?;
        sqlx::query(
            r#"
            INSERT INTO phone_specs (phone_id, specs, scraped_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(phone_id) DO UPDATE SET
                specs = excluded.specs,
                scraped_at = excluded.scraped_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(phone_id)
        .bind(&specs_json)
        .bind(record.scraped_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(phone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    async fn store() -> SqliteSpecStore {
        SqliteSpecStore::connect("sqlite::memory:").await.unwrap()
    }

    fn phone() -> Phone {
        Phone {
            brand: "Samsung".to_string(),
            brand_slug: "samsung_9".to_string(),
            name: "Galaxy S24".to_string(),
            detail_url: "https://www.gsmarena.com/samsung_galaxy_s24-12773.php".to_string(),
            image: None,
        }
    }

    fn record(battery: &str) -> SpecRecord {
        let mut fields = BTreeMap::new();
        fields.insert("model_name".to_string(), "Samsung Galaxy S24".to_string());
        fields.insert("battery".to_string(), battery.to_string());
        fields.insert("price".to_string(), "$ 799.99".to_string());
        SpecRecord::new(fields, "https://www.gsmarena.com/samsung_galaxy_s24-12773.php")
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(parse_price_usd("$ 1,199.99"), Some(1199.99));
        assert_eq!(parse_price_usd("$799"), Some(799.0));
        assert_eq!(parse_price_usd("about €1,249"), None);
    }

    #[tokio::test]
    async fn test_find_or_create_brand_is_idempotent() {
        let store = store().await;
        let a = store.find_or_create_brand("Samsung", "samsung_9").await.unwrap();
        let b = store.find_or_create_brand("Samsung", "samsung_9").await.unwrap();
        assert_eq!(a, b);

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM brands")
            .fetch_one(store.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_twice_yields_one_row_with_latest_values() {
        let store = store().await;
        let brand_id = store.find_or_create_brand("Samsung", "samsung_9").await.unwrap();

        let first = store
            .upsert_phone(brand_id, &phone(), &record("4000 mAh"))
            .await
            .unwrap();
        let second = store
            .upsert_phone(brand_id, &phone(), &record("4100 mAh"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM phones")
            .fetch_one(store.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);

        let specs: String = sqlx::query("SELECT specs FROM phone_specs WHERE phone_id = ?")
            .bind(second)
            .fetch_one(store.pool())
            .await
            .unwrap()
            .get("specs");
        assert!(specs.contains("4100 mAh"));

        let price: f64 = sqlx::query("SELECT price_usd FROM phones WHERE id = ?")
            .bind(second)
            .fetch_one(store.pool())
            .await
            .unwrap()
            .get("price_usd");
        assert!((price - 799.99).abs() < f64::EPSILON);
    }
}
