//! MySQL-backed ad store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseConfig;
use crate::models::{Ad, AdDraft};

use super::{AdStore, ListParams, StoreError};

const AD_COLUMNS: &str = "id, title, description, price, active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AdRow {
    id: i64,
    title: String,
    description: String,
    price: f64,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdRow> for Ad {
    fn from(row: AdRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            active: row.active,
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::from_persistence(other),
    }
}

#[derive(Clone)]
pub struct MySqlAdStore {
    pool: MySqlPool,
}

impl MySqlAdStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from the database settings and verifies it with a ping query.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = match config.url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => url.parse::<MySqlConnectOptions>()?,
            None => MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.name),
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Page query for `params`. Identifiers cannot be bound, so the ORDER BY
/// clause is built from the closed sort enums; limit and offset stay bound.
fn list_sql(params: &ListParams) -> String {
    format!(
        "SELECT {AD_COLUMNS} FROM ads ORDER BY {} {} LIMIT ? OFFSET ?",
        params.sort.as_sql(),
        params.order.as_sql()
    )
}

#[async_trait]
impl AdStore for MySqlAdStore {
    async fn list(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        let sql = list_sql(params);
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Ad::from).collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ads")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count)
            .map_err(|_| StoreError::from_persistence("count exceeds supported range"))
    }

    async fn find(&self, id: i64) -> Result<Ad, StoreError> {
        let sql = format!("SELECT {AD_COLUMNS} FROM ads WHERE id = ?");
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)?;

        Ok(row.into())
    }

    async fn insert(&self, draft: &AdDraft) -> Result<Ad, StoreError> {
        let result =
            sqlx::query("INSERT INTO ads (title, description, price, active) VALUES (?, ?, ?, ?)")
                .bind(&draft.title)
                .bind(&draft.description)
                .bind(draft.price)
                .bind(draft.active)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| StoreError::from_persistence("inserted id exceeds supported range"))?;

        // Timestamps are assigned by the database; read the row back to get them.
        self.find(id).await.map_err(|err| match err {
            StoreError::NotFound => {
                StoreError::from_persistence(format!("inserted ad {id} could not be read back"))
            }
            other => other,
        })
    }

    async fn update(&self, id: i64, draft: &AdDraft) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE ads \
             SET title = ?, description = ?, price = ?, active = ?, \
                 updated_at = CURRENT_TIMESTAMP(6) \
             WHERE id = ?",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.active)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM ads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
