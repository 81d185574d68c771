//! Postgres collection store: one JSONB `documents` table keyed by
//! `(collection, key)`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder, Row,
    postgres::{PgPool, PgPoolOptions},
    types::Json,
};

use crate::application::store::{
    CollectionQuery, CollectionStore, Document, SortDirection, StoreError, StoredDocument,
};

pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to statement timeout")
                || db
                    .message()
                    .contains("canceling statement due to user request") =>
        {
            StoreError::Timeout
        }
        sqlx::Error::Database(db) if db.message().contains("violates") => {
            StoreError::invalid_document(db.message())
        }
        sqlx::Error::ColumnDecode { source, .. } | sqlx::Error::Decode(source) => {
            StoreError::invalid_document(source.to_string())
        }
        other => StoreError::from_persistence(other),
    }
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }
}

#[async_trait]
impl CollectionStore for PostgresStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let body = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(body.map(|Json(document)| document))
    }

    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, key, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, key) DO UPDATE SET body = EXCLUDED.body",
        )
        .bind(collection)
        .bind(key)
        .bind(Json(document))
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3 WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key)
        .bind(Json(fields))
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, key));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT key, body FROM documents WHERE collection = ",
        );
        qb.push_bind(collection);
        qb.push(" AND body ? ");
        qb.push_bind(query.order_by.as_str());

        let (comparison, direction) = match query.direction {
            SortDirection::Ascending => (">", "ASC"),
            SortDirection::Descending => ("<", "DESC"),
        };

        if let Some(start) = query.start_after.as_ref() {
            qb.push(" AND (body -> ");
            qb.push_bind(query.order_by.as_str());
            qb.push(", key) ");
            qb.push(comparison);
            qb.push(" (");
            qb.push_bind(Json(start.value.clone()));
            qb.push(", ");
            qb.push_bind(start.key.as_str());
            qb.push(")");
        }

        qb.push(" ORDER BY body -> ");
        qb.push_bind(query.order_by.as_str());
        qb.push(" ");
        qb.push(direction);
        qb.push(", key ");
        qb.push(direction);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(query.limit));

        let rows = qb
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let key: String = row.try_get("key").map_err(map_sqlx_error)?;
                let Json(body): Json<Document> = row.try_get("body").map_err(map_sqlx_error)?;
                Ok(StoredDocument { key, body })
            })
            .collect()
    }

    async fn aggregate_sum(&self, collection: &str, field: &str) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM((body ->> $2)::BIGINT), 0)::BIGINT FROM documents \
             WHERE collection = $1 \
               AND jsonb_typeof(body -> $2) = 'number' \
               AND (body ->> $2) ~ '^-?[0-9]+$'",
        )
        .bind(collection)
        .bind(field)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
