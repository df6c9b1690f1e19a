//! # keystone-db-postgres
//!
//! PostgreSQL document store backend for Keystone.
//!
//! Collections are tables with a single JSONB `doc` column; predicates
//! compile to parameterized expressions over `doc`, and the unique indexes
//! the contract requires are expression indexes on the indexed field.
//!
//! The two atomicity contracts of the document backend are discharged by
//! single SQL statements:
//!
//! - duplicate detection happens in the unique index at insert time, never
//!   as a separate existence check;
//! - `take_one` is one `DELETE ... RETURNING` statement, so a concurrent
//!   redeemer of the same document gets an empty result, never a stale
//!   copy.
//!
//! # Example
//!
//! ```ignore
//! use keystone_db_postgres::{PostgresBackend, PostgresConfig};
//!
//! let config = PostgresConfig::new("postgres://localhost/keystone");
//! let backend = PostgresBackend::connect(&config).await?;
//! ```

mod config;
mod pool;
mod sql;

use async_trait::async_trait;
use serde_json::Value;
use sqlx_core::query::{Query, query};
use sqlx_core::query_scalar::{QueryScalar, query_scalar};
use sqlx_postgres::{PgArguments, Postgres};
use tracing::debug;

use keystone_store::{DocumentBackend, Predicate, StoreError};

pub use config::PostgresConfig;
pub use pool::{PgPoolOptions, create_pool};
pub use sqlx_postgres::PgPool;

use sql::{SqlParam, compile};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;
type PgQueryScalar<'q> = QueryScalar<'q, Postgres, Value, PgArguments>;

/// PostgreSQL implementation of the document backend contract.
///
/// Holds a process-lifetime connection pool; the backend itself is
/// immutable and shared read-only across callers.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    schema: Option<String>,
}

impl PostgresBackend {
    /// Connects a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the pool cannot be
    /// established.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = create_pool(config).await?;
        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, schema: None }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, collection: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(collection)),
            None => quote_ident(collection),
        }
    }
}

#[async_trait]
impl DocumentBackend for PostgresBackend {
    async fn find(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Value>, StoreError> {
        let compiled = compile(predicate, 1)?;
        let sql = format!(
            "SELECT doc FROM {} WHERE {}",
            self.table(collection),
            compiled.clause
        );
        let mut statement: PgQueryScalar<'_> = query_scalar(&sql);
        for param in compiled.params {
            statement = bind_scalar_param(statement, param);
        }
        statement
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<(), StoreError> {
        let sql = format!("INSERT INTO {} (doc) VALUES ($1)", self.table(collection));
        query(&sql)
            .bind(document)
            .execute(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))?;
        Ok(())
    }

    async fn replace(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Value,
    ) -> Result<u64, StoreError> {
        let compiled = compile(predicate, 2)?;
        let sql = format!(
            "UPDATE {} SET doc = $1 WHERE {}",
            self.table(collection),
            compiled.clause
        );
        let mut statement: PgQuery<'_> = query(&sql).bind(document);
        for param in compiled.params {
            statement = bind_query_param(statement, param);
        }
        let result = statement
            .execute(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, collection: &str, predicate: &Predicate) -> Result<u64, StoreError> {
        let compiled = compile(predicate, 1)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table(collection),
            compiled.clause
        );
        let mut statement: PgQuery<'_> = query(&sql);
        for param in compiled.params {
            statement = bind_query_param(statement, param);
        }
        let result = statement
            .execute(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))?;
        Ok(result.rows_affected())
    }

    async fn take_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Value>, StoreError> {
        let table = self.table(collection);
        let compiled = compile(predicate, 1)?;
        // One statement: the row is locked, deleted, and returned without a
        // separate read, and a raced caller skips the locked row entirely.
        let sql = format!(
            "DELETE FROM {table} WHERE id = \
             (SELECT id FROM {table} WHERE {} LIMIT 1 FOR UPDATE SKIP LOCKED) \
             RETURNING doc",
            compiled.clause
        );
        let mut statement: PgQueryScalar<'_> = query_scalar(&sql);
        for param in compiled.params {
            statement = bind_scalar_param(statement, param);
        }
        statement
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        if let Some(schema) = &self.schema {
            let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
            query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|err| map_error(err, collection))?;
        }
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL)",
            self.table(collection)
        );
        query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))?;
        debug!(collection, "collection ensured");
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let index_name = quote_ident(&format!(
            "ux_{}_{}",
            sanitize_ident(collection),
            sanitize_ident(field)
        ));
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {index_name} ON {} ((doc->>'{}'))",
            self.table(collection),
            sanitize_field(field)?,
        );
        query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|err| map_error(err, collection))?;
        debug!(collection, field, "unique index ensured");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn bind_query_param(statement: PgQuery<'_>, param: SqlParam) -> PgQuery<'_> {
    match param {
        SqlParam::Text(value) => statement.bind(value),
        SqlParam::Int(value) => statement.bind(value),
        SqlParam::Float(value) => statement.bind(value),
        SqlParam::Bool(value) => statement.bind(value),
        SqlParam::TextArray(values) => statement.bind(values),
    }
}

fn bind_scalar_param(statement: PgQueryScalar<'_>, param: SqlParam) -> PgQueryScalar<'_> {
    match param {
        SqlParam::Text(value) => statement.bind(value),
        SqlParam::Int(value) => statement.bind(value),
        SqlParam::Float(value) => statement.bind(value),
        SqlParam::Bool(value) => statement.bind(value),
        SqlParam::TextArray(values) => statement.bind(values),
    }
}

/// Quotes an SQL identifier, doubling any embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Reduces a name to identifier characters for index naming.
fn sanitize_ident(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Validates a field name before it is spliced into an index expression.
fn sanitize_field(field: &str) -> Result<&str, StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(field)
    } else {
        Err(StoreError::backend(format!(
            "invalid index field name '{field}'"
        )))
    }
}

fn map_error(err: sqlx_core::Error, collection: &str) -> StoreError {
    match err {
        sqlx_core::Error::PoolTimedOut => {
            StoreError::timeout(format!("acquiring a connection for '{collection}'"))
        }
        sqlx_core::Error::PoolClosed => StoreError::connection("connection pool is closed"),
        sqlx_core::Error::Io(io) => StoreError::connection(io.to_string()),
        sqlx_core::Error::Tls(tls) => StoreError::connection(tls.to_string()),
        sqlx_core::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::duplicate_key(collection, db_err.constraint().unwrap_or("unique index"))
        }
        other => StoreError::backend(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("Clients"), "\"Clients\"");
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn test_sanitize_ident_flattens_punctuation() {
        assert_eq!(sanitize_ident("PersistedGrants"), "PersistedGrants");
        assert_eq!(sanitize_ident("my-collection"), "my_collection");
    }

    #[test]
    fn test_sanitize_field_rejects_injection() {
        assert!(sanitize_field("clientId").is_ok());
        assert!(sanitize_field("normalized_email").is_ok());
        assert!(sanitize_field("f'; --").is_err());
        assert!(sanitize_field("").is_err());
    }
}
