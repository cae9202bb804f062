//! Executors run one parameterized statement and normalize the rows they return.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::string::Param;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::error::Error;

/// A row, column name to value. NULL columns are present as `null`.
pub type Row = serde_json::Map<String, Value>;

/// The outcome of a statement: the rows of a query, or how many rows a write touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: u64,
}

/// Runs statements for one dialect.
#[async_trait]
pub trait Executor: Debug + Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<QueryResult, Error>;
}

/// Whether a statement produces rows rather than a count of affected rows.
fn returns_rows(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("select"))
}

/// Executes statements on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteExecutor { pool }
    }

    pub async fn connect(uri: &str) -> Result<Self, Error> {
        Ok(SqliteExecutor::new(SqlitePool::connect(uri).await?))
    }

    /// A private in-memory database. Every connection of a pool would see its own database,
    /// so the pool holds exactly one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(SqliteExecutor::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn bind<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        param: &Param,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match param {
            Param::Null => query.bind(None::<String>),
            Param::Bool(b) => query.bind(*b),
            Param::Integer(i) => query.bind(*i),
            Param::Float(f) => query.bind(*f),
            Param::String(s) => query.bind(s.clone()),
            Param::Json(value) => query.bind(sqlx::types::Json(value.clone())),
        }
    }

    /// SQLite values carry their storage class, whatever the column was declared as.
    fn convert_row(sqlite_row: &SqliteRow) -> Result<Row, Error> {
        let mut row = Row::new();
        for column in sqlite_row.columns() {
            let index = column.ordinal();
            let raw = sqlite_row.try_get_raw(index)?;
            if raw.is_null() {
                row.insert(column.name().to_string(), Value::Null);
                continue;
            }
            let type_name = raw.type_info().name().to_string();
            let value = match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(sqlite_row.try_get::<i64, _>(index)?),
                "REAL" | "NUMERIC" => float(sqlite_row.try_get::<f64, _>(index)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                    Value::String(sqlite_row.try_get::<String, _>(index)?)
                }
                _ => {
                    return Err(Error::UnsupportedRowValue {
                        column: column.name().to_string(),
                        type_name,
                    })
                }
            };
            row.insert(column.name().to_string(), value);
        }
        Ok(row)
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<QueryResult, Error> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| Self::bind(query, param));

        if returns_rows(sql) {
            let rows = query
                .fetch_all(&self.pool)
                .await?
                .iter()
                .map(Self::convert_row)
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(QueryResult {
                row_count: rows.len() as u64,
                rows,
            })
        } else {
            let done = query.execute(&self.pool).await?;
            Ok(QueryResult {
                rows: vec![],
                row_count: done.rows_affected(),
            })
        }
    }
}

/// Executes statements on a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    pub fn new(pool: PgPool) -> Self {
        PostgresExecutor { pool }
    }

    pub async fn connect(
        uri: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(uri)
            .await?;
        Ok(PostgresExecutor::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind<'q>(
        query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        param: &Param,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        match param {
            Param::Null => query.bind(None::<String>),
            Param::Bool(b) => query.bind(*b),
            Param::Integer(i) => query.bind(*i),
            Param::Float(f) => query.bind(*f),
            Param::String(s) => query.bind(s.clone()),
            Param::Json(value) => query.bind(sqlx::types::Json(value.clone())),
        }
    }

    /// Postgres decoding is strict, so every column is read as exactly its declared type.
    fn convert_row(pg_row: &PgRow) -> Result<Row, Error> {
        let mut row = Row::new();
        for column in pg_row.columns() {
            let index = column.ordinal();
            if pg_row.try_get_raw(index)?.is_null() {
                row.insert(column.name().to_string(), Value::Null);
                continue;
            }
            let value = match column.type_info().name() {
                "BOOL" => Value::Bool(pg_row.try_get::<bool, _>(index)?),
                "INT2" => Value::from(pg_row.try_get::<i16, _>(index)?),
                "INT4" => Value::from(pg_row.try_get::<i32, _>(index)?),
                "INT8" => Value::from(pg_row.try_get::<i64, _>(index)?),
                "FLOAT4" => float(f64::from(pg_row.try_get::<f32, _>(index)?)),
                "FLOAT8" => float(pg_row.try_get::<f64, _>(index)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    Value::String(pg_row.try_get::<String, _>(index)?)
                }
                "JSON" | "JSONB" => pg_row.try_get::<sqlx::types::JsonValue, _>(index)?,
                other => {
                    return Err(Error::UnsupportedRowValue {
                        column: column.name().to_string(),
                        type_name: other.to_string(),
                    })
                }
            };
            row.insert(column.name().to_string(), value);
        }
        Ok(row)
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<QueryResult, Error> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| Self::bind(query, param));

        if returns_rows(sql) {
            let rows = query
                .fetch_all(&self.pool)
                .await?
                .iter()
                .map(Self::convert_row)
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(QueryResult {
                row_count: rows.len() as u64,
                rows,
            })
        } else {
            let done = query.execute(&self.pool).await?;
            Ok(QueryResult {
                rows: vec![],
                row_count: done.rows_affected(),
            })
        }
    }
}

/// Non-finite floats have no JSON representation.
fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    #[test]
    fn only_selects_return_rows() {
        assert!(returns_rows("SELECT * FROM \"users\""));
        assert!(returns_rows("  select 1"));
        assert!(!returns_rows("UPDATE \"users\" SET \"a\" = ?"));
        assert!(!returns_rows("DEL"));
    }

    #[tokio::test]
    async fn sqlite_round_trip() {
        let executor = SqliteExecutor::in_memory().await.unwrap();
        executor
            .execute(
                r#"CREATE TABLE "users" ("_id" TEXT PRIMARY KEY, "age" INTEGER, "score" REAL, "tags" TEXT)"#,
                &[],
            )
            .await
            .unwrap();

        let inserted = executor
            .execute(
                r#"INSERT INTO "users" ("_id", "age", "score", "tags") VALUES (?, ?, ?, ?), (?, ?, NULL, NULL)"#,
                &[
                    Param::String("u1".to_string()),
                    Param::Integer(30),
                    Param::Float(1.5),
                    Param::String(r#"["a"]"#.to_string()),
                    Param::String("u2".to_string()),
                    Param::Null,
                ],
            )
            .await
            .unwrap();
        assert_eq!(inserted.row_count, 2);

        let selected = executor
            .execute(
                r#"SELECT * FROM "users" WHERE EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" = ?)"#,
                &[Param::String("a".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(
            selected.rows,
            vec![json!({"_id": "u1", "age": 30, "score": 1.5, "tags": r#"["a"]"#})
                .as_object()
                .cloned()
                .unwrap()]
        );

        let everyone = executor
            .execute(r#"SELECT * FROM "users" ORDER BY "_id" ASC"#, &[])
            .await
            .unwrap();
        assert_eq!(everyone.row_count, 2);
        assert_eq!(everyone.rows[1].get("age"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn database_errors_are_forwarded() {
        let executor = SqliteExecutor::in_memory().await.unwrap();
        let result = executor.execute(r#"SELECT * FROM "missing""#, &[]).await;
        assert!(matches!(result, Err(Error::Execution(_))));
    }
}
