//! Generic client trait for unified database access.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// The one capability the model layer needs from a database handle:
/// execute parameterized SQL and return the resulting rows.
///
/// Placeholders use the Postgres `$1..$n` convention and are passed through
/// unchanged. Errors from the underlying driver are returned as-is; this layer
/// never retries.
pub trait GenericClient: Send + Sync {
    /// Execute a statement and return all rows it produced.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }
}

fn as_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn decode_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    rows.iter().map(Row::from_pg_row).collect()
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &as_params(params))
            .await
            .map_err(OrmError::from)?;
        decode_rows(rows)
    }
}

impl<T: GenericClient> GenericClient for &T {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }
}

impl<T: GenericClient> GenericClient for Arc<T> {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }
}
