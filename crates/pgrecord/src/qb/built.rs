use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::monitor::{QueryType, log_query};
use crate::row::Row;
use crate::value::Value;

/// The result of building a query: SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    pub fn query_type(&self) -> QueryType {
        QueryType::from_sql(&self.sql)
    }

    /// Execute the statement and return every produced row.
    pub async fn fetch(&self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        log_query(self.query_type(), &self.sql, self.params.len());
        conn.query(&self.sql, &self.params).await
    }

    /// Execute the statement and return the first produced row.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> OrmResult<Option<Row>> {
        log_query(self.query_type(), &self.sql, self.params.len());
        conn.query_opt(&self.sql, &self.params).await
    }
}
