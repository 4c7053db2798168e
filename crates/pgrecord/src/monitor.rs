//! SQL statement logging via `tracing`.

use std::borrow::Cow;
use std::fmt;

/// Tracing target every executed statement is logged under.
pub const SQL_TARGET: &str = "pgrecord.sql";

/// SQL strings longer than this (in bytes) are truncated in log output.
pub const MAX_LOGGED_SQL: usize = 200;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    /// Detect query type from the leading keyword of a SQL string.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
            QueryType::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// Cut `sql` to at most `max` bytes without splitting a UTF-8 character.
pub(crate) fn truncate_sql_bytes(sql: &str, max: usize) -> &str {
    if sql.len() <= max {
        return sql;
    }
    let mut end = max;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Emit the DEBUG event for a statement about to be executed.
pub(crate) fn log_query(query_type: QueryType, sql: &str, param_count: usize) {
    let sql: Cow<'_, str> = if sql.len() > MAX_LOGGED_SQL {
        Cow::Owned(format!("{}...", truncate_sql_bytes(sql, MAX_LOGGED_SQL)))
    } else {
        Cow::Borrowed(sql)
    };
    tracing::debug!(
        target: SQL_TARGET,
        query_type = %query_type,
        param_count,
        sql = %sql,
        "executing query"
    );
}
