use crate::error::{OrmError, OrmResult};
use crate::qb::built::BuiltQuery;
use crate::qb::placeholder::shift_placeholders;
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// JOIN flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
        }
    }
}

impl FromStr for JoinKind {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(JoinKind::Inner),
            "LEFT" => Ok(JoinKind::Left),
            "RIGHT" => Ok(JoinKind::Right),
            "FULL" => Ok(JoinKind::Full),
            other => Err(OrmError::configuration(format!("unknown join kind: {other}"))),
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        })
    }
}

/// One JOIN clause, rendered as `<KIND> JOIN <table> ON <on>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub on: String,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} JOIN {} ON {}", self.kind.as_sql(), self.table, self.on)
    }
}

/// Statement builder with ordered positional parameters.
///
/// Predicates added through [`QueryBuilder::where_`] are copied verbatim and
/// their values appended to the parameter list in call order, so callers pick
/// `$n` numbers consistent with that order. The one exception is `UPDATE`:
/// the SET values take `$1..$k` and predicate placeholders are shifted up by
/// `k` at build time.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    table: Option<String>,
    projection: Vec<String>,
    joins: Vec<JoinClause>,
    predicates: Vec<String>,
    params: Vec<Value>,
    orderings: Vec<(String, Order)>,
    limit: Option<u64>,
    insert: Option<Row>,
    update: Option<Row>,
    delete: bool,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source table (last call wins).
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Replace the projection list. An empty list renders as `*`.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, kind: JoinKind, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.joins.push(JoinClause {
            kind,
            table: table.into(),
            on: on.into(),
        });
        self
    }

    pub fn inner_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn left_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    pub fn right_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    pub fn full_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Full, table, on)
    }

    /// Add a predicate fragment (ANDed with the others) and its values.
    pub fn where_<I, V>(mut self, condition: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.predicates.push(condition.into());
        self.params.extend(values.into_iter().map(Into::into));
        self
    }

    /// Add a predicate fragment that binds no values.
    pub fn where_raw(mut self, condition: impl Into<String>) -> Self {
        self.predicates.push(condition.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.orderings.push((field.into(), order));
        self
    }

    pub fn order_by_asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Order::Asc)
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Order::Desc)
    }

    /// Cap the number of rows (last call wins).
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Render an INSERT of `payload` (columns in payload order).
    pub fn insert(mut self, payload: Row) -> Self {
        self.insert = Some(payload);
        self
    }

    /// Render an UPDATE setting every column of `payload`.
    pub fn update(mut self, payload: Row) -> Self {
        self.update = Some(payload);
        self
    }

    /// Render a DELETE restricted by the accumulated predicates.
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Number of predicate parameters accumulated so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Render the statement and its parameters.
    pub fn build(self) -> OrmResult<BuiltQuery> {
        let table = match self.table.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => {
                return Err(OrmError::configuration(
                    "table name must be specified with `from()`",
                ));
            }
        };

        if let Some(payload) = self.insert {
            return Ok(Self::render_insert(&table, payload));
        }
        if let Some(payload) = self.update {
            return Self::render_update(&table, payload, self.predicates, self.params);
        }
        if self.delete {
            return Self::render_delete(&table, self.predicates, self.params);
        }

        let mut parts = Vec::with_capacity(6);
        if self.projection.is_empty() {
            parts.push("SELECT *".to_string());
        } else {
            parts.push(format!("SELECT {}", self.projection.join(", ")));
        }
        parts.push(format!("FROM {table}"));
        parts.extend(self.joins.iter().map(JoinClause::to_string));
        if !self.predicates.is_empty() {
            parts.push(format!("WHERE {}", self.predicates.join(" AND ")));
        }
        if !self.orderings.is_empty() {
            let order_by = self
                .orderings
                .iter()
                .map(|(field, order)| format!("{field} {order}"))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("ORDER BY {order_by}"));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {limit}"));
        }

        Ok(BuiltQuery::new(parts.join(" "), self.params))
    }

    /// Render for debugging; build errors are rendered as their message.
    pub fn to_sql(&self) -> String {
        match self.clone().build() {
            Ok(built) => built.sql,
            Err(e) => e.to_string(),
        }
    }

    fn render_insert(table: &str, payload: Row) -> BuiltQuery {
        if payload.is_empty() {
            return BuiltQuery::new(
                format!("INSERT INTO {table} DEFAULT VALUES RETURNING *"),
                Vec::new(),
            );
        }

        let columns: Vec<&str> = payload.columns().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let params = payload.into_iter().map(|(_, value)| value).collect();
        BuiltQuery::new(sql, params)
    }

    fn render_update(
        table: &str,
        payload: Row,
        predicates: Vec<String>,
        predicate_params: Vec<Value>,
    ) -> OrmResult<BuiltQuery> {
        if payload.is_empty() {
            return Err(OrmError::configuration("update payload must set at least one column"));
        }

        let width = payload.len();
        let sets = payload
            .columns()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("UPDATE {table} SET {sets}");
        if !predicates.is_empty() {
            let filter = predicates
                .iter()
                .map(|p| shift_placeholders(p, width))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        sql.push_str(" RETURNING *");

        let mut params: Vec<Value> = payload.into_iter().map(|(_, value)| value).collect();
        params.extend(predicate_params);
        Ok(BuiltQuery::new(sql, params))
    }

    fn render_delete(
        table: &str,
        predicates: Vec<String>,
        params: Vec<Value>,
    ) -> OrmResult<BuiltQuery> {
        if predicates.is_empty() {
            return Err(OrmError::configuration(
                "delete requires at least one `where_` predicate",
            ));
        }
        Ok(BuiltQuery::new(
            format!("DELETE FROM {} WHERE {}", table, predicates.join(" AND ")),
            params,
        ))
    }
}
