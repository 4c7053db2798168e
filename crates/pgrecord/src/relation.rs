//! Declared relations between model types and the queries that resolve them.

use crate::error::{OrmError, OrmResult};
use crate::qb::QueryBuilder;
use crate::row::Row;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key used when a relation does not name its local key.
pub const DEFAULT_LOCAL_KEY: &str = "id";

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "one-to-one",
            RelationKind::OneToMany => "one-to-many",
            RelationKind::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "one-to-one" => Ok(RelationKind::OneToOne),
            "one-to-many" => Ok(RelationKind::OneToMany),
            "many-to-many" => Ok(RelationKind::ManyToMany),
            _ => Err(OrmError::relation(format!("unsupported relation type: {s}"))),
        }
    }
}

/// How one model type reaches another.
///
/// `target_model` is a model name, resolved through the
/// [`Registry`](crate::Registry) when the relation is loaded, so two model
/// types may point at each other. Missing keys are only reported when the
/// relation is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    pub target_model: String,
    pub local_key: Option<String>,
    pub foreign_key: Option<String>,
    pub through_table: Option<String>,
    pub through_local_key: Option<String>,
    pub through_foreign_key: Option<String>,
}

impl RelationDescriptor {
    pub fn new(kind: RelationKind, target_model: impl Into<String>) -> Self {
        Self {
            kind,
            target_model: target_model.into(),
            local_key: None,
            foreign_key: None,
            through_table: None,
            through_local_key: None,
            through_foreign_key: None,
        }
    }

    /// Target rows whose `foreign_key` equals this instance's `local_key`; at most one.
    pub fn one_to_one(
        target_model: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(RelationKind::OneToOne, target_model)
            .local_key(local_key)
            .foreign_key(foreign_key)
    }

    /// Target rows whose `foreign_key` equals this instance's `local_key`.
    pub fn one_to_many(
        target_model: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(RelationKind::OneToMany, target_model)
            .local_key(local_key)
            .foreign_key(foreign_key)
    }

    /// Target rows linked through a join table; finish with [`RelationDescriptor::through`].
    pub fn many_to_many(target_model: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self::new(RelationKind::ManyToMany, target_model).local_key(local_key)
    }

    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Join table plus its column pointing at this model (`local_key`) and
    /// its column pointing at the target's `id` (`foreign_key`).
    pub fn through(
        mut self,
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.through_table = Some(table.into());
        self.through_local_key = Some(local_key.into());
        self.through_foreign_key = Some(foreign_key.into());
        self
    }

    /// The instance attribute whose value drives the lookup.
    pub fn local_key_or_default(&self) -> &str {
        self.local_key.as_deref().unwrap_or(DEFAULT_LOCAL_KEY)
    }

    /// Build the lookup for `local_value` against `target_table`.
    pub fn query_for(&self, target_table: &str, local_value: Value) -> OrmResult<QueryBuilder> {
        let qb = QueryBuilder::new().from(target_table);
        match self.kind {
            RelationKind::OneToOne => {
                let fk = self.require(&self.foreign_key, "foreign_key")?;
                Ok(qb.where_(format!("{fk} = $1"), [local_value]).limit(1))
            }
            RelationKind::OneToMany => {
                let fk = self.require(&self.foreign_key, "foreign_key")?;
                Ok(qb.where_(format!("{fk} = $1"), [local_value]))
            }
            RelationKind::ManyToMany => {
                let through = self.require(&self.through_table, "through_table")?;
                let through_local = self.require(&self.through_local_key, "through_local_key")?;
                let through_foreign =
                    self.require(&self.through_foreign_key, "through_foreign_key")?;
                Ok(qb
                    .inner_join(
                        through,
                        format!("{through}.{through_foreign} = {target_table}.id"),
                    )
                    .where_(format!("{through}.{through_local} = $1"), [local_value]))
            }
        }
    }

    fn require<'a>(&self, field: &'a Option<String>, name: &str) -> OrmResult<&'a str> {
        field.as_deref().filter(|v| !v.trim().is_empty()).ok_or_else(|| {
            OrmError::configuration(format!(
                "{} relation to \"{}\" is missing `{}`",
                self.kind, self.target_model, name
            ))
        })
    }
}

/// Per-model-type mapping from relation name to descriptor.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    entries: BTreeMap<String, RelationDescriptor>,
}

impl Relations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a relation.
    pub fn define(&mut self, name: impl Into<String>, descriptor: RelationDescriptor) {
        self.entries.insert(name.into(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&RelationDescriptor> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rows produced by loading a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// one-to-one: the first matching row, if any
    One(Option<Row>),
    /// one-to-many and many-to-many: every matching row
    Many(Vec<Row>),
}

impl Loaded {
    pub fn one(&self) -> Option<&Row> {
        match self {
            Loaded::One(row) => row.as_ref(),
            Loaded::Many(rows) => rows.first(),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Loaded::One(row) => row.into_iter().collect(),
            Loaded::Many(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Loaded::One(row) => row.is_none(),
            Loaded::Many(rows) => rows.is_empty(),
        }
    }
}
