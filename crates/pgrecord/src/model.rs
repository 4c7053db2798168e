//! Active-record style models.
//!
//! Model types are described once at startup by a [`ModelSchema`] (table name
//! and relations) collected in a [`Registry`]. A [`ModelContext`] pairs the
//! registry with the application's connection and is passed by reference to
//! every operation:
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry
//!     .register(ModelSchema::new("User", "users"))
//!     .define_relation("posts", RelationDescriptor::one_to_many("Post", "id", "user_id"));
//! registry
//!     .register(ModelSchema::new("Post", "posts"))
//!     .define_relation("user", RelationDescriptor::one_to_one("User", "user_id", "id"));
//!
//! let ctx = ModelContext::with_connection(registry, conn);
//! let users = ctx.model("User")?;
//!
//! if let Some(user) = users.find_by_id(1).await? {
//!     let posts = user.load_relation(&ctx, "posts").await?;
//! }
//! ```
//!
//! `ModelType::find_all` returns raw rows while `ModelType::find_by_id`
//! returns a [`Model`]; callers wanting instances from `find_all` can wrap
//! rows with [`ModelType::build_with`].

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::qb::{BuiltQuery, QueryBuilder};
use crate::relation::{Loaded, RelationDescriptor, RelationKind, Relations};
use crate::row::Row;
use crate::value::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Column holding the primary key of every model table.
pub const PRIMARY_KEY: &str = "id";

/// Static description of one model type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    table_name: String,
    relations: Relations,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            relations: Relations::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Declare a relation; a later declaration under the same name replaces it.
    pub fn define_relation(
        &mut self,
        name: impl Into<String>,
        descriptor: RelationDescriptor,
    ) -> &mut Self {
        self.relations.define(name, descriptor);
        self
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }
}

/// All model types known to the application, by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: HashMap<String, ModelSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model type, replacing any previous one with the same name, and
    /// return it for relation setup.
    pub fn register(&mut self, schema: ModelSchema) -> &mut ModelSchema {
        match self.models.entry(schema.name.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(schema);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(schema),
        }
    }

    pub fn get(&self, name: &str) -> OrmResult<&ModelSchema> {
        self.models
            .get(name)
            .ok_or_else(|| OrmError::configuration(format!("model \"{name}\" is not registered")))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelSchema> {
        self.models.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Registry plus the shared connection every model operation runs on.
#[derive(Debug)]
pub struct ModelContext<C> {
    registry: Registry,
    connection: Option<C>,
}

impl<C> ModelContext<C> {
    /// A context without a connection; every database operation fails with a
    /// configuration error until one is set.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            connection: None,
        }
    }

    pub fn with_connection(registry: Registry, connection: C) -> Self {
        Self {
            registry,
            connection: Some(connection),
        }
    }

    pub fn set_connection(&mut self, connection: C) {
        self.connection = Some(connection);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn connection(&self) -> OrmResult<&C> {
        self.connection.as_ref().ok_or_else(OrmError::not_initialized)
    }

    /// Give the connection back, e.g. to close it.
    pub fn into_connection(self) -> OrmResult<C> {
        self.connection.ok_or_else(OrmError::not_initialized)
    }
}

impl<C: GenericClient> ModelContext<C> {
    /// Handle for the class-level operations of a registered model type.
    pub fn model(&self, name: &str) -> OrmResult<ModelType<'_, C>> {
        Ok(ModelType {
            schema: self.registry.get(name)?,
            ctx: self,
        })
    }
}

/// Execute a statement, logging failures before handing them back unchanged.
async fn run(query: BuiltQuery, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
    match query.fetch(conn).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            tracing::error!(error = %e, sql = %query.sql, "error executing query");
            Err(e)
        }
    }
}

/// Class-level operations of one model type.
#[derive(Debug)]
pub struct ModelType<'a, C> {
    schema: &'a ModelSchema,
    ctx: &'a ModelContext<C>,
}

impl<C> Clone for ModelType<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ModelType<'_, C> {}

impl<'a, C: GenericClient> ModelType<'a, C> {
    pub fn schema(&self) -> &'a ModelSchema {
        self.schema
    }

    pub fn table_name(&self) -> &'a str {
        &self.schema.table_name
    }

    /// A new, unsaved instance with no attributes.
    pub fn build(&self) -> Model {
        Model::new(self.schema.name.clone())
    }

    /// A new instance carrying `attributes` (e.g. a row from `find_all`).
    pub fn build_with(&self, attributes: Row) -> Model {
        Model {
            model: self.schema.name.clone(),
            attributes,
        }
    }

    /// Every row of the table, as raw rows.
    pub async fn find_all(&self) -> OrmResult<Vec<Row>> {
        let conn = self.ctx.connection()?;
        let query = QueryBuilder::new().from(self.table_name()).build()?;
        run(query, conn).await
    }

    /// The instance with primary key `id`, if it exists.
    pub async fn find_by_id(&self, id: i64) -> OrmResult<Option<Model>> {
        let conn = self.ctx.connection()?;
        let query = QueryBuilder::new()
            .from(self.table_name())
            .where_(format!("{PRIMARY_KEY} = $1"), [id])
            .build()?;

        let rows = run(query, conn).await?;
        Ok(rows.into_iter().next().map(|row| {
            let mut instance = self.build();
            instance.attributes.merge(row);
            instance
        }))
    }
}

/// One record: its model type name and an ordered attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    model: String,
    attributes: Row,
}

impl Model {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            attributes: Row::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Primary key, present once persisted.
    pub fn id(&self) -> Option<i64> {
        self.attributes.get(PRIMARY_KEY).and_then(Value::as_i64)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(column, value);
        self
    }

    /// Drop an attribute so it is left out of the next `save`.
    pub fn unset(&mut self, column: &str) -> Option<Value> {
        self.attributes.remove(column)
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub fn into_attributes(self) -> Row {
        self.attributes
    }

    fn schema<'a, C>(&self, ctx: &'a ModelContext<C>) -> OrmResult<&'a ModelSchema> {
        ctx.registry().get(&self.model)
    }

    fn require_id(&self, operation: &str) -> OrmResult<i64> {
        self.id().ok_or_else(|| {
            OrmError::configuration(format!(
                "cannot {operation} a \"{}\" instance without an id",
                self.model
            ))
        })
    }

    /// Insert every attribute as a new row and merge the returned row
    /// (including the generated id) back onto the instance.
    pub async fn save<C: GenericClient>(&mut self, ctx: &ModelContext<C>) -> OrmResult<()> {
        let schema = self.schema(ctx)?;
        let conn = ctx.connection()?;
        let query = QueryBuilder::new()
            .from(schema.table_name())
            .insert(self.attributes.clone())
            .build()?;

        if let Some(row) = run(query, conn).await?.into_iter().next() {
            self.attributes.merge(row);
        }
        Ok(())
    }

    /// Update this instance's row with `patch` and merge the returned row.
    ///
    /// Returns `false` when no row matched the instance id.
    pub async fn update<C: GenericClient>(
        &mut self,
        ctx: &ModelContext<C>,
        patch: Row,
    ) -> OrmResult<bool> {
        let schema = self.schema(ctx)?;
        let conn = ctx.connection()?;
        let id = self.require_id("update")?;
        let query = QueryBuilder::new()
            .from(schema.table_name())
            .update(patch)
            .where_(format!("{PRIMARY_KEY} = $1"), [id])
            .build()?;

        match run(query, conn).await?.into_iter().next() {
            Some(row) => {
                self.attributes.merge(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete this instance's row. The attributes are left in place.
    pub async fn delete<C: GenericClient>(&self, ctx: &ModelContext<C>) -> OrmResult<()> {
        let schema = self.schema(ctx)?;
        let conn = ctx.connection()?;
        let id = self.require_id("delete")?;
        let query = QueryBuilder::new()
            .from(schema.table_name())
            .where_(format!("{PRIMARY_KEY} = $1"), [id])
            .delete()
            .build()?;

        run(query, conn).await?;
        Ok(())
    }

    /// Load the relation declared as `name` on this instance's model type.
    ///
    /// Fails with [`OrmError::Relation`] before touching the connection when
    /// no such relation is declared.
    pub async fn load_relation<C: GenericClient>(
        &self,
        ctx: &ModelContext<C>,
        name: &str,
    ) -> OrmResult<Loaded> {
        let schema = self.schema(ctx)?;
        let relation = schema.relations().get(name).ok_or_else(|| {
            OrmError::relation(format!(
                "relation \"{name}\" is not defined on model \"{}\"",
                self.model
            ))
        })?;
        let target = ctx.registry().get(&relation.target_model)?;
        let local_value = self
            .attributes
            .get(relation.local_key_or_default())
            .cloned()
            .unwrap_or_default();
        let query = relation
            .query_for(target.table_name(), local_value)?
            .build()?;

        let conn = ctx.connection()?;
        let rows = run(query, conn).await?;
        Ok(match relation.kind {
            RelationKind::OneToOne => Loaded::One(rows.into_iter().next()),
            RelationKind::OneToMany | RelationKind::ManyToMany => Loaded::Many(rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let mut registry = Registry::new();
        registry.register(ModelSchema::new("User", "users"));
        assert!(registry.contains("User"));
        assert_eq!(registry.get("User").unwrap().table_name(), "users");
        assert!(registry.get("Post").unwrap_err().is_configuration());
    }

    #[test]
    fn register_returns_schema_for_relation_setup() {
        let mut registry = Registry::new();
        registry
            .register(ModelSchema::new("User", "users"))
            .define_relation("posts", RelationDescriptor::one_to_many("Post", "id", "user_id"))
            .define_relation("profile", RelationDescriptor::one_to_one("Profile", "id", "user_id"));

        let names: Vec<&str> = registry.get("User").unwrap().relations().names().collect();
        assert_eq!(names, vec!["posts", "profile"]);
    }

    #[test]
    fn model_attributes() {
        let mut m = Model::new("User");
        assert_eq!(m.id(), None);
        m.set("name", "alice").set("id", 3);
        assert_eq!(m.id(), Some(3));
        assert_eq!(m.get("name"), Some(&Value::Text("alice".into())));
        assert_eq!(m.unset("name"), Some(Value::Text("alice".into())));
        assert_eq!(m.attributes().len(), 1);
    }

    #[test]
    fn non_integer_id_is_not_an_id() {
        let mut m = Model::new("User");
        m.set("id", "abc");
        assert_eq!(m.id(), None);
    }

    #[test]
    fn context_without_connection() {
        let ctx: ModelContext<()> = ModelContext::new(Registry::new());
        let err = ctx.connection().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not initialized"));
    }
}
