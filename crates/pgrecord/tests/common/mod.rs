#![allow(dead_code)]

use pgrecord::{
    GenericClient, ModelContext, ModelSchema, OrmError, OrmResult, Registry, RelationDescriptor,
    Row, Value,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A client that records every statement and replays scripted results.
///
/// Unscripted calls return no rows.
#[derive(Debug, Default)]
pub struct SpyClient {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    responses: Mutex<VecDeque<OrmResult<Vec<Row>>>>,
}

impl SpyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next call.
    pub fn respond(&self, rows: Vec<Row>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Make the next call fail.
    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(OrmError::Other(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_sql(&self) -> String {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(sql, _)| sql.clone())
            .unwrap_or_default()
    }
}

impl GenericClient for SpyClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Users, posts and tags wired both ways, like a typical blog schema.
pub fn blog_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(ModelSchema::new("User", "users"))
        .define_relation("posts", RelationDescriptor::one_to_many("Post", "id", "user_id"))
        .define_relation("profile", RelationDescriptor::one_to_one("Profile", "id", "user_id"));
    registry
        .register(ModelSchema::new("Post", "posts"))
        .define_relation("user", RelationDescriptor::one_to_one("User", "user_id", "id"))
        .define_relation(
            "tags",
            RelationDescriptor::many_to_many("Tag", "id").through("post_tags", "post_id", "tag_id"),
        )
        .define_relation("comments", RelationDescriptor::one_to_many("Comment", "id", "post_id"))
        .define_relation("broken", RelationDescriptor::many_to_many("Tag", "id"))
        .define_relation("dangling", RelationDescriptor::one_to_many("Missing", "id", "post_id"));
    registry.register(ModelSchema::new("Profile", "profiles"));
    registry.register(ModelSchema::new("Comment", "comments"));
    registry.register(ModelSchema::new("Tag", "tags"));
    registry
}

pub fn context(spy: &SpyClient) -> ModelContext<&SpyClient> {
    ModelContext::with_connection(blog_registry(), spy)
}

pub fn user_row(id: i64, name: &str) -> Row {
    Row::new().with("id", id).with("name", name)
}
