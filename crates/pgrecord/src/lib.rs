//! # pgrecord
//!
//! A small active-record style ORM for PostgreSQL.
//!
//! ## Features
//!
//! - **Fluent SQL builder**: [`QueryBuilder`] renders SELECT / INSERT / UPDATE / DELETE with
//!   `$1..$n` placeholders and an ordered parameter list
//! - **Active records**: [`Model`] instances carry an ordered attribute map and support
//!   `save`, `update`, `delete`
//! - **Declared relations**: one-to-one, one-to-many and many-to-many, resolved to a second
//!   query on demand
//! - **Injected connection**: anything implementing [`GenericClient`] works, including a plain
//!   `tokio_postgres::Client`
//!
//! ## Query Builder
//!
//! ```ignore
//! use pgrecord::{QueryBuilder, Row};
//!
//! let q = QueryBuilder::new()
//!     .from("users")
//!     .update(Row::new().with("name", "bob"))
//!     .where_("id = $1", [5])
//!     .build()?;
//! assert_eq!(q.sql, "UPDATE users SET name = $1 WHERE id = $2 RETURNING *");
//! ```
//!
//! ## Models
//!
//! ```ignore
//! use pgrecord::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(ModelSchema::new("User", "users"))
//!     .define_relation("posts", RelationDescriptor::one_to_many("Post", "id", "user_id"));
//! registry.register(ModelSchema::new("Post", "posts"));
//!
//! let conn = Connection::connect(&ConnectionOptions::from_env()?).await?;
//! let ctx = ModelContext::with_connection(registry, conn);
//!
//! let mut user = ctx.model("User")?.build();
//! user.set("name", "alice");
//! user.save(&ctx).await?;
//!
//! let posts = user.load_relation(&ctx, "posts").await?;
//! ```
//!
//! SQL statements are logged at DEBUG level under the `pgrecord.sql` tracing target.

pub mod client;
pub mod connection;
pub mod error;
pub mod model;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod relation;
pub mod row;
pub mod value;

pub use client::GenericClient;
pub use connection::{Connection, ConnectionOptions};
pub use error::{OrmError, OrmResult};
pub use model::{Model, ModelContext, ModelSchema, ModelType, Registry};
pub use monitor::QueryType;
pub use qb::{BuiltQuery, JoinClause, JoinKind, Order, QueryBuilder};
pub use relation::{Loaded, RelationDescriptor, RelationKind, Relations};
pub use row::Row;
pub use value::Value;
