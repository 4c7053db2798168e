//! Fluent SQL builder producing `$n`-parameterized statements.
//!
//! One [`QueryBuilder`] accumulates clauses for one statement and renders it
//! with [`QueryBuilder::build`]. The statement kind is chosen at build time:
//! an insert payload wins over an update payload, which wins over the delete
//! flag; otherwise a `SELECT` is rendered.
//!
//! ```ignore
//! use pgrecord::{JoinKind, Order, QueryBuilder};
//!
//! let q = QueryBuilder::new()
//!     .from("users")
//!     .select(["users.name", "posts.title"])
//!     .join(JoinKind::Inner, "posts", "users.id = posts.user_id")
//!     .where_("users.id = $1", [1])
//!     .order_by("posts.title", Order::Desc)
//!     .limit(10)
//!     .build()?;
//!
//! let rows = q.fetch(&conn).await?;
//! ```

mod builder;
mod built;
mod placeholder;

pub use builder::{JoinClause, JoinKind, Order, QueryBuilder};
pub use built::BuiltQuery;
