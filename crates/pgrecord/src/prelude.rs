//! Convenient imports for typical `pgrecord` usage.
//!
//! ```ignore
//! use pgrecord::prelude::*;
//! ```

pub use crate::{
    Connection, ConnectionOptions, GenericClient, JoinKind, Loaded, Model, ModelContext,
    ModelSchema, Order, OrmError, OrmResult, QueryBuilder, Registry, RelationDescriptor,
    RelationKind, Row, Value,
};
