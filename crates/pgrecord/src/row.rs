//! Ordered column maps and decoding from `tokio_postgres` rows.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An ordered mapping from column name to [`Value`].
///
/// Used both for result rows and for insert/update payloads: insertion order is
/// kept, so the columns of a rendered `INSERT` follow the order in which they
/// were set. Setting an existing column replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Row::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column, returning the previous value if it was present.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.columns.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Overlay every column of `other` onto this row.
    pub fn merge(&mut self, other: Row) {
        for (column, value) in other.columns {
            self.insert(column, value);
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Decode every column of a driver row.
    pub fn from_pg_row(row: &tokio_postgres::Row) -> OrmResult<Self> {
        let mut out = Row::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(idx)
                .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
            out.insert(column.name(), value);
        }
        Ok(out)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces_in_place() {
        let mut row = Row::new().with("a", 1).with("b", "x");
        assert_eq!(row.insert("a", 2), Some(Value::Int(1)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn merge_overlays_and_appends() {
        let mut row = Row::new().with("name", "alice").with("email", "a@x");
        row.merge(Row::new().with("id", 7).with("name", "Alice"));

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "email", "id"]);
        assert_eq!(row.get("name"), Some(&Value::Text("Alice".into())));
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
    }

    #[test]
    fn remove_and_contains() {
        let mut row: Row = [("a", 1), ("b", 2)].into_iter().collect();
        assert!(row.contains("a"));
        assert_eq!(row.remove("a"), Some(Value::Int(1)));
        assert!(!row.contains("a"));
        assert_eq!(row.remove("a"), None);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let row = Row::new().with("id", 1).with("title", "hello").with("body", None::<String>);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"id":1,"title":"hello","body":null}"#
        );
    }
}
