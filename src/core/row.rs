use std::sync::Arc;

use serde::{Serialize, Serializer, ser::SerializeMap};

use super::{schema::Schema, value::Value};

/// One record of values aligned with a [`Schema`]'s column order.
///
/// `None` marks an absent value: an optional column missing from the input,
/// or an empty field of an optional column without default. A row may hold
/// fewer values than the schema has columns; the missing trailing values are
/// absent.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Row {
    pub fn new(schema: Arc<Schema>, values: Vec<Option<Value>>) -> Self {
        Self { schema, values }
    }

    /// A row whose every value is present.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use fluent_csv_rs::core::{column::Column, row::Row, schema::Schema, value::{Value, ValueType}};
    ///
    /// let schema = Arc::new(
    ///     Schema::builder()
    ///         .column(Column::new("id", ValueType::Int)).unwrap()
    ///         .column(Column::new("name", ValueType::Text)).unwrap()
    ///         .build(),
    /// );
    /// let row = Row::from_values(schema, [Value::from(1), Value::from("DEAN")]);
    /// assert_eq!(row.get("name"), Some(&Value::from("DEAN")));
    /// ```
    pub fn from_values<I>(schema: Arc<Schema>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values = values.into_iter().map(|v| Some(v.into())).collect();
        Self::new(schema, values)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// The value at schema position `index`, `None` when absent.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)?.as_ref()
    }

    /// The value of the column `name`, `None` when absent or unknown.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.value(self.schema.index_of(name)?)
    }

    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }

    /// Projects the row to column names, in schema order.
    pub fn into_named(self) -> NamedRow {
        let entries = self
            .schema
            .names()
            .map(str::to_string)
            .zip(self.values.into_iter().chain(std::iter::repeat(None)))
            .collect();
        NamedRow { entries }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for (index, name) in self.schema.names().enumerate() {
            map.serialize_entry(name, &self.value(index))?;
        }
        map.end()
    }
}

/// Values keyed by column name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedRow {
    entries: Vec<(String, Option<Value>)>,
}

impl NamedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `name`, replacing a previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Some(value.into()));
        self
    }

    /// The value of `name`, `None` when absent or unknown.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, V> From<Vec<(S, V)>> for NamedRow
where
    S: Into<String>,
    V: Into<Value>,
{
    fn from(entries: Vec<(S, V)>) -> Self {
        entries
            .into_iter()
            .fold(NamedRow::new(), |row, (name, value)| row.with(name, value))
    }
}

impl Serialize for NamedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{column::Column, value::ValueType};

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .column(Column::new("a", ValueType::Int))
                .and_then(|b| b.column(Column::new("b", ValueType::Float)))
                .and_then(|b| b.column(Column::new("c", ValueType::Text)))
                .unwrap()
                .build(),
        )
    }

    #[test]
    fn short_rows_project_missing_values_as_absent() {
        let row = Row::new(schema(), vec![Some(Value::Int(1))]);
        assert_eq!(row.get("a"), Some(&Value::Int(1)));
        assert_eq!(row.get("c"), None);

        let named = row.into_named();
        assert_eq!(named.len(), 3);
        assert!(named.contains("c"));
        assert_eq!(named.get("c"), None);
    }

    #[test]
    fn rows_serialize_as_maps_in_schema_order() {
        let row = Row::new(
            schema(),
            vec![Some(Value::Int(1)), None, Some(Value::from("x"))],
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"a":1,"b":null,"c":"x"}"#);
        assert_eq!(serde_json::to_string(&row.into_named()).unwrap(), json);
    }

    #[test]
    fn insert_replaces_existing_entries() {
        let mut named = NamedRow::new().with("a", 1).with("b", 2.5);
        named.insert("a", Some(Value::Int(2)));
        assert_eq!(named.len(), 2);
        assert_eq!(named.get("a"), Some(&Value::Int(2)));
        assert_eq!(
            named.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
