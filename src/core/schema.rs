use std::{fmt, sync::Arc};

use log::debug;
#[cfg(feature = "record")]
use log::warn;

use crate::error::SchemaError;
#[cfg(feature = "record")]
use crate::item::record::{Members, Record};

use super::{
    column::Column,
    row::{NamedRow, Row},
};

/// An ordered set of uniquely named columns.
///
/// Column order is the position of values in every [`Row`] and the default
/// output order of writers. A schema is frozen once built; share it through an
/// `Arc` between readers and writers.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::column::Column;
/// use fluent_csv_rs::core::schema::Schema;
/// use fluent_csv_rs::core::value::ValueType;
///
/// let schema = Schema::builder()
///     .column(Column::new("id", ValueType::Int)).unwrap()
///     .column(Column::new("name", ValueType::Text)).unwrap()
///     .build();
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.index_of("name"), Some(1));
/// assert!(Schema::builder()
///     .column(Column::new("id", ValueType::Int)).unwrap()
///     .column(Column::new("id", ValueType::Text))
///     .is_err());
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The columns a record type declares, see [`SchemaBuilder::record`].
    #[cfg(feature = "record")]
    pub fn for_record<T: Record>() -> Result<Schema, SchemaError> {
        Ok(Schema::builder().record::<T>()?.build())
    }

    /// A builder starting from this schema's columns.
    pub fn to_builder(&self) -> SchemaBuilder {
        SchemaBuilder {
            columns: self.columns.clone(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Aligns named values to this schema's column order.
    ///
    /// Names unknown to the schema are dropped, columns without an entry are
    /// absent.
    pub fn row_from_named(self: &Arc<Self>, named: &NamedRow) -> Row {
        let values = self
            .columns
            .iter()
            .map(|column| named.get(column.name()).cloned())
            .collect();
        Row::new(Arc::clone(self), values)
    }
}

/// A builder collecting the columns of a [`Schema`].
#[derive(Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::DuplicateColumn`] when a column of the same name
    ///   exists; the builder is left unchanged
    /// - [`SchemaError::InvalidDefault`] when the column's default does not
    ///   produce a value of the column's type
    pub fn add_column(&mut self, column: Column) -> Result<&mut Self, SchemaError> {
        if self.contains(column.name()) {
            return Err(SchemaError::DuplicateColumn(column.name().to_string()));
        }

        column
            .default_value()
            .map_err(|source| SchemaError::InvalidDefault {
                column: column.name().to_string(),
                source,
            })?;

        debug!("Column added: {:?}", column);
        self.columns.push(column);
        Ok(self)
    }

    /// Chained form of [`add_column`](Self::add_column).
    pub fn column(mut self, column: Column) -> Result<Self, SchemaError> {
        self.add_column(column)?;
        Ok(self)
    }

    /// Appends every column of `columns`, stopping at the first error.
    pub fn columns<I>(mut self, columns: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Column>,
    {
        for column in columns {
            self.add_column(column)?;
        }
        Ok(self)
    }

    /// Appends the columns declared by a record type, each carrying its
    /// record accessors.
    ///
    /// A declared column whose name is already present is skipped: the
    /// existing column wins.
    #[cfg(feature = "record")]
    pub fn record<T: Record>(mut self) -> Result<Self, SchemaError> {
        let members = Members::<T>::describe();
        for (column, accessor) in members.into_declared_columns() {
            if self.contains(column.name()) {
                warn!(
                    "Column {} declared by {} is already in the schema, skipped",
                    column.name(),
                    std::any::type_name::<T>()
                );
                continue;
            }
            self.add_column(column.with_slot(Arc::new(accessor)))?;
        }
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name() == name)
    }

    pub fn build(self) -> Schema {
        Schema {
            columns: self.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::{Value, ValueType};

    fn people() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .column(Column::new("id", ValueType::Int))
                .and_then(|b| b.column(Column::new("name", ValueType::Text)))
                .unwrap()
                .build(),
        )
    }

    #[test]
    fn duplicate_name_leaves_builder_unchanged() {
        let mut builder = Schema::builder();
        builder.add_column(Column::new("a", ValueType::Int)).unwrap();

        let result = builder.add_column(Column::new("a", ValueType::Text));

        assert_eq!(result.err(), Some(SchemaError::DuplicateColumn("a".to_string())));
        let schema = builder.build();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.columns()[0].value_type(), ValueType::Int);
    }

    #[test]
    fn invalid_default_is_rejected_on_insertion() {
        let column = Column::builder("a", ValueType::Int).default_text("one").build();
        let result = Schema::builder().column(column);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDefault { ref column, .. }) if column == "a"
        ));
    }

    #[test]
    fn lookups_follow_insertion_order() {
        let schema = people();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(schema.index_of("id"), Some(0));
        assert_eq!(schema.index_of("age"), None);
        assert_eq!(schema.column("name").map(Column::value_type), Some(ValueType::Text));
    }

    #[test]
    fn named_values_are_aligned_to_schema_order() {
        let schema = people();
        let named = NamedRow::from(vec![
            ("name", Value::from("DEAN")),
            ("unknown", Value::from(1)),
        ]);

        let row = schema.row_from_named(&named);

        assert_eq!(row.values(), &[None, Some(Value::from("DEAN"))]);
    }

    #[test]
    fn to_builder_extends_a_frozen_schema() {
        let schema = people();
        let extended = schema
            .to_builder()
            .column(Column::new("age", ValueType::Int))
            .unwrap()
            .build();
        assert_eq!(extended.len(), 3);
        assert_eq!(schema.len(), 2);
    }
}
