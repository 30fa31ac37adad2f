use log::debug;

use crate::{core::schema::Schema, error::SchemaError};

/// Binds the fields of an input header to schema columns.
///
/// Built once per stream from the first data line. Input names unknown to the
/// schema are ignored; a name repeated in the header binds its first
/// occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    /// Input position → schema column index.
    by_position: Vec<Option<usize>>,
    /// Schema column index → input position.
    by_column: Vec<Option<usize>>,
}

impl HeaderMap {
    /// Resolves the header `fields` against `schema`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MissingColumns`] listing, in schema order, every
    /// required column the header lacks.
    ///
    /// ```
    /// use fluent_csv_rs::core::{column::Column, schema::Schema, value::ValueType};
    /// use fluent_csv_rs::error::SchemaError;
    /// use fluent_csv_rs::item::csv::header::HeaderMap;
    ///
    /// let schema = Schema::builder()
    ///     .column(Column::new("a", ValueType::Int)).unwrap()
    ///     .column(Column::new("b", ValueType::Int)).unwrap()
    ///     .column(Column::new("c", ValueType::Int)).unwrap()
    ///     .build();
    ///
    /// let result = HeaderMap::resolve(&["b".to_string()], &schema);
    /// assert_eq!(
    ///     result,
    ///     Err(SchemaError::MissingColumns(vec!["a".to_string(), "c".to_string()]))
    /// );
    /// ```
    pub fn resolve(fields: &[String], schema: &Schema) -> Result<Self, SchemaError> {
        let mut by_position = vec![None; fields.len()];
        let mut by_column = vec![None; schema.len()];

        for (position, name) in fields.iter().enumerate() {
            let Some(index) = schema.index_of(name) else {
                debug!("Header field {} is not in the schema, ignored", name);
                continue;
            };
            if by_column[index].is_some() {
                debug!("Header field {} repeated at position {}, ignored", name, position);
                continue;
            }
            by_position[position] = Some(index);
            by_column[index] = Some(position);
        }

        let missing: Vec<String> = schema
            .columns()
            .iter()
            .zip(&by_column)
            .filter(|(column, position)| position.is_none() && !column.is_optional())
            .map(|(column, _)| column.name().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        debug!("Header resolved: {:?}", by_column);
        Ok(Self {
            by_position,
            by_column,
        })
    }

    /// The schema column index bound to input `position`.
    pub fn column_at(&self, position: usize) -> Option<usize> {
        self.by_position.get(position).copied().flatten()
    }

    /// The input position of schema column `index`.
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.by_column.get(index).copied().flatten()
    }

    /// Number of fields in the input header.
    pub fn width(&self) -> usize {
        self.by_position.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{column::Column, value::ValueType};

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn schema() -> Schema {
        Schema::builder()
            .column(Column::new("id", ValueType::Int))
            .and_then(|b| b.column(Column::new("name", ValueType::Text)))
            .and_then(|b| {
                b.column(Column::builder("note", ValueType::Text).optional(true).build())
            })
            .unwrap()
            .build()
    }

    #[test]
    fn positions_are_bound_both_ways() {
        let header = HeaderMap::resolve(&fields(&["name", "extra", "id"]), &schema()).unwrap();

        assert_eq!(header.width(), 3);
        assert_eq!(header.column_at(0), Some(1));
        assert_eq!(header.column_at(1), None);
        assert_eq!(header.column_at(2), Some(0));
        assert_eq!(header.position_of(0), Some(2));
        assert_eq!(header.position_of(2), None);
    }

    #[test]
    fn first_occurrence_of_a_repeated_name_wins() {
        let header = HeaderMap::resolve(&fields(&["id", "name", "id"]), &schema()).unwrap();
        assert_eq!(header.position_of(0), Some(0));
        assert_eq!(header.column_at(2), None);
    }

    #[test]
    fn optional_columns_may_be_missing() {
        assert!(HeaderMap::resolve(&fields(&["id", "name"]), &schema()).is_ok());
        assert_eq!(
            HeaderMap::resolve(&fields(&["note"]), &schema()),
            Err(SchemaError::MissingColumns(fields(&["id", "name"])))
        );
    }
}
