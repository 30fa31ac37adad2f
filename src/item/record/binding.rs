use std::{collections::HashMap, fmt, sync::Arc};

use log::{debug, trace, warn};

use crate::{
    core::{
        column::Column,
        row::Row,
        schema::Schema,
        value::{FieldValue, Value, ValueType},
    },
    error::BindingError,
};

use super::members::{
    Accessor, Construct, ConstructorArgs, Initializer, Members, Record, getter, setter,
};

/// Where an accessor of a column comes from, in decreasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorSource {
    /// Registered on the binding by column name.
    Custom,
    /// Carried by the column, declared through [`Record::describe`].
    Declared,
    /// A `get_`, `is_` or `set_` method named after the column.
    Convention,
    /// A field named after the column.
    Field,
}

struct Strategy<T> {
    source: AccessorSource,
    accessor: Accessor<T>,
}

enum Instantiate<T> {
    Default(Arc<dyn Fn() -> T + Send + Sync>),
    Constructor {
        params: Vec<String>,
        indices: Vec<usize>,
        construct: Construct<T>,
    },
}

/// Converts between rows of a schema and records of type `T`.
///
/// For every schema column the binding keeps an ordered list of accessor
/// strategies (see [`AccessorSource`]). Reading sets each present value with
/// the first setter that accepts it; writing takes each value from the first
/// strategy that has a getter.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{column::Column, row::Row, schema::Schema, value::{Value, ValueType}};
/// use fluent_csv_rs::item::record::{Members, Record, RecordBinding};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// impl Record for Person {
///     fn describe(members: &mut Members<Self>) {
///         members
///             .initializer(Person::default)
///             .column(Column::new("id", ValueType::Int), |p| p.id, |p, v| p.id = v)
///             .field("name", |p| p.name.clone(), |p, v| p.name = v);
///     }
/// }
///
/// let schema = Arc::new(
///     Schema::builder()
///         .record::<Person>().unwrap()
///         .column(Column::new("name", ValueType::Text)).unwrap()
///         .build(),
/// );
/// let binding = RecordBinding::<Person>::builder(schema.clone()).build().unwrap();
///
/// let row = Row::from_values(schema, [Value::from(1), Value::from("DEAN")]);
/// let person = binding.construct(&row).unwrap();
/// assert_eq!(person, Person { id: 1, name: "DEAN".to_string() });
/// assert_eq!(binding.deconstruct(&person).unwrap(), row);
/// ```
pub struct RecordBinding<T> {
    schema: Arc<Schema>,
    /// Strategies of every schema column, in priority order.
    strategies: Vec<Vec<Strategy<T>>>,
    instantiate: Option<Instantiate<T>>,
}

impl<T> fmt::Debug for RecordBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<(&str, Vec<AccessorSource>)> = self
            .schema
            .names()
            .zip(&self.strategies)
            .map(|(name, chain)| (name, chain.iter().map(|s| s.source).collect()))
            .collect();
        f.debug_struct("RecordBinding")
            .field("record", &std::any::type_name::<T>())
            .field("strategies", &sources)
            .finish()
    }
}

impl<T: Record> RecordBinding<T> {
    pub fn builder(schema: impl Into<Arc<Schema>>) -> RecordBindingBuilder<T> {
        RecordBindingBuilder::new(schema)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The accessor sources available for column `name`, in priority order.
    pub fn sources(&self, name: &str) -> Vec<AccessorSource> {
        self.schema
            .index_of(name)
            .map(|index| self.strategies[index].iter().map(|s| s.source).collect())
            .unwrap_or_default()
    }

    /// Whether records can be built from rows.
    pub fn can_construct(&self) -> bool {
        self.instantiate.is_some()
    }

    /// Builds a record from a row of this binding's schema.
    ///
    /// # Errors
    ///
    /// - [`BindingError::ConstructionFailure`] when the type has no
    ///   initializer or its constructor fails
    /// - [`BindingError::NoAccessor`] when no setter accepts a present value
    pub fn construct(&self, row: &Row) -> Result<T, BindingError> {
        let (mut record, consumed) = self.instantiate(row)?;

        for (index, column) in self.schema.columns().iter().enumerate() {
            if consumed.contains(&index) {
                continue;
            }
            if let Some(value) = row.value(index) {
                self.inject(&mut record, index, column, value)?;
            }
        }

        Ok(record)
    }

    /// Extracts a row of this binding's schema from a record.
    ///
    /// # Errors
    ///
    /// [`BindingError::NoAccessor`] when a column has no getter.
    pub fn deconstruct(&self, record: &T) -> Result<Row, BindingError> {
        let values = self
            .schema
            .columns()
            .iter()
            .zip(&self.strategies)
            .map(|(column, chain)| {
                chain
                    .iter()
                    .find_map(|strategy| strategy.accessor.getter.as_ref())
                    .map(|get| get(record))
                    .ok_or_else(|| BindingError::NoAccessor(column.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Row::new(Arc::clone(&self.schema), values))
    }

    fn instantiate(&self, row: &Row) -> Result<(T, Vec<usize>), BindingError> {
        match &self.instantiate {
            None => Err(BindingError::ConstructionFailure(format!(
                "{} declares no initializer",
                std::any::type_name::<T>()
            ))),
            Some(Instantiate::Default(init)) => Ok((init(), Vec::new())),
            Some(Instantiate::Constructor {
                params,
                indices,
                construct,
            }) => {
                let values = indices.iter().map(|&i| row.value(i).cloned()).collect();
                let record = construct(&ConstructorArgs::new(params, values))?;
                Ok((record, indices.clone()))
            }
        }
    }

    fn inject(
        &self,
        record: &mut T,
        index: usize,
        column: &Column,
        value: &Value,
    ) -> Result<(), BindingError> {
        for strategy in &self.strategies[index] {
            let Some(set) = &strategy.accessor.setter else {
                continue;
            };
            match set(record, value.clone()) {
                Ok(()) => {
                    trace!("Column {} set by {:?} accessor", column.name(), strategy.source);
                    return Ok(());
                }
                Err(err) => debug!(
                    "Fail to set column {} by {:?} accessor: {}",
                    column.name(),
                    strategy.source,
                    err
                ),
            }
        }

        Err(BindingError::NoAccessor(column.name().to_string()))
    }
}

/// A builder for a [`RecordBinding`], registering custom accessors.
pub struct RecordBindingBuilder<T> {
    schema: Arc<Schema>,
    custom: HashMap<String, Accessor<T>>,
}

impl<T: Record> RecordBindingBuilder<T> {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            custom: HashMap::new(),
        }
    }

    /// Sets column `column` through `set`, ahead of every other accessor.
    pub fn setter<E, S>(mut self, column: impl AsRef<str>, set: S) -> Self
    where
        E: FieldValue,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        self.custom_accessor(column.as_ref()).setter = Some(setter(set));
        self
    }

    /// Gets column `column` through `get`, ahead of every other accessor.
    pub fn getter<E, G>(mut self, column: impl AsRef<str>, get: G) -> Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
    {
        self.custom_accessor(column.as_ref()).getter = Some(getter(get));
        self
    }

    pub(crate) fn accessors(mut self, custom: HashMap<String, Accessor<T>>) -> Self {
        self.custom.extend(custom);
        self
    }

    fn custom_accessor(&mut self, name: &str) -> &mut Accessor<T> {
        self.custom.entry(name.to_string()).or_default()
    }

    /// Resolves the accessor strategies of every column.
    ///
    /// # Errors
    ///
    /// [`BindingError::ConstructionFailure`] when a constructor parameter
    /// names a column the schema lacks.
    pub fn build(self) -> Result<RecordBinding<T>, BindingError> {
        let mut members = Members::<T>::describe();

        for name in self.custom.keys() {
            if !self.schema.names().any(|n| n == name) {
                warn!("Custom accessor registered for unknown column {}", name);
            }
        }

        let strategies = self
            .schema
            .columns()
            .iter()
            .map(|column| self.resolve(column, &members))
            .collect();

        let instantiate = match members.initializer.take() {
            None => None,
            Some(Initializer::Default(init)) => Some(Instantiate::Default(init)),
            Some(Initializer::Constructor { params, construct }) => {
                let indices = params
                    .iter()
                    .map(|param| {
                        self.schema.index_of(param).ok_or_else(|| {
                            BindingError::ConstructionFailure(format!(
                                "constructor parameter {} is not a column",
                                param
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(Instantiate::Constructor {
                    params,
                    indices,
                    construct,
                })
            }
        };

        let binding = RecordBinding {
            schema: self.schema,
            strategies,
            instantiate,
        };
        debug!("Record binding resolved: {:?}", binding);
        Ok(binding)
    }

    fn resolve(&self, column: &Column, members: &Members<T>) -> Vec<Strategy<T>> {
        let mut chain = Vec::new();
        let mut push = |source, accessor: Accessor<T>| {
            if !accessor.is_empty() {
                chain.push(Strategy { source, accessor });
            }
        };

        if let Some(accessor) = self.custom.get(column.name()) {
            push(AccessorSource::Custom, accessor.clone());
        }

        if let Some(accessor) = column.slot::<Accessor<T>>() {
            push(AccessorSource::Declared, accessor.clone());
        }

        let snake = snake_case(column.name());
        let getter = members.getters.get(&format!("get_{}", snake)).or_else(|| {
            (column.value_type() == ValueType::Bool)
                .then(|| members.getters.get(&format!("is_{}", snake)))
                .flatten()
        });
        push(
            AccessorSource::Convention,
            Accessor {
                getter: getter.cloned(),
                setter: members.setters.get(&format!("set_{}", snake)).cloned(),
            },
        );

        if let Some(accessor) = members.fields.get(column.name()) {
            push(AccessorSource::Field, accessor.clone());
        }

        chain
    }
}

/// `firstName` → `first_name`, `Unit Price` → `unit_price`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.chars() {
        if c.is_uppercase() {
            if previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            snake.push(c);
        } else if !snake.is_empty() && !snake.ends_with('_') {
            snake.push('_');
        }
        previous = Some(c);
    }

    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_turned_into_snake_case() {
        assert_eq!(snake_case("name"), "name");
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("FirstName"), "first_name");
        assert_eq!(snake_case("userID"), "user_id");
        assert_eq!(snake_case("Unit Price"), "unit_price");
        assert_eq!(snake_case("zip-code"), "zip_code");
        assert_eq!(snake_case("a1B"), "a1_b");
    }
}
