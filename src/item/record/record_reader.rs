use std::{collections::HashMap, io::Read, path::Path, sync::Arc};

use crate::{
    core::{
        dialect::Dialect,
        item::{ItemReader, ItemReaderResult},
        schema::Schema,
        value::FieldValue,
    },
    error::{BindingError, CsvError},
    item::csv::csv_reader::{CsvRowReader, CsvRowReaderBuilder},
};

use super::{
    binding::{RecordBinding, RecordBindingBuilder},
    members::{Accessor, Record, setter},
};

/// Reads records of type `T`, one per CSV data line.
///
/// Rows come from a [`CsvRowReader`] and are bound to records by a
/// [`RecordBinding`]. A binding failure ends the stream like any other read
/// error.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::{column::Column, item::ItemReader, value::ValueType};
/// use fluent_csv_rs::item::record::{Members, Record, record_reader::RecordReaderBuilder};
///
/// #[derive(Debug, Default)]
/// struct Person {
///     id: i32,
///     name: String,
/// }
///
/// impl Record for Person {
///     fn describe(members: &mut Members<Self>) {
///         members
///             .initializer(Person::default)
///             .column(Column::new("id", ValueType::Int), |p| p.id, |p, v| p.id = v)
///             .column(Column::new("name", ValueType::Text), |p| p.name.clone(), |p, v| p.name = v);
///     }
/// }
///
/// let reader = RecordReaderBuilder::<Person>::new()
///     .from_str("id,name\n1,DEAN\n2,WEN-ZHE")
///     .unwrap();
///
/// let people: Vec<Person> = reader.records().collect::<Result<_, _>>().unwrap();
/// assert_eq!(people.len(), 2);
/// assert_eq!(people[1].name, "WEN-ZHE");
/// ```
pub struct RecordReader<'a, T> {
    rows: CsvRowReader<'a>,
    binding: Arc<RecordBinding<T>>,
}

impl<'a, T: Record> RecordReader<'a, T> {
    pub fn binding(&self) -> &Arc<RecordBinding<T>> {
        &self.binding
    }

    pub fn rows(&self) -> &CsvRowReader<'a> {
        &self.rows
    }

    /// Iterates over the remaining records.
    pub fn records(&self) -> Records<'_, 'a, T> {
        Records { reader: self }
    }
}

impl<T: Record> ItemReader<T> for RecordReader<'_, T> {
    fn read(&self) -> ItemReaderResult<T> {
        let Some(row) = self.rows.read()? else {
            return Ok(None);
        };

        match self.binding.construct(&row) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                self.rows.terminate();
                Err(err.into())
            }
        }
    }
}

/// Iterator over the records of a [`RecordReader`].
pub struct Records<'r, 'a, T> {
    reader: &'r RecordReader<'a, T>,
}

impl<T: Record> Iterator for Records<'_, '_, T> {
    type Item = Result<T, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read().transpose()
    }
}

/// A builder for configuring record reading.
///
/// # Default Configuration
///
/// - Schema: the columns `T` declares, appended to the columns given with
///   [`schema`](Self::schema)
/// - Dialect: [`Record::dialect`], or [`Dialect::default`]
/// - Blank lines: decoded as rows
pub struct RecordReaderBuilder<T> {
    schema: Option<Arc<Schema>>,
    dialect: Option<Arc<Dialect>>,
    skip_blank_lines: bool,
    custom: HashMap<String, Accessor<T>>,
}

impl<T: Record> Default for RecordReaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordReaderBuilder<T> {
    pub fn new() -> Self {
        Self {
            schema: None,
            dialect: None,
            skip_blank_lines: false,
            custom: HashMap::new(),
        }
    }

    /// Columns read ahead of the ones `T` declares.
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn dialect(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn skip_blank_lines(mut self, yes: bool) -> Self {
        self.skip_blank_lines = yes;
        self
    }

    /// Sets column `column` through `set`, ahead of every other accessor.
    pub fn setter<E, S>(mut self, column: impl AsRef<str>, set: S) -> Self
    where
        E: FieldValue,
        S: Fn(&mut T, E) + Send + Sync + 'static,
    {
        self.custom
            .entry(column.as_ref().to_string())
            .or_default()
            .setter = Some(setter(set));
        self
    }

    pub fn from_str(self, text: &str) -> Result<RecordReader<'_, T>, CsvError> {
        let (rows, binding) = self.prepare()?;
        Ok(RecordReader {
            rows: rows.from_str(text),
            binding,
        })
    }

    pub fn from_reader<'a, R: Read + 'a>(self, rdr: R) -> Result<RecordReader<'a, T>, CsvError> {
        let (rows, binding) = self.prepare()?;
        Ok(RecordReader {
            rows: rows.from_reader(rdr),
            binding,
        })
    }

    pub fn from_lines<I>(self, lines: I) -> Result<RecordReader<'static, T>, CsvError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        I::IntoIter: 'static,
    {
        let (rows, binding) = self.prepare()?;
        Ok(RecordReader {
            rows: rows.from_lines(lines),
            binding,
        })
    }

    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<RecordReader<'static, T>, CsvError> {
        let (rows, binding) = self.prepare()?;
        Ok(RecordReader {
            rows: rows.from_path(path)?,
            binding,
        })
    }

    fn prepare(self) -> Result<(CsvRowReaderBuilder, Arc<RecordBinding<T>>), CsvError> {
        let schema = match &self.schema {
            Some(schema) => schema.to_builder(),
            None => Schema::builder(),
        }
        .record::<T>()?
        .build();

        let binding = RecordBindingBuilder::<T>::new(schema)
            .accessors(self.custom)
            .build()?;

        if !binding.can_construct() {
            return Err(BindingError::ConstructionFailure(format!(
                "{} declares no initializer",
                std::any::type_name::<T>()
            ))
            .into());
        }

        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => Arc::new(T::dialect().unwrap_or_default()),
        };

        let rows = CsvRowReaderBuilder::new(Arc::clone(binding.schema()))
            .dialect(dialect)
            .skip_blank_lines(self.skip_blank_lines);

        Ok((rows, Arc::new(binding)))
    }
}
