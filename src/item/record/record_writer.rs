use std::{cmp::Ordering, collections::HashMap, fs::File, io::Write, path::Path, sync::Arc};

use crate::{
    core::{
        column::Column,
        dialect::Dialect,
        item::{ItemWriter, ItemWriterResult},
        row::Row,
        schema::Schema,
        value::FieldValue,
    },
    error::CsvError,
    item::csv::csv_writer::{CsvRowWriter, CsvRowWriterBuilder},
};

use super::{
    binding::{RecordBinding, RecordBindingBuilder},
    members::{Accessor, Record, getter},
};

/// Writes records of type `T`, one per CSV line.
pub struct RecordWriter<W: Write, T> {
    rows: CsvRowWriter<W>,
    binding: Arc<RecordBinding<T>>,
}

impl<W: Write, T: Record> RecordWriter<W, T> {
    pub fn binding(&self) -> &Arc<RecordBinding<T>> {
        &self.binding
    }

    /// Extracts and writes one record.
    pub fn write_record(&self, record: &T) -> Result<(), CsvError> {
        let row = self.binding.deconstruct(record)?;
        self.rows.write_row(&row)
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W, CsvError> {
        self.rows.into_inner()
    }
}

impl<W: Write, T: Record> ItemWriter<T> for RecordWriter<W, T> {
    fn write(&self, items: &[T]) -> ItemWriterResult {
        items.iter().try_for_each(|record| self.write_record(record))
    }

    fn flush(&self) -> ItemWriterResult {
        ItemWriter::<Row>::flush(&self.rows)
    }

    fn open(&self) -> ItemWriterResult {
        ItemWriter::<Row>::open(&self.rows)
    }

    fn close(&self) -> ItemWriterResult {
        ItemWriter::<Row>::close(&self.rows)
    }
}

/// A builder for configuring record writing.
///
/// # Default Configuration
///
/// - Schema: the columns `T` declares, appended to the columns given with
///   [`schema`](Self::schema)
/// - Dialect: [`Record::dialect`], or [`Dialect::default`]
/// - Headers: enabled
/// - Column order: schema order
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::{column::Column, item::ItemWriter, value::ValueType};
/// use fluent_csv_rs::item::record::{Members, Record, record_writer::RecordWriterBuilder};
///
/// struct Total {
///     amount: f64,
///     paid: bool,
/// }
///
/// impl Total {
///     fn is_paid(&self) -> bool {
///         self.paid
///     }
/// }
///
/// impl Record for Total {
///     fn describe(members: &mut Members<Self>) {
///         members
///             .column_getter(Column::new("amount", ValueType::Float), |t| t.amount)
///             .method_get("is_paid", Total::is_paid);
///     }
/// }
///
/// let writer = RecordWriterBuilder::<Total>::new()
///     .schema_column(Column::new("paid", ValueType::Bool))
///     .from_writer(vec![])
///     .unwrap();
/// writer.write(&[Total { amount: 12.5, paid: true }]).unwrap();
///
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "paid,amount\ntrue,12.5\n");
/// ```
pub struct RecordWriterBuilder<T> {
    schema: Option<Arc<Schema>>,
    extra_columns: Vec<Column>,
    dialect: Option<Arc<Dialect>>,
    has_headers: bool,
    terminator: Option<String>,
    order: Option<Box<dyn FnMut(&Column, &Column) -> Ordering>>,
    custom: HashMap<String, Accessor<T>>,
}

impl<T: Record> Default for RecordWriterBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordWriterBuilder<T> {
    pub fn new() -> Self {
        Self {
            schema: None,
            extra_columns: Vec::new(),
            dialect: None,
            has_headers: true,
            terminator: None,
            order: None,
            custom: HashMap::new(),
        }
    }

    /// Columns written ahead of the ones `T` declares.
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Appends one column to the ones given with [`schema`](Self::schema).
    pub fn schema_column(mut self, column: Column) -> Self {
        self.extra_columns.push(column);
        self
    }

    pub fn dialect(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    /// Orders output columns with `compare` instead of schema order.
    pub fn sort_by<F>(mut self, compare: F) -> Self
    where
        F: FnMut(&Column, &Column) -> Ordering + 'static,
    {
        self.order = Some(Box::new(compare));
        self
    }

    /// Gets column `column` through `get`, ahead of every other accessor.
    pub fn getter<E, G>(mut self, column: impl AsRef<str>, get: G) -> Self
    where
        E: FieldValue,
        G: Fn(&T) -> E + Send + Sync + 'static,
    {
        self.custom
            .entry(column.as_ref().to_string())
            .or_default()
            .getter = Some(getter(get));
        self
    }

    /// # Errors
    ///
    /// Schema errors from the declared columns, and binding errors.
    pub fn from_writer<W: Write>(self, wtr: W) -> Result<RecordWriter<W, T>, CsvError> {
        let (rows, binding) = self.prepare()?;
        Ok(RecordWriter {
            rows: rows.from_writer(wtr),
            binding,
        })
    }

    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<RecordWriter<File, T>, CsvError> {
        let (rows, binding) = self.prepare()?;
        Ok(RecordWriter {
            rows: rows.from_path(path)?,
            binding,
        })
    }

    fn prepare(self) -> Result<(CsvRowWriterBuilder, Arc<RecordBinding<T>>), CsvError> {
        let schema = match &self.schema {
            Some(schema) => schema.to_builder(),
            None => Schema::builder(),
        }
        .columns(self.extra_columns)?
        .record::<T>()?
        .build();

        let binding = RecordBindingBuilder::<T>::new(schema)
            .accessors(self.custom)
            .build()?;

        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => Arc::new(T::dialect().unwrap_or_default()),
        };

        let mut rows = CsvRowWriterBuilder::new(Arc::clone(binding.schema()))
            .dialect(dialect)
            .has_headers(self.has_headers);
        if let Some(terminator) = self.terminator {
            rows = rows.terminator(terminator);
        }
        if let Some(order) = self.order {
            rows = rows.sort_by(order);
        }

        Ok((rows, Arc::new(binding)))
    }
}
