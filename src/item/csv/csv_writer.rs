use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use crate::{
    core::{
        column::Column,
        dialect::Dialect,
        item::{ItemWriter, ItemWriterResult},
        row::{NamedRow, Row},
        schema::Schema,
        value::Value,
    },
    error::{CsvError, ValueError},
};

/// Turns [`Row`]s into escaped lines.
///
/// The output column order is fixed when the encoder is built: schema order,
/// or the order given by a comparator. Values are always taken in schema
/// order, the comparator only moves them on the line.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    schema: Arc<Schema>,
    dialect: Arc<Dialect>,
    /// Output position → schema index.
    order: Vec<usize>,
}

impl RowEncoder {
    pub fn new(schema: impl Into<Arc<Schema>>, dialect: impl Into<Arc<Dialect>>) -> Self {
        let schema = schema.into();
        let order = (0..schema.len()).collect();
        Self {
            schema,
            dialect: dialect.into(),
            order,
        }
    }

    /// An encoder writing columns in the order given by `compare`.
    ///
    /// ```
    /// use fluent_csv_rs::core::{column::Column, dialect::Dialect, schema::Schema, value::ValueType};
    /// use fluent_csv_rs::item::csv::csv_writer::RowEncoder;
    ///
    /// let schema = Schema::builder()
    ///     .column(Column::new("b", ValueType::Int)).unwrap()
    ///     .column(Column::new("a", ValueType::Int)).unwrap()
    ///     .build();
    /// let encoder = RowEncoder::sorted_by(schema, Dialect::default(), |x, y| x.name().cmp(y.name()));
    ///
    /// assert_eq!(encoder.header_line(), "a,b");
    /// ```
    pub fn sorted_by<F>(
        schema: impl Into<Arc<Schema>>,
        dialect: impl Into<Arc<Dialect>>,
        mut compare: F,
    ) -> Self
    where
        F: FnMut(&Column, &Column) -> Ordering,
    {
        let mut encoder = Self::new(schema, dialect);
        let columns = encoder.schema.columns();
        encoder
            .order
            .sort_by(|&x, &y| compare(&columns[x], &columns[y]));
        encoder
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    /// Columns in output order.
    pub fn output_columns(&self) -> impl Iterator<Item = &Column> {
        let columns = self.schema.columns();
        self.order.iter().map(move |&index| &columns[index])
    }

    /// Escaped column names in output order.
    pub fn header_line(&self) -> String {
        self.dialect.join(self.output_columns().map(Column::name))
    }

    /// Formats one row. A row built on another schema is realigned by
    /// column name; columns it lacks are written as empty fields.
    pub fn format_row(&self, row: &Row) -> Result<String, ValueError> {
        if Arc::ptr_eq(row.schema(), &self.schema) {
            return self.format_values(row.values());
        }

        let values: Vec<Option<Value>> = self
            .schema
            .names()
            .map(|name| row.get(name).cloned())
            .collect();
        self.format_values(&values)
    }

    /// Formats values given in schema order.
    ///
    /// Absent values and values missing at the end of `values` are written as
    /// empty fields.
    ///
    /// # Errors
    ///
    /// [`ValueError::TypeMismatch`] when a present value's type differs from
    /// its column's type.
    pub fn format_values(&self, values: &[Option<Value>]) -> Result<String, ValueError> {
        let columns = self.schema.columns();
        let fields = self
            .order
            .iter()
            .map(|&index| match values.get(index) {
                Some(Some(value)) => columns[index].format(value),
                _ => Ok(String::new()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.dialect.join(fields))
    }
}

/// A CSV row writer that implements the `ItemWriter` trait.
///
/// The header line is written before the first record, or on `open`,
/// `flush`, `close` or [`into_inner`](Self::into_inner) when no record was
/// written. Each record is fully formatted before anything reaches the sink,
/// so a failing row leaves no partial line behind.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{column::Column, item::ItemWriter, row::Row, schema::Schema, value::{Value, ValueType}};
/// use fluent_csv_rs::item::csv::csv_writer::CsvRowWriterBuilder;
///
/// let schema = Arc::new(
///     Schema::builder()
///         .column(Column::new("id", ValueType::Int)).unwrap()
///         .column(Column::new("name", ValueType::Text)).unwrap()
///         .build(),
/// );
///
/// let writer = CsvRowWriterBuilder::new(schema.clone()).from_writer(vec![]);
/// writer
///     .write(&[
///         Row::from_values(schema.clone(), [Value::from(1), Value::from("DEAN")]),
///         Row::from_values(schema.clone(), [Value::from(2), Value::from("a,b")]),
///     ])
///     .unwrap();
///
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "id,name\n1,DEAN\n2,a\\,b\n");
/// ```
pub struct CsvRowWriter<W: Write> {
    encoder: RowEncoder,
    stream: RefCell<BufWriter<W>>,
    has_headers: bool,
    header_written: Cell<bool>,
    terminator: String,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn encoder(&self) -> &RowEncoder {
        &self.encoder
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.encoder.schema()
    }

    /// Formats and writes one row. See [`RowEncoder::format_row`].
    pub fn write_row(&self, row: &Row) -> Result<(), CsvError> {
        let line = self.encoder.format_row(row)?;
        self.write_header()?;
        self.write_line(&line)
    }

    /// Formats and writes values given in schema order.
    pub fn write_values(&self, values: &[Option<Value>]) -> Result<(), CsvError> {
        let line = self.encoder.format_values(values)?;
        self.write_header()?;
        self.write_line(&line)
    }

    fn write_header(&self) -> Result<(), CsvError> {
        if self.has_headers && !self.header_written.get() {
            let header = self.encoder.header_line();
            self.write_line(&header)?;
        }
        self.header_written.set(true);
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<(), CsvError> {
        let mut stream = self.stream.borrow_mut();
        stream.write_all(line.as_bytes())?;
        stream.write_all(self.terminator.as_bytes())?;
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W, CsvError> {
        self.write_header()?;
        self.stream
            .into_inner()
            .into_inner()
            .map_err(|err| CsvError::Io(err.into_error()))
    }
}

impl<W: Write> ItemWriter<Row> for CsvRowWriter<W> {
    fn write(&self, items: &[Row]) -> ItemWriterResult {
        items.iter().try_for_each(|row| self.write_row(row))
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// Note that this also flushes the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        self.write_header()?;
        self.stream.borrow_mut().flush()?;
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        self.write_header()
    }

    fn close(&self) -> ItemWriterResult {
        ItemWriter::<Row>::flush(self)
    }
}

impl<W: Write> ItemWriter<NamedRow> for CsvRowWriter<W> {
    /// Writes rows keyed by column name; unknown names are ignored and
    /// missing names are written as empty fields.
    fn write(&self, items: &[NamedRow]) -> ItemWriterResult {
        let schema = self.schema();
        items
            .iter()
            .try_for_each(|named| self.write_row(&schema.row_from_named(named)))
    }

    fn flush(&self) -> ItemWriterResult {
        ItemWriter::<Row>::flush(self)
    }

    fn open(&self) -> ItemWriterResult {
        self.write_header()
    }

    fn close(&self) -> ItemWriterResult {
        ItemWriter::<Row>::flush(self)
    }
}

type ColumnOrder = Box<dyn FnMut(&Column, &Column) -> Ordering>;

/// A builder for configuring CSV row writing.
///
/// # Default Configuration
///
/// - Dialect: [`Dialect::default`]
/// - Headers: enabled
/// - Column order: schema order
/// - Terminator: `\n`
pub struct CsvRowWriterBuilder {
    schema: Arc<Schema>,
    dialect: Arc<Dialect>,
    has_headers: bool,
    terminator: String,
    order: Option<ColumnOrder>,
}

impl CsvRowWriterBuilder {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            dialect: Arc::new(Dialect::default()),
            has_headers: true,
            terminator: "\n".to_string(),
            order: None,
        }
    }

    pub fn dialect(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Sets the text written after every line.
    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
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

    pub fn from_writer<W: Write>(self, wtr: W) -> CsvRowWriter<W> {
        let encoder = match self.order {
            Some(compare) => RowEncoder::sorted_by(self.schema, self.dialect, compare),
            None => RowEncoder::new(self.schema, self.dialect),
        };

        CsvRowWriter {
            encoder,
            stream: RefCell::new(BufWriter::new(wtr)),
            has_headers: self.has_headers,
            header_written: Cell::new(false),
            terminator: self.terminator,
        }
    }

    /// Writes to a file, created or truncated.
    ///
    /// # Errors
    ///
    /// [`CsvError::Io`] when the file cannot be created.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvRowWriter<File>, CsvError> {
        let file = File::create(path)?;
        Ok(self.from_writer(file))
    }
}
