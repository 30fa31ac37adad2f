use std::{
    cell::{Cell, OnceCell, RefCell},
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
    sync::Arc,
};

use log::debug;

use crate::{
    core::{
        dialect::Dialect,
        item::{ItemReader, ItemReaderResult},
        row::Row,
        schema::Schema,
        value::Value,
    },
    error::{CsvError, ValueError},
};

use super::header::HeaderMap;

/// Turns header and data lines into [`Row`]s.
///
/// The decoder holds no stream state: resolve the header once with
/// [`resolve_header`](Self::resolve_header), then hand the resulting
/// [`HeaderMap`] to [`parse_row`](Self::parse_row) for every data line. It is
/// `Send + Sync`, so one decoder can serve lines handed out to several
/// threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{column::Column, dialect::Dialect, schema::Schema, value::{Value, ValueType}};
/// use fluent_csv_rs::item::csv::csv_reader::RowDecoder;
///
/// let schema = Schema::builder()
///     .column(Column::new("id", ValueType::Int)).unwrap()
///     .column(Column::new("name", ValueType::Text)).unwrap()
///     .build();
/// let decoder = RowDecoder::new(schema, Dialect::default());
///
/// let header = decoder.resolve_header("name,id").unwrap();
/// let row = decoder.parse_row(&header, "DEAN,1").unwrap();
///
/// assert_eq!(row.get("id"), Some(&Value::Int(1)));
/// assert_eq!(row.get("name"), Some(&Value::from("DEAN")));
/// ```
#[derive(Debug, Clone)]
pub struct RowDecoder {
    schema: Arc<Schema>,
    dialect: Arc<Dialect>,
}

impl RowDecoder {
    pub fn new(schema: impl Into<Arc<Schema>>, dialect: impl Into<Arc<Dialect>>) -> Self {
        Self {
            schema: schema.into(),
            dialect: dialect.into(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    /// Tokenizes a header line and binds its names to schema columns.
    pub fn resolve_header(&self, line: &str) -> Result<HeaderMap, CsvError> {
        let fields = self.dialect.split_line(line)?;
        Ok(HeaderMap::resolve(&fields, &self.schema)?)
    }

    /// Tokenizes a data line and decodes its fields.
    pub fn parse_row(&self, header: &HeaderMap, line: &str) -> Result<Row, CsvError> {
        let fields = self.dialect.split_line(line)?;
        Ok(self.decode_fields(header, &fields)?)
    }

    /// Decodes already tokenized fields, one value per schema column:
    ///
    /// - an empty field takes the column's default, is absent for an optional
    ///   column without default, and is parsed otherwise;
    /// - a line shorter than the header yields empty fields;
    /// - a column the header lacks takes its default, or is absent.
    pub fn decode_fields(&self, header: &HeaderMap, fields: &[String]) -> Result<Row, ValueError> {
        let values = self
            .schema
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| -> Result<Option<Value>, ValueError> {
                let Some(position) = header.position_of(index) else {
                    return column.default_value();
                };

                let raw = fields.get(position).map(String::as_str).unwrap_or("");
                if !raw.is_empty() {
                    return column.parse(raw).map(Some);
                }

                if column.has_default() {
                    column.default_value()
                } else if column.is_optional() {
                    Ok(None)
                } else {
                    column.parse(raw).map(Some)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Row::new(Arc::clone(&self.schema), values))
    }
}

type Lines<'a> = Box<dyn Iterator<Item = io::Result<String>> + 'a>;

/// A CSV row reader that implements the `ItemReader` trait.
///
/// The reader pulls lines from its source, skips comment lines (and blank
/// lines when configured), resolves the header from the first remaining line
/// and decodes every following line into a [`Row`].
///
/// # Implementation Details
///
/// - Uses a `RefCell` for the line source and a `OnceCell` for the header, so
///   `read` takes `&self` and the header is resolved exactly once
/// - Fail-fast: the first error (I/O, header, tokenization or parsing) is
///   returned once, then the stream is over and `read` returns `Ok(None)`
/// - Streams the source line by line without loading it into memory
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{column::Column, item::ItemReader, schema::Schema, value::{Value, ValueType}};
/// use fluent_csv_rs::item::csv::csv_reader::CsvRowReaderBuilder;
///
/// let schema = Schema::builder()
///     .column(Column::new("id", ValueType::Int)).unwrap()
///     .column(Column::new("name", ValueType::Text)).unwrap()
///     .build();
///
/// let data = "\
/// ## people
/// id,name
/// 1,DEAN
/// 2,WEN-ZHE
/// ";
///
/// let reader = CsvRowReaderBuilder::new(schema).from_str(data);
///
/// let row = reader.read().unwrap().unwrap();
/// assert_eq!(row.get("name"), Some(&Value::from("DEAN")));
///
/// let names: Vec<String> = reader
///     .rows()
///     .map(|row| row.unwrap().get("name").unwrap().to_string())
///     .collect();
/// assert_eq!(names, vec!["WEN-ZHE"]);
/// ```
pub struct CsvRowReader<'a> {
    decoder: RowDecoder,
    /// Remaining input lines.
    lines: RefCell<Lines<'a>>,
    header: OnceCell<HeaderMap>,
    skip_blank_lines: bool,
    line_number: Cell<usize>,
    terminated: Cell<bool>,
}

impl<'a> CsvRowReader<'a> {
    fn new(decoder: RowDecoder, lines: Lines<'a>, skip_blank_lines: bool) -> Self {
        Self {
            decoder,
            lines: RefCell::new(lines),
            header: OnceCell::new(),
            skip_blank_lines,
            line_number: Cell::new(0),
            terminated: Cell::new(false),
        }
    }

    pub fn decoder(&self) -> &RowDecoder {
        &self.decoder
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.decoder.schema()
    }

    /// The resolved header, once the first data line has been read.
    pub fn header(&self) -> Option<&HeaderMap> {
        self.header.get()
    }

    /// Number of input lines consumed so far, comments included.
    pub fn line_number(&self) -> usize {
        self.line_number.get()
    }

    /// Iterates over the remaining rows.
    pub fn rows(&self) -> Rows<'_, 'a> {
        Rows { reader: self }
    }

    /// Ends the stream: every later `read` returns `Ok(None)`.
    pub(crate) fn terminate(&self) {
        self.terminated.set(true);
    }

    fn next_line(&self) -> Result<Option<String>, CsvError> {
        loop {
            let Some(line) = self.lines.borrow_mut().next() else {
                return Ok(None);
            };
            let line = line?;
            self.line_number.set(self.line_number.get() + 1);

            if self.decoder.dialect().is_comment(&line) {
                continue;
            }
            if self.skip_blank_lines && line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line));
        }
    }

    fn next_row(&self) -> ItemReaderResult<Row> {
        let header = match self.header.get() {
            Some(header) => header,
            None => {
                let Some(line) = self.next_line()? else {
                    return Ok(None);
                };
                let header = self.decoder.resolve_header(&line)?;
                self.header.get_or_init(|| header)
            }
        };

        match self.next_line()? {
            Some(line) => self.decoder.parse_row(header, &line).map(Some),
            None => Ok(None),
        }
    }
}

impl ItemReader<Row> for CsvRowReader<'_> {
    /// Reads the next row.
    ///
    /// # Returns
    /// - `Ok(Some(row))` for each data line
    /// - `Ok(None)` at the end of the input, and after an error
    /// - `Err(_)` once, for the first failure of the stream
    fn read(&self) -> ItemReaderResult<Row> {
        if self.terminated.get() {
            return Ok(None);
        }

        let result = self.next_row();
        match &result {
            Ok(Some(_)) => {}
            Ok(None) => self.terminate(),
            Err(err) => {
                debug!("Stream terminated at line {}: {}", self.line_number(), err);
                self.terminate();
            }
        }
        result
    }
}

/// Iterator over the rows of a [`CsvRowReader`], see [`CsvRowReader::rows`].
pub struct Rows<'r, 'a> {
    reader: &'r CsvRowReader<'a>,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read().transpose()
    }
}

/// A builder for configuring CSV row reading.
///
/// # Default Configuration
///
/// - Dialect: [`Dialect::default`] (escape `\`, no quote, split `,`,
///   comment `#`)
/// - Blank lines: decoded as rows
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::{column::Column, dialect::Dialect, item::ItemReader, schema::Schema, value::{Value, ValueType}};
/// use fluent_csv_rs::item::csv::csv_reader::CsvRowReaderBuilder;
///
/// let schema = Schema::builder()
///     .column(Column::new("a", ValueType::Int)).unwrap()
///     .column(Column::new("b", ValueType::Text)).unwrap()
///     .build();
/// let dialect = Dialect::builder().escape('/').quote('\'').split(':').build().unwrap();
///
/// let reader = CsvRowReaderBuilder::new(schema)
///     .dialect(dialect)
///     .skip_blank_lines(true)
///     .from_str("a:b\n\n1:'2/'3'");
///
/// let row = reader.read().unwrap().unwrap();
/// assert_eq!(row.get("b"), Some(&Value::from("2'3")));
/// ```
#[derive(Debug, Clone)]
pub struct CsvRowReaderBuilder {
    schema: Arc<Schema>,
    dialect: Arc<Dialect>,
    skip_blank_lines: bool,
}

impl CsvRowReaderBuilder {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            dialect: Arc::new(Dialect::default()),
            skip_blank_lines: false,
        }
    }

    pub fn dialect(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// When enabled, lines made only of whitespace are skipped like comments.
    pub fn skip_blank_lines(mut self, yes: bool) -> Self {
        self.skip_blank_lines = yes;
        self
    }

    /// Reads from an iterator of lines, without line terminators.
    pub fn from_lines<I>(self, lines: I) -> CsvRowReader<'static>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        I::IntoIter: 'static,
    {
        self.build(Box::new(lines.into_iter().map(|line| Ok(line.into()))))
    }

    /// Reads from a string, split on `\n` and `\r\n`.
    pub fn from_str(self, text: &str) -> CsvRowReader<'_> {
        self.build(Box::new(text.lines().map(|line| Ok(line.to_string()))))
    }

    /// Reads from any `Read` source, split on `\n` and `\r\n`.
    pub fn from_reader<'a, R: Read + 'a>(self, rdr: R) -> CsvRowReader<'a> {
        self.build(Box::new(BufReader::new(rdr).lines()))
    }

    /// Reads from a file.
    ///
    /// # Errors
    ///
    /// [`CsvError::Io`] when the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvRowReader<'static>, CsvError> {
        let file = File::open(path)?;
        Ok(self.from_reader(file))
    }

    fn build<'a>(self, lines: Lines<'a>) -> CsvRowReader<'a> {
        let decoder = RowDecoder::new(self.schema, self.dialect);
        CsvRowReader::new(decoder, lines, self.skip_blank_lines)
    }
}
