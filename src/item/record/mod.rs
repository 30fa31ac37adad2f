/// Binding of CSV rows to caller-defined record types.
///
/// A type opts in by implementing [`Record`]: its `describe` function
/// registers, once, the members the binder may use. For every schema column,
/// a [`RecordBinding`] then tries in order:
///
/// 1. an accessor registered on the reader, writer or binding builder for
///    that column name;
/// 2. the accessor declared together with the column ([`Members::column`]);
/// 3. a method registered as `set_<column>`, `get_<column>` or, for boolean
///    columns, `is_<column>` (column names are turned into snake case);
/// 4. a field registered under the column's name.
///
/// The first accessor that succeeds wins. A setter rejecting a value (wrong
/// type, out of range) hands it over to the next one.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::{column::Column, dialect::Dialect, item::{ItemReader, ItemWriter}, value::ValueType};
/// use fluent_csv_rs::item::record::{Members, Record, record_reader::RecordReaderBuilder, record_writer::RecordWriterBuilder};
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Book {
///     title: String,
///     pages: u32,
///     summary: Option<String>,
/// }
///
/// impl Book {
///     fn set_pages(&mut self, pages: u32) {
///         self.pages = pages;
///     }
///
///     fn get_pages(&self) -> u32 {
///         self.pages
///     }
/// }
///
/// impl Record for Book {
///     fn describe(members: &mut Members<Self>) {
///         members
///             .initializer(Book::default)
///             .column(Column::new("title", ValueType::Text), |b| b.title.clone(), |b, v| b.title = v)
///             .column(
///                 Column::builder("summary", ValueType::Text)
///                     .optional(true)
///                     .default_text("No Description")
///                     .build(),
///                 |b| b.summary.clone(),
///                 |b, v| b.summary = v,
///             )
///             .method_get("get_pages", Book::get_pages)
///             .method_set("set_pages", Book::set_pages);
///     }
///
///     fn dialect() -> Option<Dialect> {
///         Dialect::builder().split(';').build().ok()
///     }
/// }
///
/// let schema = fluent_csv_rs::core::schema::Schema::builder()
///     .column(Column::new("pages", ValueType::Int)).unwrap()
///     .build();
///
/// let reader = RecordReaderBuilder::<Book>::new()
///     .schema(schema.clone())
///     .from_str("title;pages\nDune;412")
///     .unwrap();
/// let book = reader.read().unwrap().unwrap();
/// assert_eq!(book.pages, 412);
/// assert_eq!(book.summary.as_deref(), Some("No Description"));
///
/// let writer = RecordWriterBuilder::<Book>::new()
///     .schema(schema)
///     .from_writer(vec![])
///     .unwrap();
/// writer.write(&[book]).unwrap();
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "pages;title;summary\n412;Dune;No Description\n");
/// ```

/// Resolution of accessor strategies per column.
pub mod binding;

/// The `Record` trait and its registration table.
pub mod members;

pub mod record_reader;

pub mod record_writer;

pub use binding::{AccessorSource, RecordBinding, RecordBindingBuilder};
pub use members::{ConstructorArgs, Members, Record};
