/// Schema-driven CSV reading and writing.
///
/// This module turns lines into typed [`Row`](crate::core::row::Row)s and back,
/// following a [`Schema`](crate::core::schema::Schema) and a
/// [`Dialect`](crate::core::dialect::Dialect).
///
/// # Module Architecture
///
/// Each direction has a stateless half and a stream half:
///
/// 1. **RowDecoder** / **CsvRowReader**: the decoder resolves a header line
///    into a [`HeaderMap`](header::HeaderMap) and decodes data lines against
///    it. The reader drives a decoder over a line source, skipping comments
///    and resolving the header once.
///
/// 2. **RowEncoder** / **CsvRowWriter**: the encoder formats and escapes rows
///    in a fixed output column order. The writer adds the header line and
///    the line terminator and owns the sink.
///
/// Decoders and encoders are `Send + Sync` and can be shared between threads;
/// readers and writers keep their stream state in `RefCell`s.
///
/// # Examples
///
/// ## Converting between dialects
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{column::Column, dialect::Dialect, item::{ItemReader, ItemWriter}, schema::Schema, value::ValueType};
/// use fluent_csv_rs::item::csv::{csv_reader::CsvRowReaderBuilder, csv_writer::CsvRowWriterBuilder};
///
/// let schema = Arc::new(
///     Schema::builder()
///         .column(Column::new("a", ValueType::Int)).unwrap()
///         .column(Column::new("b", ValueType::Text)).unwrap()
///         .build(),
/// );
/// let colon = Dialect::builder().escape('/').quote('\'').split(':').build().unwrap();
///
/// let reader = CsvRowReaderBuilder::new(schema.clone())
///     .dialect(colon)
///     .from_str("a:b\n1:'2/'3'\n2:x,y");
/// let writer = CsvRowWriterBuilder::new(schema).from_writer(vec![]);
///
/// while let Some(row) = reader.read().unwrap() {
///     writer.write(&[row]).unwrap();
/// }
///
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "a,b\n1,2'3\n2,x\\,y\n");
/// ```

/// Binding of header names to schema columns.
pub mod header;

/// A module providing facilities for reading CSV rows.
pub mod csv_reader;

/// A module providing facilities for writing CSV rows.
pub mod csv_writer;
