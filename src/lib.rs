#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 <div align="center">
   <h1>Fluent CSV for Rust</h1>
   <h3>📄 Schema-driven CSV reading and writing with configurable dialects</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # Fluent CSV for Rust

 **Fluent CSV for Rust** reads and writes line-oriented delimited text against
 a declared schema of typed columns. Fields are split with an escape-aware
 tokenizer whose escape, quote and split characters are configurable, values
 are parsed and formatted by their column, and rows can be bound to your own
 record types.

 ## Core Concepts

- **Dialect:** The escape, quote, split and comment characters. Any text
  escaped with a dialect splits back to itself under the same dialect.
- **Schema:** An ordered set of uniquely named, typed `Column`s. Columns carry
  their parser, formatter, default value and whether they may be absent.
- **Row:** The values of one record, aligned with the schema.
- **RowDecoder / CsvRowReader:** Resolve the header line against the schema,
  then decode each data line into a `Row`.
- **RowEncoder / CsvRowWriter:** Format and escape rows, in schema order or a
  custom column order.
- **Record:** A caller type that registers its members once; a
  `RecordBinding` moves values between rows and records.
- **ItemReader / ItemWriter / Step:** Readers and writers plug into a chunked
  read → process → write loop.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| record        | Enables the record binder, `RecordReader` and `RecordWriter` (default) |
| logger        | Enables a logger `ItemWriter`, useful for debugging purposes  |
| full          | Enables all available features                                |

 ## Getting Started

```rust
# use std::sync::Arc;
# use fluent_csv_rs::{
#     core::{
#         column::Column,
#         dialect::Dialect,
#         item::ItemProcessorResult,
#         row::Row,
#         schema::Schema,
#         step::StepBuilder,
#         value::{Value, ValueType},
#     },
#     error::CsvError,
#     item::csv::{csv_reader::CsvRowReaderBuilder, csv_writer::CsvRowWriterBuilder},
# };
fn main() -> Result<(), CsvError> {
    let schema = Arc::new(
        Schema::builder()
            .column(Column::new("id", ValueType::Int))?
            .column(Column::new("name", ValueType::Text))?
            .column(
                Column::builder("ratio", ValueType::Float)
                    .optional(true)
                    .default_value(0.5)
                    .build(),
            )?
            .build(),
    );

    let input = "\
## exported names
id,name
1,DEAN
2,WEN-ZHE
";

    let reader = CsvRowReaderBuilder::new(schema.clone()).from_str(input);

    let dialect = Dialect::builder().escape('/').quote('\'').split(':').build()?;
    let writer = CsvRowWriterBuilder::new(schema.clone())
        .dialect(dialect)
        .from_writer(vec![]);

    let upper_case = |row: &Row| -> ItemProcessorResult<Row> {
        let mut values = row.values().to_vec();
        if let Some(Value::Text(name)) = &values[1] {
            values[1] = Some(Value::Text(format!("{}:X", name.to_uppercase())));
        }
        Ok(Row::new(row.schema().clone(), values))
    };

    let step = StepBuilder::new("names")
        .reader(&reader)
        .processor(&upper_case)
        .writer(&writer)
        .chunk(10)
        .build()?;
    step.execute()?;

    let output = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(output, "id:name:ratio\n1:DEAN/:X:0.5\n2:WEN-ZHE/:X:0.5\n");
    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Dialect, tokenizer, schema, values and the item traits
pub mod core;

/// Error types
pub mod error;

#[doc(inline)]
pub use error::*;

/// Row readers and writers (CSV rows, records, logger)
pub mod item;
