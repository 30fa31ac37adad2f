use std::{env::temp_dir, fs};

use anyhow::Result;
use fluent_csv_rs::{
    core::{
        column::Column,
        dialect::{Dialect, DialectConfig},
        row::Row,
        schema::Schema,
        step::StepBuilder,
        value::ValueType,
    },
    item::csv::{csv_reader::CsvRowReaderBuilder, csv_writer::CsvRowWriterBuilder},
};

fn main() -> Result<()> {
    env_logger::init();

    let schema = Schema::builder()
        .column(Column::new("year", ValueType::Int))?
        .column(Column::new("make", ValueType::Text))?
        .column(Column::new("model", ValueType::Text))?
        .column(
            Column::builder("description", ValueType::Text)
                .optional(true)
                .default_text("n/a")
                .build(),
        )?
        .build();

    let input = temp_dir().join("cars.csv");
    fs::write(
        &input,
        "year,make,model,description\n\
         1948,Porsche,356,Luxury sports car\n\
         1967,Ford,Mustang fastback 1967,American car\n\
         2011,Peugeot,206+,\n\
         2012,Citroen,C4\\, Picasso,Family car\\, 7 seats\n",
    )?;

    // Target dialect, as it would come from a configuration file
    let config: DialectConfig =
        serde_json::from_str(r#"{ "escape": "/", "quote": "'", "split": ";" }"#)?;
    let target = Dialect::try_from(config)?;

    let output = temp_dir().join("cars_semicolon.csv");
    let reader = CsvRowReaderBuilder::new(schema.clone()).from_path(&input)?;
    let writer = CsvRowWriterBuilder::new(schema)
        .dialect(target)
        .terminator("\r\n")
        .sort_by(|a, b| a.name().cmp(b.name()))
        .from_path(&output)?;

    let step = StepBuilder::<Row, Row>::new("convert cars")
        .reader(&reader)
        .writer(&writer)
        .pass_through()
        .chunk(10)
        .build()?;
    step.execute()?;

    print!("{}", fs::read_to_string(&output)?);

    Ok(())
}
