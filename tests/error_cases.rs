mod common;

use common::MockFile;

use std::{
    io::{self, ErrorKind},
    sync::Arc,
};

use fluent_csv_rs::{
    core::{
        column::Column,
        dialect::Dialect,
        item::{ItemReader, ItemWriter},
        row::Row,
        schema::Schema,
        step::StepBuilder,
        value::{Value, ValueType},
    },
    error::{CsvError, DialectError, SchemaError, TokenError, ValueError},
    item::csv::{csv_reader::CsvRowReaderBuilder, csv_writer::CsvRowWriterBuilder},
};

fn car_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .column(Column::new("year", ValueType::Int))
            .unwrap()
            .column(Column::new("make", ValueType::Text))
            .unwrap()
            .build(),
    )
}

#[test]
fn step_stops_at_first_unparsable_line() {
    common::init_logger();
    let csv = "year,make\n1948,Porsche\n2011d,Peugeot\n2012,Citroen\n";

    let reader = CsvRowReaderBuilder::new(car_schema()).from_str(csv);
    let writer = CsvRowWriterBuilder::new(car_schema()).from_writer(vec![]);

    let step = StepBuilder::<Row, Row>::new("cars")
        .reader(&reader)
        .writer(&writer)
        .pass_through()
        .chunk(10)
        .build()
        .unwrap();

    let result = step.execute();
    match result {
        Err(CsvError::Value(ValueError::ParseFailure { text, expected, .. })) => {
            assert_eq!(text, "2011d");
            assert_eq!(expected, ValueType::Int);
        }
        other => panic!("expected a parse failure, got {:?}", other),
    }

    // The failing chunk is never written and nothing is read past the error.
    assert!(reader.read().unwrap().is_none());
    let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(output, "year,make\n");
}

#[test]
fn step_surfaces_sink_failure() {
    let csv = "year,make\n1948,Porsche\n2011,Peugeot\n";
    let reader = CsvRowReaderBuilder::new(car_schema()).from_str(csv);

    let mut file = MockFile::default();
    file.expect_write()
        .returning(|_buf| Err(io::Error::from(ErrorKind::PermissionDenied)));
    file.expect_flush().returning(|| Ok(()));

    let writer = CsvRowWriterBuilder::new(car_schema()).from_writer(file);

    let step = StepBuilder::<Row, Row>::new("cars")
        .reader(&reader)
        .writer(&writer)
        .pass_through()
        .chunk(1)
        .build()
        .unwrap();

    match step.execute() {
        Err(CsvError::Io(err)) => assert_eq!(err.kind(), ErrorKind::PermissionDenied),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn mismatched_value_leaves_no_partial_line() {
    let schema = car_schema();
    let writer = CsvRowWriterBuilder::new(schema.clone()).from_writer(vec![]);

    let good = Row::from_values(schema.clone(), [Value::Int(1948), Value::from("Porsche")]);
    let bad = Row::new(
        schema,
        vec![Some(Value::from("1948")), Some(Value::from("Porsche"))],
    );

    let result = writer.write(&[good, bad]);
    assert!(matches!(
        result,
        Err(CsvError::Value(ValueError::TypeMismatch {
            expected: ValueType::Int,
            ..
        }))
    ));

    let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(output, "year,make\n1948,Porsche\n");
}

#[test]
fn custom_parser_of_wrong_type_is_rejected() {
    let schema = Schema::builder()
        .column(
            Column::builder("year", ValueType::Int)
                .parser(|text: &str| -> Result<Value, ValueError> { Ok(Value::Text(text.to_string())) })
                .build(),
        )
        .unwrap()
        .build();

    let reader = CsvRowReaderBuilder::new(schema).from_str("year\n1948\n");
    assert!(matches!(
        reader.read(),
        Err(CsvError::Value(ValueError::TypeMismatch { .. }))
    ));
}

#[test]
fn malformed_lines_are_token_errors() {
    let dialect = Dialect::builder()
        .escape('/')
        .quote('\'')
        .split(':')
        .build()
        .unwrap();
    let reader = CsvRowReaderBuilder::new(car_schema())
        .dialect(dialect)
        .from_str("year:make\n1948:'Porsche\n");
    assert!(matches!(
        reader.read(),
        Err(CsvError::Token(TokenError::UnterminatedQuote { position: 5 }))
    ));

    let reader = CsvRowReaderBuilder::new(car_schema()).from_str("year,make\n1948,Pors\\qche\n");
    assert!(matches!(
        reader.read(),
        Err(CsvError::Token(TokenError::InvalidEscape { character: 'q', .. }))
    ));

    let reader = CsvRowReaderBuilder::new(car_schema()).from_str("year,make\n1948,Porsche\\\n");
    assert!(matches!(
        reader.read(),
        Err(CsvError::Token(TokenError::UnterminatedEscape { .. }))
    ));
}

#[test]
fn invalid_dialects_are_rejected() {
    assert_eq!(
        Dialect::builder().split('\\').build().unwrap_err(),
        DialectError::Collision {
            first: "escape",
            second: "split",
            character: '\\',
        }
    );
    assert_eq!(
        Dialect::builder().quote('n').build().unwrap_err(),
        DialectError::ReservedCharacter {
            role: "quote",
            character: 'n',
        }
    );
    assert!(matches!(
        Dialect::builder().comment(',').build(),
        Err(DialectError::Collision { second: "comment", .. })
    ));
}

#[test]
fn invalid_schemas_are_rejected() {
    let duplicate = Schema::builder()
        .column(Column::new("year", ValueType::Int))
        .unwrap()
        .column(Column::new("year", ValueType::Text));
    assert!(matches!(
        duplicate,
        Err(SchemaError::DuplicateColumn(name)) if name == "year"
    ));

    let bad_default = Schema::builder().column(
        Column::builder("year", ValueType::Int)
            .optional(true)
            .default_text("soon")
            .build(),
    );
    assert!(matches!(
        bad_default,
        Err(SchemaError::InvalidDefault { column, .. }) if column == "year"
    ));

    let error: CsvError = SchemaError::DuplicateColumn("year".to_string()).into();
    assert!(error.is_setup_error());
}

#[test]
fn incomplete_steps_are_not_built() {
    let reader = CsvRowReaderBuilder::new(car_schema()).from_str("year,make\n");
    let writer = CsvRowWriterBuilder::new(car_schema()).from_writer(vec![]);

    let no_writer = StepBuilder::<Row, Row>::new("cars")
        .reader(&reader)
        .pass_through()
        .build();
    assert!(matches!(no_writer, Err(CsvError::Configuration(_))));

    let no_processor = StepBuilder::<Row, Row>::new("cars")
        .reader(&reader)
        .writer(&writer)
        .build();
    assert!(matches!(no_processor, Err(CsvError::Configuration(_))));

    let empty_chunk = StepBuilder::<Row, Row>::new("cars")
        .reader(&reader)
        .writer(&writer)
        .pass_through()
        .chunk(0)
        .build();
    assert!(matches!(empty_chunk, Err(CsvError::Configuration(_))));
}

#[test]
fn empty_input_yields_no_rows() {
    let reader = CsvRowReaderBuilder::new(car_schema()).from_str("");
    assert!(reader.read().unwrap().is_none());
    assert!(reader.header().is_none());

    let reader = CsvRowReaderBuilder::new(car_schema()).from_str("# only a comment\n");
    assert!(reader.read().unwrap().is_none());
}
