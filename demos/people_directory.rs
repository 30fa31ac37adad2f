use std::env::temp_dir;

use anyhow::Result;
use fluent_csv_rs::{
    core::{
        column::Column,
        dialect::Dialect,
        item::{ItemProcessor, ItemProcessorResult},
        step::StepBuilder,
        value::ValueType,
    },
    item::{
        logger::LoggerWriter,
        record::{
            Members, Record, record_reader::RecordReaderBuilder,
            record_writer::RecordWriterBuilder,
        },
    },
};

#[derive(Debug, Default, Clone)]
struct Person {
    first_name: String,
    last_name: String,
    email: Option<String>,
    age: u8,
    active: bool,
}

impl Person {
    fn set_age(&mut self, age: u8) {
        self.age = age;
    }

    fn get_age(&self) -> u8 {
        self.age
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Record for Person {
    fn describe(members: &mut Members<Self>) {
        members
            .initializer(Person::default)
            .column(
                Column::new("firstName", ValueType::Text),
                |p| p.first_name.clone(),
                |p, v| p.first_name = v,
            )
            .column(
                Column::new("lastName", ValueType::Text),
                |p| p.last_name.clone(),
                |p, v| p.last_name = v,
            )
            .column(
                Column::builder("email", ValueType::Text)
                    .optional(true)
                    .build(),
                |p| p.email.clone(),
                |p, v| p.email = v,
            )
            .method_get("get_age", Person::get_age)
            .method_set("set_age", Person::set_age)
            .method_get("is_active", Person::is_active)
            .field("active", |p| p.active, |p, v| p.active = v);
    }

    fn dialect() -> Option<Dialect> {
        Dialect::builder().split('|').quote('"').build().ok()
    }
}

struct Anonymizer;

impl ItemProcessor<Person, Person> for Anonymizer {
    fn process(&self, item: &Person) -> ItemProcessorResult<Person> {
        let initial = item.last_name.chars().next().unwrap_or('?');
        Ok(Person {
            last_name: format!("{}.", initial),
            email: None,
            ..item.clone()
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let extra = fluent_csv_rs::core::schema::Schema::builder()
        .column(Column::new("age", ValueType::Int))?
        .column(
            Column::builder("active", ValueType::Bool)
                .optional(true)
                .default_value(true)
                .build(),
        )?
        .build();

    let csv = "\
# directory export
firstName|lastName|email|age|active
Dean|Martin|dean@example.com|42|true
Wen-Zhe|Lin||37|
\"Ann|Marie\"|Smith|ann@example.com|29|false
";

    // Log every person as read
    let reader = RecordReaderBuilder::<Person>::new()
        .schema(extra.clone())
        .from_str(csv)?;
    let logger = LoggerWriter::new().label("Person");

    let step = StepBuilder::<Person, Person>::new("log people")
        .reader(&reader)
        .writer(&logger)
        .pass_through()
        .chunk(2)
        .build()?;
    step.execute()?;

    // Write an anonymized copy
    let reader = RecordReaderBuilder::<Person>::new()
        .schema(extra.clone())
        .from_str(csv)?;
    let path = temp_dir().join("people_anonymized.csv");
    let writer = RecordWriterBuilder::<Person>::new()
        .schema(extra)
        .from_path(&path)?;

    let step = StepBuilder::new("anonymize")
        .reader(&reader)
        .processor(&Anonymizer)
        .writer(&writer)
        .chunk(2)
        .build()?;
    let execution = step.execute()?;

    println!(
        "{} people written to {} in {:?}",
        execution.write_count,
        path.display(),
        execution.duration
    );

    Ok(())
}
