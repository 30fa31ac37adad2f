use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::error::CsvError;

use super::item::{DefaultProcessor, ItemProcessor, ItemReader, ItemWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkStatus {
    Finished,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Error,
}

/// Outcome of one [`Step::execute`] run.
#[derive(Debug)]
pub struct StepExecution {
    pub name: String,
    pub status: StepStatus,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub read_count: usize,
    pub process_count: usize,
    pub write_count: usize,
}

/// Moves items from a reader to a writer in chunks.
///
/// The step is fail-fast: the first read, process or write error stops it,
/// the writer is closed and the error is returned.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fluent_csv_rs::core::{
///     column::Column, row::Row, schema::Schema, step::StepBuilder, value::ValueType,
/// };
/// use fluent_csv_rs::item::csv::{
///     csv_reader::CsvRowReaderBuilder, csv_writer::CsvRowWriterBuilder,
/// };
///
/// let schema = Arc::new(
///     Schema::builder()
///         .column(Column::new("id", ValueType::Int)).unwrap()
///         .build(),
/// );
/// let reader = CsvRowReaderBuilder::new(schema.clone()).from_str("id\n1\n2\n3");
/// let writer = CsvRowWriterBuilder::new(schema).from_writer(vec![]);
///
/// let step = StepBuilder::<Row, Row>::new("copy")
///     .reader(&reader)
///     .writer(&writer)
///     .pass_through()
///     .chunk(2)
///     .build()
///     .unwrap();
/// let execution = step.execute().unwrap();
///
/// assert_eq!(execution.write_count, 3);
/// ```
pub struct Step<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    chunk_size: usize,
    read_count: Cell<usize>,
    process_count: Cell<usize>,
    write_count: Cell<usize>,
}

impl<R, W> Step<'_, R, W> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the step until the reader is exhausted or an error occurs.
    pub fn execute(&self) -> Result<StepExecution, CsvError> {
        let start = Instant::now();
        info!("Start of step: {}", self.name);

        let result = self.writer.open().and_then(|()| self.run_chunks());
        let result = result.and(self.writer.close());

        if let Err(err) = result {
            error!(
                "Step {} failed after {} item(s) read: {}",
                self.name,
                self.read_count.get(),
                err
            );
            return Err(err);
        }

        let execution = StepExecution {
            name: self.name.clone(),
            status: StepStatus::Success,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            read_count: self.read_count.get(),
            process_count: self.process_count.get(),
            write_count: self.write_count.get(),
        };
        info!(
            "End of step: {}, duration: {:?}, {} item(s) written",
            self.name, execution.duration, execution.write_count
        );
        Ok(execution)
    }

    fn run_chunks(&self) -> Result<(), CsvError> {
        let mut read_items: Vec<R> = Vec::with_capacity(self.chunk_size);

        loop {
            let status = self.read_chunk(&mut read_items)?;
            let processed_items = self.process_chunk(&read_items)?;
            self.write_chunk(&processed_items)?;

            if status == ChunkStatus::Finished {
                return Ok(());
            }
        }
    }

    fn read_chunk(&self, read_items: &mut Vec<R>) -> Result<ChunkStatus, CsvError> {
        debug!("Start reading chunk");
        read_items.clear();

        while let Some(item) = self.reader.read()? {
            read_items.push(item);
            self.read_count.set(self.read_count.get() + 1);

            if read_items.len() == self.chunk_size {
                debug!("End reading chunk: FULL");
                return Ok(ChunkStatus::Full);
            }
        }

        debug!("End reading chunk: FINISHED");
        Ok(ChunkStatus::Finished)
    }

    fn process_chunk(&self, read_items: &[R]) -> Result<Vec<W>, CsvError> {
        let processed_items = read_items
            .iter()
            .map(|item| self.processor.process(item))
            .collect::<Result<Vec<W>, CsvError>>()?;
        self.process_count
            .set(self.process_count.get() + processed_items.len());
        Ok(processed_items)
    }

    fn write_chunk(&self, processed_items: &[W]) -> Result<(), CsvError> {
        if processed_items.is_empty() {
            return Ok(());
        }

        debug!("Start writing chunk of {} item(s)", processed_items.len());
        self.writer.write(processed_items)?;
        self.writer.flush()?;
        self.write_count
            .set(self.write_count.get() + processed_items.len());
        debug!("End writing chunk");
        Ok(())
    }
}

/// A builder for configuring a [`Step`].
///
/// # Default Configuration
///
/// - Chunk size: 1
///
/// A reader, a writer and a processor are required; [`pass_through`] installs
/// [`DefaultProcessor`] when reader and writer share the item type.
///
/// [`pass_through`]: StepBuilder::pass_through
pub struct StepBuilder<'a, R, W> {
    name: String,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    chunk_size: usize,
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
        }
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<R>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<R, W>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<W>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn chunk(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// # Errors
    ///
    /// [`CsvError::Configuration`] when the reader, processor or writer is
    /// missing, or the chunk size is zero.
    pub fn build(self) -> Result<Step<'a, R, W>, CsvError> {
        let missing = |part: &str| {
            CsvError::Configuration(format!("step {} has no {}", self.name, part))
        };

        let reader = self.reader.ok_or_else(|| missing("reader"))?;
        let processor = self.processor.ok_or_else(|| missing("processor"))?;
        let writer = self.writer.ok_or_else(|| missing("writer"))?;

        if self.chunk_size == 0 {
            return Err(CsvError::Configuration(format!(
                "step {} has a chunk size of 0",
                self.name
            )));
        }

        Ok(Step {
            name: self.name,
            reader,
            processor,
            writer,
            chunk_size: self.chunk_size,
            read_count: Cell::new(0),
            process_count: Cell::new(0),
            write_count: Cell::new(0),
        })
    }
}

impl<R: Clone> StepBuilder<'_, R, R> {
    /// Uses [`DefaultProcessor`]: items are written as read.
    pub fn pass_through(mut self) -> Self {
        self.processor = Some(&DefaultProcessor);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::item::{ItemProcessorResult, ItemReaderResult, ItemWriterResult};
    use crate::error::ValueError;
    use crate::core::value::{Value, ValueType};

    struct VecReader {
        items: RefCell<Vec<i32>>,
    }

    impl VecReader {
        fn new(items: Vec<i32>) -> Self {
            let mut items = items;
            items.reverse();
            Self {
                items: RefCell::new(items),
            }
        }
    }

    impl ItemReader<i32> for VecReader {
        fn read(&self) -> ItemReaderResult<i32> {
            Ok(self.items.borrow_mut().pop())
        }
    }

    #[derive(Default)]
    struct VecWriter {
        chunks: RefCell<Vec<Vec<i32>>>,
        closed: Cell<bool>,
    }

    impl ItemWriter<i32> for VecWriter {
        fn write(&self, items: &[i32]) -> ItemWriterResult {
            self.chunks.borrow_mut().push(items.to_vec());
            Ok(())
        }

        fn close(&self) -> ItemWriterResult {
            self.closed.set(true);
            Ok(())
        }
    }

    #[test]
    fn items_are_written_in_chunks() {
        let reader = VecReader::new(vec![1, 2, 3, 4, 5]);
        let writer = VecWriter::default();

        let step = StepBuilder::new("chunks")
            .reader(&reader)
            .writer(&writer)
            .pass_through()
            .chunk(2)
            .build()
            .unwrap();
        let execution = step.execute().unwrap();

        assert_eq!(execution.status, StepStatus::Success);
        assert_eq!(execution.read_count, 5);
        assert_eq!(execution.write_count, 5);
        assert_eq!(
            *writer.chunks.borrow(),
            vec![vec![1, 2], vec![3, 4], vec![5]]
        );
        assert!(writer.closed.get());
    }

    #[test]
    fn processor_error_stops_the_step() {
        let reader = VecReader::new(vec![1, 2, 3]);
        let writer = VecWriter::default();
        let processor = |item: &i32| -> ItemProcessorResult<i32> {
            if *item == 3 {
                Err(ValueError::TypeMismatch {
                    value: Value::Int(3),
                    expected: ValueType::Text,
                }
                .into())
            } else {
                Ok(item * 10)
            }
        };

        let step = StepBuilder::new("failing")
            .reader(&reader)
            .processor(&processor)
            .writer(&writer)
            .chunk(2)
            .build()
            .unwrap();

        assert!(matches!(step.execute(), Err(CsvError::Value(_))));
        assert_eq!(*writer.chunks.borrow(), vec![vec![10, 20]]);
        assert!(writer.closed.get());
    }

    #[test]
    fn incomplete_builder_is_a_configuration_error() {
        let writer = VecWriter::default();
        let result = StepBuilder::<i32, i32>::new("no reader")
            .writer(&writer)
            .pass_through()
            .build();
        assert!(matches!(result, Err(CsvError::Configuration(ref m)) if m.contains("reader")));

        let reader = VecReader::new(vec![]);
        let result = StepBuilder::new("zero")
            .reader(&reader)
            .writer(&writer)
            .pass_through()
            .chunk(0)
            .build();
        assert!(result.is_err());
    }
}
