use crate::error::CsvError;

/// Represents the result of reading an item from the reader.
///
/// `Ok(Some(item))` carries the next item, `Ok(None)` marks the end of the
/// stream.
pub type ItemReaderResult<R> = Result<Option<R>, CsvError>;

/// Represents the result of processing an item by the processor.
pub type ItemProcessorResult<W> = Result<W, CsvError>;

/// Represents the result of writing items by the writer.
pub type ItemWriterResult = Result<(), CsvError>;

/// A trait for reading items one at a time.
///
/// Readers keep their stream state behind interior mutability so that `read`
/// takes `&self`. Readers of this crate are fail-fast: once `read` returned an
/// error, every later call returns `Ok(None)`.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;
}

/// A trait for turning one read item into one written item.
///
/// Closures taking `&R` and returning `ItemProcessorResult<W>` are processors.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ItemProcessorResult<W>;
}

impl<R, W, F> ItemProcessor<R, W> for F
where
    F: Fn(&R) -> ItemProcessorResult<W>,
{
    fn process(&self, item: &R) -> ItemProcessorResult<W> {
        self(item)
    }
}

/// A trait for writing chunks of items.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    /// Flushes buffered output to the underlying sink.
    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once before the first chunk.
    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    /// Called once after the last chunk, also when the step failed.
    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Passes items through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProcessor;

impl<R: Clone> ItemProcessor<R, R> for DefaultProcessor {
    fn process(&self, item: &R) -> ItemProcessorResult<R> {
        Ok(item.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_processor_clones_items() {
        let item = String::from("DEAN");
        assert_eq!(DefaultProcessor.process(&item).unwrap(), "DEAN");
    }

    #[test]
    fn closures_are_processors() {
        let upper = |item: &String| -> ItemProcessorResult<String> { Ok(item.to_uppercase()) };
        assert_eq!(upper.process(&"dean".to_string()).unwrap(), "DEAN");
    }
}
