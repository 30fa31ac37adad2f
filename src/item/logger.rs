use std::{cell::Cell, fmt::Debug};

use log::{Level, log};

use crate::core::item::{ItemWriter, ItemWriterResult};

/// Logs every item it is given instead of writing it anywhere.
///
/// Items are logged in their `Debug` form, numbered from 1, at `info` level
/// unless configured otherwise.
///
/// # Examples
///
/// ```
/// use log::Level;
/// use fluent_csv_rs::core::item::ItemWriter;
/// use fluent_csv_rs::item::logger::LoggerWriter;
///
/// let writer = LoggerWriter::new().level(Level::Debug).label("person");
/// writer.write(&["DEAN", "WEN-ZHE"]).unwrap();
/// assert_eq!(writer.count(), 2);
/// ```
#[derive(Debug)]
pub struct LoggerWriter {
    level: Level,
    label: String,
    count: Cell<usize>,
}

impl Default for LoggerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerWriter {
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            label: "Record".to_string(),
            count: Cell::new(0),
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Prefix of every logged line.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Number of items logged so far.
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, items: &[T]) -> ItemWriterResult {
        for item in items {
            self.count.set(self.count.get() + 1);
            log!(self.level, "{} #{}: {:?}", self.label, self.count.get(), item);
        }
        Ok(())
    }
}
