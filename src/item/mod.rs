/// This module provides the schema-driven CSV row reader and writer.
pub mod csv;

#[cfg(feature = "record")]
/// This module binds CSV rows to caller-defined record types.
pub mod record;

#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful for debugging.
pub mod logger;
