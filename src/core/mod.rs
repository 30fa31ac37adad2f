/// Escape/quote/split configuration.
pub mod dialect;

/// Field splitting and escaping.
pub mod tokenizer;

pub mod value;

pub mod column;

pub mod schema;

pub mod row;

pub mod item;

pub mod step;
