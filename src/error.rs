use std::io;

use thiserror::Error;

use crate::core::value::{Value, ValueType};

/// Errors raised while building a [`Dialect`](crate::core::dialect::Dialect).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialectError {
    /// Two delimiter roles share the same character.
    #[error("{first} and {second} characters must differ, both are {character:?}")]
    Collision {
        first: &'static str,
        second: &'static str,
        character: char,
    },

    /// A delimiter uses a character the tokenizer reserves for itself.
    #[error("{role} character {character:?} is reserved")]
    ReservedCharacter { role: &'static str, character: char },
}

/// Errors raised while splitting a line into fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("line ends inside an escape sequence started at position {position}")]
    UnterminatedEscape { position: usize },

    #[error("line ends inside a quotation opened at position {position}")]
    UnterminatedQuote { position: usize },

    #[error("invalid escape {character:?} at position {position}")]
    InvalidEscape { character: char, position: usize },
}

/// Errors raised by schema construction and header resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("column {0} already exists")]
    DuplicateColumn(String),

    #[error("column [{}] not found", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column {column} has an invalid default: {source}")]
    InvalidDefault { column: String, source: ValueError },
}

/// Errors raised while converting between text and typed values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("can't parse {text:?} as {expected}: {reason}")]
    ParseFailure {
        text: String,
        expected: ValueType,
        reason: String,
    },

    #[error("{value} is not instance of {expected}")]
    TypeMismatch { value: Value, expected: ValueType },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: Value, target: &'static str },
}

/// Errors raised while binding rows to records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("can't find property for column {0}")]
    NoAccessor(String),

    #[error("can't construct record: {0}")]
    ConstructionFailure(String),
}

#[derive(Error, Debug)]
/// Crate-level error, every fallible operation returns it.
pub enum CsvError {
    #[error(transparent)]
    Dialect(#[from] DialectError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl CsvError {
    /// Returns `true` for errors raised before any row could be produced:
    /// dialect, schema and configuration errors.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            CsvError::Dialect(_) | CsvError::Schema(_) | CsvError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_name() {
        let error = SchemaError::MissingColumns(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(error.to_string(), "column [a, b] not found");
    }

    #[test]
    fn type_mismatch_message_names_value_and_type() {
        let error = ValueError::TypeMismatch {
            value: Value::Text("x".to_string()),
            expected: ValueType::Int,
        };
        assert!(error.to_string().contains("instance of"));
    }

    #[test]
    fn setup_errors_are_distinguished_from_row_errors() {
        let setup: CsvError = SchemaError::DuplicateColumn("a".to_string()).into();
        let row: CsvError = TokenError::UnterminatedQuote { position: 0 }.into();
        assert!(setup.is_setup_error());
        assert!(!row.is_setup_error());
    }

    #[test]
    fn invalid_default_keeps_its_value_error() {
        let source = ValueError::ParseFailure {
            text: "2.5x".to_string(),
            expected: ValueType::Float,
            reason: "invalid float literal".to_string(),
        };
        let error = SchemaError::InvalidDefault {
            column: "price".to_string(),
            source: source.clone(),
        };
        assert_eq!(error.clone(), error);
        assert!(error.to_string().starts_with("column price has an invalid default"));
        assert_eq!(
            std::error::Error::source(&error).map(|e| e.to_string()),
            Some(source.to_string())
        );
    }
}
