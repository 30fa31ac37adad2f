//! Typed cell values.
//!
//! Every column declares a [`ValueType`]; parsers produce a [`Value`] of that
//! type and formatters consume one. [`FieldValue`] bridges values and the
//! native types stored in caller records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The type of the values a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Char,
    Text,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Char => "char",
            ValueType::Text => "text",
        };
        f.write_str(name)
    }
}

impl ValueType {
    /// Parses `text` with the built-in rule for this type.
    ///
    /// `Text` accepts anything (including the empty string), `Char` requires
    /// exactly one character, the others use the standard `FromStr`
    /// implementations without trimming.
    pub fn parse(&self, text: &str) -> Result<Value, ValueError> {
        let failure = |reason: String| ValueError::ParseFailure {
            text: text.to_string(),
            expected: *self,
            reason,
        };

        match self {
            ValueType::Bool => text
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|e| failure(e.to_string())),
            ValueType::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| failure(e.to_string())),
            ValueType::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| failure(e.to_string())),
            ValueType::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(failure("expected exactly one character".to_string())),
                }
            }
            ValueType::Text => Ok(Value::Text(text.to_string())),
        }
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Char(_) => ValueType::Char,
            Value::Text(_) => ValueType::Text,
        }
    }

    pub fn is_instance_of(&self, value_type: ValueType) -> bool {
        self.value_type() == value_type
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "{}", c),
            Value::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(Int, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_value!(Float, f32, f64);
impl_from_for_value!(Bool, bool);
impl_from_for_value!(Char, char);
impl_from_for_value!(Text, String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Conversion between [`Value`]s and the native types of record members.
///
/// `Option<T>` maps to an absent value, which lets optional columns land in
/// optional members.
pub trait FieldValue: Sized {
    fn into_value(self) -> Option<Value>;

    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// The member value standing for an absent cell, if the type has one.
    fn from_absent() -> Option<Self> {
        None
    }
}

fn mismatch(value: Value, expected: ValueType) -> ValueError {
    ValueError::TypeMismatch { value, expected }
}

macro_rules! impl_field_value_for_int {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                fn into_value(self) -> Option<Value> {
                    Some(Value::Int(self.into()))
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$t>::try_from(i).map_err(|_| ValueError::OutOfRange {
                            value: Value::Int(i),
                            target: stringify!($t),
                        }),
                        other => Err(mismatch(other, ValueType::Int)),
                    }
                }
            }
        )*
    };
}

impl_field_value_for_int!(i8, i16, i32, i64, u8, u16, u32);

impl FieldValue for f64 {
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(mismatch(other, ValueType::Float)),
        }
    }
}

impl FieldValue for f32 {
    fn into_value(self) -> Option<Value> {
        Some(Value::Float(self.into()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f as f32),
            other => Err(mismatch(other, ValueType::Float)),
        }
    }
}

impl FieldValue for bool {
    fn into_value(self) -> Option<Value> {
        Some(Value::Bool(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(other, ValueType::Bool)),
        }
    }
}

impl FieldValue for char {
    fn into_value(self) -> Option<Value> {
        Some(Value::Char(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(mismatch(other, ValueType::Char)),
        }
    }
}

impl FieldValue for String {
    fn into_value(self) -> Option<Value> {
        Some(Value::Text(self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(other, ValueType::Text)),
        }
    }
}

impl FieldValue for Value {
    fn into_value(self) -> Option<Value> {
        Some(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn into_value(self) -> Option<Value> {
        self.and_then(FieldValue::into_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Some)
    }

    fn from_absent() -> Option<Self> {
        Some(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parsers_follow_the_declared_type() {
        assert_eq!(ValueType::Int.parse("42"), Ok(Value::Int(42)));
        assert_eq!(ValueType::Float.parse("2.5"), Ok(Value::Float(2.5)));
        assert_eq!(ValueType::Bool.parse("true"), Ok(Value::Bool(true)));
        assert_eq!(ValueType::Char.parse("x"), Ok(Value::Char('x')));
        assert_eq!(ValueType::Text.parse(""), Ok(Value::Text(String::new())));
    }

    #[test]
    fn malformed_text_is_a_parse_failure() {
        for (value_type, text) in [
            (ValueType::Int, "1948d"),
            (ValueType::Int, ""),
            (ValueType::Float, "pi"),
            (ValueType::Bool, "yes"),
            (ValueType::Char, "ab"),
        ] {
            match value_type.parse(text) {
                Err(ValueError::ParseFailure { expected, .. }) => assert_eq!(expected, value_type),
                other => panic!("expected parse failure for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn integers_narrow_with_range_check() {
        assert_eq!(i32::from_value(Value::Int(7)), Ok(7));
        assert!(matches!(
            u8::from_value(Value::Int(300)),
            Err(ValueError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            i64::from_value(Value::Text("1".to_string())),
            Err(ValueError::TypeMismatch { expected: ValueType::Int, .. })
        ));
    }

    #[test]
    fn options_map_absence() {
        assert_eq!(Option::<String>::from_absent(), Some(None));
        assert_eq!(String::from_absent(), None);
        assert_eq!(Option::<i32>::None.into_value(), None);
        assert_eq!(Some(3_i32).into_value(), Some(Value::Int(3)));
    }

    #[test]
    fn display_renders_plain_text() {
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Text("WEN-ZHE".to_string()).to_string(), "WEN-ZHE");
        assert_eq!(ValueType::Text.to_string(), "text");
    }
}
