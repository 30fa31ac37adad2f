use std::{fmt, sync::Arc};

#[cfg(feature = "record")]
use std::any::Any;

use crate::error::ValueError;

use super::value::{Value, ValueType};

/// Converts the text of one field into a typed value.
///
/// Any `Fn(&str) -> Result<Value, ValueError>` closure is a parser, and so is
/// a [`ValueType`] (its built-in parsing rule).
pub trait ValueParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Value, ValueError>;
}

impl<F> ValueParser for F
where
    F: Fn(&str) -> Result<Value, ValueError> + Send + Sync,
{
    fn parse(&self, text: &str) -> Result<Value, ValueError> {
        self(text)
    }
}

impl ValueParser for ValueType {
    fn parse(&self, text: &str) -> Result<Value, ValueError> {
        ValueType::parse(self, text)
    }
}

/// Renders a typed value as field text. Formatters must be stateless.
pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: &Value) -> String;
}

impl<F> ValueFormatter for F
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn format(&self, value: &Value) -> String {
        self(value)
    }
}

/// The built-in formatter: the value's `Display` rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisplayFormatter;

impl ValueFormatter for DisplayFormatter {
    fn format(&self, value: &Value) -> String {
        value.to_string()
    }
}

#[derive(Clone)]
enum DefaultValue {
    Value(Value),
    /// Text run through the column's parser whenever the default is needed.
    Text(String),
    Supplier(Arc<dyn Fn() -> Value + Send + Sync>),
}

/// A named, typed column declaration.
///
/// A column knows how to parse its field text, how to format its values and
/// what to do when a field is empty or the column is absent from the input:
///
/// - a column with a default value uses it for empty fields and for a header
///   that lacks the column;
/// - an optional column may be absent from the header;
/// - a required column without default parses whatever text it gets,
///   including the empty string.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::column::Column;
/// use fluent_csv_rs::core::value::{Value, ValueType};
///
/// let id = Column::new("id", ValueType::Int);
/// assert_eq!(id.parse("42").unwrap(), Value::Int(42));
///
/// let ratio = Column::builder("ratio", ValueType::Float)
///     .optional(true)
///     .default_value(2.75)
///     .build();
/// assert_eq!(ratio.default_value().unwrap(), Some(Value::Float(2.75)));
/// ```
#[derive(Clone)]
pub struct Column {
    name: String,
    value_type: ValueType,
    parser: Arc<dyn ValueParser>,
    formatter: Arc<dyn ValueFormatter>,
    default_value: Option<DefaultValue>,
    optional: bool,
    /// Record accessors carried by a column declared by a record type.
    #[cfg(feature = "record")]
    slot: Option<Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("optional", &self.optional)
            .field("has_default", &self.default_value.is_some())
            .finish()
    }
}

impl AsRef<str> for Column {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Column {
    /// A required column with the built-in parser and formatter of its type.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Column::builder(name, value_type).build()
    }

    pub fn builder(name: impl Into<String>, value_type: ValueType) -> ColumnBuilder {
        ColumnBuilder::new(name, value_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    /// Parses field text into a value of this column's type.
    ///
    /// # Errors
    ///
    /// The parser's own [`ValueError::ParseFailure`], or
    /// [`ValueError::TypeMismatch`] when a custom parser yields a value of
    /// another type.
    pub fn parse(&self, text: &str) -> Result<Value, ValueError> {
        let value = self.parser.parse(text)?;
        self.check_type(value)
    }

    /// Formats a value of this column's type.
    ///
    /// # Errors
    ///
    /// [`ValueError::TypeMismatch`] when `value` is of another type; the
    /// formatter is not called in that case.
    pub fn format(&self, value: &Value) -> Result<String, ValueError> {
        if !value.is_instance_of(self.value_type) {
            return Err(ValueError::TypeMismatch {
                value: value.clone(),
                expected: self.value_type,
            });
        }
        Ok(self.formatter.format(value))
    }

    /// Produces the default value, `None` when the column has none.
    pub fn default_value(&self) -> Result<Option<Value>, ValueError> {
        let value = match &self.default_value {
            None => return Ok(None),
            Some(DefaultValue::Value(value)) => value.clone(),
            Some(DefaultValue::Text(text)) => self.parser.parse(text)?,
            Some(DefaultValue::Supplier(supplier)) => supplier(),
        };
        self.check_type(value).map(Some)
    }

    fn check_type(&self, value: Value) -> Result<Value, ValueError> {
        if value.is_instance_of(self.value_type) {
            Ok(value)
        } else {
            Err(ValueError::TypeMismatch {
                value,
                expected: self.value_type,
            })
        }
    }

    #[cfg(feature = "record")]
    pub(crate) fn with_slot(mut self, slot: Arc<dyn Any + Send + Sync>) -> Self {
        self.slot = Some(slot);
        self
    }

    #[cfg(feature = "record")]
    pub(crate) fn slot<S: Any>(&self) -> Option<&S> {
        self.slot.as_ref()?.downcast_ref::<S>()
    }
}

/// A builder for configuring a [`Column`].
///
/// # Default Configuration
///
/// - Parser: built-in rule of the value type
/// - Formatter: [`DisplayFormatter`]
/// - Default value: none
/// - Optional: no
pub struct ColumnBuilder {
    name: String,
    value_type: ValueType,
    parser: Option<Arc<dyn ValueParser>>,
    formatter: Option<Arc<dyn ValueFormatter>>,
    default_value: Option<DefaultValue>,
    optional: bool,
}

impl ColumnBuilder {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            parser: None,
            formatter: None,
            default_value: None,
            optional: false,
        }
    }

    /// Replaces the built-in parser.
    ///
    /// ```
    /// use fluent_csv_rs::core::column::Column;
    /// use fluent_csv_rs::core::value::{Value, ValueType};
    /// use fluent_csv_rs::error::ValueError;
    ///
    /// let percent = Column::builder("percent", ValueType::Float)
    ///     .parser(|text: &str| {
    ///         let digits = text.trim_end_matches('%');
    ///         ValueType::Float.parse(digits)
    ///     })
    ///     .build();
    ///
    /// assert_eq!(percent.parse("12.5%").unwrap(), Value::Float(12.5));
    /// ```
    pub fn parser(mut self, parser: impl ValueParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Replaces the built-in formatter.
    pub fn formatter(mut self, formatter: impl ValueFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Uses `value` for empty fields and for a header lacking the column.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Like [`default_value`](Self::default_value), the default being
    /// `text` run through the column's parser.
    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        self.default_value = Some(DefaultValue::Text(text.into()));
        self
    }

    /// Like [`default_value`](Self::default_value), the default being
    /// produced by `supplier` each time it is needed.
    pub fn default_with<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_value = Some(DefaultValue::Supplier(Arc::new(supplier)));
        self
    }

    /// Whether the column may be absent from the header.
    pub fn optional(mut self, yes: bool) -> Self {
        self.optional = yes;
        self
    }

    pub fn build(self) -> Column {
        Column {
            parser: self
                .parser
                .unwrap_or_else(|| Arc::new(self.value_type)),
            formatter: self
                .formatter
                .unwrap_or_else(|| Arc::new(DisplayFormatter)),
            name: self.name,
            value_type: self.value_type,
            default_value: self.default_value,
            optional: self.optional,
            #[cfg(feature = "record")]
            slot: None,
        }
    }
}
