use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DialectError, TokenError};

use super::tokenizer;

pub const DEFAULT_ESCAPE: char = '\\';
pub const DEFAULT_SPLIT: char = ',';
pub const DEFAULT_COMMENT: char = '#';

/// Control characters and the letter that encodes each of them after the
/// escape character.
pub(crate) const CONTROL_ESCAPES: [(char, char); 5] = [
    ('\u{8}', 'b'),
    ('\t', 't'),
    ('\n', 'n'),
    ('\u{c}', 'f'),
    ('\r', 'r'),
];

/// Letters that decode to themselves after the escape character, whatever
/// the dialect.
pub(crate) const LITERAL_LETTERS: [char; 3] = ['"', '\'', '\\'];

const LINE_TERMINATORS: [char; 2] = ['\n', '\r'];

/// The escape/quote/split configuration governing tokenization.
///
/// A dialect is immutable once built and is meant to be shared (usually
/// behind an `Arc`) by every reader and writer of a session.
///
/// # Examples
///
/// ```
/// use fluent_csv_rs::core::dialect::Dialect;
///
/// let dialect = Dialect::builder()
///     .escape('/')
///     .quote('\'')
///     .split(':')
///     .build()
///     .unwrap();
///
/// assert_eq!(dialect.split_line("1:'2/'3'").unwrap(), vec!["1", "2'3"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DialectConfig", into = "DialectConfig")]
pub struct Dialect {
    escape: char,
    quote: Option<char>,
    split: char,
    comment: Option<char>,
    ignore_leading_space: bool,
    /// Characters that must be prefixed with the escape character to be
    /// read literally.
    significant: Vec<char>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE, None, DEFAULT_SPLIT, Some(DEFAULT_COMMENT), false)
    }
}

impl Dialect {
    pub fn builder() -> DialectBuilder {
        DialectBuilder::new()
    }

    fn new(
        escape: char,
        quote: Option<char>,
        split: char,
        comment: Option<char>,
        ignore_leading_space: bool,
    ) -> Self {
        let mut significant = vec![escape, split];
        significant.extend(quote);

        Self {
            escape,
            quote,
            split,
            comment,
            ignore_leading_space,
            significant,
        }
    }

    pub fn escape_char(&self) -> char {
        self.escape
    }

    /// The quote character, `None` when quoting is disabled.
    pub fn quote_char(&self) -> Option<char> {
        self.quote
    }

    pub fn split_char(&self) -> char {
        self.split
    }

    pub fn comment_char(&self) -> Option<char> {
        self.comment
    }

    pub fn ignore_leading_space(&self) -> bool {
        self.ignore_leading_space
    }

    /// Whether `line` is a comment line under this dialect.
    pub fn is_comment(&self, line: &str) -> bool {
        match self.comment {
            Some(marker) => line.starts_with(marker),
            None => false,
        }
    }

    /// Whether `c` is read literally when it follows the escape character.
    pub(crate) fn is_escapable(&self, c: char) -> bool {
        self.significant.contains(&c)
            || self.comment == Some(c)
            || (self.ignore_leading_space && c == ' ')
    }

    /// Whether `c` must be escaped wherever it appears in a field.
    pub(crate) fn is_significant(&self, c: char) -> bool {
        self.significant.contains(&c)
    }

    /// Splits one line into its fields. See [`tokenizer::split`].
    pub fn split_line(&self, line: &str) -> Result<Vec<String>, TokenError> {
        tokenizer::split(line, self)
    }

    /// Escapes one field. See [`tokenizer::escape`].
    pub fn escape(&self, text: &str) -> String {
        tokenizer::escape(text, self)
    }

    /// Escapes every field and joins them with the split character.
    pub fn join<I, S>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokenizer::join(fields, self)
    }
}

/// Serializable form of a [`Dialect`], validated when converted.
///
/// Missing fields take the default dialect's values, so a configuration file
/// only needs to name what differs:
///
/// ```
/// use fluent_csv_rs::core::dialect::{Dialect, DialectConfig};
///
/// let config = DialectConfig {
///     split: ';',
///     ..DialectConfig::default()
/// };
/// let dialect = Dialect::try_from(config).unwrap();
/// assert_eq!(dialect.split_char(), ';');
/// assert_eq!(dialect.escape_char(), '\\');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    pub escape: char,
    pub quote: Option<char>,
    pub split: char,
    pub comment: Option<char>,
    pub ignore_leading_space: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            escape: DEFAULT_ESCAPE,
            quote: None,
            split: DEFAULT_SPLIT,
            comment: Some(DEFAULT_COMMENT),
            ignore_leading_space: false,
        }
    }
}

impl TryFrom<DialectConfig> for Dialect {
    type Error = DialectError;

    fn try_from(config: DialectConfig) -> Result<Self, Self::Error> {
        Dialect::builder()
            .escape(config.escape)
            .optional_quote(config.quote)
            .split(config.split)
            .optional_comment(config.comment)
            .ignore_leading_space(config.ignore_leading_space)
            .build()
    }
}

impl From<Dialect> for DialectConfig {
    fn from(dialect: Dialect) -> Self {
        Self {
            escape: dialect.escape,
            quote: dialect.quote,
            split: dialect.split,
            comment: dialect.comment,
            ignore_leading_space: dialect.ignore_leading_space,
        }
    }
}

/// A builder for configuring a [`Dialect`].
///
/// # Default Configuration
///
/// - Escape: backslash (`\`)
/// - Quote: disabled
/// - Split: comma (`,`)
/// - Comment: `#`
/// - Leading spaces: kept
#[derive(Debug, Clone)]
pub struct DialectBuilder {
    config: DialectConfig,
}

impl Default for DialectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectBuilder {
    pub fn new() -> Self {
        Self {
            config: DialectConfig::default(),
        }
    }

    pub fn escape(mut self, escape: char) -> Self {
        self.config.escape = escape;
        self
    }

    /// Enables quoting with the given quote character.
    pub fn quote(mut self, quote: char) -> Self {
        self.config.quote = Some(quote);
        self
    }

    /// Disables quoting.
    pub fn no_quote(mut self) -> Self {
        self.config.quote = None;
        self
    }

    pub fn optional_quote(mut self, quote: Option<char>) -> Self {
        self.config.quote = quote;
        self
    }

    pub fn split(mut self, split: char) -> Self {
        self.config.split = split;
        self
    }

    /// Sets the marker of comment lines.
    pub fn comment(mut self, comment: char) -> Self {
        self.config.comment = Some(comment);
        self
    }

    /// Disables comment lines: every line is data.
    pub fn no_comment(mut self) -> Self {
        self.config.comment = None;
        self
    }

    pub fn optional_comment(mut self, comment: Option<char>) -> Self {
        self.config.comment = comment;
        self
    }

    /// When enabled, spaces at the start of an unquoted field are dropped.
    pub fn ignore_leading_space(mut self, yes: bool) -> Self {
        self.config.ignore_leading_space = yes;
        self
    }

    /// Validates the configuration and builds the dialect.
    ///
    /// # Errors
    ///
    /// - [`DialectError::Collision`] when two of the escape, quote, split and
    ///   comment characters are equal
    /// - [`DialectError::ReservedCharacter`] when a delimiter or the comment
    ///   marker is a line terminator or a control-escape letter (`b`, `t`,
    ///   `n`, `f`, `r`)
    pub fn build(self) -> Result<Dialect, DialectError> {
        let DialectConfig {
            escape,
            quote,
            split,
            comment,
            ignore_leading_space,
        } = self.config;

        let mut roles = vec![("escape", escape), ("split", split)];
        roles.extend(quote.map(|q| ("quote", q)));
        // The comment marker is escapable, so it can't be a control letter either.
        roles.extend(comment.map(|c| ("comment", c)));

        for &(role, character) in &roles {
            let is_letter = CONTROL_ESCAPES.iter().any(|&(_, letter)| letter == character);
            if is_letter || LINE_TERMINATORS.contains(&character) {
                return Err(DialectError::ReservedCharacter { role, character });
            }
        }

        for (i, &(first, a)) in roles.iter().enumerate() {
            if let Some(&(second, _)) = roles[i + 1..].iter().find(|(_, b)| *b == a) {
                return Err(DialectError::Collision {
                    first,
                    second,
                    character: a,
                });
            }
        }

        let dialect = Dialect::new(escape, quote, split, comment, ignore_leading_space);
        debug!("Dialect built: {:?}", dialect);
        Ok(dialect)
    }
}
