//! Escape/quote-aware field splitting and its inverse.
//!
//! [`split`] runs a four-state machine over the characters of one line:
//!
//! | State         | quote        | escape              | split            | other  |
//! |---------------|--------------|---------------------|------------------|--------|
//! | `Normal`      | → `Quote`    | → `Escape`          | emit field       | append |
//! | `Quote`       | → `Normal`   | → `QuoteEscape`     | append           | append |
//! | `Escape`      | append, → `Normal` | append, → `Normal` | append, → `Normal` | decode letter or fail |
//! | `QuoteEscape` | append, → `Quote`  | append, → `Quote`  | append, → `Quote`  | decode letter or fail |
//!
//! [`escape`] produces text that [`split`] reads back unchanged, so for every
//! dialect and every string `s`, `split(&escape(s))[0] == s`.

use std::mem;

use crate::error::TokenError;

use super::dialect::{CONTROL_ESCAPES, Dialect, LITERAL_LETTERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    Quote,
    QuoteEscape,
}

/// Splits one logical line into its fields.
///
/// # Errors
///
/// - [`TokenError::InvalidEscape`] when the escape character is followed by
///   a character that is neither significant nor a control-escape letter
/// - [`TokenError::UnterminatedEscape`] when the line ends right after the
///   escape character
/// - [`TokenError::UnterminatedQuote`] when the line ends inside a quotation
///
/// Positions are zero-based character offsets in `line`.
pub fn split(line: &str, dialect: &Dialect) -> Result<Vec<String>, TokenError> {
    let quote = dialect.quote_char();
    let escape = dialect.escape_char();
    let separator = dialect.split_char();
    let skip_leading_space = dialect.ignore_leading_space();

    let mut fields = Vec::new();
    let mut buffer = String::new();
    let mut state = State::Normal;
    let mut at_field_start = true;
    let mut escape_at = 0;
    let mut quote_at = 0;

    for (position, c) in line.chars().enumerate() {
        state = match state {
            State::Normal => {
                if Some(c) == quote {
                    quote_at = position;
                    at_field_start = false;
                    State::Quote
                } else if c == escape {
                    escape_at = position;
                    at_field_start = false;
                    State::Escape
                } else if c == separator {
                    fields.push(mem::take(&mut buffer));
                    at_field_start = true;
                    State::Normal
                } else if at_field_start && skip_leading_space && c == ' ' {
                    State::Normal
                } else {
                    buffer.push(c);
                    at_field_start = false;
                    State::Normal
                }
            }
            State::Escape => {
                buffer.push(unescape(c, position, dialect)?);
                State::Normal
            }
            State::QuoteEscape => {
                buffer.push(unescape(c, position, dialect)?);
                State::Quote
            }
            State::Quote => {
                if Some(c) == quote {
                    State::Normal
                } else if c == escape {
                    escape_at = position;
                    State::QuoteEscape
                } else {
                    buffer.push(c);
                    State::Quote
                }
            }
        };
    }

    match state {
        State::Normal => {
            fields.push(buffer);
            Ok(fields)
        }
        State::Escape | State::QuoteEscape => Err(TokenError::UnterminatedEscape {
            position: escape_at,
        }),
        State::Quote => Err(TokenError::UnterminatedQuote { position: quote_at }),
    }
}

fn unescape(c: char, position: usize, dialect: &Dialect) -> Result<char, TokenError> {
    if dialect.is_escapable(c) {
        return Ok(c);
    }

    if let Some(&(control, _)) = CONTROL_ESCAPES.iter().find(|&&(_, letter)| letter == c) {
        return Ok(control);
    }

    if LITERAL_LETTERS.contains(&c) {
        return Ok(c);
    }

    Err(TokenError::InvalidEscape {
        character: c,
        position,
    })
}

/// Escapes one field so that it survives a trip through [`split`].
///
/// Control characters become the escape character followed by their letter;
/// the escape, split and quote characters are prefixed with the escape
/// character. A leading comment marker, and a leading space when the dialect
/// drops leading spaces, are escaped as well.
pub fn escape(text: &str, dialect: &Dialect) -> String {
    let escape = dialect.escape_char();
    let mut escaped = String::with_capacity(text.len() + 2);

    for (i, c) in text.chars().enumerate() {
        if let Some(&(_, letter)) = CONTROL_ESCAPES.iter().find(|&&(control, _)| control == c) {
            escaped.push(escape);
            escaped.push(letter);
        } else if dialect.is_significant(c) || (i == 0 && needs_leading_escape(c, dialect)) {
            escaped.push(escape);
            escaped.push(c);
        } else {
            escaped.push(c);
        }
    }

    escaped
}

fn needs_leading_escape(c: char, dialect: &Dialect) -> bool {
    dialect.comment_char() == Some(c) || (c == ' ' && dialect.ignore_leading_space())
}

/// Escapes every field and joins them with the dialect's split character.
pub fn join<I, S>(fields: I, dialect: &Dialect) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(dialect.split_char());
        }
        line.push_str(&escape(field.as_ref(), dialect));
    }
    line
}

#[cfg(test)]
mod tests {
    use rand::distr::{Alphanumeric, SampleString};

    use super::*;

    fn quoted() -> Dialect {
        Dialect::builder()
            .escape('/')
            .quote('\'')
            .split(':')
            .build()
            .unwrap()
    }

    #[test]
    fn splits_plain_fields() {
        let dialect = Dialect::default();
        assert_eq!(split("1,DEAN", &dialect).unwrap(), vec!["1", "DEAN"]);
        assert_eq!(split("", &dialect).unwrap(), vec![""]);
        assert_eq!(split(",,", &dialect).unwrap(), vec!["", "", ""]);
    }

    #[test]
    fn escaped_quote_inside_quotation_is_literal() {
        let fields = split("1:'2/'3'", &quoted()).unwrap();
        assert_eq!(fields, vec!["1", "2'3"]);
    }

    #[test]
    fn split_character_inside_quotation_is_literal() {
        let fields = split("'a:b':c", &quoted()).unwrap();
        assert_eq!(fields, vec!["a:b", "c"]);
    }

    #[test]
    fn control_letters_are_decoded() {
        let dialect = Dialect::default();
        let fields = split(r"a\tb,c\nd,\\,\,", &dialect).unwrap();
        assert_eq!(fields, vec!["a\tb", "c\nd", "\\", ","]);
    }

    #[test]
    fn unknown_escape_fails_with_position() {
        let error = split(r"ab,\x", &Dialect::default()).unwrap_err();
        assert_eq!(
            error,
            TokenError::InvalidEscape {
                character: 'x',
                position: 4
            }
        );
    }

    #[test]
    fn dangling_escape_fails() {
        let error = split(r"ab\", &Dialect::default()).unwrap_err();
        assert_eq!(error, TokenError::UnterminatedEscape { position: 2 });

        let error = split("'ab/", &quoted()).unwrap_err();
        assert_eq!(error, TokenError::UnterminatedEscape { position: 3 });
    }

    #[test]
    fn open_quotation_fails() {
        let error = split("x:'abc", &quoted()).unwrap_err();
        assert_eq!(error, TokenError::UnterminatedQuote { position: 2 });
    }

    #[test]
    fn quote_is_ordinary_when_quoting_is_disabled() {
        let fields = split("'a,b'", &Dialect::default()).unwrap();
        assert_eq!(fields, vec!["'a", "b'"]);
    }

    #[test]
    fn leading_spaces_are_dropped_when_configured() {
        let dialect = Dialect::builder().ignore_leading_space(true).build().unwrap();
        assert_eq!(split("a,  b , c", &dialect).unwrap(), vec!["a", "b ", "c"]);
        assert_eq!(split(r"\  b", &dialect).unwrap(), vec!["  b"]);
    }

    #[test]
    fn escape_prefixes_significant_characters() {
        assert_eq!(escape("a,b\\c\n", &Dialect::default()), r"a\,b\\c\n");
        assert_eq!(escape("2'3:", &quoted()), "2/'3/:");
        assert_eq!(escape("#tag", &Dialect::default()), r"\#tag");
        assert_eq!(escape("a#b", &Dialect::default()), "a#b");
    }

    fn assert_no_bare_significant(escaped: &str, dialect: &Dialect) {
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == dialect.escape_char() {
                assert!(chars.next().is_some(), "escape at end of {:?}", escaped);
            } else {
                assert!(!dialect.is_significant(c), "bare {:?} in {:?}", c, escaped);
            }
        }
    }

    #[test]
    fn escape_never_leaves_significant_characters_bare() {
        let dialect = quoted();
        assert_no_bare_significant(&escape("/:'x'/:", &dialect), &dialect);
    }

    #[test]
    fn join_round_trips_random_text() {
        let dialects = vec![
            Dialect::default(),
            quoted(),
            Dialect::builder().split('\t').quote('"').build().unwrap(),
            Dialect::builder()
                .split(' ')
                .quote('\'')
                .ignore_leading_space(true)
                .build()
                .unwrap(),
            Dialect::builder().ignore_leading_space(true).build().unwrap(),
        ];

        for _ in 0..200 {
            let text: String = Alphanumeric
                .sample_string(&mut rand::rng(), 24)
                .chars()
                .map(|c| match c {
                    'a' => ',',
                    'b' => '\\',
                    'c' => '\'',
                    'd' => '\n',
                    'e' => ' ',
                    'f' => '#',
                    'g' => '\t',
                    'h' => '"',
                    'i' => '/',
                    'j' => ':',
                    'k' => '\r',
                    other => other,
                })
                .collect();

            for dialect in &dialects {
                assert_no_bare_significant(&escape(&text, dialect), dialect);

                let line = join([text.as_str(), "tail"], dialect);
                let fields = split(&line, dialect).unwrap();
                assert_eq!(fields, vec![text.as_str(), "tail"], "dialect {:?}", dialect);
            }
        }
    }
}
