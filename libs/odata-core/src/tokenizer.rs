//! Cursor tokenizer for path segments and query option text
//!
//! A `Tokenizer` consumes a borrowed string left to right. Callers that need
//! to try a tentative parse save the position with [`Tokenizer::pos`] and
//! unwind with [`Tokenizer::seek`], committing only on full success. All
//! failures carry the offending position.

use crate::error::Error;
use crate::value::{PrimitiveKind, PrimitiveValue};

#[derive(Debug)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte position of the cursor.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor to a previously saved position.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// True once the entire input has been consumed.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !keep(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += end;
        &rest[..end]
    }

    /// Consume one literal character if it is next.
    pub fn maybe_char(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume a well-formed name token, or return `None` without moving.
    pub fn maybe_identifier(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let first = rest.chars().next()?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return None;
        }
        Some(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    /// Consume a well-formed name token, or fail at the current position.
    ///
    /// # Errors
    /// `Error::Syntax` when the next character cannot start an identifier.
    pub fn match_identifier(&mut self) -> Result<&'a str, Error> {
        let pos = self.pos;
        self.maybe_identifier().ok_or_else(|| Error::Syntax {
            pos,
            message: "expected identifier".to_owned(),
        })
    }

    /// Consume a balanced `(`…`)` pair starting at the cursor and return the
    /// text between the parentheses. Nested pairs and single-quoted strings
    /// inside the expression are respected.
    ///
    /// # Errors
    /// `Error::Syntax` when the cursor is not at `(` or the pair never closes.
    pub fn matching_parenthesis(&mut self) -> Result<&'a str, Error> {
        let start = self.pos;
        if !self.maybe_char('(') {
            return Err(Error::Syntax {
                pos: start,
                message: "expected '('".to_owned(),
            });
        }
        let inner_start = self.pos;
        let mut depth = 1usize;
        let mut in_quote = false;
        for (i, c) in self.input[inner_start..].char_indices() {
            match c {
                '\'' => in_quote = !in_quote,
                '(' if !in_quote => depth += 1,
                ')' if !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = inner_start + i + 1;
                        return Ok(&self.input[inner_start..inner_start + i]);
                    }
                }
                _ => {}
            }
        }
        Err(Error::Syntax {
            pos: start,
            message: "unbalanced parenthesis".to_owned(),
        })
    }

    /// Consume and parse a literal according to the expected property type.
    ///
    /// String literals may be single-quoted (with `''` escaping an embedded
    /// quote) or bare, in which case the remainder of the input is taken
    /// verbatim.
    ///
    /// # Errors
    /// `Error::TypeMismatch` naming the expected type on malformed input;
    /// `Error::Syntax` on an unterminated quoted string.
    pub fn typed_value(&mut self, kind: PrimitiveKind) -> Result<PrimitiveValue, Error> {
        let start = self.pos;
        let mismatch = |pos| Error::TypeMismatch {
            pos,
            expected: kind,
        };
        match kind {
            PrimitiveKind::Byte => {
                let lit = self.take_while(|c| c.is_ascii_digit());
                lit.parse::<u8>()
                    .map(PrimitiveValue::Byte)
                    .map_err(|_| mismatch(start))
            }
            PrimitiveKind::Int32 => {
                let lit = self.take_while(|c| c == '-' || c.is_ascii_digit());
                lit.parse::<i32>()
                    .map(PrimitiveValue::Int32)
                    .map_err(|_| mismatch(start))
            }
            PrimitiveKind::Int64 => {
                let lit = self.take_while(|c| c == '-' || c.is_ascii_digit());
                lit.parse::<i64>()
                    .map(PrimitiveValue::Int64)
                    .map_err(|_| mismatch(start))
            }
            PrimitiveKind::Bool => {
                if self.rest().starts_with("true") {
                    self.pos += 4;
                    Ok(PrimitiveValue::Bool(true))
                } else if self.rest().starts_with("false") {
                    self.pos += 5;
                    Ok(PrimitiveValue::Bool(false))
                } else {
                    Err(mismatch(start))
                }
            }
            PrimitiveKind::String => self.string_literal(start),
            PrimitiveKind::Uuid => {
                let lit = self.take_while(|c| c.is_ascii_hexdigit() || c == '-');
                uuid::Uuid::parse_str(lit)
                    .map(PrimitiveValue::Uuid)
                    .map_err(|_| mismatch(start))
            }
            PrimitiveKind::DateTime => {
                let lit =
                    self.take_while(|c| c.is_ascii_alphanumeric() || "-:+.".contains(c));
                chrono::DateTime::parse_from_rfc3339(lit)
                    .map(|dt| PrimitiveValue::DateTime(dt.with_timezone(&chrono::Utc)))
                    .map_err(|_| mismatch(start))
            }
        }
    }

    fn string_literal(&mut self, start: usize) -> Result<PrimitiveValue, Error> {
        if !self.maybe_char('\'') {
            // Bare string: the remainder of the input is the value.
            let rest = self.rest();
            self.pos = self.input.len();
            return Ok(PrimitiveValue::String(rest.to_owned()));
        }
        let mut out = String::new();
        loop {
            let rest = self.rest();
            let Some(i) = rest.find('\'') else {
                return Err(Error::Syntax {
                    pos: start,
                    message: "unterminated string literal".to_owned(),
                });
            };
            out.push_str(&rest[..i]);
            self.pos += i + 1;
            // Doubled quote escapes a literal quote.
            if self.maybe_char('\'') {
                out.push('\'');
            } else {
                return Ok(PrimitiveValue::String(out));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_matching() {
        let mut tok = Tokenizer::new("Widgets(5)");
        assert_eq!(tok.maybe_identifier(), Some("Widgets"));
        assert_eq!(tok.pos(), 7);
        assert!(tok.maybe_identifier().is_none());
    }

    #[test]
    fn match_identifier_fails_with_position() {
        let mut tok = Tokenizer::new("(x)");
        assert_eq!(
            tok.match_identifier(),
            Err(Error::Syntax {
                pos: 0,
                message: "expected identifier".to_owned()
            })
        );
    }

    #[test]
    fn maybe_char_consumes_only_on_match() {
        let mut tok = Tokenizer::new("=5");
        assert!(!tok.maybe_char('@'));
        assert!(tok.maybe_char('='));
        assert_eq!(tok.pos(), 1);
    }

    #[test]
    fn matching_parenthesis_extracts_inner_text() {
        let mut tok = Tokenizer::new("(Code=ABC)/rest");
        assert_eq!(tok.matching_parenthesis().unwrap(), "Code=ABC");
        assert_eq!(tok.pos(), 10);
    }

    #[test]
    fn matching_parenthesis_respects_nesting_and_quotes() {
        let mut tok = Tokenizer::new("(a(b)c)");
        assert_eq!(tok.matching_parenthesis().unwrap(), "a(b)c");

        let mut tok = Tokenizer::new("('a)b')");
        assert_eq!(tok.matching_parenthesis().unwrap(), "'a)b'");
    }

    #[test]
    fn unbalanced_parenthesis_is_a_syntax_error() {
        let mut tok = Tokenizer::new("(abc");
        assert!(matches!(
            tok.matching_parenthesis(),
            Err(Error::Syntax { pos: 0, .. })
        ));
    }

    #[test]
    fn typed_int32_value() {
        let mut tok = Tokenizer::new("-42");
        assert_eq!(
            tok.typed_value(PrimitiveKind::Int32).unwrap(),
            PrimitiveValue::Int32(-42)
        );
        assert!(tok.finished());
    }

    #[test]
    fn typed_byte_overflow_is_a_type_mismatch() {
        let mut tok = Tokenizer::new("999");
        assert_eq!(
            tok.typed_value(PrimitiveKind::Byte),
            Err(Error::TypeMismatch {
                pos: 0,
                expected: PrimitiveKind::Byte
            })
        );
    }

    #[test]
    fn typed_bool_value() {
        let mut tok = Tokenizer::new("false");
        assert_eq!(
            tok.typed_value(PrimitiveKind::Bool).unwrap(),
            PrimitiveValue::Bool(false)
        );
    }

    #[test]
    fn bare_string_takes_the_rest() {
        let mut tok = Tokenizer::new("ABC-01");
        assert_eq!(
            tok.typed_value(PrimitiveKind::String).unwrap(),
            PrimitiveValue::from("ABC-01")
        );
        assert!(tok.finished());
    }

    #[test]
    fn quoted_string_with_escaped_quote() {
        let mut tok = Tokenizer::new("'O''Brien'");
        assert_eq!(
            tok.typed_value(PrimitiveKind::String).unwrap(),
            PrimitiveValue::from("O'Brien")
        );
        assert!(tok.finished());
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let mut tok = Tokenizer::new("'abc");
        assert!(matches!(
            tok.typed_value(PrimitiveKind::String),
            Err(Error::Syntax { pos: 0, .. })
        ));
    }

    #[test]
    fn typed_uuid_and_datetime_values() {
        let mut tok = Tokenizer::new("6f8f57e5-1db9-4c3a-9f6e-000000000001");
        assert!(matches!(
            tok.typed_value(PrimitiveKind::Uuid).unwrap(),
            PrimitiveValue::Uuid(_)
        ));

        let mut tok = Tokenizer::new("2026-01-15T10:00:00Z");
        assert!(matches!(
            tok.typed_value(PrimitiveKind::DateTime).unwrap(),
            PrimitiveValue::DateTime(_)
        ));
    }

    #[test]
    fn seek_restores_a_saved_position() {
        let mut tok = Tokenizer::new("abc=def");
        let mark = tok.pos();
        assert_eq!(tok.maybe_identifier(), Some("abc"));
        assert!(tok.maybe_char('='));
        tok.seek(mark);
        assert_eq!(
            tok.typed_value(PrimitiveKind::String).unwrap(),
            PrimitiveValue::from("abc=def")
        );
    }
}
