//! Byte cursor over an in-memory tree description.
//!
//! This module provides [ByteParser] with peeking, consuming, comment skipping
//! and quote-aware label parsing, the building blocks of the Newick reader.

use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser for ASCII text with support for peeking and consuming.
///
/// The parser owns its input and assumes ASCII; non-ASCII bytes are only ever
/// copied into labels.
///
/// # Features
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single quotes, `''` escapes a quote)
/// - Numeric token scanning for edge lengths
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use prunewick::parser::byte_parser::ByteParser;
///
/// let mut parser = ByteParser::from_str("  [comment] ('Wilson''s':0.5)");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b"(),:;").unwrap(), "Wilson's");
/// ```
pub struct ByteParser {
    input: Vec<u8>,
    pos: usize,
}

impl ByteParser {
    /// Creates a new `ByteParser` from a byte slice by copying it into a Vec.
    pub fn from_bytes(input: &[u8]) -> Self {
        Self { input: input.to_vec(), pos: 0 }
    }

    /// Creates a new `ByteParser` from a string by copying it into a Vec.
    pub fn from_str(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips (consumes) all consecutive ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skips (consumes) a square-bracket comment if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment starts with `[` but doesn't have a closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        while let Some(b) = self.next() {
            if b == b']' {
                return Ok(true);
            }
        }
        Err(ParsingError::unclosed_comment(self))
    }

    /// Skips (consumes) all consecutive whitespace and comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Checks if the current byte equals `ch`.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it equals `ch`.
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        let end = (self.pos + k).min(self.input.len());
        let start = self.pos.min(end);
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// Leading whitespace and comments are skipped. Whitespace inside a quoted
    /// label is kept, but each whitespace byte becomes a single space.
    ///
    /// # Arguments
    /// * `delimiters` - Bytes that end an unquoted label (whitespace always does)
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek_is(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a quoted label; the parser must be positioned at the opening quote.
    fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next(); // opening '

        let mut label = String::new();
        loop {
            match self.next() {
                None => return Err(ParsingError::unclosed_quote(self)),
                Some(b'\'') => {
                    if self.consume_if(b'\'') {
                        label.push('\'');
                    } else {
                        return Ok(label);
                    }
                }
                Some(b) if b.is_ascii_whitespace() => label.push(' '),
                Some(b) => label.push(b as char),
            }
        }
    }

    /// Parses an unquoted label until a delimiter or whitespace.
    fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let mut label = String::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) || b.is_ascii_whitespace() {
                break;
            }
            label.push(b as char);
            self.pos += 1;
        }
        label
    }

    /// Consumes a run of bytes that may form a floating point number
    /// (digits, `.`, `-`, `+`, `e`, `E`) and returns it.
    pub fn parse_number_token(&mut self) -> String {
        let mut token = String::new();
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                token.push(b as char);
                self.pos += 1;
            } else {
                break;
            }
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_nested_whitespace_and_comments() {
        let mut parser = ByteParser::from_str(" \n[a] [b]\t(");
        parser.skip_comment_and_whitespace().unwrap();
        assert_eq!(parser.peek(), Some(b'('));
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let mut parser = ByteParser::from_str("[never closed");
        assert!(parser.skip_comment_and_whitespace().is_err());
    }

    #[test]
    fn quoted_label_with_escape_and_space() {
        let mut parser = ByteParser::from_str("'Great spotted''s kiwi':1");
        assert_eq!(parser.parse_label(b":,()").unwrap(), "Great spotted's kiwi");
        assert_eq!(parser.peek(), Some(b':'));
    }

    #[test]
    fn unquoted_label_stops_at_delimiter() {
        let mut parser = ByteParser::from_str("Apteryx_owenii,B");
        assert_eq!(parser.parse_label(b",():;").unwrap(), "Apteryx_owenii");
        assert!(parser.consume_if(b','));
    }

    #[test]
    fn unclosed_quote_is_an_error() {
        let mut parser = ByteParser::from_str("'open");
        assert!(parser.parse_label(b",").is_err());
    }

    #[test]
    fn number_token_accepts_scientific_notation() {
        let mut parser = ByteParser::from_str("1.5e-10,");
        assert_eq!(parser.parse_number_token(), "1.5e-10");
        assert_eq!(parser.peek(), Some(b','));
    }
}
