//! Chat text sanitization.
//!
//! Turns untrusted chat text into something that can sit between the double
//! quotes of a console command argument: quote characters never survive, every
//! run of whitespace collapses to a single visible marker, and `:alias:` tokens
//! are swapped for their glyph or dropped when unknown.

use std::fmt;
use std::sync::Arc;

use crate::alias::AliasTable;

/// Stands in for a collapsed word break.
pub const SPACE_MARKER: char = '␣';

/// Characters that act as a word break on their own.
pub fn is_separator_char(c: char) -> bool {
    c.is_whitespace() || c == '"' || c == '\''
}

/// Characters allowed between the colons of an alias token: anything but a colon.
pub fn is_identifier_char(c: char) -> bool {
    c != ':'
}

/// Non-empty chat text that is safe to embed in a quoted command argument.
///
/// Only [`Sanitizer::sanitize`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    aliases: Arc<AliasTable>,
}

impl Sanitizer {
    pub fn new(aliases: Arc<AliasTable>) -> Self {
        Self { aliases }
    }

    /// Sanitize raw chat text. Returns `None` when nothing worth forwarding is left.
    pub fn sanitize(&self, raw: &str) -> Option<SanitizedText> {
        let mut out = Output::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(c) = rest.chars().next() {
            if c == ':' {
                if let Some(len) = alias_token_len(rest) {
                    match self.aliases.resolve(&rest[..len]) {
                        Some(glyph) => out.push_content(glyph),
                        None => out.push_break(),
                    }
                    rest = &rest[len..];
                    continue;
                }
            }

            if is_separator_char(c) {
                out.push_break();
            } else {
                out.push_content(c.encode_utf8(&mut [0; 4]));
            }
            rest = &rest[c.len_utf8()..];
        }

        out.finish()
    }
}

/// Byte length of the `:identifier:` token at the start of `s`, if there is one.
fn alias_token_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix(':')?;
    let end = body.find(|c: char| !is_identifier_char(c))?;
    (end > 0 && body[end..].starts_with(':')).then_some(end + 2)
}

/// Accumulates sanitized output. Breaks are held back until the next piece of
/// content, so leading/trailing breaks vanish and consecutive ones merge.
struct Output {
    text: String,
    pending_break: bool,
}

impl Output {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            pending_break: false,
        }
    }

    fn push_break(&mut self) {
        self.pending_break = true;
    }

    fn push_content(&mut self, content: &str) {
        if self.pending_break && !self.text.is_empty() {
            self.text.push(SPACE_MARKER);
        }
        self.pending_break = false;
        self.text.push_str(content);
    }

    fn finish(self) -> Option<SanitizedText> {
        if self.text.is_empty() {
            None
        } else {
            Some(SanitizedText(self.text))
        }
    }
}
