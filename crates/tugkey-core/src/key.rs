//! The [`SymbolKey`] value and its textual grammar.
//!
//! ## Grammar (format version 1)
//!
//! ```text
//! <key>      := "v" <version> ":" <segment>
//! <segment>  := "(" <disc> (" " <field>)* ")"
//! <field>    := <segment> | "_" | <string> | <uint> | <array>
//! <array>    := "[" (<segment> (" " <segment>)*)? "]"
//! <string>   := '"' (<char> | '\"' | '\\' | '\u{' <hex>{1,6} '}')* '"'
//! <uint>     := [0-9]+
//! ```
//!
//! Each segment starts with the discriminant of the codec that wrote it,
//! followed by that codec's fields. Segments whose category has a container
//! write the container segment as their first field, so the text nests along
//! the containment chain:
//!
//! ```text
//! v1:(M (T (N (N (D (A "Core")) "") "System") "List" 1) "Add" 0 [(G (T ...) "T")])
//! ```
//!
//! Control characters inside names are escaped as `\u{..}`, so a key never
//! contains NUL bytes or line breaks. Keys hold no graph ids or pointers and
//! are safe to store, compare, and send across process boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current key format version, written into every key header.
pub const KEY_FORMAT_VERSION: u32 = 1;

/// Opens a segment.
pub(crate) const SEGMENT_OPEN: char = '(';
/// Closes a segment.
pub(crate) const SEGMENT_CLOSE: char = ')';
/// Opens a key array.
pub(crate) const ARRAY_OPEN: char = '[';
/// Closes a key array.
pub(crate) const ARRAY_CLOSE: char = ']';
/// Stands in for an absent optional segment.
pub(crate) const NULL_FIELD: char = '_';
/// Separates fields.
pub(crate) const FIELD_SEPARATOR: char = ' ';

/// Header written before the root segment, e.g. `v1:`.
pub(crate) fn header() -> String {
    format!("v{}:", KEY_FORMAT_VERSION)
}

/// An immutable, printable identifier for an entity.
///
/// Keys are produced by [`encode`](crate::encode) and consumed by
/// [`resolve`](crate::resolve). Any text can be wrapped as a key (for example a
/// key read back from a cache); whether it is well formed is only established
/// when it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolKey(String);

impl SymbolKey {
    /// Wrap finished key text. Only the writer creates keys from scratch.
    pub(crate) fn from_encoded(text: String) -> Self {
        SymbolKey(text)
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the key text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty key (which never resolves).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SymbolKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SymbolKey {
    fn from(text: String) -> Self {
        SymbolKey(text)
    }
}

impl From<&str> for SymbolKey {
    fn from(text: &str) -> Self {
        SymbolKey(text.to_string())
    }
}

/// Append `value` to `out` as a quoted key string.
pub(crate) fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
