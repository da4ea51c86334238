//! Key reader: a cursor over key text that drives the per-category decode
//! functions.
//!
//! A [`KeyReader`] is created for exactly one top-level resolve. Decode
//! functions pull fields off the cursor in the order their encode functions
//! wrote them; every `read_*` method accepts (at most) one leading field
//! separator.
//!
//! Token lexing (quoted strings, integers, the version header) uses `winnow`
//! parsers. Structural characters are matched directly.
//!
//! ## Re-reading
//!
//! A method signature may refer to the method's own type parameters by
//! ordinal (`(! 0)`). Those references only resolve relative to a concrete
//! candidate method, so the method decoder records [`KeyReader::position`]
//! before the signature and [`KeyReader::seek`]s back to re-read it once per
//! candidate, with the candidate pushed as method context. Only references
//! read directly in that signature count; a nested method segment keeps its
//! own tally.

use tracing::trace;
use winnow::combinator::delimited;
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{any, take_till, take_while};
use winnow::ModalResult;

use crate::candidates::CandidateSet;
use crate::codec::CodecRegistry;
use crate::error::MalformedKeyError;
use crate::graph::{EntityId, SemanticGraph};
use crate::key::{
    ARRAY_CLOSE, ARRAY_OPEN, FIELD_SEPARATOR, KEY_FORMAT_VERSION, NULL_FIELD, SEGMENT_CLOSE,
    SEGMENT_OPEN,
};
use crate::pool::BufferPool;

/// Cursor over the text of one key.
pub struct KeyReader<'a> {
    text: &'a str,
    rest: &'a str,
    graph: &'a dyn SemanticGraph,
    pool: &'a BufferPool,
    registry: &'static CodecRegistry,
    depth: usize,
    max_depth: usize,
    method_context: Vec<MethodFrame>,
    segments: usize,
}

/// One method signature being read.
#[derive(Debug, Clone, Copy)]
struct MethodFrame {
    /// Candidate the signature is matched against; `None` for the outline.
    method: Option<EntityId>,
    /// Method-type-parameter references read directly in this signature.
    refs: usize,
}

impl<'a> KeyReader<'a> {
    /// Create a reader over `text` resolving against `graph`.
    ///
    /// Segments nested deeper than `max_depth` are rejected as malformed.
    pub fn new(
        text: &'a str,
        graph: &'a dyn SemanticGraph,
        pool: &'a BufferPool,
        max_depth: usize,
    ) -> Self {
        KeyReader {
            text,
            rest: text,
            graph,
            pool,
            registry: CodecRegistry::global(),
            depth: 0,
            max_depth,
            method_context: Vec::new(),
            segments: 0,
        }
    }

    /// The graph keys are resolved against.
    pub fn graph(&self) -> &'a dyn SemanticGraph {
        self.graph
    }

    /// The pool scratch buffers come from.
    pub fn pool(&self) -> &'a BufferPool {
        self.pool
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.text.len() - self.rest.len()
    }

    /// Move the cursor to an offset previously returned by [`position`](Self::position).
    pub fn seek(&mut self, position: usize) {
        self.rest = self.text.get(position..).unwrap_or("");
    }

    /// Read a complete key: header, one root segment, end of input.
    pub fn read_root(&mut self) -> Result<CandidateSet, MalformedKeyError> {
        self.read_header()?;
        let candidates = self.read_key()?;
        if !self.rest.is_empty() {
            return Err(MalformedKeyError::TrailingInput {
                offset: self.position(),
            });
        }
        Ok(candidates)
    }

    /// Read one segment and resolve it through the codec its discriminant names.
    pub fn read_key(&mut self) -> Result<CandidateSet, MalformedKeyError> {
        self.skip_separator();
        let offset = self.position();
        self.expect(SEGMENT_OPEN, "'('")?;

        let discriminant = self.next_char("discriminant")?;
        let decode = self.registry.decoder(discriminant).ok_or(
            MalformedKeyError::UnknownDiscriminant {
                offset: offset + SEGMENT_OPEN.len_utf8(),
                found: discriminant,
            },
        )?;

        if self.depth >= self.max_depth {
            return Err(MalformedKeyError::NestingTooDeep {
                offset,
                limit: self.max_depth,
            });
        }
        trace!(offset, %discriminant, depth = self.depth, "decode segment");
        self.segments += 1;

        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        let candidates = result?;

        self.expect(SEGMENT_CLOSE, "')'")?;
        Ok(candidates)
    }

    /// Read a segment, or `_` for an absent one.
    pub fn read_optional_key(&mut self) -> Result<Option<CandidateSet>, MalformedKeyError> {
        self.skip_separator();
        if let Some(rest) = self.rest.strip_prefix(NULL_FIELD) {
            self.rest = rest;
            return Ok(None);
        }
        self.read_key().map(Some)
    }

    /// Read `[seg seg ...]`, resolving each segment.
    pub fn read_key_array(&mut self) -> Result<Vec<CandidateSet>, MalformedKeyError> {
        self.skip_separator();
        self.expect(ARRAY_OPEN, "'['")?;
        let mut items = Vec::new();
        loop {
            self.skip_separator();
            if let Some(rest) = self.rest.strip_prefix(ARRAY_CLOSE) {
                self.rest = rest;
                return Ok(items);
            }
            if self.rest.is_empty() {
                return Err(self.error("']'"));
            }
            items.push(self.read_key()?);
        }
    }

    /// Read a quoted string field.
    pub fn read_string(&mut self) -> Result<String, MalformedKeyError> {
        self.skip_separator();
        self.lex(quoted_string, "string")
    }

    /// Read an unsigned integer field.
    pub fn read_u32(&mut self) -> Result<u32, MalformedKeyError> {
        self.skip_separator();
        let offset = self.position();
        let digits = self.lex(decimal, "integer")?;
        digits
            .parse::<u32>()
            .map_err(|_| MalformedKeyError::Unexpected {
                offset,
                expected: "integer in u32 range",
            })
    }

    /// Enter the signature of candidate `method`.
    pub fn push_method(&mut self, method: EntityId) {
        self.method_context.push(MethodFrame {
            method: Some(method),
            refs: 0,
        });
    }

    /// Enter a method signature without a candidate.
    ///
    /// Method-type-parameter references read inside resolve to nothing, even
    /// when an enclosing signature has a candidate pushed.
    pub fn push_outline(&mut self) {
        self.method_context.push(MethodFrame {
            method: None,
            refs: 0,
        });
    }

    /// Leave the innermost method signature, returning the number of
    /// method-type-parameter references read directly inside it.
    ///
    /// References inside nested method segments belong to those segments'
    /// own signatures and are not counted.
    pub fn pop_method(&mut self) -> usize {
        self.method_context.pop().map_or(0, |frame| frame.refs)
    }

    /// The candidate method whose signature is being read, if any.
    pub fn current_method(&self) -> Option<EntityId> {
        self.method_context.last().and_then(|frame| frame.method)
    }

    /// Record that a method-type-parameter reference was read in the
    /// innermost signature.
    pub fn note_method_type_parameter_ref(&mut self) {
        if let Some(frame) = self.method_context.last_mut() {
            frame.refs += 1;
        }
    }

    /// Method-type-parameter references read so far in the innermost
    /// signature.
    pub fn method_type_parameter_refs(&self) -> usize {
        self.method_context.last().map_or(0, |frame| frame.refs)
    }

    /// Segments decoded so far, re-reads included.
    pub fn segments_decoded(&self) -> usize {
        self.segments
    }

    fn read_header(&mut self) -> Result<(), MalformedKeyError> {
        let version = self.lex(header_version, "key header 'v<version>:'")?;
        if version != KEY_FORMAT_VERSION.to_string() {
            return Err(MalformedKeyError::IncompatibleVersion {
                found: version.to_string(),
                supported: KEY_FORMAT_VERSION,
            });
        }
        Ok(())
    }

    fn skip_separator(&mut self) {
        if let Some(rest) = self.rest.strip_prefix(FIELD_SEPARATOR) {
            self.rest = rest;
        }
    }

    fn expect(&mut self, token: char, expected: &'static str) -> Result<(), MalformedKeyError> {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(self.error(expected)),
        }
    }

    fn next_char(&mut self, expected: &'static str) -> Result<char, MalformedKeyError> {
        let mut chars = self.rest.chars();
        match chars.next() {
            Some(c) => {
                self.rest = chars.as_str();
                Ok(c)
            }
            None => Err(self.error(expected)),
        }
    }

    fn lex<O>(
        &mut self,
        parser: fn(&mut &'a str) -> ModalResult<O>,
        expected: &'static str,
    ) -> Result<O, MalformedKeyError> {
        let start = self.rest;
        match parser(&mut self.rest) {
            Ok(value) => Ok(value),
            Err(_) => {
                let error = self.error(expected);
                self.rest = start;
                Err(error)
            }
        }
    }

    /// Truncation if the input ran out, otherwise unexpected input at the cursor.
    fn error(&self, expected: &'static str) -> MalformedKeyError {
        if self.rest.is_empty() {
            MalformedKeyError::Truncated {
                offset: self.position(),
                expected,
            }
        } else {
            MalformedKeyError::Unexpected {
                offset: self.position(),
                expected,
            }
        }
    }
}

// ============================================================================
// Token parsers (winnow)
// ============================================================================

/// Parse `v<digits>:`, returning the digits.
fn header_version<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited('v', decimal, ':').parse_next(input)
}

/// Parse one or more ASCII digits.
fn decimal<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

/// Parse a double-quoted string with `\"`, `\\`, and `\u{..}` escapes.
fn quoted_string(input: &mut &str) -> ModalResult<String> {
    let _: char = '"'.parse_next(input)?;
    let mut value = String::new();
    loop {
        let chunk: &str = take_till(0.., |c: char| c == '"' || c == '\\').parse_next(input)?;
        value.push_str(chunk);
        let terminator: char = any.parse_next(input)?;
        if terminator == '"' {
            return Ok(value);
        }
        value.push(escape_sequence(input)?);
    }
}

/// Parse the part of an escape sequence after the backslash.
fn escape_sequence(input: &mut &str) -> ModalResult<char> {
    let kind: char = any.parse_next(input)?;
    match kind {
        '"' => Ok('"'),
        '\\' => Ok('\\'),
        'u' => {
            let digits: &str = delimited(
                '{',
                take_while(1..=6, |c: char| c.is_ascii_hexdigit()),
                '}',
            )
            .parse_next(input)?;
            match u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
                Some(c) => Ok(c),
                None => Err(ErrMode::from_input(input)),
            }
        }
        _ => Err(ErrMode::from_input(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SymbolGraph;

    fn reader<'a>(text: &'a str, graph: &'a SymbolGraph, pool: &'a BufferPool) -> KeyReader<'a> {
        KeyReader::new(text, graph, pool, 32)
    }

    mod token_tests {
        use super::*;

        #[test]
        fn strings_unescape() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut r = reader(r#""plain" "q\"uote" "back\\slash" "nul\u{0}""#, &graph, &pool);
            assert_eq!(r.read_string().unwrap(), "plain");
            assert_eq!(r.read_string().unwrap(), "q\"uote");
            assert_eq!(r.read_string().unwrap(), "back\\slash");
            assert_eq!(r.read_string().unwrap(), "nul\0");
            assert_eq!(r.position(), r.text.len());
        }

        #[test]
        fn unterminated_string_is_truncated() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut r = reader(r#""open"#, &graph, &pool);
            let err = r.read_string().unwrap_err();
            assert!(matches!(err, MalformedKeyError::Truncated { .. }));
            assert_eq!(r.position(), 0, "failed lexing does not move the cursor");
        }

        #[test]
        fn bad_escape_is_unexpected() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut r = reader(r#""a\qb""#, &graph, &pool);
            let err = r.read_string().unwrap_err();
            assert!(matches!(err, MalformedKeyError::Unexpected { .. }));
        }

        #[test]
        fn integers_parse_and_overflow() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut r = reader("12 99999999999", &graph, &pool);
            assert_eq!(r.read_u32().unwrap(), 12);
            let err = r.read_u32().unwrap_err();
            assert_eq!(
                err,
                MalformedKeyError::Unexpected {
                    offset: 3,
                    expected: "integer in u32 range"
                }
            );
        }
    }

    mod structure_tests {
        use super::*;

        #[test]
        fn header_version_must_match() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let err = reader(r#"v2:(A "Core")"#, &graph, &pool)
                .read_root()
                .unwrap_err();
            assert_eq!(
                err,
                MalformedKeyError::IncompatibleVersion {
                    found: "2".to_string(),
                    supported: 1
                }
            );

            let err = reader(r#"(A "Core")"#, &graph, &pool)
                .read_root()
                .unwrap_err();
            assert!(matches!(err, MalformedKeyError::Unexpected { offset: 0, .. }));
        }

        #[test]
        fn unknown_discriminant_is_reported() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let err = reader(r#"v1:(Z "x")"#, &graph, &pool)
                .read_root()
                .unwrap_err();
            assert_eq!(
                err,
                MalformedKeyError::UnknownDiscriminant {
                    offset: 4,
                    found: 'Z'
                }
            );
        }

        #[test]
        fn trailing_input_is_rejected() {
            let mut graph = SymbolGraph::new();
            graph.add_assembly("Core");
            let pool = BufferPool::default();
            let err = reader(r#"v1:(A "Core") junk"#, &graph, &pool)
                .read_root()
                .unwrap_err();
            assert_eq!(err, MalformedKeyError::TrailingInput { offset: 13 });
        }

        #[test]
        fn nesting_is_bounded() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut text = String::from("v1:");
            for _ in 0..40 {
                text.push_str("(D ");
            }
            let err = reader(&text, &graph, &pool).read_root().unwrap_err();
            assert!(matches!(
                err,
                MalformedKeyError::NestingTooDeep { limit: 32, .. }
            ));
        }

        #[test]
        fn arrays_and_nulls() {
            let mut graph = SymbolGraph::new();
            let root = graph.add_namespace(None, "Root");
            let pool = BufferPool::default();
            let mut r = reader(r#"_ [(N _ "Root") (N _ "Missing")] []"#, &graph, &pool);
            assert!(r.read_optional_key().unwrap().is_none());
            let items = r.read_key_array().unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].exact().unwrap(), root);
            assert!(items[1].is_empty());
            assert!(r.read_key_array().unwrap().is_empty());
        }

        #[test]
        fn seek_rereads_fields() {
            let graph = SymbolGraph::new();
            let pool = BufferPool::default();
            let mut r = reader(r#""a" 7"#, &graph, &pool);
            let start = r.position();
            assert_eq!(r.read_string().unwrap(), "a");
            r.seek(start);
            assert_eq!(r.read_string().unwrap(), "a");
            assert_eq!(r.read_u32().unwrap(), 7);
        }
    }
}
