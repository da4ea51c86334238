//! Method type parameters referenced from their own method's signature:
//! `(! ordinal)`.
//!
//! There is no encode function. [`KeyWriter::write_key`] emits this form
//! itself when it meets a type parameter owned by the method whose signature
//! it is writing. The segment only means something relative to a candidate
//! method, so decoding outside a candidate's signature yields an empty set.
//!
//! [`KeyWriter::write_key`]: crate::writer::KeyWriter::write_key

use crate::candidates::CandidateSet;
use crate::error::MalformedKeyError;
use crate::graph::{children_of_kind, EntityKind};
use crate::reader::KeyReader;

pub(crate) const DISCRIMINANT: char = '!';

pub(crate) fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let ordinal = reader.read_u32()?;
    reader.note_method_type_parameter_ref();

    let Some(method) = reader.current_method() else {
        return Ok(CandidateSet::empty());
    };
    let found = children_of_kind(reader.graph(), method, EntityKind::TypeParameter)
        .find(|param| param.ordinal == ordinal)
        .map(|param| param.id);
    Ok(found.map_or_else(CandidateSet::empty, CandidateSet::single))
}
