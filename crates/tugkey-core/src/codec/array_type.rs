//! Array type keys: `(Y element rank)`.
//!
//! Array types are constructed roots identified by their element type and
//! rank. The element may be any keyed type, including a method type parameter
//! written in ordinal form.

use super::KeyCodec;
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{roots_of_kind, Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::ArrayType,
    discriminant: 'Y',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    let element = entity.ty.ok_or(EncodingError::MissingAttribute {
        id: entity.id,
        kind: entity.kind,
        attribute: "element type",
    })?;
    writer.write_key(element)?;
    writer.write_u32(entity.rank);
    Ok(())
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let elements = reader.read_key()?;
    let rank = reader.read_u32()?;

    if elements.is_empty() {
        return Ok(CandidateSet::empty());
    }
    let mut matches = reader.pool().checkout();
    for array in roots_of_kind(reader.graph(), EntityKind::ArrayType) {
        if array.rank == rank && array.ty.is_some_and(|ty| elements.contains(ty)) {
            matches.push_unique(array.id);
        }
    }
    Ok(CandidateSet::from_candidates(&matches))
}
