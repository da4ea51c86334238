//! Module keys: `(D assembly)`.
//!
//! A module is identified by its assembly alone. Resolving a module key yields
//! every module of the resolved assemblies, so a multi-module assembly always
//! resolves ambiguously. Callers that need a specific module disambiguate by
//! other means.

use super::{collect_children, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Module,
    discriminant: 'D',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_container(entity)
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let assemblies = reader.read_key()?;
    if assemblies.is_empty() {
        return Ok(CandidateSet::empty());
    }
    Ok(collect_children(reader, &assemblies, EntityKind::Module, |_| true))
}
