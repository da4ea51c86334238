//! Namespace keys: `(N container-or-_ "name")`.
//!
//! Root namespaces (no container) are written with `_` in the container
//! position. The global namespace of a module has the empty name.

use super::{collect_children, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{roots_of_kind, Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Namespace,
    discriminant: 'N',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_optional_key(entity.container)?;
    writer.write_string(&entity.name);
    Ok(())
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let containers = reader.read_optional_key()?;
    let name = reader.read_string()?;

    match containers {
        Some(containers) if containers.is_empty() => Ok(CandidateSet::empty()),
        Some(containers) => Ok(collect_children(
            reader,
            &containers,
            EntityKind::Namespace,
            |ns| ns.name == name,
        )),
        None => {
            let mut matches = reader.pool().checkout();
            for ns in roots_of_kind(reader.graph(), EntityKind::Namespace) {
                if ns.name == name {
                    matches.push_unique(ns.id);
                }
            }
            Ok(CandidateSet::from_candidates(&matches))
        }
    }
}
