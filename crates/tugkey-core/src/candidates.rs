//! Resolution results.
//!
//! A [`CandidateSet`] is the immutable outcome of resolving a key against a
//! graph. It is in exactly one of three states:
//!
//! | State | Count | `is_ambiguous()` |
//! |-------|-------|------------------|
//! | Empty | 0 | false (carries an [`EmptyReason`]) |
//! | Single | 1 | false |
//! | Multiple | >1 | true |
//!
//! Candidates are ids of the graph the key was resolved against, never of the
//! graph it was encoded from.
//!
//! ## Exact vs Best-Effort Callers
//!
//! Callers that tolerate an approximate answer (hover text, breadcrumbs) may
//! use [`CandidateSet::first`]. Callers that need exact identity (rename,
//! go-to-definition) must use [`CandidateSet::exact`], which fails for any
//! count other than one.

use std::collections::HashSet;
use std::fmt;
use std::slice;

use crate::error::{MalformedKeyError, ResolveError};
use crate::graph::EntityId;
use crate::pool::LINEAR_SCAN_LIMIT;

/// Why a resolution produced no candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The key was well formed but nothing in the graph matched.
    NoMatch,
    /// The key could not be parsed.
    Malformed(MalformedKeyError),
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoMatch => f.write_str("no matching entity"),
            EmptyReason::Malformed(err) => write!(f, "malformed key: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Empty(EmptyReason),
    Single(EntityId),
    Multiple(Box<[EntityId]>),
}

/// Zero, one, or several entities matching a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    state: State,
}

impl Default for CandidateSet {
    fn default() -> Self {
        CandidateSet::empty()
    }
}

impl CandidateSet {
    /// An empty set for a well-formed key that matched nothing.
    pub fn empty() -> Self {
        CandidateSet {
            state: State::Empty(EmptyReason::NoMatch),
        }
    }

    /// An empty set carrying the parse failure that produced it.
    pub fn malformed(error: MalformedKeyError) -> Self {
        CandidateSet {
            state: State::Empty(EmptyReason::Malformed(error)),
        }
    }

    /// A set holding exactly one candidate.
    pub fn single(id: EntityId) -> Self {
        CandidateSet {
            state: State::Single(id),
        }
    }

    /// Build a set from candidates in discovery order.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn from_candidates(ids: &[EntityId]) -> Self {
        match ids {
            [] => CandidateSet::empty(),
            [id] => CandidateSet::single(*id),
            _ => {
                let mut unique: Vec<EntityId> = Vec::with_capacity(ids.len());
                if ids.len() <= LINEAR_SCAN_LIMIT {
                    for &id in ids {
                        if !unique.contains(&id) {
                            unique.push(id);
                        }
                    }
                } else {
                    let mut seen = HashSet::with_capacity(ids.len());
                    unique.extend(ids.iter().copied().filter(|&id| seen.insert(id)));
                }
                if unique.len() == 1 {
                    CandidateSet::single(unique[0])
                } else {
                    CandidateSet {
                        state: State::Multiple(unique.into_boxed_slice()),
                    }
                }
            }
        }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true when nothing matched.
    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty(_))
    }

    /// Returns true when more than one candidate matched.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.state, State::Multiple(_))
    }

    /// Why the set is empty, or `None` if it has candidates.
    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match &self.state {
            State::Empty(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns true if `id` is among the candidates.
    pub fn contains(&self, id: EntityId) -> bool {
        self.as_slice().contains(&id)
    }

    /// A fresh iterator over the candidates.
    ///
    /// Each call starts from the first candidate; iterators are independent.
    pub fn iter(&self) -> Candidates<'_> {
        Candidates {
            inner: self.as_slice().iter(),
        }
    }

    /// The first candidate in iteration order, for best-effort callers.
    pub fn first(&self) -> Option<EntityId> {
        self.as_slice().first().copied()
    }

    /// The single candidate, or an error for empty and ambiguous sets.
    pub fn exact(&self) -> Result<EntityId, ResolveError> {
        match &self.state {
            State::Single(id) => Ok(*id),
            State::Empty(reason) => Err(ResolveError::NotFound {
                reason: reason.to_string(),
            }),
            State::Multiple(ids) => Err(ResolveError::Ambiguous { count: ids.len() }),
        }
    }

    fn as_slice(&self) -> &[EntityId] {
        match &self.state {
            State::Empty(_) => &[],
            State::Single(id) => slice::from_ref(id),
            State::Multiple(ids) => &ids[..],
        }
    }
}

/// Iterator over the candidates of a [`CandidateSet`].
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    inner: slice::Iter<'a, EntityId>,
}

impl Iterator for Candidates<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Candidates<'_> {}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = EntityId;
    type IntoIter = Candidates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
