//! Semantic graph model: entities, the provider trait, and an in-memory graph.
//!
//! The key protocol never owns entities. It reads them through the
//! [`SemanticGraph`] trait for the duration of one encode or resolve call:
//!
//! - [`SemanticGraph::entity`]: category, container, and discriminating fields
//! - [`SemanticGraph::roots`]: entities without a container
//! - [`SemanticGraph::children`]: the members of a scope in declaration order
//!
//! [`SymbolGraph`] is the in-memory implementation used by the CLI and the
//! tests. It keeps entities in a `BTreeMap` for deterministic iteration and a
//! children postings list per scope.
//!
//! # Containment Shape
//!
//! ```text
//! Assembly
//! └── Module
//!     └── Namespace ("" is the global namespace)
//!         └── Namespace
//!             └── NamedType
//!                 ├── TypeParameter
//!                 ├── NamedType (nested)
//!                 ├── Field
//!                 ├── Property ── Parameter (indexers)
//!                 └── Method
//!                     ├── TypeParameter
//!                     ├── Parameter
//!                     └── Local
//! ```
//!
//! Array types are constructed from an element type and a rank; they have no
//! container and live among the roots.
//!
//! # Schema Versioning
//!
//! [`GRAPH_SCHEMA_VERSION`] tracks breaking changes to the snapshot format read
//! and written by [`SymbolGraph::from_json`] and [`SymbolGraph::to_json`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::GraphError;

/// Schema version for graph snapshot serialization.
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// Highest id a graph holds; `u32::MAX` stays free so allocation never wraps.
pub const MAX_ENTITY_ID: u32 = u32::MAX - 1;

/// Entities visited by [`SymbolGraph::display_name`] before it gives up.
pub const MAX_DISPLAY_STEPS: usize = 256;

/// Highest array rank rendered with commas; larger ranks render as `[rank=N]`.
const MAX_DISPLAYED_RANK: u32 = 32;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for an entity within one graph.
///
/// Ids are local to a graph instance. They are never written into keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ent_{}", self.0)
    }
}

/// Content hash identifying one snapshot of a graph (SHA-256, hex).
///
/// Pairs with a [`SymbolKey`](crate::SymbolKey) to form cache keys of the form
/// `(graph-version, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphVersion(pub String);

impl GraphVersion {
    /// Compute the version hash of the given bytes.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        GraphVersion(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for GraphVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Entity Kind
// ============================================================================

/// Category tag of an entity.
///
/// Every category except [`EntityKind::Local`] has a key codec registered in
/// [`CodecRegistry`](crate::codec::CodecRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Assembly,
    Module,
    Namespace,
    NamedType,
    TypeParameter,
    Method,
    Parameter,
    Field,
    Property,
    ArrayType,
    /// A method-local variable. Locals have no stable identity across edits.
    Local,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Assembly,
        EntityKind::Module,
        EntityKind::Namespace,
        EntityKind::NamedType,
        EntityKind::TypeParameter,
        EntityKind::Method,
        EntityKind::Parameter,
        EntityKind::Field,
        EntityKind::Property,
        EntityKind::ArrayType,
        EntityKind::Local,
    ];

    /// Stable lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Assembly => "assembly",
            EntityKind::Module => "module",
            EntityKind::Namespace => "namespace",
            EntityKind::NamedType => "named_type",
            EntityKind::TypeParameter => "type_parameter",
            EntityKind::Method => "method",
            EntityKind::Parameter => "parameter",
            EntityKind::Field => "field",
            EntityKind::Property => "property",
            EntityKind::ArrayType => "array_type",
            EntityKind::Local => "local",
        }
    }

    /// Returns true for kinds that may appear as the type of a parameter,
    /// field, or property.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            EntityKind::NamedType | EntityKind::TypeParameter | EntityKind::ArrayType
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entity
// ============================================================================

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A node of the semantic graph.
///
/// Fields beyond `kind`, `name`, and `container` are category specific:
///
/// | Field | Used by |
/// |-------|---------|
/// | `arity` | NamedType, Method (number of type parameters) |
/// | `ordinal` | Parameter, TypeParameter (declaration position) |
/// | `ty` | Parameter, Field, Property (declared type); ArrayType (element) |
/// | `rank` | ArrayType |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Category of this entity.
    pub kind: EntityKind,
    /// Simple name (empty for the global namespace and array types).
    #[serde(default)]
    pub name: String,
    /// Immediately enclosing entity; `None` only for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<EntityId>,
    /// Number of type parameters.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub arity: u32,
    /// Position among the siblings of the same kind.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ordinal: u32,
    /// Declared type, or element type for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<EntityId>,
    /// Array rank.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rank: u32,
}

impl Entity {
    /// Create a new entity with no container and no category-specific fields.
    pub fn new(id: EntityId, kind: EntityKind, name: impl Into<String>) -> Self {
        Entity {
            id,
            kind,
            name: name.into(),
            container: None,
            arity: 0,
            ordinal: 0,
            ty: None,
            rank: 0,
        }
    }

    /// Set the containing entity.
    pub fn with_container(mut self, container: EntityId) -> Self {
        self.container = Some(container);
        self
    }

    /// Set the number of type parameters.
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    /// Set the declaration position.
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Set the declared (or element) type.
    pub fn with_type(mut self, ty: EntityId) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Set the array rank.
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Read-only view of a semantic graph.
///
/// Implementations must not be mutated while an encode or resolve call is
/// reading them. The trait is object safe; the key protocol holds it as
/// `&dyn SemanticGraph`.
pub trait SemanticGraph {
    /// Look up an entity by id.
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Entities without a container, in declaration order.
    fn roots(&self) -> &[EntityId];

    /// Members of `scope`, in declaration order.
    fn children(&self, scope: EntityId) -> &[EntityId];
}

/// Members of `scope` with the given kind.
pub fn children_of_kind<'g>(
    graph: &'g dyn SemanticGraph,
    scope: EntityId,
    kind: EntityKind,
) -> impl Iterator<Item = &'g Entity> + 'g {
    graph
        .children(scope)
        .iter()
        .filter_map(move |&id| graph.entity(id))
        .filter(move |entity| entity.kind == kind)
}

/// Roots with the given kind.
pub fn roots_of_kind<'g>(
    graph: &'g dyn SemanticGraph,
    kind: EntityKind,
) -> impl Iterator<Item = &'g Entity> + 'g {
    graph
        .roots()
        .iter()
        .filter_map(move |&id| graph.entity(id))
        .filter(move |entity| entity.kind == kind)
}

/// Parameters of a method or property, ordered by ordinal.
pub fn parameters<'g>(graph: &'g dyn SemanticGraph, owner: EntityId) -> Vec<&'g Entity> {
    let mut params: Vec<&Entity> = children_of_kind(graph, owner, EntityKind::Parameter).collect();
    params.sort_by_key(|param| param.ordinal);
    params
}

// ============================================================================
// Snapshot
// ============================================================================

/// Serialized form of a [`SymbolGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Must equal [`GRAPH_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Entities in id order. Children keep the relative order given here.
    pub entities: Vec<Entity>,
}

// ============================================================================
// In-Memory Graph
// ============================================================================

/// In-memory semantic graph.
///
/// Builder methods allocate ids monotonically; declaration order of children
/// is insertion order.
#[derive(Debug, Clone, Default)]
pub struct SymbolGraph {
    // Primary storage (BTreeMap for deterministic iteration)
    entities: BTreeMap<EntityId, Entity>,

    /// Entities without a container, in insertion order.
    roots: Vec<EntityId>,
    /// scope → child ids, in insertion order.
    children: HashMap<EntityId, Vec<EntityId>>,

    next_id: u32,
}

impl SemanticGraph for SymbolGraph {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    fn children(&self, scope: EntityId) -> &[EntityId] {
        self.children.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl SymbolGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over all entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Allocate the next entity id.
    ///
    /// Ids count up to [`MAX_ENTITY_ID`]. Once an entity holds that id, the
    /// lowest id not in use is returned instead.
    pub fn next_entity_id(&mut self) -> EntityId {
        if self.next_id <= MAX_ENTITY_ID {
            let id = EntityId::new(self.next_id);
            self.next_id += 1;
            return id;
        }
        self.lowest_free_id()
    }

    fn lowest_free_id(&self) -> EntityId {
        let mut candidate = 0;
        for id in self.entities.keys() {
            if id.0 != candidate {
                break;
            }
            candidate += 1;
        }
        EntityId::new(candidate)
    }

    /// Insert a fully built entity, linking it under its container.
    ///
    /// Replaces any entity with the same id. Ids above [`MAX_ENTITY_ID`] are
    /// reserved.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if self.entities.contains_key(&id) {
            self.unlink(id);
        }
        match entity.container {
            Some(container) => self.children.entry(container).or_default().push(id),
            None => self.roots.push(id),
        }
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.entities.insert(id, entity);
        id
    }

    fn add(&mut self, kind: EntityKind, name: &str, container: Option<EntityId>) -> Entity {
        let id = self.next_entity_id();
        let entity = Entity::new(id, kind, name);
        match container {
            Some(container) => entity.with_container(container),
            None => entity,
        }
    }

    fn next_ordinal(&self, owner: EntityId, kind: EntityKind) -> u32 {
        children_of_kind(self, owner, kind).count() as u32
    }

    /// Add a root assembly.
    pub fn add_assembly(&mut self, name: &str) -> EntityId {
        let entity = self.add(EntityKind::Assembly, name, None);
        self.insert(entity)
    }

    /// Add a module to an assembly.
    pub fn add_module(&mut self, assembly: EntityId, name: &str) -> EntityId {
        let entity = self.add(EntityKind::Module, name, Some(assembly));
        self.insert(entity)
    }

    /// Add a namespace.
    ///
    /// A `None` container creates a root namespace. The empty name denotes the
    /// global namespace of its container.
    pub fn add_namespace(&mut self, container: Option<EntityId>, name: &str) -> EntityId {
        let entity = self.add(EntityKind::Namespace, name, container);
        self.insert(entity)
    }

    /// Add a named type to a namespace or (as a nested type) to another type.
    pub fn add_type(&mut self, container: EntityId, name: &str, arity: u32) -> EntityId {
        let entity = self
            .add(EntityKind::NamedType, name, Some(container))
            .with_arity(arity);
        self.insert(entity)
    }

    /// Add a type parameter to a type or method. The ordinal is the number of
    /// type parameters the owner already declares.
    pub fn add_type_parameter(&mut self, owner: EntityId, name: &str) -> EntityId {
        let ordinal = self.next_ordinal(owner, EntityKind::TypeParameter);
        let entity = self
            .add(EntityKind::TypeParameter, name, Some(owner))
            .with_ordinal(ordinal);
        self.insert(entity)
    }

    /// Add a method to a type.
    pub fn add_method(&mut self, ty: EntityId, name: &str, arity: u32) -> EntityId {
        let entity = self
            .add(EntityKind::Method, name, Some(ty))
            .with_arity(arity);
        self.insert(entity)
    }

    /// Add a parameter of type `ty` to a method or property.
    pub fn add_parameter(&mut self, owner: EntityId, name: &str, ty: EntityId) -> EntityId {
        let ordinal = self.next_ordinal(owner, EntityKind::Parameter);
        let entity = self
            .add(EntityKind::Parameter, name, Some(owner))
            .with_ordinal(ordinal)
            .with_type(ty);
        self.insert(entity)
    }

    /// Add a field of type `field_ty` to a type.
    pub fn add_field(&mut self, ty: EntityId, name: &str, field_ty: EntityId) -> EntityId {
        let entity = self
            .add(EntityKind::Field, name, Some(ty))
            .with_type(field_ty);
        self.insert(entity)
    }

    /// Add a property of type `prop_ty` to a type. Indexer parameters are
    /// added with [`add_parameter`](Self::add_parameter).
    pub fn add_property(&mut self, ty: EntityId, name: &str, prop_ty: EntityId) -> EntityId {
        let entity = self
            .add(EntityKind::Property, name, Some(ty))
            .with_type(prop_ty);
        self.insert(entity)
    }

    /// Add (or find) the array type with the given element type and rank.
    pub fn add_array_type(&mut self, element: EntityId, rank: u32) -> EntityId {
        let existing = roots_of_kind(self, EntityKind::ArrayType)
            .find(|array| array.ty == Some(element) && array.rank == rank)
            .map(|array| array.id);
        if let Some(id) = existing {
            return id;
        }
        let entity = self
            .add(EntityKind::ArrayType, "", None)
            .with_type(element)
            .with_rank(rank);
        self.insert(entity)
    }

    /// Add a local variable to a method.
    pub fn add_local(&mut self, method: EntityId, name: &str) -> EntityId {
        let entity = self.add(EntityKind::Local, name, Some(method));
        self.insert(entity)
    }

    /// Rename an entity. Returns false if the entity does not exist.
    pub fn rename(&mut self, id: EntityId, name: &str) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Move an entity under a different container (or to the roots).
    ///
    /// No cycle check is performed.
    pub fn set_container(&mut self, id: EntityId, container: Option<EntityId>) -> bool {
        let Some(mut entity) = self.entities.get(&id).cloned() else {
            return false;
        };
        self.unlink(id);
        entity.container = container;
        self.insert(entity);
        true
    }

    /// Remove an entity and everything it contains. Returns the number of
    /// entities removed.
    pub fn remove(&mut self, id: EntityId) -> usize {
        if !self.entities.contains_key(&id) {
            return 0;
        }
        self.unlink(id);

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if self.entities.remove(&next).is_some() {
                removed += 1;
            }
            if let Some(children) = self.children.remove(&next) {
                pending.extend(children);
            }
        }
        removed
    }

    /// Detach `id` from its container's children list (or from the roots).
    fn unlink(&mut self, id: EntityId) {
        let container = self.entities.get(&id).and_then(|entity| entity.container);
        let siblings = match container {
            Some(container) => self.children.get_mut(&container),
            None => Some(&mut self.roots),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|&sibling| sibling != id);
        }
    }

    /// Human-readable path of an entity, e.g. `[Core] System.List.Add`.
    ///
    /// Modules and the global namespace are omitted. Array types render as
    /// their element followed by `[]` (with commas for higher ranks). Names are
    /// cut short with `...` after [`MAX_DISPLAY_STEPS`] entities, so cyclic
    /// containers or element types still render.
    pub fn display_name(&self, id: EntityId) -> String {
        let mut budget = MAX_DISPLAY_STEPS;
        self.render_name(id, &mut budget)
    }

    fn render_name(&self, id: EntityId, budget: &mut usize) -> String {
        let mut parts = Vec::new();
        let mut assembly = None;
        let mut current = Some(id);

        while let Some(next) = current {
            let Some(entity) = self.entities.get(&next) else {
                break;
            };
            if *budget == 0 {
                parts.push("...".to_string());
                break;
            }
            *budget -= 1;
            match entity.kind {
                EntityKind::Assembly => assembly = Some(entity.name.clone()),
                EntityKind::Module => {}
                EntityKind::ArrayType => {
                    let element = match entity.ty {
                        Some(ty) => self.render_name(ty, budget),
                        None => String::new(),
                    };
                    parts.push(format!("{}{}", element, rank_suffix(entity.rank)));
                }
                _ if entity.name.is_empty() => {}
                _ => parts.push(entity.name.clone()),
            }
            current = entity.container;
        }

        parts.reverse();
        let path = parts.join(".");
        match assembly {
            Some(assembly) => format!("[{}] {}", assembly, path),
            None => path,
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// Capture the graph as a serializable snapshot.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            schema_version: GRAPH_SCHEMA_VERSION,
            entities: self.entities.values().cloned().collect(),
        }
    }

    /// Rebuild a graph from a snapshot, validating every reference.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        if snapshot.schema_version != GRAPH_SCHEMA_VERSION {
            return Err(GraphError::SchemaVersion {
                found: snapshot.schema_version,
                expected: GRAPH_SCHEMA_VERSION,
            });
        }

        let mut graph = SymbolGraph::new();
        for entity in &snapshot.entities {
            if entity.id.0 > MAX_ENTITY_ID {
                return Err(GraphError::ReservedId { id: entity.id });
            }
            if graph.entities.contains_key(&entity.id) {
                return Err(GraphError::DuplicateId { id: entity.id });
            }
            graph.entities.insert(entity.id, entity.clone());
        }

        for entity in &snapshot.entities {
            let references = [("container", entity.container), ("ty", entity.ty)];
            for (field, reference) in references {
                if let Some(missing) = reference.filter(|id| !graph.entities.contains_key(id)) {
                    return Err(GraphError::DanglingReference {
                        id: entity.id,
                        missing,
                        field,
                    });
                }
            }
        }

        graph.entities.clear();
        for entity in snapshot.entities {
            graph.insert(entity);
        }
        Ok(graph)
    }

    /// Parse a graph from snapshot JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Serialize the graph as pretty-printed snapshot JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Content hash of the canonical (compact JSON) snapshot.
    pub fn version(&self) -> Result<GraphVersion, GraphError> {
        let bytes = serde_json::to_vec(&self.to_snapshot())?;
        Ok(GraphVersion::compute(&bytes))
    }
}

/// `[]`, `[,]`, ... for an array of `rank` dimensions.
fn rank_suffix(rank: u32) -> String {
    if rank > MAX_DISPLAYED_RANK {
        return format!("[rank={}]", rank);
    }
    format!("[{}]", ",".repeat(rank.saturating_sub(1) as usize))
}

// ============================================================================
// Tests
// ============================================================================
