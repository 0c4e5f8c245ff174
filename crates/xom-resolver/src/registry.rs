//! The resolved, immutable type registry.
//!
//! Built once per successful pass by merging the stage facets. Types are
//! stored in topological order (base before derived); members in declaration
//! order. Every query is read-only, so a registry can be shared freely across
//! threads.

use crate::attributes::{ClassFlags, CodeGenPolicy, EventFlags, PropertyFlags, TypeTableFlags, Visibility};
use crate::contracts::{Availability, AvailabilityContext, ContractNode, Gate};
use crate::identity::Identity;
use crate::names::TypeRef;
use crate::storage::{AccessorShape, StorageBinding, StorageCategory, Surfaces};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use xom_model::{DeclId, DeclKind};

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeNode {
    pub id: DeclId,
    pub name: String,
    pub namespace: String,
    pub kind: DeclKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_interfaces: Vec<TypeRef>,
    pub depth: u32,
    /// Own members, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<DeclId>,
    pub visibility: Visibility,
    pub is_interface: bool,
    pub is_contract: bool,
    pub codegen: CodeGenPolicy,
    pub surfaces: Surfaces,
    pub storage: StorageCategory,
    pub availability: Availability,
    /// Every `(contract, version)` at which the type or a member appears.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub version_projections: Vec<Gate>,
    pub identity: Identity,
    pub type_table: TypeTableFlags,
    pub class_flags: ClassFlags,
    /// Delegate return type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A resolved member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberNode {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclKind,
    pub owner: DeclId,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessor: Option<AccessorShape>,
    pub storage: StorageBinding,
    pub codegen: CodeGenPolicy,
    pub surfaces: Surfaces,
    pub availability: Availability,
    pub identity: Identity,
    pub property_flags: PropertyFlags,
    pub event_flags: EventFlags,
    pub attached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A type or member introduced at some version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity<'r> {
    Type(&'r TypeNode),
    Member(&'r MemberNode),
}

impl Entity<'_> {
    #[must_use]
    pub fn id(&self) -> DeclId {
        match self {
            Self::Type(node) => node.id,
            Self::Member(node) => node.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Type(node) => &node.name,
            Self::Member(node) => &node.name,
        }
    }
}

/// The resolved registry.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRegistry {
    types: Vec<TypeNode>,
    members: Vec<MemberNode>,
    contracts: Vec<ContractNode>,
    #[serde(skip)]
    by_name: IndexMap<String, usize>,
    #[serde(skip)]
    type_by_decl: FxHashMap<DeclId, usize>,
    #[serde(skip)]
    member_by_decl: FxHashMap<DeclId, usize>,
}

impl TypeRegistry {
    /// Assemble a registry. `types` must already be in topological order.
    #[must_use]
    pub(crate) fn new(
        types: Vec<TypeNode>,
        members: Vec<MemberNode>,
        contracts: Vec<ContractNode>,
    ) -> Self {
        let by_name = types
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), i))
            .collect();
        let type_by_decl = types.iter().enumerate().map(|(i, node)| (node.id, i)).collect();
        let member_by_decl = members
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id, i))
            .collect();
        Self {
            types,
            members,
            contracts,
            by_name,
            type_by_decl,
            member_by_decl,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[must_use]
    pub fn type_named(&self, qualified: &str) -> Option<&TypeNode> {
        self.by_name.get(qualified).map(|&i| &self.types[i])
    }

    #[must_use]
    pub fn type_node(&self, id: DeclId) -> Option<&TypeNode> {
        self.type_by_decl.get(&id).map(|&i| &self.types[i])
    }

    #[must_use]
    pub fn member(&self, id: DeclId) -> Option<&MemberNode> {
        self.member_by_decl.get(&id).map(|&i| &self.members[i])
    }

    /// A member of `owner` by simple name.
    #[must_use]
    pub fn member_named<'r>(&'r self, owner: &'r TypeNode, name: &str) -> Option<&'r MemberNode> {
        self.members_of(owner).find(|m| m.name == name)
    }

    #[must_use]
    pub fn contract(&self, name: &str) -> Option<&ContractNode> {
        self.contracts.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn contracts(&self) -> &[ContractNode] {
        &self.contracts
    }

    /// All types, base before derived.
    #[must_use]
    pub fn topological_order(&self) -> &[TypeNode] {
        &self.types
    }

    /// All members, in declaration order.
    #[must_use]
    pub fn members(&self) -> &[MemberNode] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Own members of `owner`, in declaration order.
    pub fn members_of<'r>(&'r self, owner: &'r TypeNode) -> impl Iterator<Item = &'r MemberNode> + 'r {
        owner.members.iter().filter_map(|&id| self.member(id))
    }

    /// Declared ancestors of `node`, nearest first.
    ///
    /// The registry only exists for an acyclic graph, so a chain never holds
    /// more than the type count.
    #[must_use]
    pub fn base_chain(&self, node: &TypeNode) -> Vec<&TypeNode> {
        let mut chain = Vec::with_capacity(node.depth as usize);
        let mut current = node.base.as_ref().and_then(TypeRef::declared);
        while let Some(id) = current
            && chain.len() < self.types.len()
        {
            let Some(base) = self.type_node(id) else {
                break;
            };
            chain.push(base);
            current = base.base.as_ref().and_then(TypeRef::declared);
        }
        chain
    }

    /// Own members followed by inherited members, nearest ancestor first.
    #[must_use]
    pub fn all_members<'r>(&'r self, node: &'r TypeNode) -> Vec<&'r MemberNode> {
        std::iter::once(node)
            .chain(self.base_chain(node))
            .flat_map(|ty| self.members_of(ty))
            .collect()
    }

    /// Types deriving (directly or not) from `node`, in topological order.
    #[must_use]
    pub fn derived_types(&self, node: &TypeNode) -> Vec<&TypeNode> {
        self.types
            .iter()
            .filter(|ty| ty.depth > node.depth)
            .filter(|ty| self.base_chain(ty).iter().any(|base| base.id == node.id))
            .collect()
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Types visible under `ctx`, in topological order.
    #[must_use]
    pub fn visible_types(&self, ctx: &AvailabilityContext) -> Vec<&TypeNode> {
        self.types
            .iter()
            .filter(|ty| ty.availability.is_visible(ctx))
            .collect()
    }

    /// Own and inherited members of `node` visible under `ctx`.
    #[must_use]
    pub fn visible_members<'r>(
        &'r self,
        node: &'r TypeNode,
        ctx: &AvailabilityContext,
    ) -> Vec<&'r MemberNode> {
        self.all_members(node)
            .into_iter()
            .filter(|m| m.availability.is_visible(ctx))
            .collect()
    }

    /// Types and members whose gates include exactly `(contract, version)`.
    #[must_use]
    pub fn introduced_at(&self, contract: &str, version: u32) -> Vec<Entity<'_>> {
        let types = self
            .types
            .iter()
            .filter(|ty| ty.availability.introduced_at(contract, version))
            .map(Entity::Type);
        let members = self
            .members
            .iter()
            .filter(|m| m.availability.introduced_at(contract, version))
            .map(Entity::Member);
        types.chain(members).collect()
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    /// Types present on every surface in `surfaces`.
    #[must_use]
    pub fn types_on_surface(&self, surfaces: Surfaces) -> Vec<&TypeNode> {
        self.types
            .iter()
            .filter(|ty| ty.surfaces.contains(surfaces))
            .collect()
    }

    /// Members present on every surface in `surfaces`.
    #[must_use]
    pub fn members_on_surface(&self, surfaces: Surfaces) -> Vec<&MemberNode> {
        self.members
            .iter()
            .filter(|m| m.surfaces.contains(surfaces))
            .collect()
    }

    /// Deterministic JSON rendering of the whole registry.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
