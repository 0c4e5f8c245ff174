//! Storage bindings and generation surfaces.
//!
//! Decides, per declaration, which generated surfaces it appears on and, per
//! member, how its value is stored natively and which accessors it exposes.
//!
//! Surface computation for a type:
//! 1. start from its code-generation level (`IdlAndStub` when unmarked);
//! 2. remove what its exclusion attributes exclude;
//! 3. move `PUBLIC` to `INTERNAL` for internal/private types;
//! 4. remove `NATIVE_CORE` when any declared ancestor is excluded from core.
//!
//! A member's surfaces are its own request intersected with its owner's:
//! exclusion flows from type to member and cannot be overridden.

use crate::attributes::{CodeGenPolicy, PropertyFlags, ValueKind};
use crate::names::NameIndex;
use crate::normalize::Facets;
use crate::stage::{DiagnosticSink, StageInput};
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xom_common::{Diagnostic, diagnostic_codes};
use xom_model::{DeclId, DeclKind, Declaration, DeclarationSet};

bitflags! {
    /// Generated-code surfaces.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Surfaces: u8 {
        /// Public interface definition (IDL).
        const PUBLIC = 1 << 0;
        /// Native core type table.
        const NATIVE_CORE = 1 << 1;
        /// Full generated implementation stub.
        const STUB = 1 << 2;
        /// Partial stub completed by hand-written code.
        const PARTIAL_STUB = 1 << 3;
        /// Internal (non-public) interface definition.
        const INTERNAL = 1 << 4;

        const STUBS = Self::STUB.bits() | Self::PARTIAL_STUB.bits();
    }
}

/// How a type's instances are backed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageCategory {
    NativeBacked,
    ManagedWrapper,
    ImportedExternal,
}

/// Where a member's value lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageBinding {
    /// A field of the native object at a named offset.
    NativeField { offset: String, value_kind: ValueKind },
    /// A sparse (on-demand) property slot.
    Sparse { value_kind: ValueKind },
    /// Computed by hand-written or generated code; no storage.
    Computed,
    /// Declared on an interface or imported type; no storage here.
    InterfaceOnly,
    /// Enum member constant.
    Constant(i64),
}

/// Accessors a member exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessorShape {
    ReadOnly,
    ReadWrite,
    WriteOnly,
    EventAddRemove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeStorage {
    pub codegen: CodeGenPolicy,
    pub surfaces: Surfaces,
    pub category: StorageCategory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberStorage {
    pub codegen: CodeGenPolicy,
    pub surfaces: Surfaces,
    pub binding: StorageBinding,
    pub accessor: Option<AccessorShape>,
}

/// Output of the storage stage.
#[derive(Debug, Default)]
pub struct StorageFacet {
    pub types: Vec<Option<TypeStorage>>,
    pub members: Vec<Option<MemberStorage>>,
}

/// Surfaces a declaration asks for from its own attributes alone.
#[must_use]
pub fn own_surfaces(facets: &Facets) -> Surfaces {
    let mut surfaces = facets.codegen.unwrap_or_default().surfaces() - facets.excluded_surfaces();
    if facets.visibility().is_hidden() && surfaces.contains(Surfaces::PUBLIC) {
        surfaces.remove(Surfaces::PUBLIC);
        surfaces.insert(Surfaces::INTERNAL);
    }
    surfaces
}

/// Run the storage stage.
#[must_use]
pub fn map_storage(input: &StageInput<'_>) -> (StorageFacet, Vec<Diagnostic>) {
    let mut sink = DiagnosticSink::new("storage");
    let len = input.set.len();
    let mut facet = StorageFacet {
        types: vec![None; len],
        members: vec![None; len],
    };

    let core_sources = core_exclusion_sources(input.set, input.names, |id| {
        input.facets(id).is_some_and(Facets::excludes_core)
    });
    for (id, _, facets) in input.types() {
        let mut surfaces = if facets.imported {
            Surfaces::empty()
        } else {
            own_surfaces(facets)
        };
        if core_sources[id.index()].is_some() {
            surfaces.remove(Surfaces::NATIVE_CORE);
        }
        let category = if facets.imported {
            StorageCategory::ImportedExternal
        } else if surfaces.contains(Surfaces::NATIVE_CORE) {
            StorageCategory::NativeBacked
        } else {
            StorageCategory::ManagedWrapper
        };
        facet.types[id.index()] = Some(TypeStorage {
            codegen: facets.codegen.unwrap_or_default(),
            surfaces,
            category,
        });
    }

    let mut fields: FxHashMap<(DeclId, &str), DeclId> = FxHashMap::default();
    let mut next_constant: FxHashMap<DeclId, i64> = FxHashMap::default();
    for (id, decl, facets) in input.members() {
        let Some(owner) = input.owner(id) else {
            continue;
        };
        let (Some(owner_storage), Some(owner_facets)) =
            (facet.types[owner.index()], input.facets(owner))
        else {
            continue;
        };
        let subject = decl.display_name();
        let owner_name = input.decl(owner).qualified_name();
        let shallow = owner_facets.interface || owner_facets.imported;

        let binding = match decl.kind {
            DeclKind::EnumMember => {
                let next = next_constant.entry(owner).or_insert(0);
                let value = decl.value.unwrap_or(*next);
                *next = value.saturating_add(1);
                StorageBinding::Constant(value)
            }
            DeclKind::Property if shallow => {
                if facets.offset_field.is_some() || facets.value_kind.is_some() {
                    let what = if owner_facets.interface { "interface" } else { "imported type" };
                    sink.report(
                        diagnostic_codes::INVALID_STORAGE_BINDING,
                        &subject,
                        &[&format!("'{owner_name}' is an {what}")],
                    );
                    continue;
                }
                StorageBinding::InterfaceOnly
            }
            DeclKind::Property => match (&facets.offset_field, facets.value_kind) {
                (Some(offset), value_kind) => {
                    if let Some(&first) = fields.get(&(owner, offset.as_str())) {
                        sink.push(
                            Diagnostic::from_code(
                                diagnostic_codes::DUPLICATE_STORAGE_FIELD,
                                &subject,
                                &[offset, &input.decl(first).display_name()],
                            )
                            .with_related(input.decl(first).display_name(), "field first bound here"),
                        );
                        continue;
                    }
                    fields.insert((owner, offset.as_str()), id);
                    StorageBinding::NativeField {
                        offset: offset.clone(),
                        value_kind: value_kind.unwrap_or(ValueKind::Object),
                    }
                }
                (None, Some(value_kind)) => StorageBinding::Sparse { value_kind },
                (None, None) => StorageBinding::Computed,
            },
            _ if shallow => StorageBinding::InterfaceOnly,
            _ => StorageBinding::Computed,
        };

        facet.members[id.index()] = Some(MemberStorage {
            codegen: facets.codegen.unwrap_or(owner_storage.codegen),
            surfaces: member_surfaces(facets, owner_storage.surfaces, owner_facets.hand_written),
            binding,
            accessor: accessor_shape(decl, facets),
        });
    }

    debug!(
        types = facet.types.iter().flatten().count(),
        members = facet.members.iter().flatten().count(),
        "mapped storage"
    );
    (facet, sink.finish())
}

/// The nearest declaration (the type itself or an ancestor) whose own
/// attributes exclude each type from core, per `DeclId`.
///
/// `excludes` reports a declaration's own exclusion. Each base chain is walked
/// once with memoization, so the cost is linear in the number of types and no
/// walk exceeds the type count. A cycle ends the walk where it closes.
#[must_use]
pub fn core_exclusion_sources(
    set: &DeclarationSet,
    names: &NameIndex,
    excludes: impl Fn(DeclId) -> bool,
) -> Vec<Option<DeclId>> {
    let len = set.len();
    let mut memo: Vec<Option<Option<DeclId>>> = vec![None; len];
    let mut on_path = vec![false; len];

    for (start, decl) in set.iter() {
        if !decl.kind.is_type_like() || memo[start.index()].is_some() {
            continue;
        }
        let mut chain = Vec::new();
        let mut inherited = None;
        let mut current = Some(start);
        while let Some(id) = current {
            if let Some(known) = memo[id.index()] {
                inherited = known;
                break;
            }
            if on_path[id.index()] {
                break;
            }
            on_path[id.index()] = true;
            chain.push(id);
            let decl = &set[id];
            current = decl
                .base
                .as_deref()
                .and_then(|base| names.lookup_declared(base, &decl.namespace));
        }
        for &id in chain.iter().rev() {
            if excludes(id) {
                inherited = Some(id);
            }
            memo[id.index()] = Some(inherited);
            on_path[id.index()] = false;
        }
    }
    memo.into_iter().map(Option::flatten).collect()
}

fn member_surfaces(facets: &Facets, owner: Surfaces, owner_hand_written: bool) -> Surfaces {
    let requested = own_surfaces(facets);
    let mut allowed = owner;
    if owner.contains(Surfaces::PUBLIC) {
        allowed.insert(Surfaces::INTERNAL);
    }
    let mut surfaces = requested;
    // Public members of an internal type land on the internal surface.
    if surfaces.contains(Surfaces::PUBLIC) && !owner.contains(Surfaces::PUBLIC) {
        surfaces.remove(Surfaces::PUBLIC);
        surfaces.insert(Surfaces::INTERNAL);
    }
    // A member's stub follows its owner's kind. Hand-written owners keep the
    // stubs their members ask for explicitly.
    if surfaces.intersects(Surfaces::STUBS) {
        if owner.intersects(Surfaces::STUBS) {
            surfaces.remove(Surfaces::STUBS);
            surfaces.insert(owner & Surfaces::STUBS);
        } else if owner_hand_written && facets.codegen.is_some() {
            allowed.insert(surfaces & Surfaces::STUBS);
        }
    }
    surfaces & allowed
}

fn accessor_shape(decl: &Declaration, facets: &Facets) -> Option<AccessorShape> {
    match decl.kind {
        DeclKind::Property => {
            let read_only = facets.read_only
                || facets
                    .property_flags
                    .contains(PropertyFlags::IS_READ_ONLY_EXCEPT_FOR_PARSER);
            let getter = decl.accessors.getter;
            let setter = (decl.accessors.setter || facets.settable) && !read_only;
            Some(match (getter, setter) {
                (true, false) => AccessorShape::ReadOnly,
                (false, true) => AccessorShape::WriteOnly,
                _ if read_only => AccessorShape::ReadOnly,
                _ => AccessorShape::ReadWrite,
            })
        }
        DeclKind::Event => Some(AccessorShape::EventAddRemove),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/storage_tests.rs"]
mod tests;
