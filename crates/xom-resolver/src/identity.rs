//! Stable identity allocation.
//!
//! Two kinds of identity: GUIDs (explicit, globally unique across all roles)
//! and ordinals in per-table index spaces (types, properties, events,
//! methods). Explicit claims are honored first in declaration order; automatic
//! requests then take the lowest free ordinal of their space, also in
//! declaration order, so a pass is reproducible for a given input.

use crate::attributes::{Guid, IndexRequest, NamedGuid};
use crate::stage::{DiagnosticSink, StageInput};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;
use xom_common::limits::FIRST_STABLE_INDEX;
use xom_common::{Diagnostic, diagnostic_codes};
use xom_model::{DeclId, DeclKind};

/// A dispatch table with its own ordinal space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexSpace {
    Type,
    Property,
    Event,
    Method,
}

impl IndexSpace {
    #[must_use]
    pub const fn of(kind: DeclKind) -> Option<Self> {
        match kind {
            DeclKind::Type | DeclKind::Enum | DeclKind::Struct | DeclKind::Delegate => {
                Some(Self::Type)
            }
            DeclKind::Property => Some(Self::Property),
            DeclKind::Event => Some(Self::Event),
            DeclKind::Method => Some(Self::Method),
            DeclKind::EnumMember => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Property => "property",
            Self::Event => "event",
            Self::Method => "method",
        }
    }
}

/// A key in the flat identity map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Guid(Guid),
    Index(IndexSpace, u32),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guid(guid) => write!(f, "guid '{guid}'"),
            Self::Index(space, index) => write!(f, "{} index {index}", space.label()),
        }
    }
}

/// Identities assigned to one declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub guids: SmallVec<[NamedGuid; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl Identity {
    /// The `ClassGuid`, or the first GUID of any role.
    #[must_use]
    pub fn guid(&self) -> Option<&Guid> {
        self.guids
            .iter()
            .find(|g| g.role == "ClassGuid")
            .or_else(|| self.guids.first())
            .map(|g| &g.value)
    }
}

/// Output of the identity stage.
#[derive(Debug, Default)]
pub struct IdentityFacet {
    pub identities: Vec<Option<Identity>>,
}

/// Run the identity stage.
#[must_use]
pub fn allocate_identities(input: &StageInput<'_>) -> (IdentityFacet, Vec<Diagnostic>) {
    let mut sink = DiagnosticSink::new("identity");
    let mut facet = IdentityFacet {
        identities: vec![None; input.set.len()],
    };
    let mut claims: FxHashMap<IdentityKey, DeclId> = FxHashMap::default();
    let mut taken: FxHashMap<IndexSpace, FxHashSet<u32>> = FxHashMap::default();
    let mut auto: Vec<(DeclId, IndexSpace)> = Vec::new();

    let mut claim = |key: IdentityKey, id: DeclId, sink: &mut DiagnosticSink| -> bool {
        if let Some(&first) = claims.get(&key) {
            let subject = input.decl(id).display_name();
            let first_name = input.decl(first).display_name();
            sink.push(
                Diagnostic::from_code(
                    diagnostic_codes::DUPLICATE_IDENTITY,
                    &subject,
                    &[&key.to_string(), &first_name],
                )
                .with_related(first_name.clone(), "first claimed here"),
            );
            false
        } else {
            claims.insert(key, id);
            true
        }
    };

    for (id, decl) in input.set.iter() {
        let Some(facets) = input.facets(id) else {
            continue;
        };
        let mut identity = Identity::default();
        let mut ok = true;

        for guid in &facets.guids {
            ok &= claim(IdentityKey::Guid(guid.value.clone()), id, &mut sink);
            identity.guids.push(guid.clone());
        }
        match (facets.stable_index, IndexSpace::of(decl.kind)) {
            (Some(IndexRequest::Explicit(index)), Some(space)) => {
                if claim(IdentityKey::Index(space, index), id, &mut sink) {
                    taken.entry(space).or_default().insert(index);
                    identity.index = Some(index);
                } else {
                    ok = false;
                }
            }
            (Some(IndexRequest::Auto), Some(space)) => auto.push((id, space)),
            _ => {}
        }
        if ok {
            facet.identities[id.index()] = Some(identity);
        }
    }

    let mut next: FxHashMap<IndexSpace, u32> = FxHashMap::default();
    for (id, space) in auto {
        let Some(identity) = facet.identities[id.index()].as_mut() else {
            continue;
        };
        let used = taken.entry(space).or_default();
        let cursor = next.entry(space).or_insert(FIRST_STABLE_INDEX);
        while used.contains(cursor) {
            *cursor += 1;
        }
        used.insert(*cursor);
        identity.index = Some(*cursor);
        *cursor += 1;
    }

    debug!(claims = claims_len(&facet), "allocated identities");
    (facet, sink.finish())
}

fn claims_len(facet: &IdentityFacet) -> usize {
    facet
        .identities
        .iter()
        .flatten()
        .map(|i| i.guids.len() + usize::from(i.index.is_some()))
        .sum()
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
