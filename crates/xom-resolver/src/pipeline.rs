//! The resolution pass.
//!
//! ```text
//! DeclarationSet
//!   -> names + owners
//!   -> normalize                      (per declaration, memoized)
//!   -> contracts | graph | storage | identity   (independent, may run concurrently)
//!   -> merge                          (only when no stage reported an error)
//!   -> TypeRegistry
//! ```
//!
//! Diagnostics are collected from every stage before the pass decides whether
//! to merge, so one run reports as many independent problems as possible.

use crate::contracts::{ContractFacet, resolve_contracts};
use crate::graph::{GraphFacet, build_graph};
use crate::identity::{IdentityFacet, allocate_identities};
use crate::names::NameIndex;
use crate::normalize::Normalizer;
use crate::options::ResolverOptions;
use crate::registry::{MemberNode, TypeNode, TypeRegistry};
use crate::stage::StageInput;
use crate::storage::{StorageFacet, map_storage};
use tracing::{debug, debug_span, info};
use xom_common::{Diagnostic, DiagnosticCategory};
use xom_model::{DeclId, DeclarationSet};

/// Result of one resolution pass.
#[derive(Debug)]
pub struct Resolution {
    /// Present only when no error was reported.
    pub registry: Option<TypeRegistry>,
    /// Every diagnostic, grouped by stage in pipeline order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Warning)
    }

    /// The registry, or every diagnostic when resolution failed.
    pub fn into_result(self) -> Result<TypeRegistry, Vec<Diagnostic>> {
        match self.registry {
            Some(registry) => Ok(registry),
            None => Err(self.diagnostics),
        }
    }
}

/// Resolve `set` with `options`.
#[must_use]
pub fn resolve(set: &DeclarationSet, options: &ResolverOptions) -> Resolution {
    Resolver::new(options).resolve(set)
}

/// Runs resolution passes with one set of options.
pub struct Resolver<'o> {
    options: &'o ResolverOptions,
}

struct StageFacets {
    contracts: ContractFacet,
    graph: GraphFacet,
    storage: StorageFacet,
    identity: IdentityFacet,
}

impl<'o> Resolver<'o> {
    #[must_use]
    pub const fn new(options: &'o ResolverOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn resolve(&self, set: &DeclarationSet) -> Resolution {
        let _span = debug_span!("resolve", declarations = set.len()).entered();
        let options = self.options;

        let names = NameIndex::build(set, &options.external_types);
        let owners: Vec<Option<DeclId>> = set
            .as_slice()
            .iter()
            .map(|decl| names.owner_of(decl))
            .collect();

        let rules = options.rules();
        let normalized = {
            let _span = debug_span!("normalize").entered();
            Normalizer::new(&rules).run(set, &names, &owners, options.parallel)
        };
        let mut diagnostics = normalized.diagnostics;

        let input = StageInput {
            set,
            options,
            names: &names,
            owners: &owners,
            facets: &normalized.facets,
        };
        let ((contracts, graph), (storage, identity)) = if options.parallel {
            rayon::join(
                || rayon::join(|| run_contracts(&input), || run_graph(&input)),
                || rayon::join(|| run_storage(&input), || run_identity(&input)),
            )
        } else {
            (
                (run_contracts(&input), run_graph(&input)),
                (run_storage(&input), run_identity(&input)),
            )
        };

        diagnostics.extend(contracts.1);
        diagnostics.extend(graph.1);
        diagnostics.extend(storage.1);
        diagnostics.extend(identity.1);

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        if errors > 0 {
            info!(errors, "resolution failed");
            return Resolution {
                registry: None,
                diagnostics,
            };
        }

        let facets = StageFacets {
            contracts: contracts.0,
            graph: graph.0,
            storage: storage.0,
            identity: identity.0,
        };
        let registry = {
            let _span = debug_span!("merge").entered();
            merge(&input, facets)
        };
        info!(types = registry.len(), "resolution succeeded");
        Resolution {
            registry: Some(registry),
            diagnostics,
        }
    }
}

fn run_contracts(input: &StageInput<'_>) -> (ContractFacet, Vec<Diagnostic>) {
    let _span = debug_span!("contracts").entered();
    resolve_contracts(input)
}

fn run_graph(input: &StageInput<'_>) -> (GraphFacet, Vec<Diagnostic>) {
    let _span = debug_span!("graph").entered();
    build_graph(input)
}

fn run_storage(input: &StageInput<'_>) -> (StorageFacet, Vec<Diagnostic>) {
    let _span = debug_span!("storage").entered();
    map_storage(input)
}

fn run_identity(input: &StageInput<'_>) -> (IdentityFacet, Vec<Diagnostic>) {
    let _span = debug_span!("identity").entered();
    allocate_identities(input)
}

/// Join the four facets into registry nodes.
///
/// Only reached when every stage succeeded, so every normalized declaration
/// has every facet; a declaration missing one is skipped rather than trusted.
fn merge(input: &StageInput<'_>, mut facets: StageFacets) -> TypeRegistry {
    let order = facets.graph.order.take().unwrap_or_default();
    let mut members = Vec::new();
    let mut members_by_owner: Vec<Vec<DeclId>> = vec![Vec::new(); input.set.len()];

    for (id, decl, f) in input.members() {
        let i = id.index();
        let (Some(links), Some(storage), Some(availability), Some(identity)) = (
            facets.graph.members[i].take(),
            facets.storage.members[i].take(),
            facets.contracts.availability[i].take(),
            facets.identity.identities[i].take(),
        ) else {
            debug!(member = %decl.display_name(), "member skipped during merge");
            continue;
        };
        members_by_owner[links.owner.index()].push(id);
        members.push(MemberNode {
            id,
            name: decl.name.clone(),
            kind: decl.kind,
            owner: links.owner,
            visibility: f.visibility(),
            value_type: links.value_type,
            parameters: links.parameters,
            accessor: storage.accessor,
            storage: storage.binding,
            codegen: storage.codegen,
            surfaces: storage.surfaces,
            availability,
            identity,
            property_flags: f.property_flags,
            event_flags: f.event_flags,
            attached: f.attached,
            deprecated: f.deprecated.clone(),
            native_name: f.native_name.clone(),
            comment: f.comment.clone(),
        });
    }

    let mut types = Vec::with_capacity(order.len());
    for id in order {
        let i = id.index();
        let (Some(f), Some(links), Some(storage), Some(availability), Some(identity)) = (
            input.facets(id),
            facets.graph.types[i].take(),
            facets.storage.types[i],
            facets.contracts.availability[i].take(),
            facets.identity.identities[i].take(),
        ) else {
            continue;
        };
        let decl = input.decl(id);
        types.push(TypeNode {
            id,
            name: decl.qualified_name(),
            namespace: decl.namespace.clone(),
            kind: decl.kind,
            base: links.base,
            interfaces: links.interfaces,
            all_interfaces: links.all_interfaces,
            depth: links.depth,
            members: std::mem::take(&mut members_by_owner[i]),
            visibility: f.visibility(),
            is_interface: f.interface,
            is_contract: f.defines_contract(),
            codegen: storage.codegen,
            surfaces: storage.surfaces,
            storage: storage.category,
            availability,
            version_projections: std::mem::take(&mut facets.contracts.projections[i]),
            identity,
            type_table: f.type_table,
            class_flags: f.class_flags,
            value_type: links.value_type,
            parameters: links.parameters,
            deprecated: f.deprecated.clone(),
            native_name: f.native_name.clone(),
            comment: f.comment.clone(),
        });
    }

    TypeRegistry::new(types, members, facets.contracts.contracts)
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
