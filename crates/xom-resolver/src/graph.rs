//! Type graph construction.
//!
//! Resolves every type reference (bases, implemented interfaces, member
//! parents, value and parameter types), rejects structural errors, detects
//! inheritance cycles, and orders types base-before-derived with ties broken
//! by declaration order.
//!
//! A cycle is fatal for this stage: ordering, depth and the transitive
//! interface sets are only computed for an acyclic graph.

use crate::names::TypeRef;
use crate::stage::{DiagnosticSink, StageInput};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, warn};
use xom_common::{Diagnostic, diagnostic_codes};
use xom_model::{DeclId, DeclKind};

/// Resolved links of one type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeLinks {
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    /// Delegate return type.
    pub value_type: Option<TypeRef>,
    /// Delegate parameter types, in order.
    pub parameters: Vec<TypeRef>,
    /// Number of declared ancestors.
    pub depth: u32,
    /// Own, inherited and required interfaces, first occurrence order.
    pub all_interfaces: Vec<TypeRef>,
}

/// Resolved links of one member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberLinks {
    pub owner: DeclId,
    pub value_type: Option<TypeRef>,
    pub parameters: Vec<TypeRef>,
}

/// Output of the graph stage.
#[derive(Debug, Default)]
pub struct GraphFacet {
    pub types: Vec<Option<TypeLinks>>,
    pub members: Vec<Option<MemberLinks>>,
    /// Types base-before-derived; `None` when the stage aborted on a cycle.
    pub order: Option<Vec<DeclId>>,
}

/// Run the graph stage.
#[must_use]
pub fn build_graph(input: &StageInput<'_>) -> (GraphFacet, Vec<Diagnostic>) {
    let mut sink = DiagnosticSink::new("graph");
    let len = input.set.len();
    let mut facet = GraphFacet {
        types: vec![None; len],
        members: vec![None; len],
        order: None,
    };

    report_duplicates(input, &mut sink);
    link_types(input, &mut facet, &mut sink);
    link_members(input, &mut facet, &mut sink);

    if find_cycles(input, &facet, &mut sink) {
        warn!("inheritance cycle detected; type order not computed");
        return (facet, sink.finish());
    }
    compute_depths(input, &mut facet);
    compute_interfaces(input, &mut facet);
    facet.order = Some(topological_order(input, &facet));
    debug!(
        types = facet.types.iter().flatten().count(),
        members = facet.members.iter().flatten().count(),
        "built type graph"
    );
    (facet, sink.finish())
}

fn report_duplicates(input: &StageInput<'_>, sink: &mut DiagnosticSink) {
    for &(first, duplicate) in input.names.duplicates() {
        let name = input.decl(duplicate).qualified_name();
        sink.push(
            Diagnostic::from_code(diagnostic_codes::DUPLICATE_DECLARATION, &name, &[&name])
                .with_related(input.decl(first).qualified_name(), "first declared here"),
        );
    }

    // Properties and events share one name space per owner.
    let mut seen: FxHashMap<(DeclId, &str), DeclId> = FxHashMap::default();
    for (id, decl) in input.set.iter() {
        if !matches!(decl.kind, DeclKind::Property | DeclKind::Event | DeclKind::EnumMember) {
            continue;
        }
        let Some(owner) = input.owner(id) else {
            continue;
        };
        if let Some(&first) = seen.get(&(owner, decl.name.as_str())) {
            let name = decl.display_name();
            sink.push(
                Diagnostic::from_code(diagnostic_codes::DUPLICATE_DECLARATION, &name, &[&name])
                    .with_related(input.decl(first).display_name(), "first declared here"),
            );
        } else {
            seen.insert((owner, decl.name.as_str()), id);
        }
    }
}

fn resolve_ref(
    input: &StageInput<'_>,
    name: &str,
    scope: &str,
    subject: &str,
    sink: &mut DiagnosticSink,
) -> Option<TypeRef> {
    let resolved = input.names.lookup(name, scope);
    if resolved.is_none() {
        sink.report(diagnostic_codes::UNRESOLVED_TYPE_REFERENCE, subject, &[name]);
    }
    resolved
}

fn is_interface(input: &StageInput<'_>, id: DeclId) -> Option<bool> {
    input.facets(id).map(|f| f.interface)
}

fn link_types(input: &StageInput<'_>, facet: &mut GraphFacet, sink: &mut DiagnosticSink) {
    for (id, decl, facets) in input.types() {
        let subject = decl.qualified_name();
        let scope = decl.namespace.as_str();
        let mut links = TypeLinks::default();

        if let Some(base) = decl.base.as_deref() {
            let rejection = if decl.kind != DeclKind::Type {
                Some(format!("{} cannot declare a base type", decl.kind.with_article()))
            } else if facets.interface {
                Some("an interface cannot declare a base type".to_string())
            } else {
                None
            };
            if let Some(reason) = rejection {
                sink.report(diagnostic_codes::INVALID_BASE_TYPE, &subject, &[base, &reason]);
            } else if let Some(target) = resolve_ref(input, base, scope, &subject, sink) {
                let reason = match &target {
                    TypeRef::Declared(target_id) if input.decl(*target_id).kind != DeclKind::Type => {
                        Some(format!("it is {}", input.decl(*target_id).kind.with_article()))
                    }
                    TypeRef::Declared(target_id) if is_interface(input, *target_id) == Some(true) => {
                        Some("it is an interface".to_string())
                    }
                    _ => None,
                };
                match reason {
                    Some(reason) => {
                        sink.report(diagnostic_codes::INVALID_BASE_TYPE, &subject, &[base, &reason]);
                    }
                    None => links.base = Some(target),
                }
            }
        }

        for interface in &decl.interfaces {
            let Some(target) = resolve_ref(input, interface, scope, &subject, sink) else {
                continue;
            };
            if let TypeRef::Declared(target_id) = target
                && (input.decl(target_id).kind != DeclKind::Type
                    || is_interface(input, target_id) == Some(false))
            {
                sink.report(
                    diagnostic_codes::INVALID_INTERFACE_REFERENCE,
                    &subject,
                    &[interface],
                );
                continue;
            }
            links.interfaces.push(target);
        }

        if let Some(value_type) = decl.value_type.as_deref() {
            links.value_type = resolve_ref(input, value_type, scope, &subject, sink);
        }
        for parameter in &decl.parameters {
            if let Some(target) = resolve_ref(input, &parameter.type_name, scope, &subject, sink) {
                links.parameters.push(target);
            }
        }
        facet.types[id.index()] = Some(links);
    }
}

/// Which owner kinds a member kind may hang off.
fn owner_allowed(member: DeclKind, owner: DeclKind) -> bool {
    match member {
        DeclKind::EnumMember => owner == DeclKind::Enum,
        DeclKind::Property => matches!(owner, DeclKind::Type | DeclKind::Struct),
        DeclKind::Event | DeclKind::Method => owner == DeclKind::Type,
        _ => false,
    }
}

fn link_members(input: &StageInput<'_>, facet: &mut GraphFacet, sink: &mut DiagnosticSink) {
    for (id, decl, _) in input.members() {
        let subject = decl.display_name();
        let Some(owner) = input.owner(id) else {
            let parent = decl.parent.as_deref().unwrap_or("(missing parent)");
            sink.report(diagnostic_codes::UNRESOLVED_TYPE_REFERENCE, &subject, &[parent]);
            continue;
        };
        let owner_decl = input.decl(owner);
        if !owner_allowed(decl.kind, owner_decl.kind) {
            sink.report(
                diagnostic_codes::MEMBER_OWNER_MISMATCH,
                &subject,
                &[
                    &decl.kind.with_article(),
                    &owner_decl.kind.with_article(),
                    &owner_decl.qualified_name(),
                ],
            );
            continue;
        }

        let scope = input.scope_of(id);
        let mut links = MemberLinks {
            owner,
            value_type: None,
            parameters: Vec::with_capacity(decl.parameters.len()),
        };
        if let Some(value_type) = decl.value_type.as_deref() {
            links.value_type = resolve_ref(input, value_type, scope, &subject, sink);
        }
        for parameter in &decl.parameters {
            if let Some(target) = resolve_ref(input, &parameter.type_name, scope, &subject, sink) {
                links.parameters.push(target);
            }
        }
        facet.members[id.index()] = Some(links);
    }
}

fn declared_base(facet: &GraphFacet, id: DeclId) -> Option<DeclId> {
    facet
        .types
        .get(id.index())?
        .as_ref()?
        .base
        .as_ref()?
        .declared()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Report every inheritance cycle once. Returns whether any was found.
///
/// Each node has at most one outgoing edge, so walking from each unvisited
/// node in declaration order either ends at a finished node or closes a loop
/// on the current path.
fn find_cycles(input: &StageInput<'_>, facet: &GraphFacet, sink: &mut DiagnosticSink) -> bool {
    let mut marks = vec![Mark::Unvisited; input.set.len()];
    let mut found = false;
    for (start, _, _) in input.types() {
        if marks[start.index()] != Mark::Unvisited {
            continue;
        }
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            match marks[id.index()] {
                Mark::Done => break,
                Mark::OnPath => {
                    let at = path.iter().position(|&p| p == id).unwrap_or(0);
                    report_cycle(input, &path[at..], sink);
                    found = true;
                    break;
                }
                Mark::Unvisited => {
                    marks[id.index()] = Mark::OnPath;
                    path.push(id);
                    current = declared_base(facet, id);
                }
            }
        }
        for id in path {
            marks[id.index()] = Mark::Done;
        }
    }
    found
}

fn report_cycle(input: &StageInput<'_>, cycle: &[DeclId], sink: &mut DiagnosticSink) {
    let Some(&first) = cycle.first() else {
        return;
    };
    let names: Vec<String> = cycle
        .iter()
        .chain(std::iter::once(&first))
        .map(|&id| input.decl(id).qualified_name())
        .collect();
    let mut diagnostic = Diagnostic::from_code(
        diagnostic_codes::INHERITANCE_CYCLE,
        &names[0],
        &[&names.join(" -> ")],
    );
    for name in &names[1..names.len() - 1] {
        diagnostic = diagnostic.with_related(name.clone(), "part of the cycle");
    }
    sink.push(diagnostic);
}

fn compute_depths(input: &StageInput<'_>, facet: &mut GraphFacet) {
    let mut depths: Vec<Option<u32>> = vec![None; input.set.len()];
    for (id, _, _) in input.types() {
        let mut chain = Vec::new();
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(node) = current {
            if let Some(known) = depths[node.index()] {
                depth = known + 1;
                break;
            }
            chain.push(node);
            current = declared_base(facet, node);
        }
        // The chain ends at a root (depth 0) or a node of known depth.
        if current.is_none() {
            depth = 0;
        }
        for &node in chain.iter().rev() {
            depths[node.index()] = Some(depth);
            depth += 1;
        }
    }
    for (links, depth) in facet.types.iter_mut().zip(depths) {
        if let (Some(links), Some(depth)) = (links, depth) {
            links.depth = depth;
        }
    }
}

fn compute_interfaces(input: &StageInput<'_>, facet: &mut GraphFacet) {
    let len = input.set.len();
    let mut memo: Vec<Option<Vec<TypeRef>>> = vec![None; len];
    let mut visiting = vec![false; len];
    let mut stack: Vec<InterfaceFrame> = Vec::new();

    for (start, _, _) in input.types() {
        if memo[start.index()].is_some() {
            continue;
        }
        let Some(frame) = InterfaceFrame::new(start, facet) else {
            continue;
        };
        visiting[start.index()] = true;
        stack.push(frame);

        while let Some(frame) = stack.last_mut() {
            if let Some(&next) = frame.pending.get(frame.cursor) {
                frame.cursor += 1;
                // A node still on the stack closes a requirement loop.
                if memo[next.index()].is_none()
                    && !visiting[next.index()]
                    && let Some(child) = InterfaceFrame::new(next, facet)
                {
                    visiting[next.index()] = true;
                    stack.push(child);
                }
                continue;
            }
            let id = frame.id;
            stack.pop();
            memo[id.index()] = Some(merge_interfaces(id, facet, &memo));
            visiting[id.index()] = false;
        }
    }

    for (links, all) in facet.types.iter_mut().zip(memo) {
        if let (Some(links), Some(all)) = (links, all) {
            links.all_interfaces = all;
        }
    }
}

/// One type on the explicit interface-walk stack.
struct InterfaceFrame {
    id: DeclId,
    /// Declared required interfaces, then the declared base.
    pending: Vec<DeclId>,
    cursor: usize,
}

impl InterfaceFrame {
    fn new(id: DeclId, facet: &GraphFacet) -> Option<Self> {
        let links = facet.types.get(id.index())?.as_ref()?;
        let pending = links
            .interfaces
            .iter()
            .chain(links.base.as_ref())
            .filter_map(TypeRef::declared)
            .collect();
        Some(Self {
            id,
            pending,
            cursor: 0,
        })
    }
}

/// Own interfaces, the interfaces they require, then the base's set.
/// Dependencies without a memoized set (loop members) contribute nothing.
fn merge_interfaces(id: DeclId, facet: &GraphFacet, memo: &[Option<Vec<TypeRef>>]) -> Vec<TypeRef> {
    let Some(links) = facet.types.get(id.index()).and_then(Option::as_ref) else {
        return Vec::new();
    };
    let inherited = |target: &TypeRef| {
        target
            .declared()
            .and_then(|dep| memo[dep.index()].as_deref())
            .unwrap_or_default()
    };

    let mut all: IndexSet<TypeRef> = IndexSet::new();
    for interface in &links.interfaces {
        all.insert(interface.clone());
        all.extend(inherited(interface).iter().cloned());
    }
    if let Some(base) = &links.base {
        all.extend(inherited(base).iter().cloned());
    }
    all.into_iter().collect()
}

/// Kahn's algorithm with the ready set ordered by declaration id.
fn topological_order(input: &StageInput<'_>, facet: &GraphFacet) -> Vec<DeclId> {
    let mut children: FxHashMap<DeclId, Vec<DeclId>> = FxHashMap::default();
    let mut ready = BinaryHeap::new();
    for (id, _, _) in input.types() {
        if facet.types[id.index()].is_none() {
            continue;
        }
        match declared_base(facet, id) {
            Some(base) if facet.types[base.index()].is_some() => {
                children.entry(base).or_default().push(id);
            }
            _ => ready.push(Reverse(id)),
        }
    }

    let mut order = Vec::with_capacity(ready.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        if let Some(derived) = children.remove(&id) {
            ready.extend(derived.into_iter().map(Reverse));
        }
    }
    order
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
