//! Attribute normalization.
//!
//! Projects each declaration's raw attribute bag into one canonical [`Facets`]
//! record. The projection of a bag depends only on the declaration kind and
//! the bag itself, so outcomes are memoized per `(kind, bag)` and shared by
//! every declaration carrying the same bag. Two checks need the owning type
//! and run afterwards, per member:
//!
//! - attributes not allowed on members of interface types;
//! - a member code-generation level asking for a surface its owner lacks,
//!   whether through the owner's own level and exclusions or through core
//!   exclusion inherited from one of its ancestors.
//!
//! Errors are local: a declaration that fails normalization is reported and
//! dropped from later stages, the rest of the set continues.

use crate::attributes::{
    Attribute, ClassFlags, CodeGenPolicy, ContractVersionDecl, EventFlags, GateRef, IndexRequest,
    NamedGuid, PropertyFlags, TypeTableFlags, ValueKind, Visibility,
};
use crate::names::NameIndex;
use crate::rules::{AttributeKind, AttributeRules};
use crate::storage::{Surfaces, core_exclusion_sources};
use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};
use xom_common::limits::NORMALIZER_CACHE_CAPACITY;
use xom_common::{Diagnostic, diagnostic_codes};
use xom_model::{DeclId, DeclKind, Declaration, DeclarationSet, RawAttribute};

// =============================================================================
// Facets
// =============================================================================

/// The canonical, attribute-derived facts about one declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facets {
    /// Explicit code-generation request; `None` means the default level.
    pub codegen: Option<CodeGenPolicy>,
    pub visibility: Option<Visibility>,
    pub type_table: TypeTableFlags,
    pub class_flags: ClassFlags,
    pub property_flags: PropertyFlags,
    pub event_flags: EventFlags,
    /// Platform gates, unresolved, in attribute order.
    pub gates: SmallVec<[GateRef; 1]>,
    pub is_contract: bool,
    pub contract_versions: Vec<ContractVersionDecl>,
    pub feature: Option<String>,
    pub guids: SmallVec<[NamedGuid; 1]>,
    pub stable_index: Option<IndexRequest>,
    pub value_kind: Option<ValueKind>,
    pub offset_field: Option<String>,
    pub read_only: bool,
    pub settable: bool,
    pub hand_written: bool,
    pub imported: bool,
    pub interface: bool,
    pub attached: bool,
    pub deprecated: Option<String>,
    pub native_name: Option<String>,
    pub comment: Option<String>,
    /// Rendered attribute that supplied each facet, first occurrence first.
    sources: SmallVec<[(AttributeKind, String); 4]>,
}

impl Facets {
    /// The rendered attribute of `kind`, for diagnostics that name attributes.
    #[must_use]
    pub fn source(&self, kind: AttributeKind) -> Option<&str> {
        self.sources
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, text)| text.as_str())
    }

    /// Whether this declaration defines a contract.
    #[must_use]
    pub fn defines_contract(&self) -> bool {
        self.is_contract || !self.contract_versions.is_empty()
    }

    /// Effective visibility (`Public` when unannotated).
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Public)
    }

    /// Surfaces removed by exclusion attributes, each with the attribute that
    /// removes it.
    #[must_use]
    pub fn exclusions(&self) -> SmallVec<[(Surfaces, AttributeKind); 3]> {
        let mut out = SmallVec::new();
        if self.type_table.contains(TypeTableFlags::EXCLUDED_FROM_CORE) {
            out.push((Surfaces::NATIVE_CORE, AttributeKind::TypeTable));
        }
        if self.type_table.contains(TypeTableFlags::EXCLUDED_FROM_DXAML) {
            out.push((Surfaces::PUBLIC | Surfaces::STUBS, AttributeKind::TypeTable));
        }
        if self.class_flags.contains(ClassFlags::HIDDEN_FROM_IDL) {
            out.push((Surfaces::PUBLIC | Surfaces::STUBS, AttributeKind::ClassFlags));
        }
        if self.hand_written {
            out.push((Surfaces::STUBS, AttributeKind::HandWritten));
        }
        out
    }

    /// Whether this declaration's own attributes exclude it from core.
    #[must_use]
    pub fn excludes_core(&self) -> bool {
        self.type_table.contains(TypeTableFlags::EXCLUDED_FROM_CORE)
    }

    /// Surfaces an owner can carry members on. Public and internal count as
    /// one surface, as do the two stub kinds; hand-written owners still accept
    /// stubs their members ask for.
    fn member_reach(&self) -> Surfaces {
        if self.imported {
            return Surfaces::empty();
        }
        let mut reach = self.codegen.unwrap_or_default().surfaces();
        for (excluded, kind) in self.exclusions() {
            if kind != AttributeKind::HandWritten {
                reach -= excluded;
            }
        }
        if reach.intersects(Surfaces::PUBLIC | Surfaces::INTERNAL) {
            reach |= Surfaces::PUBLIC | Surfaces::INTERNAL;
        }
        if reach.intersects(Surfaces::STUBS) {
            reach |= Surfaces::STUBS;
        }
        reach
    }

    /// Union of all excluded surfaces.
    #[must_use]
    pub fn excluded_surfaces(&self) -> Surfaces {
        self.exclusions()
            .iter()
            .fold(Surfaces::empty(), |acc, (s, _)| acc | *s)
    }

    fn apply(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::CodeGen(policy) => self.codegen = Some(policy),
            Attribute::TypeTable(flags) => self.type_table = flags,
            Attribute::ClassFlags(flags) => self.class_flags = flags,
            Attribute::PropertyFlags(flags) => self.property_flags = flags,
            Attribute::EventFlags(flags) => self.event_flags = flags,
            Attribute::Platform(gate) => self.gates.push(gate),
            Attribute::Contract => self.is_contract = true,
            Attribute::ContractVersion(version) => self.contract_versions.push(version),
            Attribute::VelocityFeature(name) => self.feature = Some(name),
            Attribute::Guids(guids) => self.guids = guids,
            Attribute::StableIndex(request) => self.stable_index = Some(request),
            Attribute::NativeStorageType(kind) => self.value_kind = Some(kind),
            Attribute::OffsetFieldName(field) => self.offset_field = Some(field),
            Attribute::ReadOnly => self.read_only = true,
            Attribute::Settable => self.settable = true,
            Attribute::Modifier(visibility) => self.visibility = Some(visibility),
            Attribute::Deprecated(message) => self.deprecated = Some(message),
            Attribute::HandWritten => self.hand_written = true,
            Attribute::Imported => self.imported = true,
            Attribute::Interface => self.interface = true,
            Attribute::NativeName(name) => self.native_name = Some(name),
            Attribute::Comment(text) => self.comment = Some(text),
            Attribute::Attached => self.attached = true,
        }
    }
}

// =============================================================================
// Bag normalization
// =============================================================================

/// Outcome of normalizing one `(kind, bag)` pair.
///
/// Diagnostics carry an empty subject; the caller fills it in per declaration.
#[derive(Clone, Debug, Default)]
pub struct BagOutcome {
    pub facets: Option<Facets>,
    pub diagnostics: Vec<Diagnostic>,
}

fn finding(code: u32, args: &[&str]) -> Diagnostic {
    Diagnostic::from_code(code, String::new(), args)
}

/// Normalize a bag without consulting the cache.
#[must_use]
pub fn normalize_bag(rules: &AttributeRules, kind: DeclKind, attrs: &[RawAttribute]) -> BagOutcome {
    let mut diagnostics = Vec::new();
    let mut failed = false;
    let mut parsed: Vec<(AttributeKind, Attribute, String)> = Vec::with_capacity(attrs.len());

    for raw in attrs {
        let rendered = raw.to_string();
        let Some(rule) = rules.lookup(&raw.name) else {
            diagnostics.push(finding(
                diagnostic_codes::UNKNOWN_ATTRIBUTE_KIND,
                &[&raw.name],
            ));
            failed = true;
            continue;
        };
        if !rule.targets.allows(kind) {
            diagnostics.push(finding(
                diagnostic_codes::ATTRIBUTE_KIND_MISMATCH,
                &[&raw.name, &format!("{} declaration", kind.with_article())],
            ));
            failed = true;
            continue;
        }
        let attribute = match Attribute::parse(rule.kind, raw) {
            Ok(attribute) => attribute,
            Err(reason) => {
                diagnostics.push(finding(
                    diagnostic_codes::INVALID_ATTRIBUTE_ARGUMENT,
                    &[&raw.name, &reason],
                ));
                failed = true;
                continue;
            }
        };

        let previous = parsed
            .iter()
            .filter(|(k, _, _)| *k == rule.kind)
            .find(|(_, a, _)| !rule.repeatable || *a == attribute);
        if let Some((_, prev, prev_text)) = previous {
            if *prev == attribute {
                diagnostics.push(finding(diagnostic_codes::REDUNDANT_ATTRIBUTE, &[&rendered]));
            } else {
                diagnostics.push(finding(
                    diagnostic_codes::CONFLICTING_ATTRIBUTES,
                    &[prev_text, &rendered],
                ));
                failed = true;
            }
            continue;
        }
        parsed.push((rule.kind, attribute, rendered));
    }

    let claims: Vec<_> = parsed
        .iter()
        .enumerate()
        .flat_map(|(i, (_, attribute, _))| attribute.claims().into_iter().map(move |c| (c, i)))
        .collect();
    let mut reported: SmallVec<[(usize, usize); 2]> = SmallVec::new();
    for (n, &(left, i)) in claims.iter().enumerate() {
        for &(right, j) in &claims[n + 1..] {
            if i == j || !rules.conflicting(left, right) || reported.contains(&(i, j)) {
                continue;
            }
            reported.push((i, j));
            diagnostics.push(finding(
                diagnostic_codes::CONFLICTING_ATTRIBUTES,
                &[&parsed[i].2, &parsed[j].2],
            ));
            failed = true;
        }
    }

    if failed {
        return BagOutcome {
            facets: None,
            diagnostics,
        };
    }

    let mut facets = Facets::default();
    for (kind, attribute, rendered) in parsed {
        facets.sources.push((kind, rendered));
        facets.apply(attribute);
    }
    BagOutcome {
        facets: Some(facets),
        diagnostics,
    }
}

// =============================================================================
// Normalizer
// =============================================================================

type BagKey = (DeclKind, Vec<RawAttribute>);

/// Output of the normalization stage.
#[derive(Debug, Default)]
pub struct Normalized {
    /// Facets per declaration, indexed by `DeclId`.
    pub facets: Vec<Option<Facets>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Memoizing attribute normalizer for one pass.
pub struct Normalizer<'r> {
    rules: &'r AttributeRules,
    cache: DashMap<BagKey, Arc<BagOutcome>, FxBuildHasher>,
}

impl<'r> Normalizer<'r> {
    #[must_use]
    pub fn new(rules: &'r AttributeRules) -> Self {
        Self {
            rules,
            cache: DashMap::with_capacity_and_hasher(NORMALIZER_CACHE_CAPACITY, FxBuildHasher),
        }
    }

    /// Normalize a bag, reusing the outcome of an identical earlier bag.
    pub fn normalize(&self, kind: DeclKind, attrs: &[RawAttribute]) -> Arc<BagOutcome> {
        let key = (kind, attrs.to_vec());
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }
        let outcome = Arc::new(normalize_bag(self.rules, kind, attrs));
        Arc::clone(self.cache.entry(key).or_insert(outcome).value())
    }

    /// Number of distinct bags seen so far.
    #[must_use]
    pub fn distinct_bags(&self) -> usize {
        self.cache.len()
    }

    /// Normalize every declaration of `set`. `owners` maps members to their
    /// owning type and `names` resolves base types for the owner-context
    /// checks.
    pub fn run(
        &self,
        set: &DeclarationSet,
        names: &NameIndex,
        owners: &[Option<DeclId>],
        parallel: bool,
    ) -> Normalized {
        let outcomes: Vec<Arc<BagOutcome>> = if parallel {
            set.as_slice()
                .par_iter()
                .map(|decl| self.normalize(decl.kind, &decl.attributes))
                .collect()
        } else {
            set.as_slice()
                .iter()
                .map(|decl| self.normalize(decl.kind, &decl.attributes))
                .collect()
        };
        debug!(
            declarations = set.len(),
            distinct_bags = self.distinct_bags(),
            "normalized attribute bags"
        );
        let core_sources = core_exclusion_sources(set, names, |id| {
            outcomes[id.index()]
                .facets
                .as_ref()
                .is_some_and(Facets::excludes_core)
        });

        let mut normalized = Normalized {
            facets: Vec::with_capacity(set.len()),
            diagnostics: Vec::new(),
        };
        for (id, decl) in set.iter() {
            let outcome = &outcomes[id.index()];
            let subject = decl.display_name();
            normalized
                .diagnostics
                .extend(outcome.diagnostics.iter().cloned().map(|mut d| {
                    d.subject.clone_from(&subject);
                    d
                }));

            let owner = owners
                .get(id.index())
                .copied()
                .flatten()
                .and_then(|owner| {
                    let facets = outcomes[owner.index()].facets.as_ref()?;
                    let core_ancestor = core_sources[owner.index()]
                        .filter(|&source| source != owner)
                        .and_then(|source| {
                            Some((&set[source], outcomes[source.index()].facets.as_ref()?))
                        });
                    Some(OwnerContext {
                        decl: &set[owner],
                        facets,
                        core_ancestor,
                    })
                });
            let facets = match (&outcome.facets, owner) {
                (Some(facets), Some(owner)) => {
                    let errors = self.check_owner_context(decl, facets, &owner);
                    if errors.is_empty() {
                        Some(facets.clone())
                    } else {
                        trace!(member = %subject, "member rejected by owner context");
                        normalized
                            .diagnostics
                            .extend(errors.into_iter().map(|mut d| {
                                d.subject.clone_from(&subject);
                                d
                            }));
                        None
                    }
                }
                (facets, _) => facets.clone(),
            };
            normalized.facets.push(facets);
        }
        normalized
    }

    fn check_owner_context(
        &self,
        member: &Declaration,
        facets: &Facets,
        owner: &OwnerContext<'_>,
    ) -> Vec<Diagnostic> {
        let mut errors = Vec::new();
        let owner_name = owner.decl.qualified_name();

        if owner.facets.interface {
            for raw in &member.attributes {
                if let Some(rule) = self.rules.lookup(&raw.name)
                    && !rule.on_interface_members
                {
                    errors.push(finding(
                        diagnostic_codes::ATTRIBUTE_KIND_MISMATCH,
                        &[&raw.name, &format!("a member of interface '{owner_name}'")],
                    ));
                }
            }
        }

        if let Some(policy) = facets.codegen {
            let mut reach = owner.facets.member_reach();
            if owner.core_ancestor.is_some() {
                reach.remove(Surfaces::NATIVE_CORE);
            }
            let missing = policy.surfaces() - reach;
            if !missing.is_empty() {
                let member_source = facets.source(AttributeKind::CodeGen).unwrap_or("CodeGen");
                let blame = owner.blame(missing);
                errors.push(finding(
                    diagnostic_codes::CONFLICTING_ATTRIBUTES,
                    &[member_source, &blame],
                ));
            }
        }
        errors
    }
}

/// The owning type of a member, as seen by the owner-context checks.
struct OwnerContext<'a> {
    decl: &'a Declaration,
    facets: &'a Facets,
    /// Nearest ancestor excluding the owner from core, when the owner does
    /// not exclude itself.
    core_ancestor: Option<(&'a Declaration, &'a Facets)>,
}

impl OwnerContext<'_> {
    /// The attribute, and where it is declared, that takes `missing` away
    /// from this owner.
    fn blame(&self, missing: Surfaces) -> String {
        let on_owner = |source: &str| format!("{source} on '{}'", self.decl.qualified_name());
        if let Some((_, kind)) = self
            .facets
            .exclusions()
            .into_iter()
            .find(|(excluded, kind)| *kind != AttributeKind::HandWritten && missing.intersects(*excluded))
        {
            return on_owner(self.facets.source(kind).unwrap_or("TypeTable"));
        }
        if missing.contains(Surfaces::NATIVE_CORE)
            && let Some((ancestor, ancestor_facets)) = self.core_ancestor
        {
            let source = ancestor_facets
                .source(AttributeKind::TypeTable)
                .unwrap_or("TypeTable");
            return format!(
                "{source} on '{}' (inherited by '{}')",
                ancestor.qualified_name(),
                self.decl.qualified_name()
            );
        }
        if self.facets.imported {
            return on_owner(self.facets.source(AttributeKind::Imported).unwrap_or("Imported"));
        }
        on_owner(self.facets.source(AttributeKind::CodeGen).unwrap_or("CodeGen"))
    }
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
