//! Contract and version resolution.
//!
//! Builds the contract table, validates it, resolves every platform gate to a
//! declared `(contract, version)` pair, and computes each declaration's
//! effective availability. Gate semantics:
//!
//! - several gates on one declaration are alternatives (visible when any one
//!   is satisfied);
//! - a member with no gates inherits its owner's gates;
//! - a member gated on the owner's contract is clamped up to the owner's
//!   version, so a member is never visible before its type;
//! - a member gated on a contract its owner is not gated on additionally
//!   requires the owner's gates (`Availability::requires`).

use crate::attributes::{ContractVersionDecl, GateRef};
use crate::stage::{DiagnosticSink, StageInput};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, trace};
use xom_common::{Diagnostic, diagnostic_codes};
use xom_model::DeclId;

// =============================================================================
// Public types
// =============================================================================

/// A resolved platform gate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    pub contract: Arc<str>,
    pub version: u32,
    /// The contract's native-platform version for `version`, when mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_version: Option<u32>,
}

/// When a declaration is visible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Any one satisfied gate makes the declaration visible. Empty means
    /// unversioned: visible under every context.
    pub gates: SmallVec<[Gate; 1]>,
    /// Owner gates that must also hold, when `gates` do not already imply
    /// them.
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub requires: SmallVec<[Gate; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
}

impl Availability {
    #[must_use]
    pub fn is_unversioned(&self) -> bool {
        self.gates.is_empty() && self.requires.is_empty()
    }

    #[must_use]
    pub fn is_visible(&self, ctx: &AvailabilityContext) -> bool {
        let any = |gates: &[Gate]| gates.is_empty() || gates.iter().any(|g| ctx.satisfies(g));
        any(&self.gates)
            && any(&self.requires)
            && self
                .feature
                .as_deref()
                .is_none_or(|feature| ctx.feature_enabled(feature))
    }

    /// Lowest version of `contract` that makes this declaration visible.
    #[must_use]
    pub fn min_version(&self, contract: &str) -> Option<u32> {
        self.gates
            .iter()
            .filter(|g| &*g.contract == contract)
            .map(|g| g.version)
            .min()
    }

    /// Whether one of the gates is exactly `(contract, version)`.
    #[must_use]
    pub fn introduced_at(&self, contract: &str, version: u32) -> bool {
        self.gates
            .iter()
            .any(|g| &*g.contract == contract && g.version == version)
    }
}

/// The environment a visibility query is evaluated against.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityContext {
    pub contracts: BTreeMap<String, u32>,
    pub features: BTreeSet<String>,
}

impl AvailabilityContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contract(mut self, contract: impl Into<String>, version: u32) -> Self {
        self.contracts.insert(contract.into(), version);
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    #[must_use]
    pub fn satisfies(&self, gate: &Gate) -> bool {
        self.contracts
            .get(&*gate.contract)
            .is_some_and(|&version| version >= gate.version)
    }

    #[must_use]
    pub fn feature_enabled(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }
}

/// A declared contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractNode {
    pub name: String,
    pub decl: DeclId,
    pub versions: Vec<ContractVersionDecl>,
}

impl ContractNode {
    #[must_use]
    pub fn declares(&self, version: u32) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    #[must_use]
    pub fn latest(&self) -> Option<u32> {
        self.versions.last().map(|v| v.version)
    }

    #[must_use]
    pub fn native_version(&self, version: u32) -> Option<u32> {
        self.versions
            .iter()
            .find(|v| v.version == version)
            .and_then(|v| v.native_platform)
    }

    fn version_list(&self) -> String {
        self.versions
            .iter()
            .map(|v| v.version.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Output of the contract stage.
#[derive(Debug, Default)]
pub struct ContractFacet {
    pub contracts: Vec<ContractNode>,
    /// Availability per declaration, indexed by `DeclId`.
    pub availability: Vec<Option<Availability>>,
    /// Per type: every `(contract, version)` at which the type or one of its
    /// members becomes visible, sorted.
    pub projections: Vec<Vec<Gate>>,
}

// =============================================================================
// Resolution
// =============================================================================

struct ContractTable {
    contracts: Vec<ContractNode>,
    names: Vec<Arc<str>>,
    by_decl: FxHashMap<DeclId, (usize, bool)>,
}

enum GateError {
    Unknown(String),
    Invalid(String),
    Undeclared(u32, String, String),
}

impl ContractTable {
    fn build(input: &StageInput<'_>, sink: &mut DiagnosticSink) -> Self {
        let mut table = Self {
            contracts: Vec::new(),
            names: Vec::new(),
            by_decl: FxHashMap::default(),
        };
        for (id, decl, facets) in input.types() {
            if !facets.defines_contract() {
                continue;
            }
            let node = ContractNode {
                name: decl.qualified_name(),
                decl: id,
                versions: facets.contract_versions.clone(),
            };
            let valid = if node.versions.is_empty() {
                sink.report(diagnostic_codes::EMPTY_CONTRACT, &node.name, &[]);
                false
            } else if !node.versions.windows(2).all(|w| w[0].version < w[1].version) {
                sink.report(
                    diagnostic_codes::NON_MONOTONIC_CONTRACT_VERSIONS,
                    &node.name,
                    &[&node.version_list()],
                );
                false
            } else {
                true
            };
            trace!(contract = %node.name, valid, "contract declared");
            table.by_decl.insert(id, (table.contracts.len(), valid));
            table.names.push(Arc::from(node.name.as_str()));
            table.contracts.push(node);
        }
        table
    }

    fn resolve(&self, input: &StageInput<'_>, gate: &GateRef, scope: &str) -> Result<Gate, GateError> {
        let (index, valid) = input
            .names
            .lookup_declared(&gate.contract, scope)
            .and_then(|id| self.by_decl.get(&id).copied())
            .ok_or_else(|| GateError::Unknown(gate.contract.clone()))?;
        let node = &self.contracts[index];
        if !valid {
            return Err(GateError::Invalid(node.name.clone()));
        }
        if !node.declares(gate.version) {
            return Err(GateError::Undeclared(
                gate.version,
                node.name.clone(),
                node.version_list(),
            ));
        }
        Ok(Gate {
            contract: Arc::clone(&self.names[index]),
            version: gate.version,
            native_version: node.native_version(gate.version),
        })
    }

    fn resolve_all(
        &self,
        input: &StageInput<'_>,
        gates: &[GateRef],
        scope: &str,
        subject: &str,
        sink: &mut DiagnosticSink,
    ) -> Option<SmallVec<[Gate; 1]>> {
        let mut resolved = SmallVec::new();
        let mut ok = true;
        for gate in gates {
            match self.resolve(input, gate, scope) {
                Ok(gate) => resolved.push(gate),
                Err(error) => {
                    ok = false;
                    report_gate_error(sink, subject, error);
                }
            }
        }
        ok.then_some(resolved)
    }

    fn default_gate(&self, input: &StageInput<'_>, sink: &mut DiagnosticSink) -> Option<Gate> {
        let name = input.options.default_contract.as_deref()?;
        let Some(&(index, valid)) = input
            .names
            .get(name)
            .and_then(|id| self.by_decl.get(&id))
        else {
            sink.report(diagnostic_codes::UNKNOWN_CONTRACT, "defaultContract", &[name]);
            return None;
        };
        let node = &self.contracts[index];
        let first = node.versions.first().filter(|_| valid)?;
        Some(Gate {
            contract: Arc::clone(&self.names[index]),
            version: first.version,
            native_version: first.native_platform,
        })
    }
}

fn report_gate_error(sink: &mut DiagnosticSink, subject: &str, error: GateError) {
    match error {
        GateError::Unknown(name) => sink.report(diagnostic_codes::UNKNOWN_CONTRACT, subject, &[&name]),
        GateError::Invalid(name) => sink.report(diagnostic_codes::INVALID_GATE, subject, &[&name]),
        GateError::Undeclared(version, name, list) => sink.report(
            diagnostic_codes::UNDECLARED_CONTRACT_VERSION,
            subject,
            &[&version.to_string(), &name, &list],
        ),
    }
}

/// Run the contract stage.
#[must_use]
pub fn resolve_contracts(input: &StageInput<'_>) -> (ContractFacet, Vec<Diagnostic>) {
    let mut sink = DiagnosticSink::new("contracts");
    let table = ContractTable::build(input, &mut sink);
    let default_gate = table.default_gate(input, &mut sink);
    let mut availability: Vec<Option<Availability>> = vec![None; input.set.len()];

    for (id, decl, facets) in input.types() {
        let subject = decl.qualified_name();
        let Some(mut gates) =
            table.resolve_all(input, &facets.gates, &decl.namespace, &subject, &mut sink)
        else {
            continue;
        };
        if gates.is_empty()
            && !facets.defines_contract()
            && input.options.default_contract_applies(&decl.namespace)
            && let Some(default) = &default_gate
        {
            gates.push(default.clone());
        }
        availability[id.index()] = Some(Availability {
            gates,
            requires: SmallVec::new(),
            feature: facets.feature.clone(),
        });
    }

    for (id, decl, facets) in input.members() {
        let Some(owner) = input.owner(id) else {
            continue;
        };
        let Some(owner_availability) = availability[owner.index()].clone() else {
            continue;
        };
        let subject = decl.display_name();
        let Some(mut gates) =
            table.resolve_all(input, &facets.gates, input.scope_of(id), &subject, &mut sink)
        else {
            continue;
        };

        if let (Some(own), Some(inherited)) = (&facets.feature, &owner_availability.feature)
            && own != inherited
        {
            sink.report(
                diagnostic_codes::FEATURE_MISMATCH,
                &subject,
                &[own, inherited, &input.decl(owner).qualified_name()],
            );
            continue;
        }
        let feature = facets.feature.clone().or(owner_availability.feature);

        let requires = if gates.is_empty() {
            gates = owner_availability.gates;
            owner_availability.requires
        } else {
            clamp_to_owner(&mut gates, &owner_availability.gates);
            let implied = owner_availability.gates.is_empty()
                || gates
                    .iter()
                    .all(|g| owner_availability.gates.iter().any(|o| o.contract == g.contract));
            if implied {
                SmallVec::new()
            } else {
                owner_availability.gates
            }
        };
        availability[id.index()] = Some(Availability {
            gates,
            requires,
            feature,
        });
    }

    check_base_features(input, &mut sink);
    let projections = project_versions(input, &table, &availability);
    debug!(contracts = table.contracts.len(), "resolved contracts");

    let facet = ContractFacet {
        contracts: table.contracts,
        availability,
        projections,
    };
    (facet, sink.finish())
}

/// Raise member gates on an owner contract to at least the owner's version.
fn clamp_to_owner(gates: &mut [Gate], owner_gates: &[Gate]) {
    for gate in gates {
        if let Some(owner_gate) = owner_gates
            .iter()
            .filter(|o| o.contract == gate.contract)
            .min_by_key(|o| o.version)
            && owner_gate.version > gate.version
        {
            *gate = owner_gate.clone();
        }
    }
}

/// A public type deriving from a feature-gated base must carry the same feature.
fn check_base_features(input: &StageInput<'_>, sink: &mut DiagnosticSink) {
    for (_, decl, facets) in input.types() {
        if facets.visibility().is_hidden() {
            continue;
        }
        let Some(base_id) = decl
            .base
            .as_deref()
            .and_then(|base| input.names.lookup_declared(base, &decl.namespace))
        else {
            continue;
        };
        let Some(base_feature) = input.facets(base_id).and_then(|f| f.feature.as_deref()) else {
            continue;
        };
        if facets.feature.as_deref() != Some(base_feature) {
            sink.report(
                diagnostic_codes::FEATURE_MISMATCH,
                decl.qualified_name(),
                &[
                    facets.feature.as_deref().unwrap_or("(none)"),
                    base_feature,
                    &input.decl(base_id).qualified_name(),
                ],
            );
        }
    }
}

fn project_versions(
    input: &StageInput<'_>,
    table: &ContractTable,
    availability: &[Option<Availability>],
) -> Vec<Vec<Gate>> {
    let mut projections: Vec<BTreeSet<Gate>> = vec![BTreeSet::new(); input.set.len()];
    for (id, _, _) in input.types() {
        if let Some(av) = &availability[id.index()] {
            projections[id.index()].extend(av.gates.iter().cloned());
        }
        if let Some(&(index, true)) = table.by_decl.get(&id) {
            let node = &table.contracts[index];
            projections[id.index()].extend(node.versions.iter().map(|v| Gate {
                contract: Arc::clone(&table.names[index]),
                version: v.version,
                native_version: v.native_platform,
            }));
        }
    }
    for (id, _, _) in input.members() {
        if let (Some(owner), Some(av)) = (input.owner(id), &availability[id.index()]) {
            projections[owner.index()].extend(av.gates.iter().cloned());
        }
    }
    projections
        .into_iter()
        .map(|set| set.into_iter().collect())
        .collect()
}

#[cfg(test)]
#[path = "tests/contracts_tests.rs"]
mod tests;
