//! Helpers shared by the unit tests.

use crate::names::NameIndex;
use crate::normalize::{Facets, Normalizer};
use crate::options::ResolverOptions;
use crate::stage::StageInput;
use xom_common::Diagnostic;
use xom_model::{DeclId, DeclarationSet, RawAttribute};

/// A declaration set taken through naming and normalization, ready to feed a
/// single stage.
pub(crate) struct Prepared {
    pub set: DeclarationSet,
    pub options: ResolverOptions,
    pub names: NameIndex,
    pub owners: Vec<Option<DeclId>>,
    pub facets: Vec<Option<Facets>>,
    pub normalize_diagnostics: Vec<Diagnostic>,
}

impl Prepared {
    pub fn new(set: DeclarationSet) -> Self {
        Self::with_options(set, ResolverOptions::default().with_parallel(false))
    }

    pub fn with_options(set: DeclarationSet, options: ResolverOptions) -> Self {
        let names = NameIndex::build(&set, &options.external_types);
        let owners = set.as_slice().iter().map(|d| names.owner_of(d)).collect::<Vec<_>>();
        let rules = options.rules();
        let normalized = Normalizer::new(&rules).run(&set, &names, &owners, false);
        Self {
            set,
            options,
            names,
            owners,
            facets: normalized.facets,
            normalize_diagnostics: normalized.diagnostics,
        }
    }

    pub fn input(&self) -> StageInput<'_> {
        StageInput {
            set: &self.set,
            options: &self.options,
            names: &self.names,
            owners: &self.owners,
            facets: &self.facets,
        }
    }
}

pub(crate) fn attr(name: &str) -> RawAttribute {
    RawAttribute::new(name)
}

pub(crate) fn platform(contract: &str, version: u32) -> RawAttribute {
    RawAttribute::new("Platform").arg(contract).arg(version)
}

pub(crate) fn contract_version(version: u32) -> RawAttribute {
    RawAttribute::new("ContractVersion").arg(version)
}

pub(crate) fn codes(diagnostics: &[Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}
