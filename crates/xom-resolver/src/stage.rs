//! Shared plumbing for the resolution stages.

use crate::names::NameIndex;
use crate::normalize::Facets;
use crate::options::ResolverOptions;
use tracing::warn;
use xom_common::Diagnostic;
use xom_common::limits::MAX_DIAGNOSTICS_PER_STAGE;
use xom_model::{DeclId, Declaration, DeclarationSet};

/// Read-only view handed to the four middle stages.
///
/// Stages never see each other's output; they share only the declaration set,
/// the name index, the owner table and the normalized facets.
#[derive(Clone, Copy)]
pub struct StageInput<'a> {
    pub set: &'a DeclarationSet,
    pub options: &'a ResolverOptions,
    pub names: &'a NameIndex,
    /// Owning type per declaration (members only).
    pub owners: &'a [Option<DeclId>],
    /// Normalized facets per declaration; `None` when normalization failed.
    pub facets: &'a [Option<Facets>],
}

impl<'a> StageInput<'a> {
    #[must_use]
    pub fn decl(&self, id: DeclId) -> &'a Declaration {
        &self.set[id]
    }

    #[must_use]
    pub fn facets(&self, id: DeclId) -> Option<&'a Facets> {
        self.facets.get(id.index()).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn owner(&self, id: DeclId) -> Option<DeclId> {
        self.owners.get(id.index()).copied().flatten()
    }

    /// Namespace that relative references in `id` resolve against: its own,
    /// or its owner's for members declared without one.
    #[must_use]
    pub fn scope_of(&self, id: DeclId) -> &'a str {
        let decl = self.decl(id);
        if decl.namespace.is_empty()
            && let Some(owner) = self.owner(id)
        {
            return &self.set[owner].namespace;
        }
        &decl.namespace
    }

    /// Type-like declarations whose normalization succeeded, in order.
    pub fn types(&self) -> impl Iterator<Item = (DeclId, &'a Declaration, &'a Facets)> + 'a {
        let facets = self.facets;
        self.set.iter().filter_map(move |(id, decl)| {
            let f = facets.get(id.index())?.as_ref()?;
            decl.kind.is_type_like().then_some((id, decl, f))
        })
    }

    /// Members whose normalization succeeded, in order.
    pub fn members(&self) -> impl Iterator<Item = (DeclId, &'a Declaration, &'a Facets)> + 'a {
        let facets = self.facets;
        self.set.iter().filter_map(move |(id, decl)| {
            let f = facets.get(id.index())?.as_ref()?;
            decl.kind.is_member().then_some((id, decl, f))
        })
    }
}

/// Collects one stage's diagnostics, capped at `MAX_DIAGNOSTICS_PER_STAGE`.
#[derive(Debug)]
pub struct DiagnosticSink {
    stage: &'static str,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    dropped: usize,
}

impl DiagnosticSink {
    #[must_use]
    pub const fn new(stage: &'static str) -> Self {
        Self {
            stage,
            diagnostics: Vec::new(),
            errors: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        if self.diagnostics.len() < MAX_DIAGNOSTICS_PER_STAGE {
            self.diagnostics.push(diagnostic);
        } else {
            self.dropped += 1;
        }
    }

    /// Report `code` against `subject` using the message table.
    pub fn report(&mut self, code: u32, subject: impl Into<String>, args: &[&str]) {
        self.push(Diagnostic::from_code(code, subject, args));
    }

    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.errors > 0
    }

    #[must_use]
    pub fn finish(self) -> Vec<Diagnostic> {
        if self.dropped > 0 {
            warn!(
                stage = self.stage,
                dropped = self.dropped,
                "diagnostic limit reached"
            );
        }
        self.diagnostics
    }
}
