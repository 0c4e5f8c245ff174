//! The immutable declaration arena handed to a resolution pass.

use crate::declaration::Declaration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense index of a declaration within its `DeclarationSet`.
///
/// Ids are assigned in input order, so comparing two ids compares declaration
/// order. That ordering is load-bearing for ordinal identity assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

impl DeclId {
    /// The id at position `index`, saturating at `u32::MAX`.
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An ordered set of declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSet {
    #[serde(default)]
    declarations: Vec<Declaration>,
}

impl DeclarationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration and return its id.
    pub fn push(&mut self, declaration: Declaration) -> DeclId {
        let id = DeclId::from_index(self.declarations.len());
        self.declarations.push(declaration);
        id
    }

    #[must_use]
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declarations with their ids, in input order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (DeclId, &Declaration)> {
        self.declarations
            .iter()
            .enumerate()
            .map(|(i, decl)| (DeclId::from_index(i), decl))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Parse a set from its JSON form (`{"declarations": [...]}`).
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

impl std::ops::Index<DeclId> for DeclarationSet {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }
}

impl FromIterator<Declaration> for DeclarationSet {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        Self {
            declarations: iter.into_iter().collect(),
        }
    }
}

impl Extend<Declaration> for DeclarationSet {
    fn extend<I: IntoIterator<Item = Declaration>>(&mut self, iter: I) {
        self.declarations.extend(iter);
    }
}

#[cfg(test)]
#[path = "tests/declaration_tests.rs"]
mod tests;
