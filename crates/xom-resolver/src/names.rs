//! Qualified-name lookup shared by every stage.
//!
//! Lookup order for a reference written in namespace `A.B`:
//! 1. the name as a fully qualified name,
//! 2. the name relative to `A.B`, then `A`,
//! 3. the external type table.
//!
//! Generic references (`IVector<Ns.Item>`) resolve when the generic root and
//! every argument resolve. Array suffixes (`Ns.Item[]`) are ignored.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use xom_model::{DeclId, Declaration, DeclarationSet};

/// A resolved type reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Declared(DeclId),
    External(String),
}

impl TypeRef {
    #[must_use]
    pub const fn declared(&self) -> Option<DeclId> {
        match self {
            Self::Declared(id) => Some(*id),
            Self::External(_) => None,
        }
    }
}

/// Index of every type-like declaration by qualified name.
#[derive(Debug, Default)]
pub struct NameIndex {
    types: FxHashMap<String, DeclId>,
    /// `(first, duplicate)` pairs in declaration order.
    duplicates: Vec<(DeclId, DeclId)>,
    external: FxHashSet<String>,
}

impl NameIndex {
    #[must_use]
    pub fn build(set: &DeclarationSet, external_types: &[String]) -> Self {
        let mut types: FxHashMap<String, DeclId> = FxHashMap::default();
        let mut duplicates = Vec::new();
        for (id, decl) in set.iter() {
            if !decl.kind.is_type_like() {
                continue;
            }
            let name = decl.qualified_name();
            match types.get(&name) {
                Some(&first) => duplicates.push((first, id)),
                None => {
                    types.insert(name, id);
                }
            }
        }
        Self {
            types,
            duplicates,
            external: external_types.iter().cloned().collect(),
        }
    }

    /// Exact qualified-name lookup among declared types.
    #[must_use]
    pub fn get(&self, qualified: &str) -> Option<DeclId> {
        self.types.get(qualified).copied()
    }

    #[must_use]
    pub fn duplicates(&self) -> &[(DeclId, DeclId)] {
        &self.duplicates
    }

    #[must_use]
    pub fn is_external(&self, name: &str) -> bool {
        self.external.contains(name)
    }

    /// Resolve `name` as written in `namespace`.
    #[must_use]
    pub fn lookup(&self, name: &str, namespace: &str) -> Option<TypeRef> {
        let name = name.trim();
        let name = name.strip_suffix("[]").unwrap_or(name);
        if let Some((root, args)) = split_generic(name) {
            let root_ref = self.lookup_simple(root, namespace)?;
            for arg in args {
                self.lookup(arg, namespace)?;
            }
            return Some(match root_ref {
                TypeRef::Declared(id) => TypeRef::Declared(id),
                TypeRef::External(_) => TypeRef::External(name.to_string()),
            });
        }
        self.lookup_simple(name, namespace)
    }

    /// Like [`lookup`](Self::lookup) but only succeeds for declared types.
    #[must_use]
    pub fn lookup_declared(&self, name: &str, namespace: &str) -> Option<DeclId> {
        self.lookup(name, namespace).and_then(|r| r.declared())
    }

    /// The declared type owning `member`, if its parent reference resolves.
    #[must_use]
    pub fn owner_of(&self, member: &Declaration) -> Option<DeclId> {
        if !member.kind.is_member() {
            return None;
        }
        member
            .parent
            .as_deref()
            .and_then(|parent| self.lookup_declared(parent, &member.namespace))
    }

    fn lookup_simple(&self, name: &str, namespace: &str) -> Option<TypeRef> {
        if name.is_empty() {
            return None;
        }
        if let Some(id) = self.get(name) {
            return Some(TypeRef::Declared(id));
        }
        let mut scope = namespace;
        while !scope.is_empty() {
            if let Some(id) = self.get(&format!("{scope}.{name}")) {
                return Some(TypeRef::Declared(id));
            }
            scope = scope.rsplit_once('.').map_or("", |(outer, _)| outer);
        }
        self.is_external(name)
            .then(|| TypeRef::External(name.to_string()))
    }
}

/// Split `Root<A, B<C>>` into `Root` and its top-level arguments.
fn split_generic(name: &str) -> Option<(&str, Vec<&str>)> {
    let open = name.find('<')?;
    let inner = name[open + 1..].strip_suffix('>')?;
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    Some((name[..open].trim(), args))
}

#[cfg(test)]
#[path = "tests/names_tests.rs"]
mod tests;
