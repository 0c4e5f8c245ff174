//! The attribute rules table.
//!
//! Which spellings are recognized, which declaration kinds each may target,
//! whether it may repeat, whether it may appear on members of interface types,
//! and which claims conflict. The normalizer consults nothing else, so new
//! spellings or retargeted rules are configuration changes, not code changes.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use xom_model::DeclKinds;

/// The closed set of attribute kinds the resolver understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    CodeGen,
    TypeTable,
    ClassFlags,
    PropertyFlags,
    EventFlags,
    Platform,
    Contract,
    ContractVersion,
    VelocityFeature,
    Guids,
    StableIndex,
    NativeStorageType,
    OffsetFieldName,
    ReadOnly,
    Settable,
    Modifier,
    Deprecated,
    HandWritten,
    Imported,
    Interface,
    NativeName,
    Comment,
    Attached,
}

/// A semantic claim made by an attribute. Two attributes conflict when their
/// claims form a pair listed in the conflict table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Claim {
    ReadOnly,
    Settable,
    CoreOnly,
    ExcludedFromCore,
    ExcludedFromPublic,
    PublicSurface,
    Excluded,
    ContractDefinition,
    NativeStorage,
    HandWritten,
    Imported,
    Interface,
}

/// An unordered pair of mutually exclusive claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictRule {
    pub left: Claim,
    pub right: Claim,
}

impl ConflictRule {
    #[must_use]
    pub const fn new(left: Claim, right: Claim) -> Self {
        Self { left, right }
    }
}

/// One recognized spelling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRule {
    pub spelling: String,
    pub kind: AttributeKind,
    pub targets: DeclKinds,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default = "default_true")]
    pub on_interface_members: bool,
}

const fn default_true() -> bool {
    true
}

impl AttributeRule {
    fn new(spelling: &str, kind: AttributeKind, targets: DeclKinds) -> Self {
        Self {
            spelling: spelling.to_string(),
            kind,
            targets,
            repeatable: false,
            on_interface_members: true,
        }
    }

    fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    fn not_on_interface_members(mut self) -> Self {
        self.on_interface_members = false;
        self
    }
}

/// Configuration-level changes to the standard table.
///
/// Rules whose spelling already exists replace the standard rule; new
/// spellings are aliases. `remove` drops spellings entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleOverrides {
    pub rules: Vec<AttributeRule>,
    pub conflicts: Vec<ConflictRule>,
    pub remove: Vec<String>,
}

impl RuleOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.conflicts.is_empty() && self.remove.is_empty()
    }
}

/// The rules table consulted by the normalizer.
#[derive(Clone, Debug)]
pub struct AttributeRules {
    rules: Vec<AttributeRule>,
    by_spelling: FxHashMap<String, usize>,
    conflicts: Vec<ConflictRule>,
}

static STANDARD: Lazy<AttributeRules> = Lazy::new(AttributeRules::build_standard);

impl AttributeRules {
    /// The built-in table.
    #[must_use]
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// The built-in table with `overrides` applied.
    #[must_use]
    pub fn with_overrides(overrides: &RuleOverrides) -> Self {
        let mut rules = Self::standard();
        rules.apply(overrides);
        rules
    }

    fn build_standard() -> Self {
        use AttributeKind as K;
        let types = DeclKinds::TYPES;
        let class = DeclKinds::TYPE;
        let members = DeclKinds::CALLABLE_MEMBERS;
        let all_members = DeclKinds::MEMBERS;
        let everything = DeclKinds::all();

        let rules = vec![
            AttributeRule::new("CodeGen", K::CodeGen, everything),
            AttributeRule::new("TypeTable", K::TypeTable, types | members)
                .not_on_interface_members(),
            AttributeRule::new("ClassFlags", K::ClassFlags, class),
            AttributeRule::new("PropertyFlags", K::PropertyFlags, DeclKinds::PROPERTY)
                .not_on_interface_members(),
            AttributeRule::new("EventFlags", K::EventFlags, DeclKinds::EVENT)
                .not_on_interface_members(),
            AttributeRule::new("Platform", K::Platform, types | all_members).repeatable(),
            AttributeRule::new("Contract", K::Contract, class),
            AttributeRule::new("ContractVersion", K::ContractVersion, class).repeatable(),
            AttributeRule::new("VelocityFeature", K::VelocityFeature, types | all_members),
            AttributeRule::new("Guids", K::Guids, types),
            AttributeRule::new("StableIndex", K::StableIndex, types | members),
            AttributeRule::new(
                "NativeStorageType",
                K::NativeStorageType,
                DeclKinds::PROPERTY,
            )
            .not_on_interface_members(),
            AttributeRule::new("OffsetFieldName", K::OffsetFieldName, DeclKinds::PROPERTY)
                .not_on_interface_members(),
            AttributeRule::new("ReadOnly", K::ReadOnly, DeclKinds::PROPERTY),
            AttributeRule::new("Settable", K::Settable, DeclKinds::PROPERTY),
            AttributeRule::new("Modifier", K::Modifier, types | members),
            AttributeRule::new("Deprecated", K::Deprecated, everything),
            AttributeRule::new("HandWritten", K::HandWritten, types | members)
                .not_on_interface_members(),
            AttributeRule::new("Imported", K::Imported, types),
            AttributeRule::new("Interface", K::Interface, class),
            AttributeRule::new("NativeName", K::NativeName, everything),
            AttributeRule::new("Comment", K::Comment, everything),
            AttributeRule::new("Attached", K::Attached, DeclKinds::PROPERTY)
                .not_on_interface_members(),
        ];

        let conflicts = vec![
            ConflictRule::new(Claim::ReadOnly, Claim::Settable),
            ConflictRule::new(Claim::CoreOnly, Claim::ExcludedFromCore),
            ConflictRule::new(Claim::Interface, Claim::ContractDefinition),
            ConflictRule::new(Claim::Imported, Claim::HandWritten),
        ];

        Self::from_parts(rules, conflicts)
    }

    fn from_parts(rules: Vec<AttributeRule>, conflicts: Vec<ConflictRule>) -> Self {
        let by_spelling = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.spelling.clone(), i))
            .collect();
        Self {
            rules,
            by_spelling,
            conflicts,
        }
    }

    /// Apply configuration overrides in place.
    pub fn apply(&mut self, overrides: &RuleOverrides) {
        if overrides.is_empty() {
            return;
        }
        let mut rules = std::mem::take(&mut self.rules);
        rules.retain(|rule| !overrides.remove.contains(&rule.spelling));
        for rule in &overrides.rules {
            match rules.iter_mut().find(|r| r.spelling == rule.spelling) {
                Some(existing) => *existing = rule.clone(),
                None => rules.push(rule.clone()),
            }
        }
        let mut conflicts = std::mem::take(&mut self.conflicts);
        for conflict in &overrides.conflicts {
            if !conflicts.contains(conflict) {
                conflicts.push(*conflict);
            }
        }
        *self = Self::from_parts(rules, conflicts);
    }

    #[must_use]
    pub fn lookup(&self, spelling: &str) -> Option<&AttributeRule> {
        self.by_spelling.get(spelling).map(|&i| &self.rules[i])
    }

    #[must_use]
    pub fn rules(&self) -> &[AttributeRule] {
        &self.rules
    }

    #[must_use]
    pub fn conflicts(&self) -> &[ConflictRule] {
        &self.conflicts
    }

    /// Whether `a` and `b` are listed as a conflicting pair, in either order.
    #[must_use]
    pub fn conflicting(&self, a: Claim, b: Claim) -> bool {
        self.conflicts
            .iter()
            .any(|c| (c.left == a && c.right == b) || (c.left == b && c.right == a))
    }
}

impl Default for AttributeRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "tests/rules_tests.rs"]
mod tests;
