//! Resolver configuration.
//!
//! Loaded from camelCase JSON by the CLI (`--config`) or built with the
//! setters below by embedders. Every field has a default, so `{}` is a valid
//! configuration.

use crate::rules::{AttributeRules, RuleOverrides};
use serde::{Deserialize, Serialize};

/// Types that exist outside any declaration set: runtime primitives and
/// platform types every schema may reference.
pub const STANDARD_EXTERNAL_TYPES: &[&str] = &[
    "Object",
    "String",
    "Boolean",
    "Char",
    "Int8",
    "UInt8",
    "Int16",
    "UInt16",
    "Int32",
    "UInt32",
    "Int64",
    "UInt64",
    "Single",
    "Double",
    "Guid",
    "Void",
    "Windows.Foundation.IInspectable",
    "Windows.Foundation.Object",
    "Windows.Foundation.String",
    "Windows.Foundation.Boolean",
    "Windows.Foundation.Int32",
    "Windows.Foundation.UInt32",
    "Windows.Foundation.Int64",
    "Windows.Foundation.Double",
    "Windows.Foundation.Single",
    "Windows.Foundation.DateTime",
    "Windows.Foundation.TimeSpan",
    "Windows.Foundation.Point",
    "Windows.Foundation.Size",
    "Windows.Foundation.Rect",
    "Windows.Foundation.Uri",
    "Windows.Foundation.IAsyncAction",
    "Windows.Foundation.IClosable",
    "Windows.Foundation.EventHandler",
    "Windows.Foundation.TypedEventHandler",
    "Windows.Foundation.Collections.IVector",
    "Windows.Foundation.Collections.IVectorView",
    "Windows.Foundation.Collections.IIterable",
    "Windows.Foundation.Collections.IMap",
    "Windows.UI.Color",
    "Windows.UI.Xaml.Interop.TypeName",
];

/// Options for one resolution pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Qualified names accepted as valid reference targets without a
    /// declaration.
    pub external_types: Vec<String>,
    /// Changes to the standard attribute rules table.
    pub attribute_rules: RuleOverrides,
    /// Contract implicitly gating ungated types in the namespaces below.
    pub default_contract: Option<String>,
    /// Namespace prefixes the default contract applies to. Empty means every
    /// namespace.
    pub default_contract_namespaces: Vec<String>,
    /// Run per-declaration and per-stage work on the rayon pool.
    pub parallel: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            external_types: STANDARD_EXTERNAL_TYPES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            attribute_rules: RuleOverrides::default(),
            default_contract: None,
            default_contract_namespaces: Vec::new(),
            parallel: true,
        }
    }
}

impl ResolverOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON.
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    #[must_use]
    pub fn with_external_type(mut self, name: impl Into<String>) -> Self {
        self.external_types.push(name.into());
        self
    }

    #[must_use]
    pub fn with_default_contract<I, S>(mut self, contract: impl Into<String>, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_contract = Some(contract.into());
        self.default_contract_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_rule_overrides(mut self, overrides: RuleOverrides) -> Self {
        self.attribute_rules = overrides;
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The effective rules table for a pass.
    #[must_use]
    pub fn rules(&self) -> AttributeRules {
        AttributeRules::with_overrides(&self.attribute_rules)
    }

    /// Whether an ungated type in `namespace` receives the default contract.
    #[must_use]
    pub fn default_contract_applies(&self, namespace: &str) -> bool {
        self.default_contract.is_some()
            && (self.default_contract_namespaces.is_empty()
                || self.default_contract_namespaces.iter().any(|prefix| {
                    namespace == prefix
                        || namespace
                            .strip_prefix(prefix.as_str())
                            .is_some_and(|rest| rest.starts_with('.'))
                }))
    }
}
