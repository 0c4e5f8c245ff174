//! Raw attribute bags as produced by the external parser.
//!
//! A raw attribute is just a spelling plus arguments. Arguments may be
//! positional (`Platform(WinUIContract, 3)`) or named
//! (`TypeTable(IsExcludedFromCore = true)`). Type arguments such as
//! `typeof(Microsoft.UI.Xaml.WinUIContract)` arrive as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute argument value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short description of the value's shape, used in argument errors.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// One attribute argument, positional when `name` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: AttrValue,
}

/// An attribute exactly as written on a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AttrArg>,
}

impl RawAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<AttrValue>) -> Self {
        self.args.push(AttrArg {
            name: None,
            value: value.into(),
        });
        self
    }

    /// Append a named argument.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.args.push(AttrArg {
            name: Some(name.into()),
            value: value.into(),
        });
        self
    }

    /// Positional arguments in order, skipping named ones.
    pub fn positional(&self) -> impl Iterator<Item = &AttrValue> {
        self.args
            .iter()
            .filter(|arg| arg.name.is_none())
            .map(|arg| &arg.value)
    }

    /// The `index`-th positional argument.
    #[must_use]
    pub fn positional_at(&self, index: usize) -> Option<&AttrValue> {
        self.positional().nth(index)
    }

    /// Named arguments in order.
    pub fn named_args(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.args
            .iter()
            .filter_map(|arg| arg.name.as_deref().map(|name| (name, &arg.value)))
    }

    /// Look up a named argument (case-sensitive, first match wins).
    #[must_use]
    pub fn named_arg(&self, name: &str) -> Option<&AttrValue> {
        self.named_args()
            .find(|(arg_name, _)| *arg_name == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for RawAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &arg.name {
                Some(name) => write!(f, "{name} = {}", arg.value)?,
                None => write!(f, "{}", arg.value)?,
            }
        }
        f.write_str(")")
    }
}
