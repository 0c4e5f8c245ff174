//! Declarations: one record per type or member, exactly as the parser saw it.

use crate::attribute::RawAttribute;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeclKind {
    Type,
    Property,
    Event,
    Method,
    Enum,
    EnumMember,
    Delegate,
    Struct,
}

impl DeclKind {
    pub const ALL: [DeclKind; 8] = [
        DeclKind::Type,
        DeclKind::Property,
        DeclKind::Event,
        DeclKind::Method,
        DeclKind::Enum,
        DeclKind::EnumMember,
        DeclKind::Delegate,
        DeclKind::Struct,
    ];

    /// Types own members and participate in the type graph.
    #[must_use]
    pub const fn is_type_like(self) -> bool {
        matches!(self, Self::Type | Self::Enum | Self::Delegate | Self::Struct)
    }

    /// Members hang off exactly one owning type.
    #[must_use]
    pub const fn is_member(self) -> bool {
        !self.is_type_like()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Property => "property",
            Self::Event => "event",
            Self::Method => "method",
            Self::Enum => "enum",
            Self::EnumMember => "enum member",
            Self::Delegate => "delegate",
            Self::Struct => "struct",
        }
    }
}

impl DeclKind {
    /// The kind name with its indefinite article: `"an enum"`, `"a struct"`.
    #[must_use]
    pub fn with_article(self) -> String {
        let article = match self {
            Self::Enum | Self::EnumMember | Self::Event => "an",
            _ => "a",
        };
        format!("{article} {self}")
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// A set of declaration kinds, used by attribute validity rules.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DeclKinds: u16 {
        const TYPE = 1 << 0;
        const PROPERTY = 1 << 1;
        const EVENT = 1 << 2;
        const METHOD = 1 << 3;
        const ENUM = 1 << 4;
        const ENUM_MEMBER = 1 << 5;
        const DELEGATE = 1 << 6;
        const STRUCT = 1 << 7;

        const TYPES = Self::TYPE.bits() | Self::ENUM.bits() | Self::DELEGATE.bits() | Self::STRUCT.bits();
        const MEMBERS = Self::PROPERTY.bits() | Self::EVENT.bits() | Self::METHOD.bits() | Self::ENUM_MEMBER.bits();
        const CALLABLE_MEMBERS = Self::PROPERTY.bits() | Self::EVENT.bits() | Self::METHOD.bits();
    }
}

impl DeclKinds {
    #[must_use]
    pub const fn of(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Type => Self::TYPE,
            DeclKind::Property => Self::PROPERTY,
            DeclKind::Event => Self::EVENT,
            DeclKind::Method => Self::METHOD,
            DeclKind::Enum => Self::ENUM,
            DeclKind::EnumMember => Self::ENUM_MEMBER,
            DeclKind::Delegate => Self::DELEGATE,
            DeclKind::Struct => Self::STRUCT,
        }
    }

    #[must_use]
    pub const fn allows(self, kind: DeclKind) -> bool {
        self.contains(Self::of(kind))
    }
}

/// Accessor presence on a property declaration.
///
/// Ignored for every other kind. A property with neither accessor is treated
/// as read-write because that is what a bare auto-property means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessors {
    pub getter: bool,
    pub setter: bool,
}

impl Default for Accessors {
    fn default() -> Self {
        Self {
            getter: true,
            setter: true,
        }
    }
}

/// A method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// A type or member declaration.
///
/// All name references (`parent`, `base`, `interfaces`, `value_type`,
/// parameter types) are unresolved strings; the resolver looks them up by
/// qualified name, then relative to `namespace`, then in the external table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub kind: DeclKind,
    /// Owning type, for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub accessors: Accessors,
    /// Property type, event handler type, or method return type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Constant value, for enum members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl Declaration {
    pub fn new(kind: DeclKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
            parent: None,
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            accessors: Accessors::default(),
            value_type: None,
            parameters: Vec::new(),
            value: None,
        }
    }

    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclKind::Type, namespace, name)
    }

    pub fn enumeration(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclKind::Enum, namespace, name)
    }

    pub fn structure(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclKind::Struct, namespace, name)
    }

    pub fn delegate(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclKind::Delegate, namespace, name)
    }

    /// A member of `parent`, declared in the empty namespace.
    pub fn member(kind: DeclKind, parent: impl Into<String>, name: impl Into<String>) -> Self {
        let mut decl = Self::new(kind, String::new(), name);
        decl.parent = Some(parent.into());
        decl
    }

    pub fn property(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::member(DeclKind::Property, parent, name)
    }

    pub fn event(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::member(DeclKind::Event, parent, name)
    }

    pub fn method(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::member(DeclKind::Method, parent, name)
    }

    pub fn enum_member(parent: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        let mut decl = Self::member(DeclKind::EnumMember, parent, name);
        decl.value = Some(value);
        decl
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, attribute: RawAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_accessors(mut self, getter: bool, setter: bool) -> Self {
        self.accessors = Accessors { getter, setter };
        self
    }

    #[must_use]
    pub fn with_value_type(mut self, type_name: impl Into<String>) -> Self {
        self.value_type = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// `Namespace.Name` for types, `Name` when the namespace is empty.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Name used in diagnostics: the qualified name for types, `Parent.Name`
    /// for members.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.parent, self.kind.is_member()) {
            (Some(parent), true) => format!("{parent}.{}", self.name),
            _ => self.qualified_name(),
        }
    }

    /// Every type name this declaration references, in a stable order:
    /// base, interfaces, value type, then parameter types.
    pub fn type_references(&self) -> impl Iterator<Item = &str> {
        self.base
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
            .chain(self.value_type.as_deref())
            .chain(self.parameters.iter().map(|p| p.type_name.as_str()))
    }
}
