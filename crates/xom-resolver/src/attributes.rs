//! Canonical attribute values.
//!
//! Every recognized raw attribute is parsed into exactly one [`Attribute`]
//! variant. Parsing only looks at the attribute's own arguments; checks that
//! need the declaration kind or the rest of the bag live in `normalize`.

use crate::rules::{AttributeKind, Claim};
use crate::storage::Surfaces;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use xom_model::{AttrValue, RawAttribute};

// =============================================================================
// Code generation levels
// =============================================================================

/// How much generated code a declaration receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeGenLevel {
    Exclude,
    LookupOnly,
    CoreOnly,
    Idl,
    IdlAndStub,
    IdlAndPartialStub,
}

impl CodeGenLevel {
    fn parse(text: &str) -> Option<Self> {
        let text = text.rsplit('.').next().unwrap_or(text);
        Some(match text {
            "Exclude" => Self::Exclude,
            "LookupOnly" => Self::LookupOnly,
            "CoreOnly" => Self::CoreOnly,
            "Idl" => Self::Idl,
            "IdlAndStub" => Self::IdlAndStub,
            "IdlAndPartialStub" => Self::IdlAndPartialStub,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exclude => "Exclude",
            Self::LookupOnly => "LookupOnly",
            Self::CoreOnly => "CoreOnly",
            Self::Idl => "Idl",
            Self::IdlAndStub => "IdlAndStub",
            Self::IdlAndPartialStub => "IdlAndPartialStub",
        }
    }
}

/// A code generation request: level plus the `partial` modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeGenPolicy {
    pub level: CodeGenLevel,
    pub partial: bool,
}

impl CodeGenPolicy {
    /// Policy of a declaration with no `CodeGen` attribute.
    pub const DEFAULT: Self = Self {
        level: CodeGenLevel::IdlAndStub,
        partial: false,
    };

    /// Surfaces this policy asks for, before any exclusion is applied.
    #[must_use]
    pub fn surfaces(self) -> Surfaces {
        let base = match self.level {
            CodeGenLevel::Exclude => Surfaces::empty(),
            CodeGenLevel::LookupOnly | CodeGenLevel::CoreOnly => Surfaces::NATIVE_CORE,
            CodeGenLevel::Idl => Surfaces::PUBLIC | Surfaces::NATIVE_CORE,
            CodeGenLevel::IdlAndStub => Surfaces::PUBLIC | Surfaces::NATIVE_CORE | Surfaces::STUB,
            CodeGenLevel::IdlAndPartialStub => Surfaces::PUBLIC | Surfaces::PARTIAL_STUB,
        };
        if self.partial && base.contains(Surfaces::STUB) {
            (base - Surfaces::STUB) | Surfaces::PARTIAL_STUB
        } else {
            base
        }
    }
}

impl Default for CodeGenPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Flag sets
// =============================================================================

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TypeTableFlags: u8 {
        const EXCLUDED_FROM_CORE = 1 << 0;
        const EXCLUDED_FROM_DXAML = 1 << 1;
        const EXCLUDED_FROM_NEW_TYPE_TABLE = 1 << 2;
        const EXCLUDED_FROM_VISUAL_TREE = 1 << 3;
        const EXCLUDED_FROM_REFERENCE_TRACKER_WALK = 1 << 4;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ClassFlags: u8 {
        const HIDDEN_FROM_IDL = 1 << 0;
        const HIDDEN_IN_XAML = 1 << 1;
        const CAN_CONVERT_FROM_STRING = 1 << 2;
        const HAS_TYPE_CONVERTER = 1 << 3;
        const IS_MARKUP_EXTENSION = 1 << 4;
        const REQUIRES_CORE_SERVICES = 1 << 5;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PropertyFlags: u16 {
        const AFFECTS_MEASURE = 1 << 0;
        const AFFECTS_ARRANGE = 1 << 1;
        const IS_VALUE_INHERITED = 1 << 2;
        const IS_IN_STORAGE_GROUP = 1 << 3;
        const IS_VALUE_CREATED_ON_DEMAND = 1 << 4;
        const IS_EXCLUDED_FROM_VISUAL_TREE = 1 << 5;
        const IS_READ_ONLY_EXCEPT_FOR_PARSER = 1 << 6;
        const IS_INDEPENDENTLY_ANIMATABLE = 1 << 7;
        const IS_CONDITIONALLY_INDEPENDENTLY_ANIMATABLE = 1 << 8;
        const NEEDS_INVOKE = 1 << 9;
        const IS_SETTER_IMPL_VIRTUAL = 1 << 10;
        const HAD_FIELD_IN_BLUE = 1 << 11;
        const USE_COM_PTR = 1 << 12;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EventFlags: u8 {
        const USE_EVENT_MANAGER = 1 << 0;
        const IS_CONTROL_EVENT = 1 << 1;
        const IS_HIDDEN = 1 << 2;
        const IS_IMPL_VIRTUAL = 1 << 3;
    }
}

/// Maps a named flag argument to a bit. `inverted` entries set the bit when
/// the argument is `false` (`IsVisibleInXAML = false` sets `HIDDEN_IN_XAML`).
struct FlagSpec<F> {
    name: &'static str,
    flag: F,
    inverted: bool,
}

const fn flag<F>(name: &'static str, flag: F) -> FlagSpec<F> {
    FlagSpec {
        name,
        flag,
        inverted: false,
    }
}

const fn inverted<F>(name: &'static str, flag: F) -> FlagSpec<F> {
    FlagSpec {
        name,
        flag,
        inverted: true,
    }
}

const TYPE_TABLE_FLAGS: &[FlagSpec<TypeTableFlags>] = &[
    flag("IsExcludedFromCore", TypeTableFlags::EXCLUDED_FROM_CORE),
    flag("IsExcludedFromDXaml", TypeTableFlags::EXCLUDED_FROM_DXAML),
    flag(
        "IsExcludedFromNewTypeTable",
        TypeTableFlags::EXCLUDED_FROM_NEW_TYPE_TABLE,
    ),
    flag(
        "IsExcludedFromVisualTree",
        TypeTableFlags::EXCLUDED_FROM_VISUAL_TREE,
    ),
    flag(
        "IsExcludedFromReferenceTrackerWalk",
        TypeTableFlags::EXCLUDED_FROM_REFERENCE_TRACKER_WALK,
    ),
];

const CLASS_FLAGS: &[FlagSpec<ClassFlags>] = &[
    flag("IsHiddenFromIdl", ClassFlags::HIDDEN_FROM_IDL),
    inverted("IsVisibleInXAML", ClassFlags::HIDDEN_IN_XAML),
    flag("CanConvertFromString", ClassFlags::CAN_CONVERT_FROM_STRING),
    flag("HasTypeConverter", ClassFlags::HAS_TYPE_CONVERTER),
    flag("IsMarkupExtension", ClassFlags::IS_MARKUP_EXTENSION),
    flag("RequiresCoreServices", ClassFlags::REQUIRES_CORE_SERVICES),
];

const PROPERTY_FLAGS: &[FlagSpec<PropertyFlags>] = &[
    flag("AffectsMeasure", PropertyFlags::AFFECTS_MEASURE),
    flag("AffectsArrange", PropertyFlags::AFFECTS_ARRANGE),
    flag("IsValueInherited", PropertyFlags::IS_VALUE_INHERITED),
    flag("IsInStorageGroup", PropertyFlags::IS_IN_STORAGE_GROUP),
    flag(
        "IsValueCreatedOnDemand",
        PropertyFlags::IS_VALUE_CREATED_ON_DEMAND,
    ),
    flag(
        "IsExcludedFromVisualTree",
        PropertyFlags::IS_EXCLUDED_FROM_VISUAL_TREE,
    ),
    flag(
        "IsReadOnlyExceptForParser",
        PropertyFlags::IS_READ_ONLY_EXCEPT_FOR_PARSER,
    ),
    flag(
        "IsIndependentlyAnimatable",
        PropertyFlags::IS_INDEPENDENTLY_ANIMATABLE,
    ),
    flag(
        "IsConditionallyIndependentlyAnimatable",
        PropertyFlags::IS_CONDITIONALLY_INDEPENDENTLY_ANIMATABLE,
    ),
    flag("NeedsInvoke", PropertyFlags::NEEDS_INVOKE),
    flag("IsSetterImplVirtual", PropertyFlags::IS_SETTER_IMPL_VIRTUAL),
    flag("HadFieldInBlue", PropertyFlags::HAD_FIELD_IN_BLUE),
    flag("UseComPtr", PropertyFlags::USE_COM_PTR),
];

const EVENT_FLAGS: &[FlagSpec<EventFlags>] = &[
    flag("UseEventManager", EventFlags::USE_EVENT_MANAGER),
    flag("IsControlEvent", EventFlags::IS_CONTROL_EVENT),
    flag("IsHidden", EventFlags::IS_HIDDEN),
    flag("IsImplVirtual", EventFlags::IS_IMPL_VIRTUAL),
];

// =============================================================================
// Scalar facets
// =============================================================================

/// Declared accessibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    fn parse(text: &str) -> Option<Self> {
        Some(match text.rsplit('.').next().unwrap_or(text) {
            "Public" => Self::Public,
            "Protected" => Self::Protected,
            "Internal" => Self::Internal,
            "Private" => Self::Private,
            _ => return None,
        })
    }

    /// Internal and private declarations never reach the public surface.
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Internal | Self::Private)
    }
}

/// The native value representation of a property's backing storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Object,
    Bool,
    Enum,
    Float,
    Double,
    Signed,
    Unsigned,
    String,
    Color,
    Point,
    Size,
    Rect,
    Thickness,
    CornerRadius,
    GridLength,
    TimeSpan,
    ValueObject,
}

impl ValueKind {
    /// Accepts `Float`, `valueFloat`, `ValueType.valueFloat` and the like.
    fn parse(text: &str) -> Option<Self> {
        let text = text.rsplit('.').next().unwrap_or(text);
        let text = text.strip_prefix("value").unwrap_or(text);
        Some(match text.to_ascii_lowercase().as_str() {
            "object" => Self::Object,
            "bool" => Self::Bool,
            "enum" => Self::Enum,
            "float" => Self::Float,
            "double" => Self::Double,
            "signed" => Self::Signed,
            "unsigned" => Self::Unsigned,
            "string" => Self::String,
            "color" => Self::Color,
            "point" => Self::Point,
            "size" => Self::Size,
            "rect" => Self::Rect,
            "thickness" => Self::Thickness,
            "cornerradius" => Self::CornerRadius,
            "gridlength" => Self::GridLength,
            "timespan" => Self::TimeSpan,
            "vo" | "valueobject" => Self::ValueObject,
            _ => return None,
        })
    }
}

/// A normalized GUID string: braces stripped, lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Normalize `text`. Returns `None` for empty input.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One GUID role of a `Guids` attribute (`ClassGuid`, `InterfaceGuid`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedGuid {
    pub role: String,
    pub value: Guid,
}

/// A stable ordinal request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexRequest {
    Auto,
    Explicit(u32),
}

/// An unresolved platform gate: a contract name and a version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateRef {
    pub contract: String,
    pub version: u32,
}

/// One version declared by a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractVersionDecl {
    pub version: u32,
    /// Version of the parallel lightweight binding surface, when mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_platform: Option<u32>,
}

// =============================================================================
// Canonical attribute
// =============================================================================

/// A parsed attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    CodeGen(CodeGenPolicy),
    TypeTable(TypeTableFlags),
    ClassFlags(ClassFlags),
    PropertyFlags(PropertyFlags),
    EventFlags(EventFlags),
    Platform(GateRef),
    Contract,
    ContractVersion(ContractVersionDecl),
    VelocityFeature(String),
    Guids(SmallVec<[NamedGuid; 1]>),
    StableIndex(IndexRequest),
    NativeStorageType(ValueKind),
    OffsetFieldName(String),
    ReadOnly,
    Settable,
    Modifier(Visibility),
    Deprecated(String),
    HandWritten,
    Imported,
    Interface,
    NativeName(String),
    Comment(String),
    Attached,
}

type ParseResult<T> = Result<T, String>;

impl Attribute {
    /// Parse `raw` as an attribute of `kind`. The error is a short reason
    /// suitable for `InvalidAttributeArgument`.
    pub fn parse(kind: AttributeKind, raw: &RawAttribute) -> ParseResult<Self> {
        Ok(match kind {
            AttributeKind::CodeGen => Self::CodeGen(parse_codegen(raw)?),
            AttributeKind::TypeTable => Self::TypeTable(parse_flags(raw, TYPE_TABLE_FLAGS)?),
            AttributeKind::ClassFlags => Self::ClassFlags(parse_flags(raw, CLASS_FLAGS)?),
            AttributeKind::PropertyFlags => {
                Self::PropertyFlags(parse_flags(raw, PROPERTY_FLAGS)?)
            }
            AttributeKind::EventFlags => Self::EventFlags(parse_flags(raw, EVENT_FLAGS)?),
            AttributeKind::Platform => Self::Platform(parse_platform(raw)?),
            AttributeKind::Contract => {
                expect_no_args(raw)?;
                Self::Contract
            }
            AttributeKind::ContractVersion => Self::ContractVersion(parse_contract_version(raw)?),
            AttributeKind::VelocityFeature => Self::VelocityFeature(single_string(raw)?),
            AttributeKind::Guids => Self::Guids(parse_guids(raw)?),
            AttributeKind::StableIndex => Self::StableIndex(parse_stable_index(raw)?),
            AttributeKind::NativeStorageType => {
                let text = single_string(raw)?;
                Self::NativeStorageType(
                    ValueKind::parse(&text)
                        .ok_or_else(|| format!("unknown value kind '{text}'"))?,
                )
            }
            AttributeKind::OffsetFieldName => Self::OffsetFieldName(single_string(raw)?),
            AttributeKind::ReadOnly => {
                expect_no_args(raw)?;
                Self::ReadOnly
            }
            AttributeKind::Settable => {
                expect_no_args(raw)?;
                Self::Settable
            }
            AttributeKind::Modifier => {
                let text = single_string(raw)?;
                Self::Modifier(
                    Visibility::parse(&text)
                        .ok_or_else(|| format!("unknown visibility '{text}'"))?,
                )
            }
            AttributeKind::Deprecated => Self::Deprecated(optional_string(raw)?),
            AttributeKind::HandWritten => {
                expect_no_args(raw)?;
                Self::HandWritten
            }
            AttributeKind::Imported => {
                expect_no_args(raw)?;
                Self::Imported
            }
            AttributeKind::Interface => {
                expect_no_args(raw)?;
                Self::Interface
            }
            AttributeKind::NativeName => Self::NativeName(single_string(raw)?),
            AttributeKind::Comment => Self::Comment(single_string(raw)?),
            AttributeKind::Attached => {
                expect_no_args(raw)?;
                Self::Attached
            }
        })
    }

    /// Claims this attribute makes, checked against the conflict table.
    #[must_use]
    pub fn claims(&self) -> SmallVec<[Claim; 2]> {
        match self {
            Self::CodeGen(policy) => match policy.level {
                CodeGenLevel::CoreOnly => smallvec![Claim::CoreOnly],
                CodeGenLevel::Exclude => smallvec![Claim::Excluded],
                CodeGenLevel::Idl | CodeGenLevel::IdlAndStub | CodeGenLevel::IdlAndPartialStub => {
                    smallvec![Claim::PublicSurface]
                }
                CodeGenLevel::LookupOnly => SmallVec::new(),
            },
            Self::TypeTable(flags) => {
                let mut claims = SmallVec::new();
                if flags.contains(TypeTableFlags::EXCLUDED_FROM_CORE) {
                    claims.push(Claim::ExcludedFromCore);
                }
                if flags.contains(TypeTableFlags::EXCLUDED_FROM_DXAML) {
                    claims.push(Claim::ExcludedFromPublic);
                }
                claims
            }
            Self::ClassFlags(flags) if flags.contains(ClassFlags::HIDDEN_FROM_IDL) => {
                smallvec![Claim::ExcludedFromPublic]
            }
            Self::ContractVersion(_) | Self::Contract => smallvec![Claim::ContractDefinition],
            Self::OffsetFieldName(_) | Self::NativeStorageType(_) => {
                smallvec![Claim::NativeStorage]
            }
            Self::ReadOnly => smallvec![Claim::ReadOnly],
            Self::Settable => smallvec![Claim::Settable],
            Self::HandWritten => smallvec![Claim::HandWritten],
            Self::Imported => smallvec![Claim::Imported],
            Self::Interface => smallvec![Claim::Interface],
            _ => SmallVec::new(),
        }
    }
}

fn type_argument(text: &str) -> &str {
    text.trim()
        .strip_prefix("typeof(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(text)
        .trim()
}

fn expect_no_args(raw: &RawAttribute) -> ParseResult<()> {
    if raw.args.is_empty() {
        Ok(())
    } else {
        Err("takes no arguments".to_string())
    }
}

fn single_string(raw: &RawAttribute) -> ParseResult<String> {
    match raw.positional_at(0) {
        Some(AttrValue::Str(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(other) => Err(format!("expected a string, found {}", other.shape())),
        None => Err("expected a string argument".to_string()),
    }
}

fn optional_string(raw: &RawAttribute) -> ParseResult<String> {
    match raw.positional_at(0) {
        None => Ok(String::new()),
        Some(AttrValue::Str(text)) => Ok(text.clone()),
        Some(other) => Err(format!("expected a string, found {}", other.shape())),
    }
}

fn to_version(value: i64) -> ParseResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| format!("version {value} is not a positive integer"))
}

fn parse_codegen(raw: &RawAttribute) -> ParseResult<CodeGenPolicy> {
    let level = match raw.positional_at(0) {
        Some(AttrValue::Str(text)) => {
            CodeGenLevel::parse(text).ok_or_else(|| format!("unknown code generation level '{text}'"))?
        }
        Some(other) => return Err(format!("expected a level, found {}", other.shape())),
        None => return Err("expected a code generation level".to_string()),
    };
    let mut partial = false;
    for (name, value) in raw.named_args() {
        match (name, value) {
            ("partial", AttrValue::Bool(b)) => partial = *b,
            ("partial", other) => {
                return Err(format!("'partial' expects a boolean, found {}", other.shape()));
            }
            (other, _) => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(CodeGenPolicy { level, partial })
}

fn parse_flags<F>(raw: &RawAttribute, table: &[FlagSpec<F>]) -> ParseResult<F>
where
    F: bitflags::Flags + Copy,
{
    if raw.positional().next().is_some() {
        return Err("flags must be named".to_string());
    }
    let mut flags = F::empty();
    for (name, value) in raw.named_args() {
        let spec = table
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| format!("unknown flag '{name}'"))?;
        let on = value
            .as_bool()
            .ok_or_else(|| format!("flag '{name}' expects a boolean, found {}", value.shape()))?;
        flags.set(spec.flag, on != spec.inverted);
    }
    Ok(flags)
}

/// `Platform(contract, version)`. A leading string before the contract (the
/// older `Platform("name", typeof(C), v)` form) is accepted and ignored.
fn parse_platform(raw: &RawAttribute) -> ParseResult<GateRef> {
    let mut contract = None;
    let mut version = None;
    for value in raw.positional() {
        match value {
            AttrValue::Str(text) => contract = Some(type_argument(text).to_string()),
            AttrValue::Int(v) => version = Some(to_version(*v)?),
            AttrValue::Bool(_) => return Err("unexpected boolean argument".to_string()),
        }
    }
    for (name, value) in raw.named_args() {
        if name != "ForcePrimaryInterfaceGeneration" || value.as_bool().is_none() {
            return Err(format!("unknown argument '{name}'"));
        }
    }
    match (contract, version) {
        (Some(contract), Some(version)) if !contract.is_empty() => Ok(GateRef { contract, version }),
        (_, Some(_)) => Err("missing contract".to_string()),
        _ => Err("missing version".to_string()),
    }
}

fn parse_contract_version(raw: &RawAttribute) -> ParseResult<ContractVersionDecl> {
    let version = match raw.positional_at(0) {
        Some(AttrValue::Int(v)) => to_version(*v)?,
        Some(other) => return Err(format!("expected a version, found {}", other.shape())),
        None => return Err("missing version".to_string()),
    };
    let mut native_platform = match raw.positional_at(1) {
        Some(AttrValue::Int(v)) => Some(to_version(*v)?),
        Some(other) => {
            return Err(format!("expected a native platform version, found {}", other.shape()));
        }
        None => None,
    };
    for (name, value) in raw.named_args() {
        match (name, value) {
            ("NativePlatform" | "nativePlatform", AttrValue::Int(v)) => {
                native_platform = Some(to_version(*v)?);
            }
            (other, _) => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(ContractVersionDecl {
        version,
        native_platform,
    })
}

fn parse_guids(raw: &RawAttribute) -> ParseResult<SmallVec<[NamedGuid; 1]>> {
    let mut guids = SmallVec::new();
    if let Some(value) = raw.positional_at(0) {
        guids.push(named_guid("ClassGuid", value)?);
    }
    for (name, value) in raw.named_args() {
        if !name.ends_with("Guid") {
            return Err(format!("unknown argument '{name}'"));
        }
        guids.push(named_guid(name, value)?);
    }
    if guids.is_empty() {
        return Err("expected at least one GUID".to_string());
    }
    Ok(guids)
}

fn named_guid(role: &str, value: &AttrValue) -> ParseResult<NamedGuid> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("'{role}' expects a string, found {}", value.shape()))?;
    let value = Guid::parse(text).ok_or_else(|| format!("'{role}' is empty"))?;
    Ok(NamedGuid {
        role: role.to_string(),
        value,
    })
}

fn parse_stable_index(raw: &RawAttribute) -> ParseResult<IndexRequest> {
    match raw.positional_at(0) {
        None => Ok(IndexRequest::Auto),
        Some(AttrValue::Int(v)) => u32::try_from(*v)
            .ok()
            .filter(|v| *v > 0)
            .map(IndexRequest::Explicit)
            .ok_or_else(|| format!("index {v} is not a positive integer")),
        Some(other) => Err(format!("expected an index, found {}", other.shape())),
    }
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
