use super::*;
use crate::attributes::CodeGenLevel;
use crate::test_support::{Prepared, attr, codes};
use xom_model::{DeclarationSet, RawAttribute};

fn run(set: DeclarationSet) -> (StorageFacet, Vec<Diagnostic>) {
    let prepared = Prepared::new(set);
    assert!(prepared.normalize_diagnostics.is_empty(), "{:?}", prepared.normalize_diagnostics);
    map_storage(&prepared.input())
}

fn codegen(level: &str) -> RawAttribute {
    RawAttribute::new("CodeGen").arg(level)
}

fn type_table(flag: &str) -> RawAttribute {
    RawAttribute::new("TypeTable").named(flag, true)
}

fn offset(field: &str) -> RawAttribute {
    RawAttribute::new("OffsetFieldName").arg(field)
}

fn storage_type(kind: &str) -> RawAttribute {
    RawAttribute::new("NativeStorageType").arg(kind)
}

fn type_surfaces(facet: &StorageFacet, i: usize) -> Surfaces {
    facet.types[i].expect("type storage").surfaces
}

fn member(facet: &StorageFacet, i: usize) -> &MemberStorage {
    facet.members[i].as_ref().expect("member storage")
}

#[test]
fn test_type_surfaces_follow_codegen() {
    let (facet, diagnostics) = run([
        Declaration::class("", "Default"),
        Declaration::class("", "IdlOnly").with_attr(codegen("Idl")),
        Declaration::class("", "Partial").with_attr(codegen("IdlAndPartialStub")),
        Declaration::class("", "Core").with_attr(codegen("CoreOnly")),
        Declaration::class("", "Gone").with_attr(codegen("Exclude")),
        Declaration::class("", "Hidden").with_attr(RawAttribute::new("Modifier").arg("Internal")),
    ]
    .into_iter()
    .collect());
    assert!(diagnostics.is_empty());
    assert_eq!(type_surfaces(&facet, 0), Surfaces::PUBLIC | Surfaces::NATIVE_CORE | Surfaces::STUB);
    assert_eq!(type_surfaces(&facet, 1), Surfaces::PUBLIC | Surfaces::NATIVE_CORE);
    assert_eq!(type_surfaces(&facet, 2), Surfaces::PUBLIC | Surfaces::PARTIAL_STUB);
    assert_eq!(type_surfaces(&facet, 3), Surfaces::NATIVE_CORE);
    assert_eq!(type_surfaces(&facet, 4), Surfaces::empty());
    assert_eq!(
        type_surfaces(&facet, 5),
        Surfaces::INTERNAL | Surfaces::NATIVE_CORE | Surfaces::STUB
    );
    assert_eq!(facet.types[0].map(|t| t.category), Some(StorageCategory::NativeBacked));
    assert_eq!(facet.types[2].map(|t| t.category), Some(StorageCategory::ManagedWrapper));
}

#[test]
fn test_exclusions_remove_surfaces() {
    let (facet, _) = run([
        Declaration::class("", "NoCore").with_attr(type_table("IsExcludedFromCore")),
        Declaration::class("", "NoDxaml").with_attr(type_table("IsExcludedFromDXaml")),
        Declaration::class("", "NoIdl")
            .with_attr(RawAttribute::new("ClassFlags").named("IsHiddenFromIdl", true)),
        Declaration::class("", "Manual").with_attr(attr("HandWritten")),
    ]
    .into_iter()
    .collect());
    assert_eq!(type_surfaces(&facet, 0), Surfaces::PUBLIC | Surfaces::STUB);
    assert_eq!(type_surfaces(&facet, 1), Surfaces::NATIVE_CORE);
    assert_eq!(type_surfaces(&facet, 2), Surfaces::NATIVE_CORE);
    assert_eq!(type_surfaces(&facet, 3), Surfaces::PUBLIC | Surfaces::NATIVE_CORE);
}

#[test]
fn test_core_exclusion_is_inherited() {
    let (facet, _) = run([
        Declaration::class("", "Leaf").with_base("Middle"),
        Declaration::class("", "Middle").with_base("Root"),
        Declaration::class("", "Root").with_attr(type_table("IsExcludedFromCore")),
        Declaration::class("", "Other").with_base("Windows.Foundation.Object"),
    ]
    .into_iter()
    .collect());
    for i in 0..3 {
        assert!(!type_surfaces(&facet, i).contains(Surfaces::NATIVE_CORE), "type {i}");
        assert_eq!(facet.types[i].map(|t| t.category), Some(StorageCategory::ManagedWrapper));
    }
    assert!(type_surfaces(&facet, 3).contains(Surfaces::NATIVE_CORE));
}

#[test]
fn test_core_exclusion_survives_cycles() {
    let (facet, _) = run([
        Declaration::class("", "A").with_base("B"),
        Declaration::class("", "B").with_base("A"),
    ]
    .into_iter()
    .collect());
    assert!(facet.types[0].is_some());
    assert!(facet.types[1].is_some());
}

#[test]
fn test_imported_types_generate_nothing() {
    let (facet, _) = run([
        Declaration::class("", "Foreign").with_attr(attr("Imported")),
        Declaration::property("Foreign", "P"),
    ]
    .into_iter()
    .collect());
    let foreign = facet.types[0].expect("foreign");
    assert_eq!(foreign.surfaces, Surfaces::empty());
    assert_eq!(foreign.category, StorageCategory::ImportedExternal);
    assert_eq!(member(&facet, 1).binding, StorageBinding::InterfaceOnly);
    assert_eq!(member(&facet, 1).surfaces, Surfaces::empty());
}

#[test]
fn test_property_bindings() {
    let (facet, diagnostics) = run([
        Declaration::class("", "Panel"),
        Declaration::property("Panel", "Width")
            .with_attr(offset("m_width"))
            .with_attr(storage_type("Float")),
        Declaration::property("Panel", "Tag").with_attr(offset("m_tag")),
        Declaration::property("Panel", "Padding").with_attr(storage_type("Thickness")),
        Declaration::property("Panel", "Children"),
        Declaration::method("Panel", "Measure"),
    ]
    .into_iter()
    .collect());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(
        member(&facet, 1).binding,
        StorageBinding::NativeField {
            offset: "m_width".into(),
            value_kind: ValueKind::Float,
        }
    );
    assert_eq!(
        member(&facet, 2).binding,
        StorageBinding::NativeField {
            offset: "m_tag".into(),
            value_kind: ValueKind::Object,
        }
    );
    assert_eq!(
        member(&facet, 3).binding,
        StorageBinding::Sparse {
            value_kind: ValueKind::Thickness,
        }
    );
    assert_eq!(member(&facet, 4).binding, StorageBinding::Computed);
    assert_eq!(member(&facet, 5).binding, StorageBinding::Computed);
    assert_eq!(member(&facet, 5).accessor, None);
}

#[test]
fn test_storage_errors() {
    let (facet, diagnostics) = run([
        Declaration::class("", "IThing").with_attr(attr("Interface")),
        Declaration::class("", "Panel"),
        Declaration::property("Panel", "A").with_attr(offset("m_value")),
        Declaration::property("Panel", "B").with_attr(offset("m_value")),
        Declaration::property("IThing", "Ok"),
        Declaration::event("IThing", "Changed"),
    ]
    .into_iter()
    .collect());
    assert_eq!(codes(&diagnostics), [diagnostic_codes::DUPLICATE_STORAGE_FIELD]);
    assert_eq!(
        diagnostics[0].message_text,
        "Native field 'm_value' is already bound by 'Panel.A'."
    );
    assert!(facet.members[3].is_none());
    assert_eq!(member(&facet, 4).binding, StorageBinding::InterfaceOnly);
    assert_eq!(member(&facet, 5).binding, StorageBinding::InterfaceOnly);
}

#[test]
fn test_native_storage_on_imported_owner() {
    let prepared = Prepared::new(
        [
            Declaration::class("", "Foreign").with_attr(attr("Imported")),
            Declaration::property("Foreign", "P").with_attr(storage_type("Signed")),
        ]
        .into_iter()
        .collect(),
    );
    assert!(prepared.normalize_diagnostics.is_empty(), "{:?}", prepared.normalize_diagnostics);
    let (facet, diagnostics) = map_storage(&prepared.input());
    assert_eq!(codes(&diagnostics), [diagnostic_codes::INVALID_STORAGE_BINDING]);
    assert_eq!(
        diagnostics[0].message_text,
        "Native storage is not allowed here: 'Foreign' is an imported type."
    );
    assert!(facet.members[1].is_none());
}

#[test]
fn test_native_storage_on_interface_owner() {
    // The standard rules already reject storage attributes on interface
    // members, so hand the stage facets that slipped past a custom table.
    let mut prepared = Prepared::new(
        [
            Declaration::class("", "IThing").with_attr(attr("Interface")),
            Declaration::property("IThing", "Value"),
        ]
        .into_iter()
        .collect(),
    );
    if let Some(facets) = prepared.facets[1].as_mut() {
        facets.offset_field = Some("m_value".to_string());
        facets.value_kind = Some(ValueKind::Signed);
    }
    let (facet, diagnostics) = map_storage(&prepared.input());
    assert_eq!(codes(&diagnostics), [diagnostic_codes::INVALID_STORAGE_BINDING]);
    assert_eq!(
        diagnostics[0].message_text,
        "Native storage is not allowed here: 'IThing' is an interface."
    );
    assert!(facet.members[1].is_none());
}

#[test]
fn test_enum_constants_continue_from_previous() {
    let (facet, _) = run([
        Declaration::enumeration("", "Mode"),
        Declaration::member(DeclKind::EnumMember, "Mode", "Off"),
        Declaration::enum_member("Mode", "Low", 5),
        Declaration::member(DeclKind::EnumMember, "Mode", "High"),
    ]
    .into_iter()
    .collect());
    assert_eq!(member(&facet, 1).binding, StorageBinding::Constant(0));
    assert_eq!(member(&facet, 2).binding, StorageBinding::Constant(5));
    assert_eq!(member(&facet, 3).binding, StorageBinding::Constant(6));
}

#[test]
fn test_accessor_shapes() {
    let (facet, _) = run([
        Declaration::class("", "Panel"),
        Declaration::property("Panel", "Both"),
        Declaration::property("Panel", "Getter").with_accessors(true, false),
        Declaration::property("Panel", "Locked").with_attr(attr("ReadOnly")),
        Declaration::property("Panel", "Opened")
            .with_accessors(true, false)
            .with_attr(attr("Settable")),
        Declaration::property("Panel", "Parsed").with_attr(
            RawAttribute::new("PropertyFlags").named("IsReadOnlyExceptForParser", true),
        ),
        Declaration::property("Panel", "Sink").with_accessors(false, true),
        Declaration::event("Panel", "Clicked"),
    ]
    .into_iter()
    .collect());
    let shape = |i| member(&facet, i).accessor;
    assert_eq!(shape(1), Some(AccessorShape::ReadWrite));
    assert_eq!(shape(2), Some(AccessorShape::ReadOnly));
    assert_eq!(shape(3), Some(AccessorShape::ReadOnly));
    assert_eq!(shape(4), Some(AccessorShape::ReadWrite));
    assert_eq!(shape(5), Some(AccessorShape::ReadOnly));
    assert_eq!(shape(6), Some(AccessorShape::WriteOnly));
    assert_eq!(shape(7), Some(AccessorShape::EventAddRemove));
}

#[test]
fn test_member_surfaces_are_bounded_by_owner() {
    let (facet, diagnostics) = run([
        Declaration::class("", "IdlOnly").with_attr(codegen("Idl")),
        Declaration::property("IdlOnly", "P"),
        Declaration::class("", "Partial").with_attr(codegen("IdlAndPartialStub")),
        Declaration::property("Partial", "Q"),
        Declaration::property("Partial", "Skipped").with_attr(codegen("Exclude")),
        Declaration::class("", "Secret").with_attr(RawAttribute::new("Modifier").arg("Internal")),
        Declaration::property("Secret", "R"),
        Declaration::class("", "Open"),
        Declaration::property("Open", "Private")
            .with_attr(RawAttribute::new("Modifier").arg("Private")),
        Declaration::class("", "NoDxaml").with_attr(type_table("IsExcludedFromDXaml")),
        Declaration::property("NoDxaml", "CoreSide"),
    ]
    .into_iter()
    .collect());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(member(&facet, 1).surfaces, Surfaces::PUBLIC | Surfaces::NATIVE_CORE);
    assert_eq!(member(&facet, 1).codegen.level, CodeGenLevel::Idl);
    assert_eq!(member(&facet, 3).surfaces, Surfaces::PUBLIC | Surfaces::PARTIAL_STUB);
    assert_eq!(member(&facet, 4).surfaces, Surfaces::empty());
    assert_eq!(
        member(&facet, 6).surfaces,
        Surfaces::INTERNAL | Surfaces::NATIVE_CORE | Surfaces::STUB
    );
    assert_eq!(
        member(&facet, 8).surfaces,
        Surfaces::INTERNAL | Surfaces::NATIVE_CORE | Surfaces::STUB
    );
    assert_eq!(member(&facet, 10).surfaces, Surfaces::NATIVE_CORE);
}

#[test]
fn test_explicit_member_stub_follows_owner_kind() {
    let (facet, diagnostics) = run([
        Declaration::class("", "Full"),
        Declaration::property("Full", "Partial").with_attr(codegen("IdlAndPartialStub")),
        Declaration::class("", "Manual").with_attr(attr("HandWritten")),
        Declaration::property("Manual", "Generated").with_attr(codegen("IdlAndStub")),
        Declaration::property("Manual", "Plain"),
    ]
    .into_iter()
    .collect());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(member(&facet, 1).surfaces, Surfaces::PUBLIC | Surfaces::STUB);
    assert_eq!(
        member(&facet, 3).surfaces,
        Surfaces::PUBLIC | Surfaces::NATIVE_CORE | Surfaces::STUB
    );
    assert_eq!(member(&facet, 4).surfaces, Surfaces::PUBLIC | Surfaces::NATIVE_CORE);
}

#[test]
fn test_core_exclusion_sources_name_nearest_excluder() {
    let prepared = Prepared::new(
        [
            Declaration::class("", "Leaf").with_base("Middle"),
            Declaration::class("", "Middle")
                .with_base("Root")
                .with_attr(type_table("IsExcludedFromCore")),
            Declaration::class("", "Root").with_attr(type_table("IsExcludedFromCore")),
            Declaration::class("", "Free"),
            Declaration::property("Leaf", "P"),
        ]
        .into_iter()
        .collect(),
    );
    let input = prepared.input();
    let sources = core_exclusion_sources(input.set, input.names, |id| {
        input.facets(id).is_some_and(Facets::excludes_core)
    });
    assert_eq!(sources, [Some(DeclId(1)), Some(DeclId(1)), Some(DeclId(2)), None, None]);
}

#[test]
fn test_core_exclusion_reaches_far_end_of_long_chain() {
    const DEPTH: usize = 5_000;
    // Leaf first, so every walk starts at the far end of the chain.
    let mut set: DeclarationSet = (1..DEPTH)
        .rev()
        .map(|i| Declaration::class("Deep", format!("T{i}")).with_base(format!("T{}", i - 1)))
        .collect();
    set.push(Declaration::class("Deep", "T0").with_attr(type_table("IsExcludedFromCore")));

    let (facet, diagnostics) = run(set);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    for i in 0..DEPTH {
        let storage = facet.types[i].expect("type storage");
        assert!(!storage.surfaces.contains(Surfaces::NATIVE_CORE), "type {i}");
        assert_eq!(storage.category, StorageCategory::ManagedWrapper, "type {i}");
    }
}
