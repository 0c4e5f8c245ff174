use super::*;
use crate::attributes::CodeGenLevel;
use crate::test_support::{Prepared, attr, codes};
use xom_model::Declaration;

fn bag(kind: DeclKind, attrs: &[RawAttribute]) -> BagOutcome {
    normalize_bag(&AttributeRules::standard(), kind, attrs)
}

#[test]
fn test_empty_bag_normalizes_to_defaults() {
    let outcome = bag(DeclKind::Type, &[]);
    assert!(outcome.diagnostics.is_empty());
    let facets = outcome.facets.expect("facets");
    assert_eq!(facets.codegen, None);
    assert_eq!(facets.visibility(), Visibility::Public);
    assert!(facets.excluded_surfaces().is_empty());
}

#[test]
fn test_facets_are_folded() {
    let outcome = bag(
        DeclKind::Property,
        &[
            RawAttribute::new("CodeGen").arg("IdlAndPartialStub"),
            RawAttribute::new("OffsetFieldName").arg("m_padding"),
            RawAttribute::new("NativeStorageType").arg("ValueType.valueThickness"),
            RawAttribute::new("PropertyFlags").named("AffectsMeasure", true),
            attr("ReadOnly"),
        ],
    );
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let facets = outcome.facets.expect("facets");
    assert_eq!(
        facets.codegen.map(|p| p.level),
        Some(CodeGenLevel::IdlAndPartialStub)
    );
    assert_eq!(facets.offset_field.as_deref(), Some("m_padding"));
    assert_eq!(facets.value_kind, Some(ValueKind::Thickness));
    assert!(facets.property_flags.contains(PropertyFlags::AFFECTS_MEASURE));
    assert!(facets.read_only);
    assert_eq!(
        facets.source(AttributeKind::CodeGen),
        Some("CodeGen(IdlAndPartialStub)")
    );
}

#[test]
fn test_unknown_and_mistargeted_attributes() {
    let outcome = bag(
        DeclKind::Method,
        &[attr("Frobnicate"), RawAttribute::new("OffsetFieldName").arg("m_x")],
    );
    assert!(outcome.facets.is_none());
    assert_eq!(
        codes(&outcome.diagnostics),
        [
            diagnostic_codes::UNKNOWN_ATTRIBUTE_KIND,
            diagnostic_codes::ATTRIBUTE_KIND_MISMATCH
        ]
    );
    assert!(
        outcome.diagnostics[1]
            .message_text
            .contains("a method declaration")
    );
}

#[test]
fn test_conflicting_claims() {
    let outcome = bag(DeclKind::Property, &[attr("ReadOnly"), attr("Settable")]);
    assert!(outcome.facets.is_none());
    assert_eq!(
        codes(&outcome.diagnostics),
        [diagnostic_codes::CONFLICTING_ATTRIBUTES]
    );
    assert_eq!(
        outcome.diagnostics[0].message_text,
        "Attributes 'ReadOnly' and 'Settable' conflict."
    );
}

#[test]
fn test_core_only_conflicts_with_core_exclusion() {
    let outcome = bag(
        DeclKind::Type,
        &[
            RawAttribute::new("CodeGen").arg("CoreOnly"),
            RawAttribute::new("TypeTable").named("IsExcludedFromCore", true),
        ],
    );
    assert!(outcome.facets.is_none());
    assert_eq!(
        codes(&outcome.diagnostics),
        [diagnostic_codes::CONFLICTING_ATTRIBUTES]
    );
}

#[test]
fn test_repeated_attributes() {
    let same = bag(DeclKind::Type, &[attr("HandWritten"), attr("HandWritten")]);
    assert!(same.facets.is_some(), "identical repeats only warn");
    assert_eq!(codes(&same.diagnostics), [diagnostic_codes::REDUNDANT_ATTRIBUTE]);
    assert!(!same.diagnostics[0].is_error());

    let different = bag(
        DeclKind::Type,
        &[
            RawAttribute::new("CodeGen").arg("Idl"),
            RawAttribute::new("CodeGen").arg("CoreOnly"),
        ],
    );
    assert!(different.facets.is_none());
    assert_eq!(
        codes(&different.diagnostics),
        [diagnostic_codes::CONFLICTING_ATTRIBUTES]
    );

    let gates = bag(
        DeclKind::Type,
        &[
            RawAttribute::new("Platform").arg("C").arg(1),
            RawAttribute::new("Platform").arg("D").arg(2),
        ],
    );
    assert_eq!(gates.facets.expect("repeatable").gates.len(), 2);
}

#[test]
fn test_invalid_argument() {
    let outcome = bag(
        DeclKind::Type,
        &[RawAttribute::new("Modifier").arg("Friend")],
    );
    assert!(outcome.facets.is_none());
    assert_eq!(
        outcome.diagnostics[0].message_text,
        "Invalid argument for attribute 'Modifier': unknown visibility 'Friend'."
    );
}

#[test]
fn test_memoization_shares_identical_bags() {
    let rules = AttributeRules::standard();
    let normalizer = Normalizer::new(&rules);
    let attrs = [RawAttribute::new("CodeGen").arg("Idl")];
    let first = normalizer.normalize(DeclKind::Property, &attrs);
    let second = normalizer.normalize(DeclKind::Property, &attrs);
    assert!(Arc::ptr_eq(&first, &second));
    // Same bag, different kind: separate entry.
    let _ = normalizer.normalize(DeclKind::Event, &attrs);
    assert_eq!(normalizer.distinct_bags(), 2);
}

#[test]
fn test_errors_are_local_to_declaration() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Good"),
        Declaration::class("Ns", "Bad").with_attr(attr("Nope")),
        Declaration::property("Ns.Good", "P"),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[0].is_some());
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    assert_eq!(prepared.normalize_diagnostics.len(), 1);
    assert_eq!(prepared.normalize_diagnostics[0].subject, "Ns.Bad");
}

#[test]
fn test_interface_member_restrictions() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "IThing").with_attr(attr("Interface")),
        Declaration::property("Ns.IThing", "Value")
            .with_attr(RawAttribute::new("OffsetFieldName").arg("m_value")),
        Declaration::property("Ns.IThing", "Other").with_attr(attr("ReadOnly")),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    assert_eq!(
        prepared.normalize_diagnostics[0].message_text,
        "Attribute 'OffsetFieldName' cannot be applied to a member of interface 'Ns.IThing'."
    );
}

#[test]
fn test_member_cannot_reinclude_excluded_surface() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Hidden")
            .with_attr(RawAttribute::new("TypeTable").named("IsExcludedFromDXaml", true)),
        Declaration::property("Ns.Hidden", "Shown")
            .with_attr(RawAttribute::new("CodeGen").arg("Idl")),
        Declaration::property("Ns.Hidden", "CoreOnly")
            .with_attr(RawAttribute::new("CodeGen").arg("CoreOnly")),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    let diagnostic = &prepared.normalize_diagnostics[0];
    assert_eq!(diagnostic.code, diagnostic_codes::CONFLICTING_ATTRIBUTES);
    assert_eq!(diagnostic.subject, "Ns.Hidden.Shown");
    assert!(
        diagnostic
            .message_text
            .contains("TypeTable(IsExcludedFromDXaml = true) on 'Ns.Hidden'")
    );
}

#[test]
fn test_member_cannot_reinclude_surface_missing_from_owner_level() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Core").with_attr(RawAttribute::new("CodeGen").arg("CoreOnly")),
        Declaration::property("Ns.Core", "Shown")
            .with_attr(RawAttribute::new("CodeGen").arg("Idl")),
        Declaration::property("Ns.Core", "Native")
            .with_attr(RawAttribute::new("CodeGen").arg("LookupOnly")),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    assert_eq!(
        codes(&prepared.normalize_diagnostics),
        [diagnostic_codes::CONFLICTING_ATTRIBUTES]
    );
    let diagnostic = &prepared.normalize_diagnostics[0];
    assert_eq!(diagnostic.subject, "Ns.Core.Shown");
    assert!(
        diagnostic
            .message_text
            .contains("CodeGen(CoreOnly) on 'Ns.Core'"),
        "{}",
        diagnostic.message_text
    );
}

#[test]
fn test_member_cannot_reinclude_core_excluded_by_ancestor() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Derived").with_base("Middle"),
        Declaration::property("Ns.Derived", "Native")
            .with_attr(RawAttribute::new("CodeGen").arg("CoreOnly")),
        Declaration::property("Ns.Derived", "Public")
            .with_attr(RawAttribute::new("CodeGen").arg("IdlAndPartialStub")),
        Declaration::class("Ns", "Middle").with_base("Base"),
        Declaration::class("Ns", "Base")
            .with_attr(RawAttribute::new("TypeTable").named("IsExcludedFromCore", true)),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    assert_eq!(
        codes(&prepared.normalize_diagnostics),
        [diagnostic_codes::CONFLICTING_ATTRIBUTES]
    );
    let diagnostic = &prepared.normalize_diagnostics[0];
    assert_eq!(diagnostic.subject, "Ns.Derived.Native");
    assert!(
        diagnostic
            .message_text
            .contains("TypeTable(IsExcludedFromCore = true) on 'Ns.Base' (inherited by 'Ns.Derived')"),
        "{}",
        diagnostic.message_text
    );
}

#[test]
fn test_owner_reach_treats_stub_kinds_and_visibility_alike() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Partial")
            .with_attr(RawAttribute::new("CodeGen").arg("IdlAndPartialStub")),
        Declaration::property("Ns.Partial", "Stubbed")
            .with_attr(RawAttribute::new("CodeGen").arg("IdlAndPartialStub")),
        Declaration::class("Ns", "Secret").with_attr(RawAttribute::new("Modifier").arg("Internal")),
        Declaration::property("Ns.Secret", "Idl").with_attr(RawAttribute::new("CodeGen").arg("Idl")),
        Declaration::class("Ns", "Manual").with_attr(attr("HandWritten")),
        Declaration::property("Ns.Manual", "Generated")
            .with_attr(RawAttribute::new("CodeGen").arg("IdlAndStub")),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(
        prepared.normalize_diagnostics.is_empty(),
        "{:?}",
        prepared.normalize_diagnostics
    );
    assert!(prepared.facets.iter().all(Option::is_some));
}

#[test]
fn test_member_of_imported_type_cannot_request_surfaces() {
    let set: DeclarationSet = [
        Declaration::class("Ns", "Foreign").with_attr(attr("Imported")),
        Declaration::property("Ns.Foreign", "Value")
            .with_attr(RawAttribute::new("CodeGen").arg("Idl")),
        Declaration::property("Ns.Foreign", "Skipped")
            .with_attr(RawAttribute::new("CodeGen").arg("Exclude")),
    ]
    .into_iter()
    .collect();
    let prepared = Prepared::new(set);
    assert!(prepared.facets[1].is_none());
    assert!(prepared.facets[2].is_some());
    assert!(
        prepared.normalize_diagnostics[0]
            .message_text
            .contains("Imported on 'Ns.Foreign'")
    );
}
