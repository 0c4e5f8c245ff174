//! Inheritance chains far deeper than any real schema, resolved through the
//! whole pipeline in both scheduling modes.

mod common;

use common::{render, sequential};
use xom_model::{Declaration, DeclarationSet, RawAttribute};
use xom_resolver::{
    AvailabilityContext, ResolverOptions, StorageCategory, Surfaces, TypeRegistry, resolve,
};

const DEPTH: usize = 5_000;

/// `Deep.T{DEPTH-1} -> ... -> Deep.T0`, leaf declared first. The root is
/// excluded from core, implements `IRoot` and owns `Marker`; the leaf owns
/// `Tip`.
fn deep_chain() -> DeclarationSet {
    let mut set: DeclarationSet = (1..DEPTH)
        .rev()
        .map(|i| Declaration::class("Deep", format!("T{i}")).with_base(format!("T{}", i - 1)))
        .collect();
    set.push(Declaration::property(format!("Deep.T{}", DEPTH - 1), "Tip"));
    set.push(
        Declaration::class("Deep", "T0")
            .implementing("IRoot")
            .with_attr(RawAttribute::new("TypeTable").named("IsExcludedFromCore", true)),
    );
    set.push(Declaration::property("Deep.T0", "Marker"));
    set.push(Declaration::class("Deep", "IRoot").with_attr(RawAttribute::new("Interface")));
    set
}

fn resolved_with(set: &DeclarationSet, options: &ResolverOptions) -> TypeRegistry {
    match resolve(set, options).into_result() {
        Ok(registry) => registry,
        Err(diagnostics) => panic!("resolution failed:\n{}", render(&diagnostics)),
    }
}

fn leaf_name() -> String {
    format!("Deep.T{}", DEPTH - 1)
}

#[test]
fn deep_chain_resolves_in_parallel() {
    let registry = resolved_with(&deep_chain(), &ResolverOptions::default());
    let leaf = registry.type_named(&leaf_name()).expect("leaf");
    assert_eq!(leaf.depth as usize, DEPTH - 1);
    assert_eq!(leaf.all_interfaces.len(), 1);
    assert_eq!(registry.topological_order()[0].name, "Deep.T0");
}

#[test]
fn deep_chain_matches_across_scheduling() {
    let set = deep_chain();
    let parallel = resolved_with(&set, &ResolverOptions::default());
    let serial = resolved_with(&set, &sequential());
    assert_eq!(
        parallel.to_json_pretty().expect("registry serializes"),
        serial.to_json_pretty().expect("registry serializes")
    );
}

#[test]
fn core_exclusion_reaches_the_leaf() {
    let registry = resolved_with(&deep_chain(), &sequential());
    let leaf = registry.type_named(&leaf_name()).expect("leaf");
    assert!(!leaf.surfaces.contains(Surfaces::NATIVE_CORE));
    assert_eq!(leaf.storage, StorageCategory::ManagedWrapper);
    assert!(
        registry
            .topological_order()
            .iter()
            .all(|ty| ty.is_interface || !ty.surfaces.contains(Surfaces::NATIVE_CORE))
    );
}

#[test]
fn queries_walk_the_whole_chain() {
    let registry = resolved_with(&deep_chain(), &sequential());
    let leaf = registry.type_named(&leaf_name()).expect("leaf");

    let chain = registry.base_chain(leaf);
    assert_eq!(chain.len(), DEPTH - 1);
    assert_eq!(chain.last().map(|ty| ty.name.as_str()), Some("Deep.T0"));

    let members: Vec<&str> = registry
        .all_members(leaf)
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(members, ["Tip", "Marker"]);

    let visible = registry.visible_members(leaf, &AvailabilityContext::new());
    assert_eq!(visible.len(), 2);
}
