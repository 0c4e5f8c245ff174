//! Fixtures shared by the resolver integration tests.

#![allow(dead_code)]

use xom_common::Diagnostic;
use xom_model::{Declaration, DeclarationSet, RawAttribute};
use xom_resolver::{Resolution, ResolverOptions, TypeRegistry, resolve};

pub fn sequential() -> ResolverOptions {
    ResolverOptions::default().with_parallel(false)
}

pub fn contract(namespace: &str, name: &str, versions: &[u32]) -> Declaration {
    versions.iter().fold(
        Declaration::class(namespace, name).with_attr(RawAttribute::new("Contract")),
        |decl, &version| decl.with_attr(RawAttribute::new("ContractVersion").arg(version)),
    )
}

pub fn platform(contract: &str, version: u32) -> RawAttribute {
    RawAttribute::new("Platform").arg(contract).arg(version)
}

pub fn guid(value: &str) -> RawAttribute {
    RawAttribute::new("Guids").arg(value)
}

pub fn run(set: &DeclarationSet) -> Resolution {
    resolve(set, &sequential())
}

pub fn resolved(set: &DeclarationSet) -> TypeRegistry {
    match run(set).into_result() {
        Ok(registry) => registry,
        Err(diagnostics) => panic!("resolution failed:\n{}", render(&diagnostics)),
    }
}

pub fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn codes(diagnostics: &[Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}

/// A mid-sized control hierarchy exercising every stage.
pub fn control_library() -> DeclarationSet {
    let mut set: DeclarationSet = [
        contract("Ui", "UiContract", &[1, 2, 3, 4]),
        Declaration::class("Ui", "IUIElement").with_attr(RawAttribute::new("Interface")),
        Declaration::class("Ui", "DependencyObject")
            .with_attr(platform("UiContract", 1))
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::class("Ui", "UIElement")
            .with_base("DependencyObject")
            .implementing("IUIElement")
            .with_attr(platform("UiContract", 1))
            .with_attr(guid("{6F3C52C3-5A11-4E5B-9A9D-2B36C0F4B1A0}"))
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::property("Ui.UIElement", "Opacity")
            .with_attr(RawAttribute::new("OffsetFieldName").arg("m_opacity"))
            .with_attr(RawAttribute::new("NativeStorageType").arg("Double"))
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::event("Ui.UIElement", "Tapped").with_attr(RawAttribute::new("StableIndex")),
        Declaration::class("Ui", "Control")
            .with_base("UIElement")
            .with_attr(platform("UiContract", 2))
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::property("Ui.Control", "Padding")
            .with_value_type("Windows.Foundation.Rect")
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::property("Ui.Control", "CornerRadius")
            .with_attr(platform("UiContract", 4))
            .with_attr(RawAttribute::new("StableIndex")),
        Declaration::enumeration("Ui", "Orientation").with_attr(platform("UiContract", 1)),
        Declaration::enum_member("Ui.Orientation", "Horizontal", 0),
        Declaration::enum_member("Ui.Orientation", "Vertical", 1),
        Declaration::class("Ui", "Panel")
            .with_base("UIElement")
            .with_attr(platform("UiContract", 1))
            .with_attr(RawAttribute::new("TypeTable").named("IsExcludedFromCore", true)),
    ]
    .into_iter()
    .collect();
    set.push(
        Declaration::class("Ui", "StackPanel")
            .with_base("Panel")
            .with_attr(platform("UiContract", 3))
            .with_attr(RawAttribute::new("StableIndex")),
    );
    set.push(Declaration::property("Ui.StackPanel", "Orientation").with_value_type("Orientation"));
    set
}
