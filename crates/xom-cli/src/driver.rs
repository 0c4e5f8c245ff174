//! Command execution. Every command returns its output instead of printing,
//! so the binary stays a thin shell and the commands stay testable.

use crate::args::{CliArgs, Command, InputArgs, OutputFormat, QueryArgs, ResolveArgs};
use crate::reporter::Reporter;
use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;
use xom::resolver::{
    Availability, AttributeRules, Entity, MemberNode, RuleOverrides, TypeNode, TypeRef,
};
use xom::{AvailabilityContext, DeclarationSet, Resolution, ResolverOptions, Surfaces, TypeRegistry};

/// Exit status when resolution succeeded (warnings allowed).
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when any error diagnostic was reported.
pub const EXIT_DIAGNOSTICS: i32 = 1;

/// What a command wants written to stdout and stderr, and its exit status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the command selected by `args`.
pub fn run(args: &CliArgs, color: bool) -> Result<CommandOutput> {
    let reporter = Reporter::new(color && !args.no_color);
    match &args.command {
        Command::Resolve(resolve) => resolve_command(resolve, &reporter),
        Command::Query(query) => query_command(query, &reporter),
        Command::Rules => rules_command(),
    }
}

// =============================================================================
// Inputs
// =============================================================================

pub fn load_declarations(path: &Path) -> Result<DeclarationSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read declarations from {}", path.display()))?;
    DeclarationSet::from_json(&text)
        .with_context(|| format!("failed to parse declarations in {}", path.display()))
}

pub fn load_options(config: Option<&Path>, no_parallel: bool) -> Result<ResolverOptions> {
    let options = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            ResolverOptions::from_json(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ResolverOptions::default(),
    };
    Ok(if no_parallel {
        options.with_parallel(false)
    } else {
        options
    })
}

fn resolve_input(input: &InputArgs) -> Result<Resolution> {
    let set = load_declarations(&input.declarations)?;
    let options = load_options(input.config.as_deref(), input.no_parallel)?;
    info!(
        declarations = set.len(),
        parallel = options.parallel,
        "resolving {}",
        input.declarations.display()
    );
    Ok(xom::resolve(&set, &options))
}

// =============================================================================
// Commands
// =============================================================================

fn resolve_command(args: &ResolveArgs, reporter: &Reporter) -> Result<CommandOutput> {
    let resolution = resolve_input(&args.input)?;
    let diagnostics = reporter.render(&resolution.diagnostics);
    let summary = reporter.summary(&resolution.diagnostics);
    let exit_code = exit_code(&resolution);

    let mut output = CommandOutput {
        exit_code,
        ..CommandOutput::default()
    };
    match args.format {
        OutputFormat::Text => {
            output.stdout = join_blocks(&[&diagnostics, &summary]);
            if let Some(registry) = &resolution.registry {
                let line = format!(
                    "Resolved {} types, {} members, {} contracts.",
                    registry.len(),
                    registry.members().len(),
                    registry.contracts().len()
                );
                output.stdout = join_blocks(&[&output.stdout, &line]);
            }
        }
        OutputFormat::Json => {
            output.stderr = join_blocks(&[&diagnostics, &summary]);
            if let Some(registry) = &resolution.registry {
                output.stdout = registry
                    .to_json_pretty()
                    .context("failed to serialize registry")?;
                output.stdout.push('\n');
            }
        }
    }
    Ok(output)
}

fn query_command(args: &QueryArgs, reporter: &Reporter) -> Result<CommandOutput> {
    if args.type_name.is_none() && args.contract.is_none() {
        bail!("query needs --type NAME or --contract NAME --version N");
    }
    let resolution = resolve_input(&args.input)?;
    let Some(registry) = &resolution.registry else {
        return Ok(CommandOutput {
            stdout: String::new(),
            stderr: join_blocks(&[
                &reporter.render(&resolution.diagnostics),
                &reporter.summary(&resolution.diagnostics),
            ]),
            exit_code: EXIT_DIAGNOSTICS,
        });
    };

    let context = query_context(args);
    let stdout = match (&args.type_name, &args.contract, args.contract_version) {
        (Some(name), _, _) => {
            let node = registry
                .type_named(name)
                .with_context(|| format!("no type named '{name}'"))?;
            describe_type(registry, node, context.as_ref())
        }
        (None, Some(contract), Some(version)) if args.introduced => {
            list_introduced(registry, contract, version)
        }
        (None, Some(_), Some(_)) => {
            let context = context.unwrap_or_default();
            list_visible(registry, &context)
        }
        _ => bail!("--contract requires --version"),
    };
    Ok(CommandOutput {
        stdout,
        stderr: reporter.render(&resolution.diagnostics),
        exit_code: EXIT_SUCCESS,
    })
}

fn rules_command() -> Result<CommandOutput> {
    let standard = AttributeRules::standard();
    let table = RuleOverrides {
        rules: standard.rules().to_vec(),
        conflicts: standard.conflicts().to_vec(),
        remove: Vec::new(),
    };
    let mut stdout = serde_json::to_string_pretty(&table).context("failed to serialize rules")?;
    stdout.push('\n');
    Ok(CommandOutput {
        stdout,
        ..CommandOutput::default()
    })
}

fn exit_code(resolution: &Resolution) -> i32 {
    if resolution.has_errors() {
        EXIT_DIAGNOSTICS
    } else {
        EXIT_SUCCESS
    }
}

fn query_context(args: &QueryArgs) -> Option<AvailabilityContext> {
    if args.contract.is_none() && args.features.is_empty() {
        return None;
    }
    let mut context = AvailabilityContext::new();
    if let (Some(contract), Some(version)) = (&args.contract, args.contract_version) {
        context = context.with_contract(contract.clone(), version);
    }
    for feature in &args.features {
        context = context.with_feature(feature.clone());
    }
    Some(context)
}

// =============================================================================
// Rendering
// =============================================================================

fn join_blocks(blocks: &[&str]) -> String {
    let mut out = blocks
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| b.trim_end_matches('\n'))
        .collect::<Vec<_>>()
        .join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// `C >= 2 or D >= 1, requires A >= 1, feature F`, or `always`.
#[must_use]
pub fn describe_availability(availability: &Availability) -> String {
    let gates = |gates: &[xom::resolver::Gate]| {
        gates
            .iter()
            .map(|g| format!("{} >= {}", g.contract, g.version))
            .collect::<Vec<_>>()
            .join(" or ")
    };
    let mut parts = Vec::new();
    if !availability.gates.is_empty() {
        parts.push(gates(&availability.gates));
    }
    if !availability.requires.is_empty() {
        parts.push(format!("requires {}", gates(&availability.requires)));
    }
    if let Some(feature) = &availability.feature {
        parts.push(format!("feature {feature}"));
    }
    if parts.is_empty() {
        "always".to_string()
    } else {
        parts.join(", ")
    }
}

#[must_use]
pub fn describe_surfaces(surfaces: Surfaces) -> String {
    if surfaces.is_empty() {
        return "none".to_string();
    }
    surfaces
        .iter_names()
        .filter(|(name, _)| *name != "STUBS")
        .map(|(name, _)| name.to_lowercase().replace('_', "-"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn type_ref_name(registry: &TypeRegistry, type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::Declared(id) => registry
            .type_node(*id)
            .map_or_else(|| id.to_string(), |node| node.name.clone()),
        TypeRef::External(name) => name.clone(),
    }
}

fn describe_member(registry: &TypeRegistry, member: &MemberNode) -> String {
    let mut line = format!("  {} {}", member.kind, member.name);
    if let Some(value_type) = &member.value_type {
        let _ = write!(line, ": {}", type_ref_name(registry, value_type));
    }
    let _ = write!(line, " [{}]", describe_availability(&member.availability));
    if let Some(owner) = registry.type_node(member.owner) {
        let _ = write!(line, " (from {})", owner.name);
    }
    line
}

fn describe_type(
    registry: &TypeRegistry,
    node: &TypeNode,
    context: Option<&AvailabilityContext>,
) -> String {
    let mut out = format!("{} {}", node.kind, node.name);
    if let Some(base) = &node.base {
        let _ = write!(out, " : {}", type_ref_name(registry, base));
    }
    out.push('\n');
    let _ = writeln!(out, "  availability: {}", describe_availability(&node.availability));
    let _ = writeln!(out, "  surfaces: {}", describe_surfaces(node.surfaces));
    if !node.all_interfaces.is_empty() {
        let names: Vec<String> = node
            .all_interfaces
            .iter()
            .map(|i| type_ref_name(registry, i))
            .collect();
        let _ = writeln!(out, "  interfaces: {}", names.join(", "));
    }
    if let Some(guid) = node.identity.guid() {
        let _ = writeln!(out, "  guid: {guid}");
    }
    if let Some(index) = node.identity.index {
        let _ = writeln!(out, "  index: {index}");
    }
    let members = match context {
        Some(context) => registry.visible_members(node, context),
        None => registry.all_members(node),
    };
    for member in members {
        out.push_str(&describe_member(registry, member));
        out.push('\n');
    }
    out
}

fn list_visible(registry: &TypeRegistry, context: &AvailabilityContext) -> String {
    registry
        .visible_types(context)
        .into_iter()
        .map(|node| format!("{} {}\n", node.kind, node.name))
        .collect()
}

fn list_introduced(registry: &TypeRegistry, contract: &str, version: u32) -> String {
    registry
        .introduced_at(contract, version)
        .into_iter()
        .map(|entity| match entity {
            Entity::Type(node) => format!("{} {}\n", node.kind, node.name),
            Entity::Member(member) => {
                let owner = registry
                    .type_node(member.owner)
                    .map_or("?", |owner| owner.name.as_str());
                format!("{} {}.{}\n", member.kind, owner, member.name)
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
