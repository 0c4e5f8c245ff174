use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the xom binary.
#[derive(Parser, Debug)]
#[command(
    name = "xom",
    version,
    about = "Resolve contract, type graph, storage and identity metadata for UI object-model schemas"
)]
pub struct CliArgs {
    /// Disable colored diagnostics.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a declaration set and report diagnostics or the registry.
    Resolve(ResolveArgs),
    /// Resolve a declaration set and answer one question about it.
    Query(QueryArgs),
    /// Print the standard attribute rules table as JSON.
    Rules,
}

/// Inputs shared by every command that runs a resolution pass.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Declaration set (camelCase JSON).
    pub declarations: PathBuf,

    /// Resolver options (camelCase JSON).
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Run every stage on the calling thread.
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Describe one type by qualified name.
    #[arg(short = 't', long = "type", value_name = "NAME")]
    pub type_name: Option<String>,

    /// Contract to evaluate visibility against.
    #[arg(long, requires = "contract_version")]
    pub contract: Option<String>,

    /// Version of `--contract`.
    #[arg(long = "version", id = "contract_version", requires = "contract")]
    pub contract_version: Option<u32>,

    /// Enabled feature gate; repeatable.
    #[arg(long = "feature", value_name = "NAME")]
    pub features: Vec<String>,

    /// List what is introduced at exactly `--contract`/`--version` instead of
    /// everything visible there.
    #[arg(long, requires = "contract")]
    pub introduced: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable diagnostics and a summary line.
    Text,
    /// The resolved registry as JSON; diagnostics go to stderr.
    Json,
}
