//! Tracing configuration for binaries.
//!
//! Supports three output formats controlled by `XOM_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical indented output via `tracing-tree`, one level per
//!   resolution stage
//! - `json`: one JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Stage-by-stage tree
//! XOM_LOG=debug XOM_LOG_FORMAT=tree xom resolve decls.json
//!
//! # JSON for tooling
//! XOM_LOG=debug XOM_LOG_FORMAT=json xom resolve decls.json
//!
//! # Trace two stages, keep the rest at debug
//! XOM_LOG="graph,storage,xom_resolver=debug" xom resolve decls.json
//! ```
//!
//! In `XOM_LOG`, a bare stage name (`normalize`, `contracts`, `graph`,
//! `storage`, `identity`, `pipeline`) stands for `trace` on that stage's
//! module; every other directive is passed to `EnvFilter` unchanged.
//!
//! The subscriber is only initialised when `XOM_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `XOM_LOG_FORMAT` value. Unknown values fall back to text.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("XOM_LOG_FORMAT").unwrap_or_default())
    }
}

/// Resolution stages and the module that logs each of them.
const STAGE_TARGETS: &[(&str, &str)] = &[
    ("normalize", "xom_resolver::normalize"),
    ("contracts", "xom_resolver::contracts"),
    ("graph", "xom_resolver::graph"),
    ("storage", "xom_resolver::storage"),
    ("identity", "xom_resolver::identity"),
    ("pipeline", "xom_resolver::pipeline"),
];

/// Expand bare stage names in a `XOM_LOG` value into `EnvFilter` directives.
#[must_use]
pub fn expand_stage_directives(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .map(|directive| {
            STAGE_TARGETS
                .iter()
                .find(|(stage, _)| *stage == directive)
                .map_or_else(|| directive.to_string(), |(_, target)| format!("{target}=trace"))
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Build an `EnvFilter` from `XOM_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    match std::env::var("XOM_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(expand_stage_directives(&value)),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `XOM_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so it never mixes with registry JSON on stdout.
pub fn init_tracing() {
    let has_xom_log = std::env::var("XOM_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_xom_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            // Stage spans already name the stage; module targets add nothing.
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_bracketed_fields(true)
                .with_targets(false);

            let _ = Registry::default().with(filter).with(tree_layer).try_init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr);

            let _ = Registry::default().with(filter).with(json_layer).try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_span_events(fmt::format::FmtSpan::CLOSE)
                .try_init();
        }
    }
}
