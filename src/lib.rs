//! Contract and type metadata resolution for declarative UI object-model
//! schemas.
//!
//! Re-exports the workspace crates behind one name so embedders and the CLI
//! depend on a single package.

// Diagnostics and resolution limits
pub use xom_common as common;
pub use xom_common::{Diagnostic, DiagnosticCategory, diagnostic_codes};

// Declaration model - the resolver's input
pub use xom_model as model;
pub use xom_model::{DeclId, DeclKind, Declaration, DeclarationSet, RawAttribute};

// Resolution pipeline and the resolved registry
pub use xom_resolver as resolver;
pub use xom_resolver::{
    AvailabilityContext, Resolution, Resolver, ResolverOptions, Surfaces, TypeRegistry, resolve,
};

// Subscriber setup for binaries (XOM_LOG / XOM_LOG_FORMAT)
pub mod tracing_config;
