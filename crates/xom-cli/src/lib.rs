//! Command-line front-end: JSON declarations in, diagnostics and registry
//! JSON or query listings out.

pub mod args;
pub mod driver;
pub mod reporter;

pub use driver::{CommandOutput, EXIT_DIAGNOSTICS, EXIT_SUCCESS};
