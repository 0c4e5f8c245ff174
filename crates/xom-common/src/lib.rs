//! Common types and utilities for the xom metadata resolver.
//!
//! This crate provides foundational types used across all xom crates:
//! - Structured diagnostics (`Diagnostic`, `DiagnosticCategory`) with stable codes
//! - Message templates and `format_message`
//! - Resolution limits and thresholds

// Diagnostics - codes, categories, templates
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticRelatedInformation,
    diagnostic_codes, diagnostic_messages, format_message,
};

// Centralized limits and thresholds
pub mod limits;
