//! Diagnostic types and message lookup for the resolver.
//!
//! Message templates and stable codes live in `data.rs`. Codes are grouped by
//! the stage that reports them:
//!
//! | Range | Stage |
//! |-------|-------|
//! | 1xxx  | Attribute normalizer |
//! | 2xxx  | Contract & version resolver |
//! | 3xxx  | Type graph builder |
//! | 4xxx  | Storage & surface mapper |
//! | 5xxx  | Identity allocator |

use serde::Serialize;
use std::fmt;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Message = 2,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Message => "message",
        };
        f.write_str(label)
    }
}

/// Related information for a diagnostic (e.g. the other side of a duplicate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    /// Qualified name of the related declaration.
    pub subject: String,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A resolution diagnostic.
///
/// The `subject` is the qualified name of the declaration (or contract) the
/// diagnostic is attached to; there are no source spans at this layer because
/// the core never sees source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub subject: String,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related declarations (e.g. the first claimant of a duplicated identity)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(subject: String, message: String, code: u32) -> Self {
        Self {
            subject,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Build a diagnostic from the message table, filling the template with `args`.
    ///
    /// Unknown codes still produce an error diagnostic whose text is the joined
    /// arguments, so a missing table entry never loses information.
    #[must_use]
    pub fn from_code(code: u32, subject: impl Into<String>, args: &[&str]) -> Self {
        let subject = subject.into();
        match get_diagnostic_message(code) {
            Some(def) => Self {
                subject,
                message_text: format_message(def.message, args),
                category: def.category,
                code,
                related_information: Vec::new(),
            },
            None => Self::error(subject, args.join(" "), code),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, subject: impl Into<String>, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            subject: subject.into(),
            message_text: message.into(),
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} XOM{}: {}: {}",
            self.category, self.code, self.subject, self.message_text
        )?;
        for related in &self.related_information {
            write!(f, "\n    {}: {}", related.subject, related.message_text)?;
        }
        Ok(())
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
