//! Diagnostic codes and message templates.
//!
//! Keep the three tables (`diagnostic_codes`, `diagnostic_messages`,
//! `DIAGNOSTIC_MESSAGES`) in sync; `tests/diagnostics_tests.rs` checks that
//! every code has exactly one template.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    // Attribute normalizer
    pub const UNKNOWN_ATTRIBUTE_KIND: u32 = 1001;
    pub const ATTRIBUTE_KIND_MISMATCH: u32 = 1002;
    pub const CONFLICTING_ATTRIBUTES: u32 = 1003;
    pub const INVALID_ATTRIBUTE_ARGUMENT: u32 = 1004;
    pub const REDUNDANT_ATTRIBUTE: u32 = 1005;

    // Contract & version resolver
    pub const UNKNOWN_CONTRACT: u32 = 2001;
    pub const NON_MONOTONIC_CONTRACT_VERSIONS: u32 = 2002;
    pub const EMPTY_CONTRACT: u32 = 2003;
    pub const UNDECLARED_CONTRACT_VERSION: u32 = 2004;
    pub const INVALID_GATE: u32 = 2005;
    pub const FEATURE_MISMATCH: u32 = 2006;

    // Type graph builder
    pub const UNRESOLVED_TYPE_REFERENCE: u32 = 3001;
    pub const INHERITANCE_CYCLE: u32 = 3002;
    pub const DUPLICATE_DECLARATION: u32 = 3003;
    pub const INVALID_BASE_TYPE: u32 = 3004;
    pub const INVALID_INTERFACE_REFERENCE: u32 = 3005;
    pub const MEMBER_OWNER_MISMATCH: u32 = 3006;

    // Storage & surface mapper
    pub const INVALID_STORAGE_BINDING: u32 = 4001;
    pub const DUPLICATE_STORAGE_FIELD: u32 = 4002;

    // Identity allocator
    pub const DUPLICATE_IDENTITY: u32 = 5001;
}

pub mod diagnostic_messages {
    pub const UNKNOWN_ATTRIBUTE_KIND: &str = "Attribute '{0}' is not a recognized attribute kind.";
    pub const ATTRIBUTE_KIND_MISMATCH: &str = "Attribute '{0}' cannot be applied to {1}.";
    pub const CONFLICTING_ATTRIBUTES: &str = "Attributes '{0}' and '{1}' conflict.";
    pub const INVALID_ATTRIBUTE_ARGUMENT: &str = "Invalid argument for attribute '{0}': {1}.";
    pub const REDUNDANT_ATTRIBUTE: &str =
        "Attribute '{0}' is repeated with identical arguments and is ignored.";

    pub const UNKNOWN_CONTRACT: &str = "Gate references undeclared contract '{0}'.";
    pub const NON_MONOTONIC_CONTRACT_VERSIONS: &str =
        "Contract versions [{0}] are not unique and strictly increasing.";
    pub const EMPTY_CONTRACT: &str = "Contract declares no versions.";
    pub const UNDECLARED_CONTRACT_VERSION: &str =
        "Gate requires version {0} of contract '{1}', which declares only [{2}].";
    pub const INVALID_GATE: &str = "Gate on contract '{0}' is invalid because the contract failed validation.";
    pub const FEATURE_MISMATCH: &str =
        "Feature gate '{0}' does not match feature gate '{1}' of '{2}'.";

    pub const UNRESOLVED_TYPE_REFERENCE: &str = "Cannot resolve type reference '{0}'.";
    pub const INHERITANCE_CYCLE: &str = "Inheritance cycle: {0}.";
    pub const DUPLICATE_DECLARATION: &str = "'{0}' is declared more than once.";
    pub const INVALID_BASE_TYPE: &str = "Cannot derive from '{0}': {1}.";
    pub const INVALID_INTERFACE_REFERENCE: &str = "Cannot implement '{0}': it is not an interface.";
    pub const MEMBER_OWNER_MISMATCH: &str = "Cannot declare {0} as a member of {1} '{2}'.";

    pub const INVALID_STORAGE_BINDING: &str = "Native storage is not allowed here: {0}.";
    pub const DUPLICATE_STORAGE_FIELD: &str = "Native field '{0}' is already bound by '{1}'.";

    pub const DUPLICATE_IDENTITY: &str = "Identity {0} is already claimed by '{1}'.";
}

use DiagnosticCategory::{Error, Warning};

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::UNKNOWN_ATTRIBUTE_KIND,
        category: Error,
        message: diagnostic_messages::UNKNOWN_ATTRIBUTE_KIND,
    },
    DiagnosticMessage {
        code: diagnostic_codes::ATTRIBUTE_KIND_MISMATCH,
        category: Error,
        message: diagnostic_messages::ATTRIBUTE_KIND_MISMATCH,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CONFLICTING_ATTRIBUTES,
        category: Error,
        message: diagnostic_messages::CONFLICTING_ATTRIBUTES,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_ATTRIBUTE_ARGUMENT,
        category: Error,
        message: diagnostic_messages::INVALID_ATTRIBUTE_ARGUMENT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::REDUNDANT_ATTRIBUTE,
        category: Warning,
        message: diagnostic_messages::REDUNDANT_ATTRIBUTE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNKNOWN_CONTRACT,
        category: Error,
        message: diagnostic_messages::UNKNOWN_CONTRACT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NON_MONOTONIC_CONTRACT_VERSIONS,
        category: Error,
        message: diagnostic_messages::NON_MONOTONIC_CONTRACT_VERSIONS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EMPTY_CONTRACT,
        category: Error,
        message: diagnostic_messages::EMPTY_CONTRACT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNDECLARED_CONTRACT_VERSION,
        category: Error,
        message: diagnostic_messages::UNDECLARED_CONTRACT_VERSION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_GATE,
        category: Error,
        message: diagnostic_messages::INVALID_GATE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FEATURE_MISMATCH,
        category: Error,
        message: diagnostic_messages::FEATURE_MISMATCH,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNRESOLVED_TYPE_REFERENCE,
        category: Error,
        message: diagnostic_messages::UNRESOLVED_TYPE_REFERENCE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INHERITANCE_CYCLE,
        category: Error,
        message: diagnostic_messages::INHERITANCE_CYCLE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_DECLARATION,
        category: Error,
        message: diagnostic_messages::DUPLICATE_DECLARATION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_BASE_TYPE,
        category: Error,
        message: diagnostic_messages::INVALID_BASE_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_INTERFACE_REFERENCE,
        category: Error,
        message: diagnostic_messages::INVALID_INTERFACE_REFERENCE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::MEMBER_OWNER_MISMATCH,
        category: Error,
        message: diagnostic_messages::MEMBER_OWNER_MISMATCH,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_STORAGE_BINDING,
        category: Error,
        message: diagnostic_messages::INVALID_STORAGE_BINDING,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_STORAGE_FIELD,
        category: Error,
        message: diagnostic_messages::DUPLICATE_STORAGE_FIELD,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_IDENTITY,
        category: Error,
        message: diagnostic_messages::DUPLICATE_IDENTITY,
    },
];
