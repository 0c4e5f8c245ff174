//! Centralized limits and thresholds for the resolver.
//!
//! Base-type walks need no constant here: every walk marks the nodes on its
//! current path and memoizes finished nodes, so it visits each type at most
//! once and stops within the type count even on cyclic input.

// =============================================================================
// Diagnostic Limits
// =============================================================================

/// Maximum number of diagnostics collected per stage before further
/// diagnostics of that stage are dropped.
///
/// A badly broken input (for example an attribute table that rejects every
/// attribute) would otherwise produce one diagnostic per attribute across tens
/// of thousands of declarations.
pub const MAX_DIAGNOSTICS_PER_STAGE: usize = 10_000;

// =============================================================================
// Identity Limits
// =============================================================================

/// First ordinal handed out by the identity allocator.
///
/// Ordinal 0 is reserved as the "unknown" sentinel in every native dispatch
/// table, matching the layout generated stubs expect.
pub const FIRST_STABLE_INDEX: u32 = 1;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Initial capacity for the normalizer's memoization cache.
///
/// Attribute bags repeat heavily (`[CodeGen(IdlAndPartialStub)]` alone appears
/// on hundreds of members), so the number of distinct bags is a small fraction
/// of the declaration count.
pub const NORMALIZER_CACHE_CAPACITY: usize = 1_024;
