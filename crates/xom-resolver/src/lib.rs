//! Contract and type metadata resolution.
//!
//! Takes a [`DeclarationSet`](xom_model::DeclarationSet) of raw type and member
//! declarations and produces either an immutable [`TypeRegistry`] or the full
//! list of diagnostics explaining why it could not.
//!
//! The pass runs in fixed stages: attribute normalization, then contract
//! resolution, type graph construction, storage/surface mapping and identity
//! allocation (mutually independent), then a merge. See [`pipeline`].

pub mod attributes;
pub mod contracts;
pub mod graph;
pub mod identity;
pub mod names;
pub mod normalize;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod rules;
pub mod stage;
pub mod storage;

pub use attributes::{
    ClassFlags, CodeGenLevel, CodeGenPolicy, ContractVersionDecl, EventFlags, Guid, IndexRequest,
    NamedGuid, PropertyFlags, TypeTableFlags, ValueKind, Visibility,
};
pub use contracts::{Availability, AvailabilityContext, ContractNode, Gate};
pub use identity::{Identity, IndexSpace};
pub use names::TypeRef;
pub use normalize::{Facets, Normalizer};
pub use options::ResolverOptions;
pub use pipeline::{Resolution, Resolver, resolve};
pub use registry::{Entity, MemberNode, TypeNode, TypeRegistry};
pub use rules::{AttributeKind, AttributeRule, AttributeRules, Claim, ConflictRule, RuleOverrides};
pub use storage::{AccessorShape, StorageBinding, StorageCategory, Surfaces};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
