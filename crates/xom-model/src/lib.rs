//! Declaration model for the xom metadata resolver.
//!
//! These are the leaf data structures handed to the resolver by an external
//! parser: one `Declaration` per type or member, each with an ordered bag of
//! raw attributes. Nothing here resolves names or interprets attributes; that
//! is the resolver's job.
//!
//! - `declaration` - `Declaration`, `DeclKind`, `DeclKinds`, accessors, parameters
//! - `attribute` - `RawAttribute`, `AttrArg`, `AttrValue`
//! - `set` - `DeclarationSet` arena and `DeclId`

pub mod attribute;
pub use attribute::{AttrArg, AttrValue, RawAttribute};

pub mod declaration;
pub use declaration::{Accessors, DeclKind, DeclKinds, Declaration, Parameter};

pub mod set;
pub use set::{DeclId, DeclarationSet};
