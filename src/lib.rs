//! Builder, validator and wire codec for portable relational-algebra plans.
//!
//! Plans are trees of relations (scan, filter, fetch, aggregate, cross,
//! join) whose output record types are inferred eagerly, including the
//! nullability effects of each join type. Construction goes through
//! [`plan::Builder`]; serialization through [`wire`].

#![warn(missing_docs)]

pub mod error;
pub mod expr;
pub mod extensions;
pub mod plan;
pub mod types;
pub mod wire;

pub use error::{PlanError, Result};
pub use expr::{Expression, FieldReference, Literal};
pub use extensions::{ExtensionCollection, FunctionCatalog};
pub use plan::{Builder, BuilderOptions, JoinType, Plan, Relation};
pub use types::{NamedStruct, Nullability, RecordType, Type, TypeKind};
