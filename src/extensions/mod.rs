#![forbid(unsafe_code)]

//! Extension function declarations.
//!
//! A [`FunctionCatalog`] answers "what does `(uri, name)` return?" for the
//! builder. [`ExtensionCollection`] is the in-memory implementation; its
//! [`ExtensionCollection::standard`] instance covers the common generic,
//! comparison, boolean and arithmetic functions.

use rustc_hash::FxHashMap;

use crate::error::{PlanError, Result};
use crate::types::{Nullability, Type, TypeKind};

pub mod registry;

pub use registry::{ExtensionFunction, ExtensionRegistry, ExtensionTable, ExtensionUri, FunctionRef};

/// URI prefix of the standard extension declaration files.
pub const DEFAULT_URI_PREFIX: &str =
    "https://github.com/substrait-io/substrait/blob/main/extensions/";

/// Whether a function is evaluated per row or across a group.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FunctionKind {
    /// Row-level function.
    Scalar,
    /// Group-level function.
    Aggregate,
}

/// How a function's output type is derived from its arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReturnType {
    /// Always this type.
    Fixed(Type),
    /// Type of the first argument.
    SameAsFirstArgument,
    /// Type of the first argument, forced nullable.
    FirstArgumentNullable,
    /// Boolean, nullable when any argument is nullable.
    Boolean,
}

impl ReturnType {
    /// Resolves the output type for a call with the given argument types.
    pub fn resolve(&self, name: &str, args: &[Type]) -> Result<Type> {
        let first = || {
            args.first().cloned().ok_or_else(|| {
                PlanError::invalid_arg(format!(
                    "function {name} requires at least one argument to derive its output type"
                ))
            })
        };
        match self {
            ReturnType::Fixed(ty) => Ok(ty.clone()),
            ReturnType::SameAsFirstArgument => first(),
            ReturnType::FirstArgumentNullable => {
                Ok(first()?.with_nullability(Nullability::Nullable))
            }
            ReturnType::Boolean => {
                let nullability = if args.iter().any(Type::is_nullable) {
                    Nullability::Nullable
                } else {
                    Nullability::Required
                };
                Ok(Type::new(TypeKind::Boolean, nullability))
            }
        }
    }
}

/// Declaration of one extension function.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionDecl {
    /// Declaring extension URI.
    pub uri: String,
    /// Function name.
    pub name: String,
    /// Scalar or aggregate.
    pub kind: FunctionKind,
    /// Output type rule.
    pub returns: ReturnType,
}

impl FunctionDecl {
    /// Human-readable signature used in diagnostics.
    pub fn signature(&self) -> String {
        let kind = match self.kind {
            FunctionKind::Scalar => "scalar",
            FunctionKind::Aggregate => "aggregate",
        };
        format!("{kind} {}#{}", self.uri, self.name)
    }
}

/// Resolves extension function declarations by URI and name.
pub trait FunctionCatalog {
    /// Looks up the declaration of `name` within `uri`.
    fn lookup(&self, uri: &str, name: &str) -> Option<FunctionDecl>;
}

/// In-memory function catalog.
#[derive(Clone, Debug, Default)]
pub struct ExtensionCollection {
    functions: FxHashMap<(String, String), FunctionDecl>,
}

impl ExtensionCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function declaration.
    pub fn with_function(
        mut self,
        uri: impl Into<String>,
        name: impl Into<String>,
        kind: FunctionKind,
        returns: ReturnType,
    ) -> Self {
        let decl = FunctionDecl {
            uri: uri.into(),
            name: name.into(),
            kind,
            returns,
        };
        self.functions
            .insert((decl.uri.clone(), decl.name.clone()), decl);
        self
    }

    /// Number of declared functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The standard declarations shipped with the IR.
    pub fn standard() -> Self {
        let generic = format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml");
        let arithmetic = format!("{DEFAULT_URI_PREFIX}functions_arithmetic.yaml");
        let comparison = format!("{DEFAULT_URI_PREFIX}functions_comparison.yaml");
        let boolean = format!("{DEFAULT_URI_PREFIX}functions_boolean.yaml");

        let mut collection = Self::new().with_function(
            generic,
            "count",
            FunctionKind::Aggregate,
            ReturnType::Fixed(Type::required(TypeKind::I64)),
        );
        for name in ["sum", "min", "max", "avg"] {
            collection = collection.with_function(
                arithmetic.clone(),
                name,
                FunctionKind::Aggregate,
                ReturnType::FirstArgumentNullable,
            );
        }
        for name in ["add", "subtract", "multiply", "divide"] {
            collection = collection.with_function(
                arithmetic.clone(),
                name,
                FunctionKind::Scalar,
                ReturnType::SameAsFirstArgument,
            );
        }
        for name in ["equal", "not_equal", "lt", "lte", "gt", "gte"] {
            collection = collection.with_function(
                comparison.clone(),
                name,
                FunctionKind::Scalar,
                ReturnType::Boolean,
            );
        }
        collection = collection.with_function(
            comparison,
            "is_null",
            FunctionKind::Scalar,
            ReturnType::Fixed(Type::required(TypeKind::Boolean)),
        );
        for name in ["and", "or", "not"] {
            collection = collection.with_function(
                boolean.clone(),
                name,
                FunctionKind::Scalar,
                ReturnType::Boolean,
            );
        }
        collection
    }
}

impl FunctionCatalog for ExtensionCollection {
    fn lookup(&self, uri: &str, name: &str) -> Option<FunctionDecl> {
        self.functions
            .get(&(uri.to_owned(), name.to_owned()))
            .cloned()
    }
}
