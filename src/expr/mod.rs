#![forbid(unsafe_code)]

//! Expressions evaluated against a relation's record type.

pub mod decimal;
pub mod literal;

pub use literal::{Literal, LiteralValue};

use crate::error::{PlanError, Result};
use crate::extensions::FunctionRef;
use crate::types::{RecordType, Type};

/// Expression tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Direct reference to a column of the addressed record type.
    FieldReference(FieldReference),
    /// Constant value.
    Literal(Literal),
    /// Call to an extension scalar function.
    ScalarFunction(ScalarCall),
}

impl Expression {
    /// Result type of the expression.
    pub fn ty(&self) -> Type {
        match self {
            Expression::FieldReference(field) => field.ty.clone(),
            Expression::Literal(lit) => lit.ty(),
            Expression::ScalarFunction(call) => call.output_type.clone(),
        }
    }

    /// The referenced field, if this is a field reference.
    pub fn as_field_ref(&self) -> Option<&FieldReference> {
        match self {
            Expression::FieldReference(field) => Some(field),
            _ => None,
        }
    }

    /// Checks that every field reference in the tree addresses `record`.
    ///
    /// A reference built against another relation fails here even when its
    /// index happens to be in range, as long as the column types differ.
    pub(crate) fn check_scope(&self, record: &RecordType) -> Result<()> {
        match self {
            Expression::FieldReference(field) => field.check_scope(record),
            Expression::Literal(_) => Ok(()),
            Expression::ScalarFunction(call) => call
                .args
                .iter()
                .try_for_each(|arg| arg.check_scope(record)),
        }
    }

    /// Visits every extension function referenced by this expression.
    pub(crate) fn for_each_function<'a>(&'a self, visit: &mut dyn FnMut(&'a FunctionRef)) {
        if let Expression::ScalarFunction(call) = self {
            visit(&call.function);
            for arg in &call.args {
                arg.for_each_function(visit);
            }
        }
    }
}

impl From<Literal> for Expression {
    fn from(value: Literal) -> Self {
        Expression::Literal(value)
    }
}

impl From<FieldReference> for Expression {
    fn from(value: FieldReference) -> Self {
        Expression::FieldReference(value)
    }
}

/// Root-relative direct reference to one column.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FieldReference {
    field: u32,
    ty: Type,
}

impl FieldReference {
    /// Resolves column `index` of `record`.
    pub(crate) fn resolve(record: &RecordType, index: i32) -> Result<Self> {
        if index < 0 {
            return Err(PlanError::invalid_arg(format!(
                "cannot create field ref index {index}"
            )));
        }
        let field = record.field(index as usize).ok_or_else(|| {
            PlanError::invalid_arg(format!(
                "field ref index {index} out of range for {} fields",
                record.len()
            ))
        })?;
        Ok(Self {
            field: index as u32,
            ty: field.ty.clone(),
        })
    }

    fn check_scope(&self, record: &RecordType) -> Result<()> {
        let column = record.field(self.field as usize).ok_or_else(|| {
            PlanError::invalid_arg(format!(
                "field ref index {} out of range for {} fields",
                self.field,
                record.len()
            ))
        })?;
        if column.ty != self.ty {
            return Err(PlanError::invalid_arg(format!(
                "field ref index {} has type {}, but the column is {}",
                self.field, self.ty, column.ty
            )));
        }
        Ok(())
    }

    /// Column index.
    pub fn field(&self) -> u32 {
        self.field
    }

    /// Type of the referenced column.
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

/// Scalar function invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarCall {
    pub(crate) function: FunctionRef,
    pub(crate) args: Vec<Expression>,
    pub(crate) output_type: Type,
}

impl ScalarCall {
    /// Bound extension function.
    pub fn function(&self) -> &FunctionRef {
        &self.function
    }

    /// Call arguments.
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Declared result type.
    pub fn output_type(&self) -> &Type {
        &self.output_type
    }
}
