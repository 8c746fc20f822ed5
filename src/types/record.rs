//! Record types: ordered, named, typed columns.

use std::fmt;

use crate::types::{Nullability, Type};

/// Unnamed struct of column types.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct StructType {
    /// Column types in order.
    pub types: Vec<Type>,
    /// Nullability of the struct itself.
    pub nullability: Nullability,
}

impl StructType {
    /// Creates a required struct over the given column types.
    pub fn new(types: Vec<Type>) -> Self {
        Self {
            types,
            nullability: Nullability::Required,
        }
    }
}

/// Named schema describing a base data source.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct NamedStruct {
    /// Column names, parallel to `r#struct.types`.
    pub names: Vec<String>,
    /// Column types.
    pub r#struct: StructType,
}

impl NamedStruct {
    /// Builds a required named struct from `(name, type)` pairs.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        let (names, types): (Vec<String>, Vec<Type>) = columns
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .unzip();
        Self {
            names,
            r#struct: StructType::new(types),
        }
    }

    /// Converts the schema into a record type.
    ///
    /// Missing names (more types than names) become `field{i}`.
    pub fn record_type(&self) -> RecordType {
        RecordType::new(
            self.r#struct
                .types
                .iter()
                .enumerate()
                .map(|(idx, ty)| {
                    let name = self
                        .names
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| format!("field{idx}"));
                    Field::new(name, ty.clone())
                })
                .collect(),
        )
    }
}

/// Single column of a record type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Column type, nullability included.
    pub ty: Type,
}

impl Field {
    /// Creates a field.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Whether the column may hold nulls.
    pub fn nullable(&self) -> bool {
        self.ty.is_nullable()
    }
}

/// Output schema of a relation: ordered `(name, type, nullable)` columns.
///
/// Renders as `NSTRUCT<name: type[?], ...>`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct RecordType {
    fields: Vec<Field>,
}

impl RecordType {
    /// Creates a record type from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Columns in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column at `idx`.
    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    /// Left columns followed by right columns, nullability untouched.
    pub fn concat(&self, other: &RecordType) -> RecordType {
        let mut fields = Vec::with_capacity(self.len() + other.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        RecordType { fields }
    }

    /// Copy with every column forced nullable.
    pub fn as_nullable(&self) -> RecordType {
        RecordType {
            fields: self
                .fields
                .iter()
                .map(|f| Field::new(f.name.clone(), f.ty.with_nullability(Nullability::Nullable)))
                .collect(),
        }
    }

    /// Copy with the columns renamed, in order.
    ///
    /// Callers ensure `names.len() == self.len()`.
    pub fn renamed(&self, names: &[String]) -> RecordType {
        RecordType {
            fields: self
                .fields
                .iter()
                .zip(names)
                .map(|(f, name)| Field::new(name.clone(), f.ty.clone()))
                .collect(),
        }
    }

    /// The column types as an unnamed struct.
    pub fn to_struct(&self) -> StructType {
        StructType::new(self.fields.iter().map(|f| f.ty.clone()).collect())
    }
}

impl FromIterator<Field> for RecordType {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        RecordType::new(iter.into_iter().collect())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NSTRUCT<")?;
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.ty)?;
        }
        f.write_str(">")
    }
}
