#![forbid(unsafe_code)]

//! Column types with explicit nullability.
//!
//! Every [`Type`] pairs a [`TypeKind`] with a [`Nullability`]. Rendering
//! follows the short IR names (`i32`, `fp32`, `boolean`, ...) with a `?`
//! suffix on nullable columns.

use std::fmt;

pub mod record;

pub use record::{Field, NamedStruct, RecordType, StructType};

/// Nullability marker carried by every type.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Nullability {
    /// Producer did not say.
    #[default]
    Unspecified,
    /// Column may hold nulls.
    Nullable,
    /// Column never holds nulls.
    Required,
}

/// Sub-second precision used by precision timestamps and day-second intervals.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TimePrecision {
    /// 10^0 seconds.
    Seconds,
    /// 10^-1 seconds.
    DeciSeconds,
    /// 10^-2 seconds.
    CentiSeconds,
    /// 10^-3 seconds.
    MilliSeconds,
    /// 10^-4 seconds.
    EMinus4Seconds,
    /// 10^-5 seconds.
    EMinus5Seconds,
    /// 10^-6 seconds.
    MicroSeconds,
    /// 10^-7 seconds.
    EMinus7Seconds,
    /// 10^-8 seconds.
    EMinus8Seconds,
    /// 10^-9 seconds.
    NanoSeconds,
}

impl TimePrecision {
    /// Number of fractional decimal digits.
    pub const fn digits(self) -> i32 {
        self as i32
    }

    /// Looks up a precision by its digit count.
    pub fn from_digits(digits: i32) -> Option<Self> {
        use TimePrecision::*;
        Some(match digits {
            0 => Seconds,
            1 => DeciSeconds,
            2 => CentiSeconds,
            3 => MilliSeconds,
            4 => EMinus4Seconds,
            5 => EMinus5Seconds,
            6 => MicroSeconds,
            7 => EMinus7Seconds,
            8 => EMinus8Seconds,
            9 => NanoSeconds,
            _ => return None,
        })
    }
}

/// Type family and its parameters.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    Boolean,
    I8,
    I16,
    I32,
    I64,
    Fp32,
    Fp64,
    String,
    Binary,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    IntervalYear,
    IntervalDay { precision: TimePrecision },
    Uuid,
    FixedChar { length: u32 },
    VarChar { length: u32 },
    FixedBinary { length: u32 },
    Decimal { precision: u8, scale: u8 },
    PrecisionTimestamp { precision: TimePrecision },
    PrecisionTimestampTz { precision: TimePrecision },
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Boolean => f.write_str("boolean"),
            TypeKind::I8 => f.write_str("i8"),
            TypeKind::I16 => f.write_str("i16"),
            TypeKind::I32 => f.write_str("i32"),
            TypeKind::I64 => f.write_str("i64"),
            TypeKind::Fp32 => f.write_str("fp32"),
            TypeKind::Fp64 => f.write_str("fp64"),
            TypeKind::String => f.write_str("string"),
            TypeKind::Binary => f.write_str("binary"),
            TypeKind::Timestamp => f.write_str("timestamp"),
            TypeKind::TimestampTz => f.write_str("timestamp_tz"),
            TypeKind::Date => f.write_str("date"),
            TypeKind::Time => f.write_str("time"),
            TypeKind::IntervalYear => f.write_str("interval_year"),
            TypeKind::IntervalDay { precision } => {
                write!(f, "interval_day<{}>", precision.digits())
            }
            TypeKind::Uuid => f.write_str("uuid"),
            TypeKind::FixedChar { length } => write!(f, "char<{length}>"),
            TypeKind::VarChar { length } => write!(f, "varchar<{length}>"),
            TypeKind::FixedBinary { length } => write!(f, "fixedbinary<{length}>"),
            TypeKind::Decimal { precision, scale } => write!(f, "decimal<{precision},{scale}>"),
            TypeKind::PrecisionTimestamp { precision } => {
                write!(f, "precision_timestamp<{}>", precision.digits())
            }
            TypeKind::PrecisionTimestampTz { precision } => {
                write!(f, "precision_timestamp_tz<{}>", precision.digits())
            }
        }
    }
}

/// A column type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Type {
    /// Type family.
    pub kind: TypeKind,
    /// Null-ability of values of this type.
    pub nullability: Nullability,
}

impl Type {
    /// Creates a type with the given nullability.
    pub fn new(kind: TypeKind, nullability: Nullability) -> Self {
        Self { kind, nullability }
    }

    /// Creates a non-nullable type.
    pub fn required(kind: TypeKind) -> Self {
        Self::new(kind, Nullability::Required)
    }

    /// Creates a nullable type.
    pub fn nullable(kind: TypeKind) -> Self {
        Self::new(kind, Nullability::Nullable)
    }

    /// Returns a copy with the nullability replaced.
    pub fn with_nullability(&self, nullability: Nullability) -> Self {
        Self {
            kind: self.kind.clone(),
            nullability,
        }
    }

    /// Whether values may be null.
    pub fn is_nullable(&self) -> bool {
        self.nullability == Nullability::Nullable
    }

    /// Whether this is a boolean type of any nullability.
    pub fn is_boolean(&self) -> bool {
        self.kind == TypeKind::Boolean
    }

    /// Type name without the nullability suffix, used in error messages.
    pub fn short_name(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.is_nullable() {
            f.write_str("?")?;
        }
        Ok(())
    }
}
