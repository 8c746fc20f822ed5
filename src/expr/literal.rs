//! Typed literal values used as leaf expressions.
//!
//! Constructors mirror the IR's literal families. The plan builder only
//! inspects a literal's [`Type`]; the payload travels untouched through the
//! wire codec.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{PlanError, Result};
use crate::expr::decimal::{parse_decimal, MAX_DECIMAL_PRECISION};
use crate::types::{Nullability, TimePrecision, Type, TypeKind};

/// Microseconds in one day; valid `time` values lie in `[0, MICROS_PER_DAY)`.
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Literal payload.
///
/// Equality compares floats by bit pattern, so a NaN payload equals itself
/// and `0.0` differs from `-0.0`, matching what the wire form preserves.
#[derive(Clone, Debug)]
pub enum LiteralValue {
    /// Boolean literal.
    Boolean(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// 32-bit float.
    Fp32(f32),
    /// 64-bit float.
    Fp64(f64),
    /// UTF-8 string.
    String(String),
    /// Arbitrary bytes.
    Binary(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    /// Microseconds since the Unix epoch, UTC.
    TimestampTz(i64),
    /// Year-month interval.
    IntervalYearToMonth {
        /// Whole years.
        years: i32,
        /// Additional months.
        months: i32,
    },
    /// Day-second interval with sub-second precision.
    IntervalDayToSecond {
        /// Whole days.
        days: i32,
        /// Additional seconds.
        seconds: i32,
        /// Sub-second units at `precision`.
        subseconds: i64,
        /// Unit of `subseconds`.
        precision: TimePrecision,
    },
    /// 16-byte UUID.
    Uuid([u8; 16]),
    /// Fixed-length character string.
    FixedChar(String),
    /// Variable-length character string with declared maximum length.
    VarChar {
        /// Characters.
        value: String,
        /// Declared maximum length.
        length: u32,
    },
    /// Fixed-length binary.
    FixedBinary(Vec<u8>),
    /// 128-bit decimal in little-endian two's complement.
    Decimal {
        /// Unscaled value bytes.
        value: [u8; 16],
        /// Total digits.
        precision: u8,
        /// Fractional digits.
        scale: u8,
    },
    /// Timestamp with explicit precision.
    PrecisionTimestamp {
        /// Unit of `value`.
        precision: TimePrecision,
        /// Units since the Unix epoch.
        value: i64,
    },
    /// UTC timestamp with explicit precision.
    PrecisionTimestampTz {
        /// Unit of `value`.
        precision: TimePrecision,
        /// Units since the Unix epoch.
        value: i64,
    },
    /// Typed null.
    Null(Type),
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        use LiteralValue as L;
        match (self, other) {
            (L::Boolean(a), L::Boolean(b)) => a == b,
            (L::I8(a), L::I8(b)) => a == b,
            (L::I16(a), L::I16(b)) => a == b,
            (L::I32(a), L::I32(b)) => a == b,
            (L::I64(a), L::I64(b)) => a == b,
            (L::Fp32(a), L::Fp32(b)) => a.to_bits() == b.to_bits(),
            (L::Fp64(a), L::Fp64(b)) => a.to_bits() == b.to_bits(),
            (L::String(a), L::String(b)) => a == b,
            (L::Binary(a), L::Binary(b)) => a == b,
            (L::Date(a), L::Date(b)) => a == b,
            (L::Time(a), L::Time(b)) => a == b,
            (L::Timestamp(a), L::Timestamp(b)) => a == b,
            (L::TimestampTz(a), L::TimestampTz(b)) => a == b,
            (
                L::IntervalYearToMonth { years, months },
                L::IntervalYearToMonth {
                    years: other_years,
                    months: other_months,
                },
            ) => years == other_years && months == other_months,
            (
                L::IntervalDayToSecond {
                    days,
                    seconds,
                    subseconds,
                    precision,
                },
                L::IntervalDayToSecond {
                    days: other_days,
                    seconds: other_seconds,
                    subseconds: other_subseconds,
                    precision: other_precision,
                },
            ) => {
                days == other_days
                    && seconds == other_seconds
                    && subseconds == other_subseconds
                    && precision == other_precision
            }
            (L::Uuid(a), L::Uuid(b)) => a == b,
            (L::FixedChar(a), L::FixedChar(b)) => a == b,
            (
                L::VarChar { value, length },
                L::VarChar {
                    value: other_value,
                    length: other_length,
                },
            ) => value == other_value && length == other_length,
            (L::FixedBinary(a), L::FixedBinary(b)) => a == b,
            (
                L::Decimal {
                    value,
                    precision,
                    scale,
                },
                L::Decimal {
                    value: other_value,
                    precision: other_precision,
                    scale: other_scale,
                },
            ) => value == other_value && precision == other_precision && scale == other_scale,
            (
                L::PrecisionTimestamp { precision, value },
                L::PrecisionTimestamp {
                    precision: other_precision,
                    value: other_value,
                },
            )
            | (
                L::PrecisionTimestampTz { precision, value },
                L::PrecisionTimestampTz {
                    precision: other_precision,
                    value: other_value,
                },
            ) => precision == other_precision && value == other_value,
            (L::Null(a), L::Null(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

/// A literal value plus its nullability flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    value: LiteralValue,
    nullable: bool,
}

impl Literal {
    /// Wraps a payload as a non-nullable literal.
    pub fn new(value: LiteralValue) -> Self {
        Self {
            value,
            nullable: false,
        }
    }

    /// Wraps a payload with an explicit nullability flag.
    pub fn with_nullable(value: LiteralValue, nullable: bool) -> Self {
        Self { value, nullable }
    }

    /// Payload.
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    /// Whether the literal's type is declared nullable.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Declared type of the literal.
    pub fn ty(&self) -> Type {
        let kind = match &self.value {
            LiteralValue::Boolean(_) => TypeKind::Boolean,
            LiteralValue::I8(_) => TypeKind::I8,
            LiteralValue::I16(_) => TypeKind::I16,
            LiteralValue::I32(_) => TypeKind::I32,
            LiteralValue::I64(_) => TypeKind::I64,
            LiteralValue::Fp32(_) => TypeKind::Fp32,
            LiteralValue::Fp64(_) => TypeKind::Fp64,
            LiteralValue::String(_) => TypeKind::String,
            LiteralValue::Binary(_) => TypeKind::Binary,
            LiteralValue::Date(_) => TypeKind::Date,
            LiteralValue::Time(_) => TypeKind::Time,
            LiteralValue::Timestamp(_) => TypeKind::Timestamp,
            LiteralValue::TimestampTz(_) => TypeKind::TimestampTz,
            LiteralValue::IntervalYearToMonth { .. } => TypeKind::IntervalYear,
            LiteralValue::IntervalDayToSecond { precision, .. } => TypeKind::IntervalDay {
                precision: *precision,
            },
            LiteralValue::Uuid(_) => TypeKind::Uuid,
            LiteralValue::FixedChar(value) => TypeKind::FixedChar {
                length: value.len() as u32,
            },
            LiteralValue::VarChar { length, .. } => TypeKind::VarChar { length: *length },
            LiteralValue::FixedBinary(value) => TypeKind::FixedBinary {
                length: value.len() as u32,
            },
            LiteralValue::Decimal {
                precision, scale, ..
            } => TypeKind::Decimal {
                precision: *precision,
                scale: *scale,
            },
            LiteralValue::PrecisionTimestamp { precision, .. } => TypeKind::PrecisionTimestamp {
                precision: *precision,
            },
            LiteralValue::PrecisionTimestampTz { precision, .. } => {
                TypeKind::PrecisionTimestampTz {
                    precision: *precision,
                }
            }
            LiteralValue::Null(ty) => return ty.with_nullability(Nullability::Nullable),
        };
        let nullability = if self.nullable {
            Nullability::Nullable
        } else {
            Nullability::Required
        };
        Type::new(kind, nullability)
    }

    /// Boolean literal.
    pub fn boolean(value: bool) -> Self {
        Self::new(LiteralValue::Boolean(value))
    }

    /// 8-bit integer literal.
    pub fn i8(value: i8) -> Self {
        Self::new(LiteralValue::I8(value))
    }

    /// 16-bit integer literal.
    pub fn i16(value: i16) -> Self {
        Self::new(LiteralValue::I16(value))
    }

    /// 32-bit integer literal.
    pub fn i32(value: i32) -> Self {
        Self::new(LiteralValue::I32(value))
    }

    /// 64-bit integer literal.
    pub fn i64(value: i64) -> Self {
        Self::new(LiteralValue::I64(value))
    }

    /// 32-bit float literal.
    pub fn fp32(value: f32) -> Self {
        Self::new(LiteralValue::Fp32(value))
    }

    /// 64-bit float literal.
    pub fn fp64(value: f64) -> Self {
        Self::new(LiteralValue::Fp64(value))
    }

    /// String literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::String(value.into()))
    }

    /// Binary literal.
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self::new(LiteralValue::Binary(value.into()))
    }

    /// Date literal from a day count relative to the Unix epoch.
    pub fn date(days: i32) -> Self {
        Self::new(LiteralValue::Date(days))
    }

    /// Time-of-day literal. The total must land within one day.
    pub fn time(hours: i32, minutes: i32, seconds: i32, micros: i32) -> Result<Self> {
        let total = i64::from(hours) * 3_600_000_000
            + i64::from(minutes) * 60_000_000
            + i64::from(seconds) * 1_000_000
            + i64::from(micros);
        if !(0..MICROS_PER_DAY).contains(&total) {
            return Err(PlanError::invalid_arg(format!(
                "invalid time value {hours}:{minutes}:{seconds}.{micros}"
            )));
        }
        Ok(Self::new(LiteralValue::Time(total)))
    }

    /// Time-of-day literal from microseconds since midnight.
    pub fn time_from_micros(micros: i64) -> Result<Self> {
        if !(0..MICROS_PER_DAY).contains(&micros) {
            return Err(PlanError::invalid_arg(format!("invalid time value {micros}")));
        }
        Ok(Self::new(LiteralValue::Time(micros)))
    }

    /// Timestamp literal in microseconds since the epoch, rounded down.
    pub fn timestamp(at: OffsetDateTime) -> Self {
        Self::timestamp_from_micros(scaled_epoch(at, TimePrecision::MicroSeconds))
    }

    /// Timestamp literal from microseconds since the epoch.
    pub fn timestamp_from_micros(micros: i64) -> Self {
        Self::new(LiteralValue::Timestamp(micros))
    }

    /// UTC timestamp literal in microseconds since the epoch, rounded down.
    pub fn timestamp_tz(at: OffsetDateTime) -> Self {
        Self::timestamp_tz_from_micros(scaled_epoch(at, TimePrecision::MicroSeconds))
    }

    /// UTC timestamp literal from microseconds since the epoch.
    pub fn timestamp_tz_from_micros(micros: i64) -> Self {
        Self::new(LiteralValue::TimestampTz(micros))
    }

    /// Year-month interval literal.
    pub fn interval_years_to_month(years: i32, months: i32) -> Self {
        Self::new(LiteralValue::IntervalYearToMonth { years, months })
    }

    /// Day-second interval with microsecond sub-seconds.
    pub fn interval_days_to_second(days: i32, seconds: i32, micros: i64) -> Self {
        Self::new(LiteralValue::IntervalDayToSecond {
            days,
            seconds,
            subseconds: micros,
            precision: TimePrecision::MicroSeconds,
        })
    }

    /// UUID literal.
    pub fn uuid(value: Uuid) -> Self {
        Self::new(LiteralValue::Uuid(*value.as_bytes()))
    }

    /// UUID literal from raw bytes; exactly 16 are required.
    pub fn uuid_from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: [u8; 16] = bytes.try_into().map_err(|_| {
            PlanError::invalid_arg(format!("uuid must be 16 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::new(LiteralValue::Uuid(value)))
    }

    /// Fixed-length character literal.
    pub fn fixed_char(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::FixedChar(value.into()))
    }

    /// Fixed-length binary literal.
    pub fn fixed_binary(value: impl Into<Vec<u8>>) -> Self {
        Self::new(LiteralValue::FixedBinary(value.into()))
    }

    /// Variable-length char whose declared length is the value's byte length.
    pub fn var_char(value: impl Into<String>) -> Self {
        let value = value.into();
        let length = value.len() as u32;
        Self::new(LiteralValue::VarChar { value, length })
    }

    /// Decimal from a 16-byte little-endian two's-complement integer.
    pub fn decimal_from_twos_complement(bytes: &[u8], precision: i32, scale: i32) -> Result<Self> {
        let value: [u8; 16] = bytes
            .try_into()
            .map_err(|_| PlanError::invalid_arg("twos complement must be 16 bytes"))?;
        if !(1..=MAX_DECIMAL_PRECISION as i32).contains(&precision) {
            return Err(PlanError::invalid_arg("precision must be in range [1, 38]"));
        }
        if !(0..=precision).contains(&scale) {
            return Err(PlanError::invalid_arg("scale must be in range [0, precision]"));
        }
        Ok(Self::new(LiteralValue::Decimal {
            value,
            precision: precision as u8,
            scale: scale as u8,
        }))
    }

    /// Decimal parsed from its string form; see [`crate::expr::decimal`].
    pub fn decimal_from_str(value: &str) -> Result<Self> {
        let parts = parse_decimal(value)?;
        Ok(Self::new(LiteralValue::Decimal {
            value: parts.to_le_bytes(),
            precision: parts.precision,
            scale: parts.scale,
        }))
    }

    /// Timestamp literal counted in units of `precision`.
    pub fn precision_timestamp(precision: TimePrecision, value: i64) -> Self {
        Self::new(LiteralValue::PrecisionTimestamp { precision, value })
    }

    /// Timestamp literal at `precision`, rounded down.
    pub fn precision_timestamp_from_time(precision: TimePrecision, at: OffsetDateTime) -> Self {
        Self::precision_timestamp(precision, scaled_epoch(at, precision))
    }

    /// UTC timestamp literal counted in units of `precision`.
    pub fn precision_timestamp_tz(precision: TimePrecision, value: i64) -> Self {
        Self::new(LiteralValue::PrecisionTimestampTz { precision, value })
    }

    /// UTC timestamp literal at `precision`, rounded down.
    pub fn precision_timestamp_tz_from_time(precision: TimePrecision, at: OffsetDateTime) -> Self {
        Self::precision_timestamp_tz(precision, scaled_epoch(at, precision))
    }

    /// Null of the given type; the resulting type is always nullable.
    pub fn null(ty: Type) -> Self {
        Self::with_nullable(
            LiteralValue::Null(ty.with_nullability(Nullability::Nullable)),
            true,
        )
    }
}

/// Offset from the Unix epoch in units of `precision`.
///
/// Rounds toward negative infinity, so an instant before 1970 that falls
/// inside a unit maps to the earlier unit.
fn scaled_epoch(at: OffsetDateTime, precision: TimePrecision) -> i64 {
    let divisor = 10i128.pow((9 - precision.digits()) as u32);
    at.unix_timestamp_nanos().div_euclid(divisor) as i64
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::boolean(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::i32(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::i64(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::fp64(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::string(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::string(value)
    }
}
