//! Serde message set for the canonical JSON plan encoding.
//!
//! Field names follow protobuf JSON conventions: camelCase keys, oneofs as
//! single-key objects, enums as `SCREAMING_SNAKE_CASE` strings. Decoding is
//! lenient where protobuf JSON is (zero values may be omitted, 64-bit
//! integers may arrive as strings); required parts are `Option`s so the
//! decoder can report exactly what is missing.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Empty message (`{}`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyMsg {}

/// Top-level plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionMsg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_uris: Vec<ExtensionUriMsg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionDeclMsg>,
    #[serde(default)]
    pub relations: Vec<PlanRelMsg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMsg {
    #[serde(default)]
    pub major_number: u32,
    #[serde(default)]
    pub minor_number: u32,
    #[serde(default)]
    pub patch_number: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_hash: String,
    #[serde(default)]
    pub producer: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionUriMsg {
    #[serde(default)]
    pub extension_uri_anchor: u32,
    #[serde(default)]
    pub uri: String,
}

/// Extension declaration; only function declarations are understood.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionDeclMsg {
    ExtensionFunction(ExtensionFunctionMsg),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFunctionMsg {
    #[serde(default)]
    pub extension_uri_reference: u32,
    #[serde(default)]
    pub function_anchor: u32,
    #[serde(default)]
    pub name: String,
}

/// Entry of the plan's relation list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanRelMsg {
    /// Bare relation without output names.
    Rel(RelMsg),
    /// Relation plus output names.
    Root(RelRootMsg),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelRootMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

/// Relation oneof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelMsg {
    Read(Box<ReadRelMsg>),
    Filter(Box<FilterRelMsg>),
    Fetch(Box<FetchRelMsg>),
    Aggregate(Box<AggregateRelMsg>),
    Cross(Box<CrossRelMsg>),
    Join(Box<JoinRelMsg>),
}

/// Common relation header: exactly one of `direct` or `emit`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelCommonMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<EmptyMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitMsg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitMsg {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_mapping: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<NamedStructMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_table: Option<NamedTableMsg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTableMsg {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedStructMsg {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub r#struct: StructMsg,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructMsg {
    #[serde(default)]
    pub types: Vec<TypeMsg>,
    #[serde(default)]
    pub nullability: NullabilityMsg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ExpressionMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RelMsg>,
    #[serde(default, with = "int64")]
    pub offset: i64,
    #[serde(default, with = "int64")]
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<GroupingMsg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<MeasureMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingMsg {
    #[serde(default)]
    pub grouping_expressions: Vec<ExpressionMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<AggregateFunctionMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ExpressionMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateFunctionMsg {
    #[serde(default)]
    pub function_reference: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<FunctionArgumentMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<TypeMsg>,
    #[serde(default)]
    pub phase: AggregationPhaseMsg,
    #[serde(default)]
    pub invocation: AggregationInvocationMsg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<RelMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRelMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<RelCommonMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<RelMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_join_filter: Option<ExpressionMsg>,
    #[serde(rename = "type", default)]
    pub join_type: JoinTypeMsg,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinTypeMsg {
    #[default]
    #[serde(rename = "JOIN_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "JOIN_TYPE_INNER")]
    Inner,
    #[serde(rename = "JOIN_TYPE_OUTER")]
    Outer,
    #[serde(rename = "JOIN_TYPE_LEFT")]
    Left,
    #[serde(rename = "JOIN_TYPE_RIGHT")]
    Right,
    #[serde(rename = "JOIN_TYPE_SEMI")]
    Semi,
    #[serde(rename = "JOIN_TYPE_ANTI")]
    Anti,
    #[serde(rename = "JOIN_TYPE_SINGLE")]
    Single,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationPhaseMsg {
    #[default]
    #[serde(rename = "AGGREGATION_PHASE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "AGGREGATION_PHASE_INITIAL_TO_INTERMEDIATE")]
    InitialToIntermediate,
    #[serde(rename = "AGGREGATION_PHASE_INTERMEDIATE_TO_INTERMEDIATE")]
    IntermediateToIntermediate,
    #[serde(rename = "AGGREGATION_PHASE_INITIAL_TO_RESULT")]
    InitialToResult,
    #[serde(rename = "AGGREGATION_PHASE_INTERMEDIATE_TO_RESULT")]
    IntermediateToResult,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationInvocationMsg {
    #[default]
    #[serde(rename = "AGGREGATION_INVOCATION_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "AGGREGATION_INVOCATION_ALL")]
    All,
    #[serde(rename = "AGGREGATION_INVOCATION_DISTINCT")]
    Distinct,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullabilityMsg {
    #[default]
    #[serde(rename = "NULLABILITY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "NULLABILITY_NULLABLE")]
    Nullable,
    #[serde(rename = "NULLABILITY_REQUIRED")]
    Required,
}

/// Type oneof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeMsg {
    Bool(TypeParamsMsg),
    I8(TypeParamsMsg),
    I16(TypeParamsMsg),
    I32(TypeParamsMsg),
    I64(TypeParamsMsg),
    Fp32(TypeParamsMsg),
    Fp64(TypeParamsMsg),
    String(TypeParamsMsg),
    Binary(TypeParamsMsg),
    Timestamp(TypeParamsMsg),
    Date(TypeParamsMsg),
    Time(TypeParamsMsg),
    IntervalYear(TypeParamsMsg),
    IntervalDay(PrecisionTypeMsg),
    TimestampTz(TypeParamsMsg),
    Uuid(TypeParamsMsg),
    FixedChar(LengthTypeMsg),
    Varchar(LengthTypeMsg),
    FixedBinary(LengthTypeMsg),
    Decimal(DecimalTypeMsg),
    PrecisionTimestamp(PrecisionTypeMsg),
    PrecisionTimestampTz(PrecisionTypeMsg),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamsMsg {
    #[serde(default)]
    pub nullability: NullabilityMsg,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthTypeMsg {
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub nullability: NullabilityMsg,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalTypeMsg {
    #[serde(default)]
    pub scale: i32,
    #[serde(default)]
    pub precision: i32,
    #[serde(default)]
    pub nullability: NullabilityMsg,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionTypeMsg {
    #[serde(default)]
    pub precision: i32,
    #[serde(default)]
    pub nullability: NullabilityMsg,
}

/// Expression oneof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionMsg {
    Selection(Box<FieldReferenceMsg>),
    Literal(Box<LiteralMsg>),
    ScalarFunction(Box<ScalarFunctionMsg>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReferenceMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_reference: Option<ReferenceSegmentMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_reference: Option<EmptyMsg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSegmentMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_field: Option<StructFieldMsg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructFieldMsg {
    #[serde(default)]
    pub field: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<ReferenceSegmentMsg>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarFunctionMsg {
    #[serde(default)]
    pub function_reference: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<FunctionArgumentMsg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<TypeMsg>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionArgumentMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ExpressionMsg>,
}

/// Literal with its nullability flag; the payload key is flattened in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiteralMsg {
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(flatten)]
    pub value: LiteralKindMsg,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Literal payload oneof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKindMsg {
    Boolean(bool),
    I8(i32),
    I16(i32),
    I32(i32),
    I64(#[serde(with = "int64")] i64),
    Fp32(#[serde(with = "float32")] f32),
    Fp64(#[serde(with = "float64")] f64),
    String(String),
    Binary(#[serde(with = "bytes64")] Vec<u8>),
    Timestamp(#[serde(with = "int64")] i64),
    Date(i32),
    Time(#[serde(with = "int64")] i64),
    IntervalYearToMonth(IntervalYearToMonthMsg),
    IntervalDayToSecond(IntervalDayToSecondMsg),
    FixedChar(String),
    VarChar(VarCharMsg),
    FixedBinary(#[serde(with = "bytes64")] Vec<u8>),
    Decimal(DecimalMsg),
    PrecisionTimestamp(PrecisionTimestampMsg),
    PrecisionTimestampTz(PrecisionTimestampMsg),
    TimestampTz(#[serde(with = "int64")] i64),
    Null(TypeMsg),
    Uuid(#[serde(with = "bytes64")] Vec<u8>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalYearToMonthMsg {
    #[serde(default)]
    pub years: i32,
    #[serde(default)]
    pub months: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalDayToSecondMsg {
    #[serde(default)]
    pub days: i32,
    #[serde(default)]
    pub seconds: i32,
    #[serde(default, with = "int64")]
    pub subseconds: i64,
    #[serde(default)]
    pub precision: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarCharMsg {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub length: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalMsg {
    #[serde(default, with = "bytes64")]
    pub value: Vec<u8>,
    #[serde(default)]
    pub precision: i32,
    #[serde(default)]
    pub scale: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionTimestampMsg {
    #[serde(default)]
    pub precision: i32,
    #[serde(default, with = "int64")]
    pub value: i64,
}

/// 64-bit integers: written as numbers, read from numbers or strings.
mod int64 {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Int64Visitor;

        impl<'de> Visitor<'de> for Int64Visitor {
            type Value = i64;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 64-bit integer as a number or a string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value).map_err(|_| E::custom(format!("{value} overflows int64")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse::<i64>()
                    .map_err(|err| E::custom(format!("invalid int64 '{value}': {err}")))
            }
        }

        deserializer.deserialize_any(Int64Visitor)
    }
}

/// Floats: finite values as numbers, the rest as `"NaN"`, `"Infinity"`,
/// `"-Infinity"`.
mod float64 {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match non_finite_name(*value) {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_f64(*value),
        }
    }

    pub(super) fn non_finite_name(value: f64) -> Option<&'static str> {
        if value.is_nan() {
            Some("NaN")
        } else if value == f64::INFINITY {
            Some("Infinity")
        } else if value == f64::NEG_INFINITY {
            Some("-Infinity")
        } else {
            None
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FloatVisitor;

        impl<'de> Visitor<'de> for FloatVisitor {
            type Value = f64;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a number or one of \"NaN\", \"Infinity\", \"-Infinity\"")
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value as f64)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value as f64)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match value {
                    "NaN" => Ok(f64::NAN),
                    "Infinity" => Ok(f64::INFINITY),
                    "-Infinity" => Ok(f64::NEG_INFINITY),
                    other => other
                        .parse::<f64>()
                        .map_err(|err| E::custom(format!("invalid float '{other}': {err}"))),
                }
            }
        }

        deserializer.deserialize_any(FloatVisitor)
    }
}

mod float32 {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match super::float64::non_finite_name(f64::from(*value)) {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_f32(*value),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f32, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::float64::deserialize(deserializer).map(|value| value as f32)
    }
}

/// Byte fields as standard base64 strings.
mod bytes64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::{self, Deserialize, Deserializer};
    use serde::Serializer;

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(|err| de::Error::custom(format!("invalid base64: {err}")))
    }
}
