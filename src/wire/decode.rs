//! Wire messages back into a validated in-memory plan.
//!
//! Every relation is rebuilt through the same validated constructors the
//! builder uses, so a decoded plan satisfies the same invariants. All
//! failures surface as [`PlanError::Decode`].

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{PlanError, Result};
use crate::expr::{Expression, FieldReference, Literal, LiteralValue, ScalarCall};
use crate::extensions::{
    ExtensionFunction, ExtensionRegistry, ExtensionTable, ExtensionUri, FunctionCatalog,
    FunctionRef,
};
use crate::plan::relation::{
    AggRelMeasure, AggregateCall, AggregateRel, AggregationInvocation, AggregationPhase, CrossRel,
    FetchRel, FilterRel, Grouping, JoinRel, JoinType, ReadRel, RelOp, Relation,
};
use crate::plan::{Plan, Root, Version};
use crate::types::{NamedStruct, Nullability, RecordType, StructType, TimePrecision, Type, TypeKind};
use crate::wire::messages::*;

/// Rebuilds a plan from its wire message.
///
/// Anchors are kept as they appear on the wire. `catalog` is consulted only
/// to report declarations it does not know.
pub fn decode(msg: &PlanMsg, catalog: &dyn FunctionCatalog) -> Result<Plan> {
    let version = msg
        .version
        .as_ref()
        .map(|v| Version {
            major: v.major_number,
            minor: v.minor_number,
            patch: v.patch_number,
            producer: v.producer.clone(),
        })
        .unwrap_or(Version {
            major: 0,
            minor: 0,
            patch: 0,
            producer: String::new(),
        });

    let extensions = ExtensionTable {
        uris: msg
            .extension_uris
            .iter()
            .map(|uri| ExtensionUri {
                anchor: uri.extension_uri_anchor,
                uri: uri.uri.clone(),
            })
            .collect(),
        functions: msg
            .extensions
            .iter()
            .map(|decl| match decl {
                ExtensionDeclMsg::ExtensionFunction(func) => ExtensionFunction {
                    uri_anchor: func.extension_uri_reference,
                    anchor: func.function_anchor,
                    name: func.name.clone(),
                },
            })
            .collect(),
    };
    let registry = ExtensionRegistry::from_table(&extensions)?;
    for func in &extensions.functions {
        if let Some(resolved) = registry.resolve(func.anchor) {
            if catalog.lookup(resolved.uri(), resolved.name()).is_none() {
                debug!(
                    uri = resolved.uri(),
                    name = resolved.name(),
                    anchor = func.anchor,
                    "decoded plan references a function unknown to the catalog"
                );
            }
        }
    }

    let decoder = Decoder { registry };
    let roots = msg
        .relations
        .iter()
        .map(|rel| decoder.root(rel))
        .collect::<Result<Vec<_>>>()?;
    if roots.is_empty() {
        return Err(PlanError::decode("plan has no relations"));
    }
    debug!(roots = roots.len(), %version, "decoded plan");
    Ok(Plan {
        version,
        extensions,
        roots,
    })
}

struct Decoder {
    registry: ExtensionRegistry,
}

fn missing(what: &str) -> PlanError {
    PlanError::decode(format!("missing {what}"))
}

impl Decoder {
    fn root(&self, msg: &PlanRelMsg) -> Result<Root> {
        let root = match msg {
            PlanRelMsg::Root(root) => root,
            PlanRelMsg::Rel(_) => {
                return Err(PlanError::decode("plan relation without a root is not supported"))
            }
        };
        let input = self.relation(root.input.as_ref().ok_or_else(|| missing("root input"))?)?;
        let field_count = input.record_type().len();
        if root.names.len() != field_count {
            return Err(PlanError::decode(format!(
                "number of output names ({}) does not match record type field count ({field_count})",
                root.names.len()
            )));
        }
        Ok(Root {
            input,
            names: root.names.clone(),
        })
    }

    fn child(&self, msg: Option<&RelMsg>, what: &str) -> Result<Arc<Relation>> {
        let msg = msg.ok_or_else(|| missing(what))?;
        self.relation(msg).map(Arc::new)
    }

    fn relation(&self, msg: &RelMsg) -> Result<Relation> {
        let (op, common) = match msg {
            RelMsg::Read(read) => {
                let base_schema = named_struct(
                    read.base_schema
                        .as_ref()
                        .ok_or_else(|| missing("read base schema"))?,
                )?;
                let table = read
                    .named_table
                    .as_ref()
                    .ok_or_else(|| PlanError::decode("only named table reads are supported"))?
                    .names
                    .clone();
                (RelOp::Read(ReadRel { table, base_schema }), &read.common)
            }
            RelMsg::Filter(filter) => {
                let input = self.child(filter.input.as_ref(), "filter input")?;
                let condition = self.expression(
                    filter
                        .condition
                        .as_ref()
                        .ok_or_else(|| missing("filter condition"))?,
                    &input.record_type(),
                )?;
                (RelOp::Filter(FilterRel { input, condition }), &filter.common)
            }
            RelMsg::Fetch(fetch) => {
                let input = self.child(fetch.input.as_ref(), "fetch input")?;
                (
                    RelOp::Fetch(FetchRel {
                        input,
                        offset: fetch.offset,
                        count: fetch.count,
                    }),
                    &fetch.common,
                )
            }
            RelMsg::Aggregate(agg) => {
                let input = self.child(agg.input.as_ref(), "aggregate input")?;
                let record = input.record_type();
                let groupings = agg
                    .groupings
                    .iter()
                    .map(|grouping| {
                        grouping
                            .grouping_expressions
                            .iter()
                            .map(|expr| self.expression(expr, &record))
                            .collect::<Result<Vec<_>>>()
                            .map(|expressions| Grouping { expressions })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let measures = agg
                    .measures
                    .iter()
                    .map(|measure| self.measure(measure, &record))
                    .collect::<Result<Vec<_>>>()?;
                (
                    RelOp::Aggregate(AggregateRel {
                        input,
                        groupings,
                        measures,
                    }),
                    &agg.common,
                )
            }
            RelMsg::Cross(cross) => {
                let left = self.child(cross.left.as_ref(), "cross left input")?;
                let right = self.child(cross.right.as_ref(), "cross right input")?;
                (RelOp::Cross(CrossRel { left, right }), &cross.common)
            }
            RelMsg::Join(join) => {
                let left = self.child(join.left.as_ref(), "join left input")?;
                let right = self.child(join.right.as_ref(), "join right input")?;
                let joined = left.record_type().concat(&right.record_type());
                let condition = self.expression(
                    join.expression
                        .as_ref()
                        .ok_or_else(|| missing("join condition"))?,
                    &joined,
                )?;
                let post_join_filter = join
                    .post_join_filter
                    .as_ref()
                    .map(|expr| self.expression(expr, &joined))
                    .transpose()?;
                (
                    RelOp::Join(JoinRel {
                        left,
                        right,
                        condition,
                        post_join_filter,
                        join_type: join_type(join.join_type),
                    }),
                    &join.common,
                )
            }
        };
        let remap = emit(common.as_ref())?;
        trace!(op = op.name(), "decoded relation");
        Relation::build(op, remap.as_deref()).map_err(PlanError::into_decode)
    }

    fn measure(&self, msg: &MeasureMsg, record: &RecordType) -> Result<AggRelMeasure> {
        let call = msg.measure.as_ref().ok_or_else(|| missing("measure function"))?;
        let function = self.function(call.function_reference)?;
        let args = self.arguments(&call.arguments, record)?;
        let output_type = ty(call
            .output_type
            .as_ref()
            .ok_or_else(|| missing("measure output type"))?)?;
        let filter = msg
            .filter
            .as_ref()
            .map(|expr| self.expression(expr, record))
            .transpose()?;
        Ok(AggRelMeasure {
            measure: AggregateCall {
                function,
                args,
                output_type,
                phase: phase(call.phase),
                invocation: invocation(call.invocation),
            },
            filter,
        })
    }

    fn function(&self, anchor: u32) -> Result<FunctionRef> {
        self.registry
            .resolve(anchor)
            .ok_or_else(|| PlanError::decode(format!("unknown function anchor {anchor}")))
    }

    fn arguments(&self, args: &[FunctionArgumentMsg], record: &RecordType) -> Result<Vec<Expression>> {
        args.iter()
            .map(|arg| {
                let value = arg
                    .value
                    .as_ref()
                    .ok_or_else(|| PlanError::decode("only value arguments are supported"))?;
                self.expression(value, record)
            })
            .collect()
    }

    fn expression(&self, msg: &ExpressionMsg, record: &RecordType) -> Result<Expression> {
        match msg {
            ExpressionMsg::Selection(selection) => {
                if selection.root_reference.is_none() {
                    return Err(PlanError::decode("only root references are supported"));
                }
                let field = selection
                    .direct_reference
                    .as_ref()
                    .and_then(|segment| segment.struct_field.as_ref())
                    .ok_or_else(|| missing("struct field reference"))?;
                if field.child.is_some() {
                    return Err(PlanError::decode("nested field references are not supported"));
                }
                FieldReference::resolve(record, field.field)
                    .map(Expression::from)
                    .map_err(PlanError::into_decode)
            }
            ExpressionMsg::Literal(lit) => literal(lit).map(Expression::from),
            ExpressionMsg::ScalarFunction(call) => {
                let function = self.function(call.function_reference)?;
                let args = self.arguments(&call.arguments, record)?;
                let output_type = ty(call
                    .output_type
                    .as_ref()
                    .ok_or_else(|| missing("scalar function output type"))?)?;
                Ok(Expression::ScalarFunction(ScalarCall {
                    function,
                    args,
                    output_type,
                }))
            }
        }
    }
}

fn emit(common: Option<&RelCommonMsg>) -> Result<Option<Vec<i32>>> {
    match common {
        None => Ok(None),
        Some(RelCommonMsg {
            direct: Some(_),
            emit: Some(_),
        }) => Err(PlanError::decode("relation common sets both direct and emit")),
        Some(RelCommonMsg { emit: Some(emit), .. }) => Ok(Some(emit.output_mapping.clone())),
        Some(_) => Ok(None),
    }
}

fn join_type(msg: JoinTypeMsg) -> JoinType {
    match msg {
        JoinTypeMsg::Unspecified => JoinType::Unspecified,
        JoinTypeMsg::Inner => JoinType::Inner,
        JoinTypeMsg::Outer => JoinType::Outer,
        JoinTypeMsg::Left => JoinType::Left,
        JoinTypeMsg::Right => JoinType::Right,
        JoinTypeMsg::Semi => JoinType::Semi,
        JoinTypeMsg::Anti => JoinType::Anti,
        JoinTypeMsg::Single => JoinType::Single,
    }
}

fn phase(msg: AggregationPhaseMsg) -> AggregationPhase {
    match msg {
        AggregationPhaseMsg::Unspecified => AggregationPhase::Unspecified,
        AggregationPhaseMsg::InitialToIntermediate => AggregationPhase::InitialToIntermediate,
        AggregationPhaseMsg::IntermediateToIntermediate => {
            AggregationPhase::IntermediateToIntermediate
        }
        AggregationPhaseMsg::InitialToResult => AggregationPhase::InitialToResult,
        AggregationPhaseMsg::IntermediateToResult => AggregationPhase::IntermediateToResult,
    }
}

fn invocation(msg: AggregationInvocationMsg) -> AggregationInvocation {
    match msg {
        AggregationInvocationMsg::Unspecified => AggregationInvocation::Unspecified,
        AggregationInvocationMsg::All => AggregationInvocation::All,
        AggregationInvocationMsg::Distinct => AggregationInvocation::Distinct,
    }
}

fn nullability(msg: NullabilityMsg) -> Nullability {
    match msg {
        NullabilityMsg::Unspecified => Nullability::Unspecified,
        NullabilityMsg::Nullable => Nullability::Nullable,
        NullabilityMsg::Required => Nullability::Required,
    }
}

fn precision(digits: i32) -> Result<TimePrecision> {
    TimePrecision::from_digits(digits)
        .ok_or_else(|| PlanError::decode(format!("invalid time precision {digits}")))
}

fn decimal_params(precision: i32, scale: i32) -> Result<(u8, u8)> {
    if !(1..=38).contains(&precision) || !(0..=precision).contains(&scale) {
        return Err(PlanError::decode(format!(
            "invalid decimal precision {precision} and scale {scale}"
        )));
    }
    Ok((precision as u8, scale as u8))
}

fn named_struct(msg: &NamedStructMsg) -> Result<NamedStruct> {
    let types = msg.r#struct.types.iter().map(ty).collect::<Result<Vec<_>>>()?;
    Ok(NamedStruct {
        names: msg.names.clone(),
        r#struct: StructType {
            types,
            nullability: nullability(msg.r#struct.nullability),
        },
    })
}

fn ty(msg: &TypeMsg) -> Result<Type> {
    let plain = |kind: TypeKind, params: &TypeParamsMsg| -> Result<Type> {
        Ok(Type::new(kind, nullability(params.nullability)))
    };
    match msg {
        TypeMsg::Bool(p) => plain(TypeKind::Boolean, p),
        TypeMsg::I8(p) => plain(TypeKind::I8, p),
        TypeMsg::I16(p) => plain(TypeKind::I16, p),
        TypeMsg::I32(p) => plain(TypeKind::I32, p),
        TypeMsg::I64(p) => plain(TypeKind::I64, p),
        TypeMsg::Fp32(p) => plain(TypeKind::Fp32, p),
        TypeMsg::Fp64(p) => plain(TypeKind::Fp64, p),
        TypeMsg::String(p) => plain(TypeKind::String, p),
        TypeMsg::Binary(p) => plain(TypeKind::Binary, p),
        TypeMsg::Timestamp(p) => plain(TypeKind::Timestamp, p),
        TypeMsg::TimestampTz(p) => plain(TypeKind::TimestampTz, p),
        TypeMsg::Date(p) => plain(TypeKind::Date, p),
        TypeMsg::Time(p) => plain(TypeKind::Time, p),
        TypeMsg::IntervalYear(p) => plain(TypeKind::IntervalYear, p),
        TypeMsg::Uuid(p) => plain(TypeKind::Uuid, p),
        TypeMsg::IntervalDay(p) => Ok(Type::new(
            TypeKind::IntervalDay {
                precision: precision(p.precision)?,
            },
            nullability(p.nullability),
        )),
        TypeMsg::FixedChar(p) => Ok(Type::new(
            TypeKind::FixedChar { length: p.length },
            nullability(p.nullability),
        )),
        TypeMsg::Varchar(p) => Ok(Type::new(
            TypeKind::VarChar { length: p.length },
            nullability(p.nullability),
        )),
        TypeMsg::FixedBinary(p) => Ok(Type::new(
            TypeKind::FixedBinary { length: p.length },
            nullability(p.nullability),
        )),
        TypeMsg::Decimal(p) => {
            let (precision, scale) = decimal_params(p.precision, p.scale)?;
            Ok(Type::new(
                TypeKind::Decimal { precision, scale },
                nullability(p.nullability),
            ))
        }
        TypeMsg::PrecisionTimestamp(p) => Ok(Type::new(
            TypeKind::PrecisionTimestamp {
                precision: precision(p.precision)?,
            },
            nullability(p.nullability),
        )),
        TypeMsg::PrecisionTimestampTz(p) => Ok(Type::new(
            TypeKind::PrecisionTimestampTz {
                precision: precision(p.precision)?,
            },
            nullability(p.nullability),
        )),
    }
}

fn sixteen_bytes(bytes: &[u8], what: &str) -> Result<[u8; 16]> {
    bytes.try_into().map_err(|_| {
        PlanError::decode(format!("{what} must be 16 bytes, got {}", bytes.len()))
    })
}

fn narrow<T: TryFrom<i32>>(value: i32, what: &str) -> Result<T> {
    T::try_from(value).map_err(|_| PlanError::decode(format!("{what} literal {value} out of range")))
}

fn literal(msg: &LiteralMsg) -> Result<Literal> {
    let value = match &msg.value {
        LiteralKindMsg::Boolean(v) => LiteralValue::Boolean(*v),
        LiteralKindMsg::I8(v) => LiteralValue::I8(narrow(*v, "i8")?),
        LiteralKindMsg::I16(v) => LiteralValue::I16(narrow(*v, "i16")?),
        LiteralKindMsg::I32(v) => LiteralValue::I32(*v),
        LiteralKindMsg::I64(v) => LiteralValue::I64(*v),
        LiteralKindMsg::Fp32(v) => LiteralValue::Fp32(*v),
        LiteralKindMsg::Fp64(v) => LiteralValue::Fp64(*v),
        LiteralKindMsg::String(v) => LiteralValue::String(v.clone()),
        LiteralKindMsg::Binary(v) => LiteralValue::Binary(v.clone()),
        LiteralKindMsg::Timestamp(v) => LiteralValue::Timestamp(*v),
        LiteralKindMsg::TimestampTz(v) => LiteralValue::TimestampTz(*v),
        LiteralKindMsg::Date(v) => LiteralValue::Date(*v),
        LiteralKindMsg::Time(v) => LiteralValue::Time(*v),
        LiteralKindMsg::IntervalYearToMonth(v) => LiteralValue::IntervalYearToMonth {
            years: v.years,
            months: v.months,
        },
        LiteralKindMsg::IntervalDayToSecond(v) => LiteralValue::IntervalDayToSecond {
            days: v.days,
            seconds: v.seconds,
            subseconds: v.subseconds,
            precision: precision(v.precision)?,
        },
        LiteralKindMsg::FixedChar(v) => LiteralValue::FixedChar(v.clone()),
        LiteralKindMsg::VarChar(v) => LiteralValue::VarChar {
            value: v.value.clone(),
            length: v.length,
        },
        LiteralKindMsg::FixedBinary(v) => LiteralValue::FixedBinary(v.clone()),
        LiteralKindMsg::Decimal(v) => {
            let (precision, scale) = decimal_params(v.precision, v.scale)?;
            LiteralValue::Decimal {
                value: sixteen_bytes(&v.value, "decimal value")?,
                precision,
                scale,
            }
        }
        LiteralKindMsg::PrecisionTimestamp(v) => LiteralValue::PrecisionTimestamp {
            precision: precision(v.precision)?,
            value: v.value,
        },
        LiteralKindMsg::PrecisionTimestampTz(v) => LiteralValue::PrecisionTimestampTz {
            precision: precision(v.precision)?,
            value: v.value,
        },
        LiteralKindMsg::Null(null_ty) => LiteralValue::Null(ty(null_ty)?),
        LiteralKindMsg::Uuid(v) => LiteralValue::Uuid(sixteen_bytes(v, "uuid")?),
    };
    Ok(Literal::with_nullable(value, msg.nullable))
}
