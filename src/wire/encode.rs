//! In-memory plan to wire messages.

use crate::expr::{Expression, FieldReference, Literal, LiteralValue};
use crate::plan::relation::{
    AggRelMeasure, AggregateCall, AggregationInvocation, AggregationPhase, Emit, JoinType, RelOp,
    Relation,
};
use crate::plan::{Plan, Root, Version};
use crate::types::{NamedStruct, Nullability, Type, TypeKind};
use crate::wire::messages::*;

/// Converts `plan` into its wire message. Encoding cannot fail.
pub fn encode(plan: &Plan) -> PlanMsg {
    PlanMsg {
        version: Some(version(&plan.version)),
        extension_uris: plan
            .extensions
            .uris
            .iter()
            .map(|uri| ExtensionUriMsg {
                extension_uri_anchor: uri.anchor,
                uri: uri.uri.clone(),
            })
            .collect(),
        extensions: plan
            .extensions
            .functions
            .iter()
            .map(|func| {
                ExtensionDeclMsg::ExtensionFunction(ExtensionFunctionMsg {
                    extension_uri_reference: func.uri_anchor,
                    function_anchor: func.anchor,
                    name: func.name.clone(),
                })
            })
            .collect(),
        relations: plan.roots.iter().map(root).collect(),
    }
}

fn version(version: &Version) -> VersionMsg {
    VersionMsg {
        major_number: version.major,
        minor_number: version.minor,
        patch_number: version.patch,
        git_hash: String::new(),
        producer: version.producer.clone(),
    }
}

fn root(root: &Root) -> PlanRelMsg {
    PlanRelMsg::Root(RelRootMsg {
        input: Some(relation(&root.input)),
        names: root.names.clone(),
    })
}

fn common(emit: Option<&Emit>) -> Option<RelCommonMsg> {
    Some(match emit {
        None => RelCommonMsg {
            direct: Some(EmptyMsg {}),
            emit: None,
        },
        Some(emit) => RelCommonMsg {
            direct: None,
            emit: Some(EmitMsg {
                output_mapping: emit.mapping().iter().map(|&idx| idx as i32).collect(),
            }),
        },
    })
}

/// Converts one relation subtree.
pub fn relation(rel: &Relation) -> RelMsg {
    let common = common(rel.emit());
    match rel.op() {
        RelOp::Read(read) => RelMsg::Read(Box::new(ReadRelMsg {
            common,
            base_schema: Some(named_struct(&read.base_schema)),
            named_table: Some(NamedTableMsg {
                names: read.table.clone(),
            }),
        })),
        RelOp::Filter(filter) => RelMsg::Filter(Box::new(FilterRelMsg {
            common,
            input: Some(relation(&filter.input)),
            condition: Some(expression(&filter.condition)),
        })),
        RelOp::Fetch(fetch) => RelMsg::Fetch(Box::new(FetchRelMsg {
            common,
            input: Some(relation(&fetch.input)),
            offset: fetch.offset,
            count: fetch.count,
        })),
        RelOp::Aggregate(agg) => RelMsg::Aggregate(Box::new(AggregateRelMsg {
            common,
            input: Some(relation(&agg.input)),
            groupings: agg
                .groupings
                .iter()
                .map(|grouping| GroupingMsg {
                    grouping_expressions: grouping.expressions.iter().map(expression).collect(),
                })
                .collect(),
            measures: agg.measures.iter().map(measure).collect(),
        })),
        RelOp::Cross(cross) => RelMsg::Cross(Box::new(CrossRelMsg {
            common,
            left: Some(relation(&cross.left)),
            right: Some(relation(&cross.right)),
        })),
        RelOp::Join(join) => RelMsg::Join(Box::new(JoinRelMsg {
            common,
            left: Some(relation(&join.left)),
            right: Some(relation(&join.right)),
            expression: Some(expression(&join.condition)),
            post_join_filter: join.post_join_filter.as_ref().map(expression),
            join_type: join_type(join.join_type),
        })),
    }
}

fn join_type(join_type: JoinType) -> JoinTypeMsg {
    match join_type {
        JoinType::Unspecified => JoinTypeMsg::Unspecified,
        JoinType::Inner => JoinTypeMsg::Inner,
        JoinType::Outer => JoinTypeMsg::Outer,
        JoinType::Left => JoinTypeMsg::Left,
        JoinType::Right => JoinTypeMsg::Right,
        JoinType::Semi => JoinTypeMsg::Semi,
        JoinType::Anti => JoinTypeMsg::Anti,
        JoinType::Single => JoinTypeMsg::Single,
    }
}

fn measure(measure: &AggRelMeasure) -> MeasureMsg {
    MeasureMsg {
        measure: Some(aggregate_call(&measure.measure)),
        filter: measure.filter.as_ref().map(expression),
    }
}

fn aggregate_call(call: &AggregateCall) -> AggregateFunctionMsg {
    AggregateFunctionMsg {
        function_reference: call.function.anchor(),
        arguments: arguments(&call.args),
        output_type: Some(ty(&call.output_type)),
        phase: match call.phase {
            AggregationPhase::Unspecified => AggregationPhaseMsg::Unspecified,
            AggregationPhase::InitialToIntermediate => AggregationPhaseMsg::InitialToIntermediate,
            AggregationPhase::IntermediateToIntermediate => {
                AggregationPhaseMsg::IntermediateToIntermediate
            }
            AggregationPhase::InitialToResult => AggregationPhaseMsg::InitialToResult,
            AggregationPhase::IntermediateToResult => AggregationPhaseMsg::IntermediateToResult,
        },
        invocation: match call.invocation {
            AggregationInvocation::Unspecified => AggregationInvocationMsg::Unspecified,
            AggregationInvocation::All => AggregationInvocationMsg::All,
            AggregationInvocation::Distinct => AggregationInvocationMsg::Distinct,
        },
    }
}

fn arguments(args: &[Expression]) -> Vec<FunctionArgumentMsg> {
    args.iter()
        .map(|arg| FunctionArgumentMsg {
            value: Some(expression(arg)),
        })
        .collect()
}

/// Converts one expression tree.
pub fn expression(expr: &Expression) -> ExpressionMsg {
    match expr {
        Expression::FieldReference(field) => ExpressionMsg::Selection(Box::new(selection(field))),
        Expression::Literal(lit) => ExpressionMsg::Literal(Box::new(literal(lit))),
        Expression::ScalarFunction(call) => {
            ExpressionMsg::ScalarFunction(Box::new(ScalarFunctionMsg {
                function_reference: call.function.anchor(),
                arguments: arguments(&call.args),
                output_type: Some(ty(&call.output_type)),
            }))
        }
    }
}

fn selection(field: &FieldReference) -> FieldReferenceMsg {
    FieldReferenceMsg {
        direct_reference: Some(ReferenceSegmentMsg {
            struct_field: Some(StructFieldMsg {
                field: field.field() as i32,
                child: None,
            }),
        }),
        root_reference: Some(EmptyMsg {}),
    }
}

fn literal(lit: &Literal) -> LiteralMsg {
    let value = match lit.value() {
        LiteralValue::Boolean(v) => LiteralKindMsg::Boolean(*v),
        LiteralValue::I8(v) => LiteralKindMsg::I8(i32::from(*v)),
        LiteralValue::I16(v) => LiteralKindMsg::I16(i32::from(*v)),
        LiteralValue::I32(v) => LiteralKindMsg::I32(*v),
        LiteralValue::I64(v) => LiteralKindMsg::I64(*v),
        LiteralValue::Fp32(v) => LiteralKindMsg::Fp32(*v),
        LiteralValue::Fp64(v) => LiteralKindMsg::Fp64(*v),
        LiteralValue::String(v) => LiteralKindMsg::String(v.clone()),
        LiteralValue::Binary(v) => LiteralKindMsg::Binary(v.clone()),
        LiteralValue::Date(v) => LiteralKindMsg::Date(*v),
        LiteralValue::Time(v) => LiteralKindMsg::Time(*v),
        LiteralValue::Timestamp(v) => LiteralKindMsg::Timestamp(*v),
        LiteralValue::TimestampTz(v) => LiteralKindMsg::TimestampTz(*v),
        LiteralValue::IntervalYearToMonth { years, months } => {
            LiteralKindMsg::IntervalYearToMonth(IntervalYearToMonthMsg {
                years: *years,
                months: *months,
            })
        }
        LiteralValue::IntervalDayToSecond {
            days,
            seconds,
            subseconds,
            precision,
        } => LiteralKindMsg::IntervalDayToSecond(IntervalDayToSecondMsg {
            days: *days,
            seconds: *seconds,
            subseconds: *subseconds,
            precision: precision.digits(),
        }),
        LiteralValue::Uuid(v) => LiteralKindMsg::Uuid(v.to_vec()),
        LiteralValue::FixedChar(v) => LiteralKindMsg::FixedChar(v.clone()),
        LiteralValue::VarChar { value, length } => LiteralKindMsg::VarChar(VarCharMsg {
            value: value.clone(),
            length: *length,
        }),
        LiteralValue::FixedBinary(v) => LiteralKindMsg::FixedBinary(v.clone()),
        LiteralValue::Decimal {
            value,
            precision,
            scale,
        } => LiteralKindMsg::Decimal(DecimalMsg {
            value: value.to_vec(),
            precision: i32::from(*precision),
            scale: i32::from(*scale),
        }),
        LiteralValue::PrecisionTimestamp { precision, value } => {
            LiteralKindMsg::PrecisionTimestamp(PrecisionTimestampMsg {
                precision: precision.digits(),
                value: *value,
            })
        }
        LiteralValue::PrecisionTimestampTz { precision, value } => {
            LiteralKindMsg::PrecisionTimestampTz(PrecisionTimestampMsg {
                precision: precision.digits(),
                value: *value,
            })
        }
        LiteralValue::Null(null_ty) => LiteralKindMsg::Null(ty(null_ty)),
    };
    LiteralMsg {
        nullable: lit.is_nullable(),
        value,
    }
}

fn named_struct(schema: &NamedStruct) -> NamedStructMsg {
    NamedStructMsg {
        names: schema.names.clone(),
        r#struct: StructMsg {
            types: schema.r#struct.types.iter().map(ty).collect(),
            nullability: nullability(schema.r#struct.nullability),
        },
    }
}

fn nullability(nullability: Nullability) -> NullabilityMsg {
    match nullability {
        Nullability::Unspecified => NullabilityMsg::Unspecified,
        Nullability::Nullable => NullabilityMsg::Nullable,
        Nullability::Required => NullabilityMsg::Required,
    }
}

/// Converts a column type.
pub fn ty(ty: &Type) -> TypeMsg {
    let n = nullability(ty.nullability);
    let plain = TypeParamsMsg { nullability: n };
    match &ty.kind {
        TypeKind::Boolean => TypeMsg::Bool(plain),
        TypeKind::I8 => TypeMsg::I8(plain),
        TypeKind::I16 => TypeMsg::I16(plain),
        TypeKind::I32 => TypeMsg::I32(plain),
        TypeKind::I64 => TypeMsg::I64(plain),
        TypeKind::Fp32 => TypeMsg::Fp32(plain),
        TypeKind::Fp64 => TypeMsg::Fp64(plain),
        TypeKind::String => TypeMsg::String(plain),
        TypeKind::Binary => TypeMsg::Binary(plain),
        TypeKind::Timestamp => TypeMsg::Timestamp(plain),
        TypeKind::TimestampTz => TypeMsg::TimestampTz(plain),
        TypeKind::Date => TypeMsg::Date(plain),
        TypeKind::Time => TypeMsg::Time(plain),
        TypeKind::IntervalYear => TypeMsg::IntervalYear(plain),
        TypeKind::Uuid => TypeMsg::Uuid(plain),
        TypeKind::IntervalDay { precision } => TypeMsg::IntervalDay(PrecisionTypeMsg {
            precision: precision.digits(),
            nullability: n,
        }),
        TypeKind::FixedChar { length } => TypeMsg::FixedChar(LengthTypeMsg {
            length: *length,
            nullability: n,
        }),
        TypeKind::VarChar { length } => TypeMsg::Varchar(LengthTypeMsg {
            length: *length,
            nullability: n,
        }),
        TypeKind::FixedBinary { length } => TypeMsg::FixedBinary(LengthTypeMsg {
            length: *length,
            nullability: n,
        }),
        TypeKind::Decimal { precision, scale } => TypeMsg::Decimal(DecimalTypeMsg {
            scale: i32::from(*scale),
            precision: i32::from(*precision),
            nullability: n,
        }),
        TypeKind::PrecisionTimestamp { precision } => {
            TypeMsg::PrecisionTimestamp(PrecisionTypeMsg {
                precision: precision.digits(),
                nullability: n,
            })
        }
        TypeKind::PrecisionTimestampTz { precision } => {
            TypeMsg::PrecisionTimestampTz(PrecisionTypeMsg {
                precision: precision.digits(),
                nullability: n,
            })
        }
    }
}
