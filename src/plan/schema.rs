//! Natural output record types per operator.
//!
//! Every operator's output is derived from its inputs' *visible* record
//! types. Joins apply the nullability matrix in [`join_record_type`].

use crate::error::{PlanError, Result};
use crate::plan::relation::{AggRelMeasure, Grouping, JoinType, RelOp};
use crate::types::{Field, RecordType};

/// Computes the output of `op` before any remap.
pub(crate) fn direct_output_schema(op: &RelOp) -> Result<RecordType> {
    match op {
        RelOp::Read(read) => Ok(read.base_schema.record_type()),
        RelOp::Filter(filter) => Ok(filter.input.record_type()),
        RelOp::Fetch(fetch) => Ok(fetch.input.record_type()),
        RelOp::Cross(cross) => Ok(cross.left.record_type().concat(&cross.right.record_type())),
        RelOp::Join(join) => join_record_type(
            &join.left.record_type(),
            &join.right.record_type(),
            join.join_type,
        ),
        RelOp::Aggregate(agg) => Ok(aggregate_record_type(
            &agg.input.record_type(),
            &agg.groupings,
            &agg.measures,
        )),
    }
}

/// Output of joining `left` and `right` with `join_type`.
///
/// | type   | columns       | left     | right    |
/// |--------|---------------|----------|----------|
/// | inner  | left ++ right | as is    | as is    |
/// | left   | left ++ right | as is    | nullable |
/// | right  | left ++ right | nullable | as is    |
/// | outer  | left ++ right | nullable | nullable |
/// | single | left ++ right | as is    | nullable |
/// | semi   | left          | as is    |          |
/// | anti   | left          | as is    |          |
pub fn join_record_type(
    left: &RecordType,
    right: &RecordType,
    join_type: JoinType,
) -> Result<RecordType> {
    match join_type {
        JoinType::Inner => Ok(left.concat(right)),
        JoinType::Left | JoinType::Single => Ok(left.concat(&right.as_nullable())),
        JoinType::Right => Ok(left.as_nullable().concat(right)),
        JoinType::Outer => Ok(left.as_nullable().concat(&right.as_nullable())),
        JoinType::Semi | JoinType::Anti => Ok(left.clone()),
        JoinType::Unspecified => Err(PlanError::invalid_arg(
            "join type must not be unspecified for Join relations",
        )),
    }
}

/// Grouping expressions across all sets, then one column per measure.
fn aggregate_record_type(
    input: &RecordType,
    groupings: &[Grouping],
    measures: &[AggRelMeasure],
) -> RecordType {
    let mut fields = Vec::new();
    for expr in groupings.iter().flat_map(|g| g.expressions.iter()) {
        let name = expr
            .as_field_ref()
            .and_then(|field| input.field(field.field() as usize))
            .map(|field| field.name.clone())
            .unwrap_or_else(|| format!("expr{}", fields.len()));
        fields.push(Field::new(name, expr.ty()));
    }
    for measure in measures {
        fields.push(Field::new(
            measure.measure.function.name(),
            measure.measure.output_type.clone(),
        ));
    }
    RecordType::new(fields)
}
