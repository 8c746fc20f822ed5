//! Relation tree nodes.
//!
//! A [`Relation`] is an immutable node: an operator ([`RelOp`]), an optional
//! output remap ([`Emit`]) and the natural record type computed when the node
//! was built. Nodes are only produced by validated constructors, so every
//! reachable `Relation` satisfies its operator's invariants.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::error::{PlanError, Result, EMIT_OUT_OF_RANGE, NIL_CONDITION};
use crate::expr::Expression;
use crate::extensions::FunctionRef;
use crate::plan::schema;
use crate::types::{NamedStruct, RecordType, Type};

/// Join semantics.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum JoinType {
    /// Sentinel; never valid on a built join.
    #[default]
    Unspecified,
    /// Matching pairs only.
    Inner,
    /// Full outer join.
    Outer,
    /// Left outer join.
    Left,
    /// Right outer join.
    Right,
    /// Left rows with at least one match.
    Semi,
    /// Left rows without a match.
    Anti,
    /// Left outer join with at most one match per left row.
    Single,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Unspecified => "unspecified",
            JoinType::Inner => "inner",
            JoinType::Outer => "outer",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Semi => "semi",
            JoinType::Anti => "anti",
            JoinType::Single => "single",
        };
        f.write_str(name)
    }
}

/// Output remap: indices into the natural output, in emitted order.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Emit {
    mapping: SmallVec<[u32; 8]>,
}

impl Emit {
    /// Checks every index against `[0, field_count)`.
    pub(crate) fn validate(mapping: &[i32], field_count: usize) -> Result<Self> {
        let mut checked = SmallVec::with_capacity(mapping.len());
        for &idx in mapping {
            if idx < 0 || idx as usize >= field_count {
                return Err(PlanError::invalid_rel(format!(
                    "{EMIT_OUT_OF_RANGE} [{idx}] for {field_count} fields"
                )));
            }
            checked.push(idx as u32);
        }
        Ok(Self { mapping: checked })
    }

    /// Indices into the natural output.
    pub fn mapping(&self) -> &[u32] {
        &self.mapping
    }

    /// Projects `record` through the mapping.
    pub fn apply(&self, record: &RecordType) -> RecordType {
        self.mapping
            .iter()
            .filter_map(|&idx| record.field(idx as usize).cloned())
            .collect()
    }
}

/// Execution phase of an aggregate call.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum AggregationPhase {
    #[default]
    Unspecified,
    InitialToIntermediate,
    IntermediateToIntermediate,
    InitialToResult,
    IntermediateToResult,
}

/// Whether an aggregate consumes all or only distinct values.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum AggregationInvocation {
    #[default]
    Unspecified,
    All,
    Distinct,
}

/// Bound aggregate function call.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateCall {
    pub(crate) function: FunctionRef,
    pub(crate) args: Vec<Expression>,
    pub(crate) output_type: Type,
    pub(crate) phase: AggregationPhase,
    pub(crate) invocation: AggregationInvocation,
}

impl AggregateCall {
    /// Bound extension function.
    pub fn function(&self) -> &FunctionRef {
        &self.function
    }

    /// Arguments over the aggregate input.
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Declared result type.
    pub fn output_type(&self) -> &Type {
        &self.output_type
    }

    /// Aggregation phase.
    pub fn phase(&self) -> AggregationPhase {
        self.phase
    }

    /// All or distinct invocation.
    pub fn invocation(&self) -> AggregationInvocation {
        self.invocation
    }
}

/// Aggregate measure: a call plus an optional row filter.
#[derive(Clone, Debug, PartialEq)]
pub struct AggRelMeasure {
    pub(crate) measure: AggregateCall,
    pub(crate) filter: Option<Expression>,
}

impl AggRelMeasure {
    /// The aggregate call.
    pub fn measure(&self) -> &AggregateCall {
        &self.measure
    }

    /// Rows not matching the filter are skipped by this measure.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }
}

/// One grouping set.
#[derive(Clone, Debug, PartialEq)]
pub struct Grouping {
    pub(crate) expressions: Vec<Expression>,
}

impl Grouping {
    /// Expressions of this grouping set.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }
}

/// Scan of a named table.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadRel {
    pub(crate) table: Vec<String>,
    pub(crate) base_schema: NamedStruct,
}

impl ReadRel {
    /// Qualified table name parts.
    pub fn table(&self) -> &[String] {
        &self.table
    }

    /// Declared schema of the table.
    pub fn base_schema(&self) -> &NamedStruct {
        &self.base_schema
    }
}

/// Row filter.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRel {
    pub(crate) input: Arc<Relation>,
    pub(crate) condition: Expression,
}

impl FilterRel {
    /// Filtered input.
    pub fn input(&self) -> &Relation {
        &self.input
    }

    /// Boolean predicate over the input columns.
    pub fn condition(&self) -> &Expression {
        &self.condition
    }
}

/// Offset/limit.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRel {
    pub(crate) input: Arc<Relation>,
    pub(crate) offset: i64,
    pub(crate) count: i64,
}

impl FetchRel {
    /// Limited input.
    pub fn input(&self) -> &Relation {
        &self.input
    }

    /// Rows skipped before the first emitted row.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Maximum number of rows emitted.
    pub fn count(&self) -> i64 {
        self.count
    }
}

/// Grouped aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRel {
    pub(crate) input: Arc<Relation>,
    pub(crate) groupings: Vec<Grouping>,
    pub(crate) measures: Vec<AggRelMeasure>,
}

impl AggregateRel {
    /// Aggregated input.
    pub fn input(&self) -> &Relation {
        &self.input
    }

    /// Grouping sets, in declaration order.
    pub fn groupings(&self) -> &[Grouping] {
        &self.groupings
    }

    /// Measures, in declaration order.
    pub fn measures(&self) -> &[AggRelMeasure] {
        &self.measures
    }
}

/// Cartesian product.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossRel {
    pub(crate) left: Arc<Relation>,
    pub(crate) right: Arc<Relation>,
}

impl CrossRel {
    /// Left input.
    pub fn left(&self) -> &Relation {
        &self.left
    }

    /// Right input.
    pub fn right(&self) -> &Relation {
        &self.right
    }
}

/// Conditional join.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinRel {
    pub(crate) left: Arc<Relation>,
    pub(crate) right: Arc<Relation>,
    pub(crate) condition: Expression,
    pub(crate) post_join_filter: Option<Expression>,
    pub(crate) join_type: JoinType,
}

impl JoinRel {
    /// Left input.
    pub fn left(&self) -> &Relation {
        &self.left
    }

    /// Right input.
    pub fn right(&self) -> &Relation {
        &self.right
    }

    /// Join condition over the concatenated left and right columns.
    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    /// Filter applied to joined rows, if any.
    pub fn post_join_filter(&self) -> Option<&Expression> {
        self.post_join_filter.as_ref()
    }

    /// Join semantics.
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }
}

/// Relational operator at a node.
#[derive(Clone, Debug, PartialEq)]
pub enum RelOp {
    /// Leaf scan.
    Read(ReadRel),
    /// Unary filter.
    Filter(FilterRel),
    /// Unary offset/limit.
    Fetch(FetchRel),
    /// Unary aggregation.
    Aggregate(AggregateRel),
    /// Binary product.
    Cross(CrossRel),
    /// Binary join.
    Join(JoinRel),
}

impl RelOp {
    /// Operator name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RelOp::Read(_) => "Read",
            RelOp::Filter(_) => "Filter",
            RelOp::Fetch(_) => "Fetch",
            RelOp::Aggregate(_) => "Aggregate",
            RelOp::Cross(_) => "Cross",
            RelOp::Join(_) => "Join",
        }
    }
}

/// Immutable relation node.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    op: RelOp,
    emit: Option<Emit>,
    direct: RecordType,
}

impl Relation {
    /// Wraps a scan; reads without a remap cannot fail.
    pub(crate) fn read(read: ReadRel) -> Self {
        let direct = read.base_schema.record_type();
        Self {
            op: RelOp::Read(read),
            emit: None,
            direct,
        }
    }

    /// Validates `op`, computes its natural output and attaches the remap.
    ///
    /// Operator-specific checks (conditions, groupings) run here so the
    /// builder and the decoder share them.
    pub(crate) fn build(op: RelOp, remap: Option<&[i32]>) -> Result<Self> {
        validate_op(&op)?;
        let direct = schema::direct_output_schema(&op)?;
        let emit = remap
            .map(|mapping| Emit::validate(mapping, direct.len()))
            .transpose()?;
        trace!(op = op.name(), fields = direct.len(), remapped = emit.is_some(), "built relation");
        Ok(Self { op, emit, direct })
    }

    /// Operator at this node.
    pub fn op(&self) -> &RelOp {
        &self.op
    }

    /// Output remap, if any.
    pub fn emit(&self) -> Option<&Emit> {
        self.emit.as_ref()
    }

    /// Natural output before the remap.
    pub fn direct_output_schema(&self) -> &RecordType {
        &self.direct
    }

    /// Visible output: the natural output projected through the remap.
    pub fn record_type(&self) -> RecordType {
        match &self.emit {
            Some(emit) => emit.apply(&self.direct),
            None => self.direct.clone(),
        }
    }

    /// Direct inputs, left to right.
    pub fn inputs(&self) -> Vec<&Relation> {
        match &self.op {
            RelOp::Read(_) => Vec::new(),
            RelOp::Filter(rel) => vec![rel.input.as_ref()],
            RelOp::Fetch(rel) => vec![rel.input.as_ref()],
            RelOp::Aggregate(rel) => vec![rel.input.as_ref()],
            RelOp::Cross(rel) => vec![rel.left.as_ref(), rel.right.as_ref()],
            RelOp::Join(rel) => vec![rel.left.as_ref(), rel.right.as_ref()],
        }
    }

    /// Visits every extension function referenced in this subtree.
    pub(crate) fn for_each_function<'a>(&'a self, visit: &mut dyn FnMut(&'a FunctionRef)) {
        match &self.op {
            RelOp::Read(_) | RelOp::Fetch(_) | RelOp::Cross(_) => {}
            RelOp::Filter(rel) => rel.condition.for_each_function(visit),
            RelOp::Aggregate(rel) => {
                for grouping in &rel.groupings {
                    for expr in &grouping.expressions {
                        expr.for_each_function(visit);
                    }
                }
                for measure in &rel.measures {
                    visit(&measure.measure.function);
                    for arg in &measure.measure.args {
                        arg.for_each_function(visit);
                    }
                    if let Some(filter) = &measure.filter {
                        filter.for_each_function(visit);
                    }
                }
            }
            RelOp::Join(rel) => {
                rel.condition.for_each_function(visit);
                if let Some(filter) = &rel.post_join_filter {
                    filter.for_each_function(visit);
                }
            }
        }
        for input in self.inputs() {
            input.for_each_function(visit);
        }
    }
}

fn validate_op(op: &RelOp) -> Result<()> {
    match op {
        RelOp::Read(_) | RelOp::Fetch(_) | RelOp::Cross(_) => Ok(()),
        RelOp::Filter(rel) => {
            rel.condition.check_scope(&rel.input.record_type())?;
            let ty = rel.condition.ty();
            if !ty.is_boolean() {
                return Err(PlanError::invalid_arg(format!(
                    "condition for Filter Relation must yield boolean, not {}",
                    ty.short_name()
                )));
            }
            Ok(())
        }
        RelOp::Join(rel) => {
            let joined = rel.left.record_type().concat(&rel.right.record_type());
            rel.condition.check_scope(&joined)?;
            let ty = rel.condition.ty();
            if !ty.is_boolean() {
                return Err(PlanError::invalid_arg(format!(
                    "condition for Join Relation must yield boolean, not {}",
                    ty.short_name()
                )));
            }
            if let Some(filter) = &rel.post_join_filter {
                filter.check_scope(&joined)?;
                let ty = filter.ty();
                if !ty.is_boolean() {
                    return Err(PlanError::invalid_arg(format!(
                        "post join filter must be either absent or yield a boolean, not {}",
                        ty.short_name()
                    )));
                }
            }
            if rel.join_type == JoinType::Unspecified {
                return Err(PlanError::invalid_arg(
                    "join type must not be unspecified for Join relations",
                ));
            }
            Ok(())
        }
        RelOp::Aggregate(rel) => {
            if rel.groupings.is_empty() && rel.measures.is_empty() {
                return Err(PlanError::invalid_rel(
                    "aggregate relation must have at least one grouping expression or measure",
                ));
            }
            if rel.groupings.iter().any(|g| g.expressions.is_empty()) {
                return Err(PlanError::invalid_rel(
                    "groupings cannot contain empty expression list or absent expression",
                ));
            }
            let record = rel.input.record_type();
            for expr in rel.groupings.iter().flat_map(|g| &g.expressions) {
                expr.check_scope(&record)?;
            }
            for measure in &rel.measures {
                for arg in &measure.measure.args {
                    arg.check_scope(&record)?;
                }
                if let Some(filter) = &measure.filter {
                    filter.check_scope(&record)?;
                }
                check_measure_filter(measure.filter.as_ref())?;
            }
            Ok(())
        }
    }
}

pub(crate) fn check_measure_filter(filter: Option<&Expression>) -> Result<()> {
    match filter.map(Expression::ty) {
        Some(ty) if !ty.is_boolean() => Err(PlanError::invalid_arg(format!(
            "measure filter must be either absent or yield a boolean, not {}",
            ty.short_name()
        ))),
        _ => Ok(()),
    }
}

/// Unwraps a required condition.
pub(crate) fn require_condition(condition: Option<Expression>) -> Result<Expression> {
    condition.ok_or_else(|| PlanError::invalid_rel(NIL_CONDITION))
}
