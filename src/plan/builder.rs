//! Validated construction of relations, expressions and plans.
//!
//! A [`Builder`] owns the extension anchor registry of one plan-building
//! session. Every method either returns a fully valid value or a
//! [`PlanError`]; nothing is half-built.
//!
//! Inputs and conditions are taken as `impl Into<Option<_>>` so callers can
//! pass `None` where a value is missing and get the matching error back.

use std::sync::Arc;

use tracing::debug;

use crate::error::{PlanError, Result, NIL_INPUT};
use crate::expr::{Expression, FieldReference, ScalarCall};
use crate::extensions::{
    ExtensionCollection, ExtensionRegistry, ExtensionTable, FunctionCatalog, FunctionDecl,
    FunctionKind, FunctionRef,
};
use crate::plan::relation::{
    check_measure_filter, require_condition, AggRelMeasure, AggregateCall, AggregateRel,
    AggregationInvocation, AggregationPhase, CrossRel, FetchRel, FilterRel, Grouping, JoinRel,
    JoinType, ReadRel, RelOp, Relation,
};
use crate::plan::{Plan, Root, Version};
use crate::types::{NamedStruct, Type};

/// Builder configuration.
#[derive(Clone)]
pub struct BuilderOptions {
    /// Version stamped on every plan.
    pub version: Version,
    /// Declarations used to type function calls.
    pub catalog: Arc<dyn FunctionCatalog + Send + Sync>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            version: Version::default(),
            catalog: Arc::new(ExtensionCollection::standard()),
        }
    }
}

impl std::fmt::Debug for BuilderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderOptions")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Plan-building session.
#[derive(Debug, Default)]
pub struct Builder {
    options: BuilderOptions,
    registry: ExtensionRegistry,
}

fn require_input(input: Option<Relation>) -> Result<Arc<Relation>> {
    input
        .map(Arc::new)
        .ok_or_else(|| PlanError::invalid_rel(NIL_INPUT))
}

impl Builder {
    /// Creates a builder with the given options and a fresh registry.
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            options,
            registry: ExtensionRegistry::new(),
        }
    }

    /// Options this builder was created with.
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Anchor registry of this session.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Scan of the table `table` with the declared schema.
    pub fn named_scan<I, S>(&self, table: I, schema: NamedStruct) -> Relation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Relation::read(ReadRel {
            table: table.into_iter().map(Into::into).collect(),
            base_schema: schema,
        })
    }

    /// [`Builder::named_scan`] with an output remap.
    pub fn named_scan_remap<I, S>(
        &self,
        table: I,
        schema: NamedStruct,
        remap: &[i32],
    ) -> Result<Relation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let read = ReadRel {
            table: table.into_iter().map(Into::into).collect(),
            base_schema: schema,
        };
        Relation::build(RelOp::Read(read), Some(remap))
    }

    /// Keeps rows for which `condition` holds.
    pub fn filter(
        &self,
        input: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
    ) -> Result<Relation> {
        self.filter_inner(input.into(), condition.into(), None)
    }

    /// [`Builder::filter`] with an output remap.
    pub fn filter_remap(
        &self,
        input: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
        remap: &[i32],
    ) -> Result<Relation> {
        self.filter_inner(input.into(), condition.into(), Some(remap))
    }

    fn filter_inner(
        &self,
        input: Option<Relation>,
        condition: Option<Expression>,
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let input = require_input(input)?;
        let condition = require_condition(condition)?;
        Relation::build(RelOp::Filter(FilterRel { input, condition }), remap)
    }

    /// Skips `offset` rows, then keeps at most `count`.
    pub fn fetch(
        &self,
        input: impl Into<Option<Relation>>,
        offset: i64,
        count: i64,
    ) -> Result<Relation> {
        self.fetch_inner(input.into(), offset, count, None)
    }

    /// [`Builder::fetch`] with an output remap.
    pub fn fetch_remap(
        &self,
        input: impl Into<Option<Relation>>,
        offset: i64,
        count: i64,
        remap: &[i32],
    ) -> Result<Relation> {
        self.fetch_inner(input.into(), offset, count, Some(remap))
    }

    fn fetch_inner(
        &self,
        input: Option<Relation>,
        offset: i64,
        count: i64,
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let input = require_input(input)?;
        Relation::build(
            RelOp::Fetch(FetchRel {
                input,
                offset,
                count,
            }),
            remap,
        )
    }

    /// Cartesian product of `left` and `right`.
    pub fn cross(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
    ) -> Result<Relation> {
        self.cross_inner(left.into(), right.into(), None)
    }

    /// [`Builder::cross`] with an output remap.
    pub fn cross_remap(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
        remap: &[i32],
    ) -> Result<Relation> {
        self.cross_inner(left.into(), right.into(), Some(remap))
    }

    fn cross_inner(
        &self,
        left: Option<Relation>,
        right: Option<Relation>,
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let left = require_input(left)?;
        let right = require_input(right)?;
        Relation::build(RelOp::Cross(CrossRel { left, right }), remap)
    }

    /// Joins `left` and `right` on `condition`.
    ///
    /// The condition addresses the concatenated columns, see
    /// [`Builder::joined_record_field_ref`].
    pub fn join(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
        join_type: JoinType,
    ) -> Result<Relation> {
        self.join_inner(left.into(), right.into(), condition.into(), None, join_type, None)
    }

    /// [`Builder::join`] with an output remap.
    pub fn join_remap(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
        join_type: JoinType,
        remap: &[i32],
    ) -> Result<Relation> {
        self.join_inner(
            left.into(),
            right.into(),
            condition.into(),
            None,
            join_type,
            Some(remap),
        )
    }

    /// [`Builder::join`] with a filter applied to the joined rows.
    pub fn join_and_filter(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
        post_join_filter: impl Into<Option<Expression>>,
        join_type: JoinType,
    ) -> Result<Relation> {
        self.join_inner(
            left.into(),
            right.into(),
            condition.into(),
            post_join_filter.into(),
            join_type,
            None,
        )
    }

    /// [`Builder::join_and_filter`] with an output remap.
    pub fn join_and_filter_remap(
        &self,
        left: impl Into<Option<Relation>>,
        right: impl Into<Option<Relation>>,
        condition: impl Into<Option<Expression>>,
        post_join_filter: impl Into<Option<Expression>>,
        join_type: JoinType,
        remap: &[i32],
    ) -> Result<Relation> {
        self.join_inner(
            left.into(),
            right.into(),
            condition.into(),
            post_join_filter.into(),
            join_type,
            Some(remap),
        )
    }

    fn join_inner(
        &self,
        left: Option<Relation>,
        right: Option<Relation>,
        condition: Option<Expression>,
        post_join_filter: Option<Expression>,
        join_type: JoinType,
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let left = require_input(left)?;
        let right = require_input(right)?;
        let condition = require_condition(condition)?;
        Relation::build(
            RelOp::Join(JoinRel {
                left,
                right,
                condition,
                post_join_filter,
                join_type,
            }),
            remap,
        )
    }

    /// Aggregates `input` grouped by the given input columns.
    ///
    /// An empty column list means no grouping set; `measures` must then be
    /// non-empty.
    pub fn aggregate_columns(
        &self,
        input: impl Into<Option<Relation>>,
        measures: Vec<AggRelMeasure>,
        columns: &[i32],
    ) -> Result<Relation> {
        self.aggregate_columns_inner(input.into(), measures, columns, None)
    }

    /// [`Builder::aggregate_columns`] with an output remap.
    pub fn aggregate_columns_remap(
        &self,
        input: impl Into<Option<Relation>>,
        measures: Vec<AggRelMeasure>,
        columns: &[i32],
        remap: &[i32],
    ) -> Result<Relation> {
        self.aggregate_columns_inner(input.into(), measures, columns, Some(remap))
    }

    fn aggregate_columns_inner(
        &self,
        input: Option<Relation>,
        measures: Vec<AggRelMeasure>,
        columns: &[i32],
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let input = require_input(input)?;
        let record = input.record_type();
        let expressions = columns
            .iter()
            .map(|&idx| FieldReference::resolve(&record, idx).map(Expression::from))
            .collect::<Result<Vec<_>>>()?;
        let groupings = if expressions.is_empty() {
            Vec::new()
        } else {
            vec![Grouping { expressions }]
        };
        Relation::build(
            RelOp::Aggregate(AggregateRel {
                input,
                groupings,
                measures,
            }),
            remap,
        )
    }

    /// Aggregates `input` over explicit grouping sets.
    ///
    /// Each inner list is one grouping set; `None` entries are rejected.
    pub fn aggregate_exprs<G, E, X>(
        &self,
        input: impl Into<Option<Relation>>,
        measures: Vec<AggRelMeasure>,
        groups: G,
    ) -> Result<Relation>
    where
        G: IntoIterator<Item = E>,
        E: IntoIterator<Item = X>,
        X: Into<Option<Expression>>,
    {
        self.aggregate_exprs_inner(input.into(), measures, collect_groups(groups), None)
    }

    /// [`Builder::aggregate_exprs`] with an output remap.
    pub fn aggregate_exprs_remap<G, E, X>(
        &self,
        input: impl Into<Option<Relation>>,
        measures: Vec<AggRelMeasure>,
        groups: G,
        remap: &[i32],
    ) -> Result<Relation>
    where
        G: IntoIterator<Item = E>,
        E: IntoIterator<Item = X>,
        X: Into<Option<Expression>>,
    {
        self.aggregate_exprs_inner(input.into(), measures, collect_groups(groups), Some(remap))
    }

    fn aggregate_exprs_inner(
        &self,
        input: Option<Relation>,
        measures: Vec<AggRelMeasure>,
        groups: Vec<Vec<Option<Expression>>>,
        remap: Option<&[i32]>,
    ) -> Result<Relation> {
        let input = require_input(input)?;
        let groupings = groups
            .into_iter()
            .map(|set| {
                set.into_iter()
                    .collect::<Option<Vec<_>>>()
                    .map(|expressions| Grouping { expressions })
                    .ok_or_else(|| {
                        PlanError::invalid_rel(
                            "groupings cannot contain empty expression list or absent expression",
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Relation::build(
            RelOp::Aggregate(AggregateRel {
                input,
                groupings,
                measures,
            }),
            remap,
        )
    }

    /// Reference to column `index` of `rel`'s visible output.
    pub fn root_field_ref(&self, rel: &Relation, index: i32) -> Result<Expression> {
        FieldReference::resolve(&rel.record_type(), index).map(Expression::from)
    }

    /// Reference to column `index` of `left`'s columns followed by `right`'s.
    pub fn joined_record_field_ref(
        &self,
        left: &Relation,
        right: &Relation,
        index: i32,
    ) -> Result<Expression> {
        let joined = left.record_type().concat(&right.record_type());
        FieldReference::resolve(&joined, index).map(Expression::from)
    }

    /// Scalar call typed by the catalog.
    pub fn scalar_fn(
        &mut self,
        uri: &str,
        name: &str,
        args: Vec<Expression>,
    ) -> Result<Expression> {
        let decl = self.declaration(uri, name, FunctionKind::Scalar)?;
        let output_type = decl.returns.resolve(name, &arg_types(&args))?;
        self.scalar_fn_with_output(uri, name, args, output_type)
    }

    /// Scalar call with a caller-supplied output type.
    pub fn scalar_fn_with_output(
        &mut self,
        uri: &str,
        name: &str,
        args: Vec<Expression>,
        output_type: Type,
    ) -> Result<Expression> {
        let function = self.registry.register(uri, name);
        Ok(Expression::ScalarFunction(ScalarCall {
            function,
            args,
            output_type,
        }))
    }

    /// Aggregate call typed by the catalog, evaluated in one phase over all
    /// values.
    pub fn aggregate_fn(
        &mut self,
        uri: &str,
        name: &str,
        args: Vec<Expression>,
    ) -> Result<AggregateCall> {
        let decl = self.declaration(uri, name, FunctionKind::Aggregate)?;
        let output_type = decl.returns.resolve(name, &arg_types(&args))?;
        Ok(self.aggregate_fn_with_output(uri, name, args, output_type))
    }

    /// Aggregate call with a caller-supplied output type.
    pub fn aggregate_fn_with_output(
        &mut self,
        uri: &str,
        name: &str,
        args: Vec<Expression>,
        output_type: Type,
    ) -> AggregateCall {
        let function = self.registry.register(uri, name);
        AggregateCall {
            function,
            args,
            output_type,
            phase: AggregationPhase::InitialToResult,
            invocation: AggregationInvocation::All,
        }
    }

    /// Measure over `call`, optionally restricted by a boolean `filter`.
    pub fn measure(
        &self,
        call: AggregateCall,
        filter: impl Into<Option<Expression>>,
    ) -> Result<AggRelMeasure> {
        let filter = filter.into();
        check_measure_filter(filter.as_ref())?;
        Ok(AggRelMeasure {
            measure: call,
            filter,
        })
    }

    fn declaration(&self, uri: &str, name: &str, kind: FunctionKind) -> Result<FunctionDecl> {
        let decl = self
            .options
            .catalog
            .lookup(uri, name)
            .ok_or_else(|| PlanError::invalid_arg(format!("unknown function {uri}#{name}")))?;
        if decl.kind != kind {
            return Err(PlanError::invalid_arg(format!(
                "{} cannot be used as a {} function",
                decl.signature(),
                match kind {
                    FunctionKind::Scalar => "scalar",
                    FunctionKind::Aggregate => "aggregate",
                }
            )));
        }
        Ok(decl)
    }

    /// Single-root plan.
    pub fn plan<I, S>(&self, root: Relation, names: I) -> Result<Plan>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plan_with_roots([(root, names.into_iter().map(Into::into).collect())])
    }

    /// Plan over several roots, in order.
    pub fn plan_with_roots<I>(&self, roots: I) -> Result<Plan>
    where
        I: IntoIterator<Item = (Relation, Vec<String>)>,
    {
        let roots = roots
            .into_iter()
            .map(|(input, names)| {
                let field_count = input.record_type().len();
                if names.len() != field_count {
                    return Err(PlanError::invalid_arg(format!(
                        "number of output names ({}) does not match record type field count ({field_count})",
                        names.len()
                    )));
                }
                Ok(Root { input, names })
            })
            .collect::<Result<Vec<_>>>()?;
        if roots.is_empty() {
            return Err(PlanError::invalid_arg("plan must have at least one root"));
        }

        let mut referenced: Vec<&FunctionRef> = Vec::new();
        for root in &roots {
            root.input.for_each_function(&mut |func| referenced.push(func));
        }
        let extensions = ExtensionTable::from_refs(referenced);
        debug!(
            roots = roots.len(),
            functions = extensions.functions.len(),
            version = %self.options.version,
            "assembled plan"
        );
        Ok(Plan {
            version: self.options.version.clone(),
            extensions,
            roots,
        })
    }
}

fn arg_types(args: &[Expression]) -> Vec<Type> {
    args.iter().map(Expression::ty).collect()
}

fn collect_groups<G, E, X>(groups: G) -> Vec<Vec<Option<Expression>>>
where
    G: IntoIterator<Item = E>,
    E: IntoIterator<Item = X>,
    X: Into<Option<Expression>>,
{
    groups
        .into_iter()
        .map(|set| set.into_iter().map(Into::into).collect())
        .collect()
}
