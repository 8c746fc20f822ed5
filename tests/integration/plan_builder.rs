#![allow(missing_docs)]

use std::sync::Once;

use relplan::extensions::{ExtensionCollection, DEFAULT_URI_PREFIX};
use relplan::plan::{Builder, JoinType, Plan};
use relplan::types::{NamedStruct, StructType, Type, TypeKind};
use relplan::wire::{self, PlanMsg};
use relplan::{Expression, PlanError};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relplan=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn base_schema() -> NamedStruct {
    NamedStruct::new([
        ("a", Type::required(TypeKind::String)),
        ("b", Type::required(TypeKind::Fp32)),
    ])
}

fn base_schema2() -> NamedStruct {
    NamedStruct::new([
        ("x", Type::required(TypeKind::I32)),
        ("y", Type::required(TypeKind::Boolean)),
    ])
}

fn version_json() -> Value {
    json!({
        "majorNumber": 0,
        "minorNumber": 29,
        "patchNumber": 0,
        "producer": "relplan"
    })
}

fn required(kind: &str) -> Value {
    json!({ kind: { "nullability": "NULLABILITY_REQUIRED" } })
}

fn read_json(table: &str, names: &[&str], types: &[&str]) -> Value {
    json!({
        "read": {
            "common": {"direct": {}},
            "baseSchema": {
                "names": names,
                "struct": {
                    "types": types.iter().map(|t| required(t)).collect::<Vec<_>>(),
                    "nullability": "NULLABILITY_REQUIRED"
                }
            },
            "namedTable": {"names": [table]}
        }
    })
}

fn field_json(field: i32) -> Value {
    json!({
        "selection": {
            "rootReference": {},
            "directReference": {"structField": {"field": field}}
        }
    })
}

fn plan_json(input: Value, names: &[&str]) -> Value {
    json!({
        "version": version_json(),
        "relations": [{"root": {"input": input, "names": names}}]
    })
}

/// Checks the encoding against `expected`, then decodes `expected` and
/// checks both the model and its re-encoding.
fn check_round_trip(expected: Value, plan: &Plan) {
    let encoded = serde_json::to_value(wire::encode(plan)).expect("serialize plan");
    assert_eq!(
        encoded,
        expected,
        "expected: {}\ngot: {}",
        serde_json::to_string_pretty(&expected).unwrap_or_default(),
        serde_json::to_string_pretty(&encoded).unwrap_or_default()
    );

    let msg: PlanMsg = serde_json::from_value(expected).expect("parse expected");
    let round_trip = wire::decode(&msg, &ExtensionCollection::standard()).expect("decode");
    assert_eq!(&round_trip, plan);
    let re_encoded = serde_json::to_value(wire::encode(&round_trip)).expect("re-serialize");
    assert_eq!(re_encoded, encoded);
}

fn assert_invalid_rel(result: relplan::Result<impl std::fmt::Debug>, fragment: &str) {
    match result {
        Err(PlanError::InvalidRelation(msg)) => {
            assert!(msg.contains(fragment), "{msg:?} does not contain {fragment:?}")
        }
        other => panic!("expected invalid relation containing {fragment:?}, got {other:?}"),
    }
}

fn assert_invalid_arg(result: relplan::Result<impl std::fmt::Debug>, fragment: &str) {
    match result {
        Err(PlanError::InvalidArgument(msg)) => {
            assert!(msg.contains(fragment), "{msg:?} does not contain {fragment:?}")
        }
        other => panic!("expected invalid argument containing {fragment:?}, got {other:?}"),
    }
}

#[test]
fn basic_emit_plan() {
    init_tracing();
    let b = Builder::default();
    let root = b
        .named_scan_remap(["test"], base_schema(), &[1, 0])
        .expect("remap in range");
    let plan = b.plan(root, ["a", "b"]).expect("plan");

    let bytes = wire::to_bytes(&plan).expect("encode");
    let round_trip = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");

    assert_eq!(round_trip, plan);
    assert_eq!(
        plan.roots()[0].record_type().to_string(),
        "NSTRUCT<a: fp32, b: string>"
    );
    assert_eq!(
        round_trip.roots()[0].record_type(),
        plan.roots()[0].record_type()
    );
}

#[test]
fn empty_emit_plan() {
    let b = Builder::default();
    let root = b
        .named_scan_remap(["test"], base_schema(), &[])
        .expect("empty remap");
    let plan = b.plan(root, Vec::<String>::new()).expect("plan");
    assert_eq!(plan.roots()[0].record_type().to_string(), "NSTRUCT<>");

    let bytes = wire::to_bytes(&plan).expect("encode");
    let round_trip = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");
    assert_eq!(round_trip, plan);
}

#[test]
fn emit_out_of_range() {
    let b = Builder::default();
    assert_invalid_rel(
        b.named_scan_remap(["test"], base_schema(), &[2]),
        "output mapping index out of range",
    );
}

#[test]
fn aggregate_rel_plan() {
    init_tracing();
    let uri = format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml");
    let expected = json!({
        "version": version_json(),
        "extensionUris": [{"extensionUriAnchor": 1, "uri": uri}],
        "extensions": [{
            "extensionFunction": {
                "extensionUriReference": 1,
                "functionAnchor": 1,
                "name": "count"
            }
        }],
        "relations": [{
            "root": {
                "input": {
                    "aggregate": {
                        "common": {"direct": {}},
                        "input": read_json("test", &["a", "b"], &["string", "fp32"]),
                        "groupings": [{"groupingExpressions": [field_json(0)]}],
                        "measures": [{
                            "measure": {
                                "functionReference": 1,
                                "outputType": required("i64"),
                                "phase": "AGGREGATION_PHASE_INITIAL_TO_RESULT",
                                "invocation": "AGGREGATION_INVOCATION_ALL"
                            }
                        }]
                    }
                },
                "names": ["val", "cnt"]
            }
        }]
    });

    let mut b = Builder::default();
    let count = b.aggregate_fn(&uri, "count", Vec::new()).expect("count");
    let scan = b.named_scan(["test"], base_schema());
    let measure = b.measure(count, None).expect("measure");
    let root = b
        .aggregate_columns(scan, vec![measure], &[0])
        .expect("aggregate");

    let plan = b.plan(root, ["val", "cnt"]).expect("plan");
    assert_eq!(
        plan.roots()[0].record_type().to_string(),
        "NSTRUCT<val: string, cnt: i64>"
    );

    check_round_trip(expected, &plan);
}

#[test]
fn aggregate_without_grouping() {
    let mut b = Builder::default();
    let count = b
        .aggregate_fn(
            &format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml"),
            "count",
            Vec::new(),
        )
        .expect("count");
    let scan = b.named_scan(["test"], base_schema());
    let measure = b.measure(count, None).expect("measure");
    let root = b
        .aggregate_exprs(scan, vec![measure], Vec::<Vec<Expression>>::new())
        .expect("aggregate");

    let plan = b.plan(root, ["cnt"]).expect("plan");
    assert_eq!(plan.roots()[0].record_type().to_string(), "NSTRUCT<cnt: i64>");
}

#[test]
fn aggregate_multiple_grouping_sets() {
    let uri = format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml");
    let expected = json!({
        "version": version_json(),
        "extensionUris": [{"extensionUriAnchor": 1, "uri": uri}],
        "extensions": [{
            "extensionFunction": {
                "extensionUriReference": 1,
                "functionAnchor": 1,
                "name": "count"
            }
        }],
        "relations": [{
            "root": {
                "input": {
                    "aggregate": {
                        "common": {"direct": {}},
                        "input": read_json("test", &["x", "y"], &["i32", "bool"]),
                        "groupings": [
                            {"groupingExpressions": [field_json(0), {"literal": {"i32": 7}}]},
                            {"groupingExpressions": [field_json(1)]}
                        ],
                        "measures": [{
                            "measure": {
                                "functionReference": 1,
                                "outputType": required("i64"),
                                "phase": "AGGREGATION_PHASE_INITIAL_TO_RESULT",
                                "invocation": "AGGREGATION_INVOCATION_ALL"
                            }
                        }]
                    }
                },
                "names": ["x", "bucket", "y", "cnt"]
            }
        }]
    });

    let mut b = Builder::default();
    let count = b.aggregate_fn(&uri, "count", Vec::new()).expect("count");
    let scan = b.named_scan(["test"], base_schema2());
    let x = b.root_field_ref(&scan, 0).expect("x");
    let y = b.root_field_ref(&scan, 1).expect("y");
    let bucket = Expression::from(relplan::Literal::i32(7));
    let measure = b.measure(count, None).expect("measure");
    let root = b
        .aggregate_exprs(scan, vec![measure], vec![vec![x, bucket], vec![y]])
        .expect("aggregate");
    assert_eq!(
        root.record_type().to_string(),
        "NSTRUCT<x: i32, expr1: i32, y: boolean, count: i64>"
    );

    let plan = b.plan(root, ["x", "bucket", "y", "cnt"]).expect("plan");
    check_round_trip(expected, &plan);
}

#[test]
fn aggregate_rel_errors() {
    let b = Builder::default();
    let no_groups = Vec::<Vec<Expression>>::new;

    assert_invalid_rel(
        b.aggregate_columns(None, Vec::new(), &[]),
        "input relation must not be absent",
    );
    assert_invalid_rel(
        b.aggregate_exprs(None, Vec::new(), no_groups()),
        "input relation must not be absent",
    );

    let scan = b.named_scan(["test"], base_schema());

    assert_invalid_rel(
        b.aggregate_columns(scan.clone(), Vec::new(), &[]),
        "must have at least one grouping expression or measure",
    );
    assert_invalid_rel(
        b.aggregate_exprs(scan.clone(), Vec::new(), no_groups()),
        "must have at least one grouping expression or measure",
    );
    assert_invalid_rel(
        b.aggregate_exprs(scan.clone(), Vec::new(), vec![Vec::<Expression>::new()]),
        "groupings cannot contain empty expression list or absent expression",
    );
    assert_invalid_rel(
        b.aggregate_exprs(scan.clone(), Vec::new(), vec![vec![None::<Expression>]]),
        "groupings cannot contain empty expression list or absent expression",
    );
    assert_invalid_arg(
        b.aggregate_columns(scan.clone(), Vec::new(), &[-1]),
        "cannot create field ref index -1",
    );
    assert_invalid_rel(
        b.aggregate_columns_remap(scan.clone(), Vec::new(), &[0], &[-1, 5]),
        "output mapping index out of range",
    );

    let field = b.root_field_ref(&scan, 0).expect("ref");
    assert_invalid_rel(
        b.aggregate_exprs_remap(scan, Vec::new(), vec![vec![field]], &[5, -1]),
        "output mapping index out of range",
    );
}

#[test]
fn cross_rel() {
    let expected = plan_json(
        json!({
            "cross": {
                "common": {"direct": {}},
                "left": read_json("test", &["a", "b"], &["string", "fp32"]),
                "right": read_json("test2", &["x", "y"], &["i32", "bool"])
            }
        }),
        &["str", "fp", "i", "bool"],
    );

    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());
    let root = b.cross(left, right).expect("cross");

    let plan = b.plan(root, ["str", "fp", "i", "bool"]).expect("plan");
    assert_eq!(
        plan.roots()[0].record_type().to_string(),
        "NSTRUCT<str: string, fp: fp32, i: i32, bool: boolean>"
    );

    check_round_trip(expected, &plan);
}

#[test]
fn cross_rel_errors() {
    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());

    assert_invalid_rel(b.cross(None, right.clone()), "input relation must not be absent");
    assert_invalid_rel(b.cross(left.clone(), None), "input relation must not be absent");
    assert_invalid_rel(
        b.cross_remap(left.clone(), right.clone(), &[-1]),
        "output mapping index out of range",
    );
    assert_invalid_rel(
        b.cross_remap(left, right, &[5]),
        "output mapping index out of range",
    );
}

fn single_string_scan(b: &Builder) -> relplan::Relation {
    b.named_scan(
        ["test"],
        NamedStruct::new([("a", Type::required(TypeKind::String))]),
    )
}

#[test]
fn fetch_rel() {
    let expected = plan_json(
        json!({
            "fetch": {
                "common": {"direct": {}},
                "input": read_json("test", &["a"], &["string"]),
                "offset": 100,
                "count": 50
            }
        }),
        &["a"],
    );

    let b = Builder::default();
    let scan = single_string_scan(&b);
    let fetch = b.fetch(scan, 100, 50).expect("fetch");
    let plan = b.plan(fetch, ["a"]).expect("plan");

    assert_eq!(plan.roots()[0].record_type().to_string(), "NSTRUCT<a: string>");

    check_round_trip(expected, &plan);
}

#[test]
fn fetch_rel_errors() {
    let b = Builder::default();
    assert_invalid_rel(b.fetch(None, 0, 0), "input relation must not be absent");

    let scan = single_string_scan(&b);
    assert_invalid_rel(
        b.fetch_remap(scan.clone(), 0, 0, &[-1]),
        "output mapping index out of range",
    );
    assert_invalid_rel(
        b.fetch_remap(scan, 0, 0, &[2]),
        "output mapping index out of range",
    );
}

#[test]
fn filter_relation() {
    let expected = plan_json(
        json!({
            "filter": {
                "common": {"direct": {}},
                "input": read_json("test", &["x", "y"], &["i32", "bool"]),
                "condition": field_json(1)
            }
        }),
        &["a", "b"],
    );

    let b = Builder::default();
    let scan = b.named_scan(["test"], base_schema2());
    let cond = b.root_field_ref(&scan, 1).expect("ref");
    let filter = b.filter(scan, cond).expect("filter");

    let plan = b.plan(filter, ["a", "b"]).expect("plan");
    assert_eq!(
        plan.roots()[0].record_type().to_string(),
        "NSTRUCT<a: i32, b: boolean>"
    );

    check_round_trip(expected, &plan);
}

#[test]
fn filter_relation_errors() {
    let b = Builder::default();
    assert_invalid_rel(b.filter(None, None), "input relation must not be absent");

    let scan = b.named_scan(
        ["test"],
        NamedStruct {
            names: vec!["a".into()],
            r#struct: StructType::new(vec![
                Type::nullable(TypeKind::String),
                Type::nullable(TypeKind::Boolean),
            ]),
        },
    );

    assert_invalid_rel(
        b.filter(scan.clone(), None),
        "cannot use absent condition in filter relation",
    );

    let ref_str = b.root_field_ref(&scan, 0).expect("string ref");
    let ref_bool = b.root_field_ref(&scan, 1).expect("bool ref");

    assert_invalid_arg(
        b.filter(scan.clone(), ref_str),
        "condition for Filter Relation must yield boolean, not string",
    );
    assert_invalid_rel(
        b.filter_remap(scan.clone(), ref_bool.clone(), &[-1]),
        "output mapping index out of range",
    );
    assert_invalid_rel(
        b.filter_remap(scan, ref_bool, &[3]),
        "output mapping index out of range",
    );
}

#[test]
fn join_rel_output_record_types() {
    let cases = [
        (
            "JOIN_TYPE_INNER",
            JoinType::Inner,
            &["a", "b", "c", "d"][..],
            "NSTRUCT<a: string, b: fp32, c: i32, d: boolean>",
        ),
        (
            "JOIN_TYPE_SEMI",
            JoinType::Semi,
            &["a", "b"][..],
            "NSTRUCT<a: string, b: fp32>",
        ),
        (
            "JOIN_TYPE_OUTER",
            JoinType::Outer,
            &["a", "b", "c", "d"][..],
            "NSTRUCT<a: string?, b: fp32?, c: i32?, d: boolean?>",
        ),
        (
            "JOIN_TYPE_LEFT",
            JoinType::Left,
            &["a", "b", "c", "d"][..],
            "NSTRUCT<a: string, b: fp32, c: i32?, d: boolean?>",
        ),
        (
            "JOIN_TYPE_RIGHT",
            JoinType::Right,
            &["a", "b", "c", "d"][..],
            "NSTRUCT<a: string?, b: fp32?, c: i32, d: boolean>",
        ),
        (
            "JOIN_TYPE_ANTI",
            JoinType::Anti,
            &["a", "b"][..],
            "NSTRUCT<a: string, b: fp32>",
        ),
        (
            "JOIN_TYPE_SINGLE",
            JoinType::Single,
            &["a", "b", "c", "d"][..],
            "NSTRUCT<a: string, b: fp32, c: i32?, d: boolean?>",
        ),
    ];

    for (wire_name, join_type, fields, record) in cases {
        let b = Builder::default();
        let left = b.named_scan(["test"], base_schema());
        let right = b.named_scan(["test2"], base_schema2());

        let cond = b.joined_record_field_ref(&left, &right, 3).expect("ref");
        let join = b.join(left, right, cond, join_type).expect("join");
        let plan = b.plan(join, fields.iter().copied()).expect("plan");

        assert_eq!(plan.roots()[0].record_type().to_string(), record, "{wire_name}");

        let expected = plan_json(
            json!({
                "join": {
                    "common": {"direct": {}},
                    "left": read_json("test", &["a", "b"], &["string", "fp32"]),
                    "right": read_json("test2", &["x", "y"], &["i32", "bool"]),
                    "expression": field_json(3),
                    "type": wire_name
                }
            }),
            fields,
        );
        check_round_trip(expected, &plan);
    }
}

#[test]
fn join_and_filter_relation() {
    let expected = plan_json(
        json!({
            "join": {
                "common": {"direct": {}},
                "left": read_json("test", &["a", "b"], &["string", "fp32"]),
                "right": read_json("test2", &["x", "y"], &["i32", "bool"]),
                "expression": field_json(3),
                "postJoinFilter": field_json(3),
                "type": "JOIN_TYPE_INNER"
            }
        }),
        &["a", "b", "c", "d"],
    );

    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());
    let cond = b.joined_record_field_ref(&left, &right, 3).expect("ref");

    let join = b
        .join_and_filter(left, right, cond.clone(), cond, JoinType::Inner)
        .expect("join");
    let plan = b.plan(join, ["a", "b", "c", "d"]).expect("plan");

    check_round_trip(expected, &plan);
}

#[test]
fn join_relation_errors() {
    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());

    assert_invalid_rel(
        b.join(None, right.clone(), None, JoinType::Unspecified),
        "input relation must not be absent",
    );
    assert_invalid_rel(
        b.join(left.clone(), None, None, JoinType::Unspecified),
        "input relation must not be absent",
    );
    assert_invalid_rel(
        b.join(left.clone(), right.clone(), None, JoinType::Unspecified),
        "cannot use absent condition in filter relation",
    );

    let bad_cond = b.joined_record_field_ref(&left, &right, 0).expect("ref");
    let good_cond = b.joined_record_field_ref(&left, &right, 3).expect("ref");

    assert_invalid_arg(
        b.join(left.clone(), right.clone(), bad_cond.clone(), JoinType::Unspecified),
        "condition for Join Relation must yield boolean, not string",
    );
    assert_invalid_arg(
        b.join(left.clone(), right.clone(), good_cond.clone(), JoinType::Unspecified),
        "join type must not be unspecified for Join relations",
    );
    assert_invalid_rel(
        b.join_remap(left.clone(), right.clone(), good_cond.clone(), JoinType::Inner, &[-1]),
        "output mapping index out of range",
    );
    assert_invalid_rel(
        b.join_remap(left.clone(), right.clone(), good_cond.clone(), JoinType::Anti, &[2]),
        "output mapping index out of range",
    );
    assert_invalid_arg(
        b.join_and_filter(left, right, good_cond, bad_cond, JoinType::Inner),
        "post join filter must be either absent or yield a boolean, not string",
    );
}

#[test]
fn references_must_address_the_consuming_relation() {
    let mut b = Builder::default();
    let scan = b.named_scan(["test"], base_schema());
    let flags = b.named_scan(
        ["flags"],
        NamedStruct::new([("y", Type::required(TypeKind::Boolean))]),
    );

    let foreign = b.root_field_ref(&flags, 0).expect("flag ref");
    assert_invalid_arg(
        b.filter(scan.clone(), foreign.clone()),
        "field ref index 0 has type boolean, but the column is string",
    );

    let wide = b.named_scan(["wide"], base_schema2());
    let past_end = b.root_field_ref(&wide, 1).expect("wide ref");
    assert_invalid_arg(
        b.filter(flags.clone(), past_end),
        "field ref index 1 out of range for 1 fields",
    );

    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());
    let swapped = b.joined_record_field_ref(&right, &left, 3).expect("swapped ref");
    assert_invalid_arg(
        b.join(left.clone(), right.clone(), swapped.clone(), JoinType::Inner),
        "field ref index 3 has type fp32, but the column is boolean",
    );
    let cond = b.joined_record_field_ref(&left, &right, 3).expect("ref");
    assert_invalid_arg(
        b.join_and_filter(left, right, cond, swapped, JoinType::Inner),
        "field ref index 3 has type fp32, but the column is boolean",
    );

    assert_invalid_arg(
        b.aggregate_exprs(scan.clone(), Vec::new(), vec![vec![foreign.clone()]]),
        "field ref index 0 has type boolean, but the column is string",
    );
    let count = b
        .aggregate_fn(
            &format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml"),
            "count",
            Vec::new(),
        )
        .expect("count");
    let filtered = b.measure(count, foreign).expect("measure");
    assert_invalid_arg(
        b.aggregate_columns(scan.clone(), vec![filtered], &[]),
        "field ref index 0 has type boolean, but the column is string",
    );

    let own = b.root_field_ref(&flags, 0).expect("own ref");
    let plan = b
        .plan(b.filter(flags, own).expect("filter"), ["y"])
        .expect("plan");
    let bytes = wire::to_bytes(&plan).expect("encode");
    let decoded = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");
    assert_eq!(decoded, plan);
}

#[test]
fn field_ref_bounds() {
    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());

    assert_invalid_arg(b.root_field_ref(&left, -1), "cannot create field ref index -1");
    assert_invalid_arg(b.root_field_ref(&left, 2), "out of range for 2 fields");
    assert_invalid_arg(
        b.joined_record_field_ref(&left, &right, 4),
        "out of range for 4 fields",
    );
}

#[test]
fn scalar_condition_registers_extension() {
    let mut b = Builder::default();
    let scan = b.named_scan(["test"], base_schema2());
    let x = b.root_field_ref(&scan, 0).expect("x");
    let ten = Expression::from(relplan::Literal::i32(10));
    let cond = b
        .scalar_fn(
            &format!("{DEFAULT_URI_PREFIX}functions_comparison.yaml"),
            "gt",
            vec![x, ten],
        )
        .expect("gt");
    assert_eq!(cond.ty(), Type::required(TypeKind::Boolean));

    let filter = b.filter(scan, cond).expect("filter");
    let plan = b.plan(filter, ["x", "y"]).expect("plan");
    assert_eq!(plan.extensions().functions.len(), 1);
    assert_eq!(plan.extensions().functions[0].name, "gt");

    let bytes = wire::to_bytes(&plan).expect("encode");
    let round_trip = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");
    assert_eq!(round_trip, plan);
    assert_eq!(wire::to_bytes(&round_trip).expect("re-encode"), bytes);
}

#[test]
fn multiple_roots_keep_order() {
    let b = Builder::default();
    let left = b.named_scan(["test"], base_schema());
    let right = b.named_scan(["test2"], base_schema2());
    let plan = b
        .plan_with_roots([
            (left, vec!["p".to_string(), "q".to_string()]),
            (right, vec!["r".to_string(), "s".to_string()]),
        ])
        .expect("plan");
    assert_eq!(plan.roots().len(), 2);
    assert_eq!(
        plan.roots()[1].record_type().to_string(),
        "NSTRUCT<r: i32, s: boolean>"
    );

    let bytes = wire::to_bytes(&plan).expect("encode");
    let round_trip = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");
    assert_eq!(round_trip, plan);
}
