#![allow(missing_docs)]

use relplan::expr::literal::LiteralValue;
use relplan::extensions::{ExtensionCollection, DEFAULT_URI_PREFIX};
use relplan::plan::{Builder, Plan, RelOp};
use relplan::types::TimePrecision;
use relplan::{wire, Expression, Literal, NamedStruct, PlanError, Type, TypeKind};
use serde_json::Value;
use time::macros::datetime;
use uuid::Uuid;

/// Filter plan whose condition compares column 0 against each literal.
fn plan_with_literals(literals: Vec<Literal>) -> Plan {
    let mut b = Builder::default();
    let scan = b.named_scan(
        ["t"],
        NamedStruct::new([("a", Type::required(TypeKind::I32))]),
    );
    let col = b.root_field_ref(&scan, 0).expect("ref");
    let mut args = vec![col];
    args.extend(literals.into_iter().map(Expression::from));
    let cond = b
        .scalar_fn(
            &format!("{DEFAULT_URI_PREFIX}functions_comparison.yaml"),
            "equal",
            args,
        )
        .expect("equal");
    let filter = b.filter(scan, cond).expect("filter");
    b.plan(filter, ["a"]).expect("plan")
}

fn literal_args(plan: &Plan) -> Vec<Literal> {
    let RelOp::Filter(filter) = plan.roots()[0].input().op() else {
        panic!("expected filter root");
    };
    let Expression::ScalarFunction(call) = filter.condition() else {
        panic!("expected scalar condition");
    };
    call.args()[1..]
        .iter()
        .map(|arg| match arg {
            Expression::Literal(lit) => lit.clone(),
            other => panic!("expected literal, got {other:?}"),
        })
        .collect()
}

fn decode_json(value: Value) -> Plan {
    let msg = serde_json::from_value(value).expect("plan message");
    wire::decode(&msg, &ExtensionCollection::standard()).expect("decode")
}

#[test]
fn every_literal_family_survives_the_wire() {
    let at = datetime!(2024-01-02 03:04:05.123456789 UTC);
    let literals = vec![
        Literal::boolean(false),
        Literal::i8(-7),
        Literal::i16(1234),
        Literal::i32(i32::MIN),
        Literal::i64(i64::MAX),
        Literal::fp32(1.5),
        Literal::fp64(-0.25),
        Literal::fp64(f64::INFINITY),
        Literal::string("hello"),
        Literal::binary(vec![0, 1, 2, 255]),
        Literal::date(19_000),
        Literal::time(12, 30, 0, 5).expect("time"),
        Literal::timestamp(at),
        Literal::timestamp_tz(at),
        Literal::interval_years_to_month(2, 3),
        Literal::interval_days_to_second(4, 5, 6),
        Literal::uuid(Uuid::new_v4()),
        Literal::fixed_char("abc"),
        Literal::var_char("abcd"),
        Literal::fixed_binary(vec![9, 8, 7]),
        Literal::decimal_from_str("-123.45").expect("decimal"),
        Literal::precision_timestamp_from_time(TimePrecision::MilliSeconds, at),
        Literal::precision_timestamp_tz_from_time(TimePrecision::NanoSeconds, at),
        Literal::null(Type::required(TypeKind::VarChar { length: 10 })),
        Literal::with_nullable(LiteralValue::I32(3), true),
    ];
    let plan = plan_with_literals(literals.clone());

    let bytes = wire::to_bytes(&plan).expect("encode");
    let decoded = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");

    assert_eq!(literal_args(&decoded), literals);
    assert_eq!(decoded, plan);
    assert_eq!(wire::to_bytes(&decoded).expect("re-encode"), bytes);
}

#[test]
fn literal_json_shapes() {
    let plan = plan_with_literals(vec![
        Literal::i64(-5),
        Literal::binary(b"hi".to_vec()),
        Literal::fp64(f64::NEG_INFINITY),
        Literal::null(Type::required(TypeKind::I32)),
    ]);
    let json = serde_json::to_value(wire::encode(&plan)).expect("json");
    let args = &json["relations"][0]["root"]["input"]["filter"]["condition"]["scalarFunction"]
        ["arguments"];

    assert_eq!(args[1]["value"]["literal"], serde_json::json!({"i64": -5}));
    assert_eq!(args[2]["value"]["literal"], serde_json::json!({"binary": "aGk="}));
    assert_eq!(
        args[3]["value"]["literal"],
        serde_json::json!({"fp64": "-Infinity"})
    );
    assert_eq!(
        args[4]["value"]["literal"],
        serde_json::json!({
            "nullable": true,
            "null": {"i32": {"nullability": "NULLABILITY_NULLABLE"}}
        })
    );
}

#[test]
fn nan_is_written_as_a_string() {
    let plan = plan_with_literals(vec![Literal::fp64(f64::NAN)]);
    let text = String::from_utf8(wire::to_bytes(&plan).expect("encode")).expect("utf8");
    assert!(text.contains(r#""fp64":"NaN""#), "{text}");

    let decoded = wire::from_bytes(text.as_bytes(), &ExtensionCollection::standard())
        .expect("decode");
    match literal_args(&decoded)[0].value() {
        LiteralValue::Fp64(v) => assert!(v.is_nan()),
        other => panic!("expected fp64, got {other:?}"),
    }
    assert_eq!(decoded, plan);
}

#[test]
fn int64_accepts_string_form() {
    let plan = plan_with_literals(vec![Literal::i64(9_007_199_254_740_993)]);
    let mut json = serde_json::to_value(wire::encode(&plan)).expect("json");
    json["relations"][0]["root"]["input"]["filter"]["condition"]["scalarFunction"]["arguments"][1]
        ["value"]["literal"]["i64"] = Value::String("9007199254740993".into());

    let decoded = decode_json(json);
    assert_eq!(decoded, plan);
}

#[test]
fn malformed_literal_payloads_are_decode_errors() {
    let plan = plan_with_literals(vec![Literal::uuid(Uuid::nil())]);
    let mut json = serde_json::to_value(wire::encode(&plan)).expect("json");
    json["relations"][0]["root"]["input"]["filter"]["condition"]["scalarFunction"]["arguments"][1]
        ["value"]["literal"]["uuid"] = Value::String("AAEC".into());

    let msg = serde_json::from_value(json).expect("plan message");
    let err = wire::decode(&msg, &ExtensionCollection::standard()).expect_err("short uuid");
    assert!(matches!(err, PlanError::Decode(_)), "{err:?}");
}

#[test]
fn constructor_validation() {
    assert!(matches!(
        Literal::time(25, 0, 0, 0),
        Err(PlanError::InvalidArgument(_))
    ));
    assert!(Literal::time_from_micros(-1).is_err());
    assert!(Literal::decimal_from_str("1.2.3").is_err());
    assert!(Literal::decimal_from_str(&"1".repeat(39)).is_err());

    let dec = Literal::decimal_from_str("0.050").expect("decimal");
    assert_eq!(dec.ty(), Type::required(TypeKind::Decimal { precision: 3, scale: 3 }));

    let ts = Literal::precision_timestamp(TimePrecision::Seconds, 10);
    assert_eq!(ts.ty().to_string(), "precision_timestamp<0>");
}
