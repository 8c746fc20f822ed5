#![allow(missing_docs)]

use proptest::prelude::*;
use relplan::extensions::{ExtensionCollection, DEFAULT_URI_PREFIX};
use relplan::plan::schema::join_record_type;
use relplan::plan::{Builder, JoinType, Plan};
use relplan::types::{NamedStruct, RecordType, TimePrecision};
use relplan::{wire, Nullability, PlanError, Type, TypeKind};

fn arb_kind() -> impl Strategy<Value = TypeKind> {
    prop_oneof![
        Just(TypeKind::Boolean),
        Just(TypeKind::I8),
        Just(TypeKind::I16),
        Just(TypeKind::I32),
        Just(TypeKind::I64),
        Just(TypeKind::Fp32),
        Just(TypeKind::Fp64),
        Just(TypeKind::String),
        Just(TypeKind::Binary),
        Just(TypeKind::Date),
        Just(TypeKind::Time),
        Just(TypeKind::Timestamp),
        Just(TypeKind::TimestampTz),
        Just(TypeKind::IntervalYear),
        Just(TypeKind::Uuid),
        (1u32..=64).prop_map(|length| TypeKind::VarChar { length }),
        (1u32..=16).prop_map(|length| TypeKind::FixedBinary { length }),
        (1u8..=38)
            .prop_flat_map(|precision| (Just(precision), 0..=precision))
            .prop_map(|(precision, scale)| TypeKind::Decimal { precision, scale }),
        (0i32..=9).prop_filter_map("valid precision", |digits| {
            TimePrecision::from_digits(digits).map(|precision| TypeKind::PrecisionTimestamp { precision })
        }),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    (arb_kind(), any::<bool>()).prop_map(|(kind, nullable)| {
        if nullable {
            Type::nullable(kind)
        } else {
            Type::required(kind)
        }
    })
}

fn arb_schema(prefix: &'static str) -> impl Strategy<Value = NamedStruct> {
    prop::collection::vec(arb_type(), 1..6).prop_map(move |types| {
        NamedStruct::new(
            types
                .into_iter()
                .enumerate()
                .map(|(i, ty)| (format!("{prefix}{i}"), ty)),
        )
    })
}

fn arb_join_type() -> impl Strategy<Value = JoinType> {
    prop_oneof![
        Just(JoinType::Inner),
        Just(JoinType::Outer),
        Just(JoinType::Left),
        Just(JoinType::Right),
        Just(JoinType::Semi),
        Just(JoinType::Anti),
        Just(JoinType::Single),
    ]
}

fn expected_join(left: &RecordType, right: &RecordType, join_type: JoinType) -> RecordType {
    match join_type {
        JoinType::Semi | JoinType::Anti => left.clone(),
        JoinType::Inner => left.concat(right),
        JoinType::Outer => left.as_nullable().concat(&right.as_nullable()),
        JoinType::Left | JoinType::Single => left.concat(&right.as_nullable()),
        JoinType::Right => left.as_nullable().concat(right),
        JoinType::Unspecified => unreachable!("never generated"),
    }
}

fn round_trip(plan: &Plan) -> Plan {
    let bytes = wire::to_bytes(plan).expect("encode");
    let decoded = wire::from_bytes(&bytes, &ExtensionCollection::standard()).expect("decode");
    let again = wire::to_bytes(&decoded).expect("re-encode");
    assert_eq!(again, bytes);
    decoded
}

proptest! {
    #[test]
    fn prop_scan_with_remap_round_trips(
        (schema, remap) in arb_schema("c").prop_flat_map(|schema| {
            let len = schema.r#struct.types.len() as i32;
            (Just(schema), prop::collection::vec(0..len, 0..8))
        })
    ) {
        let b = Builder::default();
        let scan = b.named_scan_remap(["t"], schema.clone(), &remap).unwrap();
        let names: Vec<String> = (0..remap.len()).map(|i| format!("out{i}")).collect();
        let plan = b.plan(scan, names).unwrap();

        let record = plan.roots()[0].record_type();
        prop_assert_eq!(record.len(), remap.len());
        for (field, &idx) in record.fields().iter().zip(&remap) {
            prop_assert_eq!(&field.ty, &schema.r#struct.types[idx as usize]);
        }

        let decoded = round_trip(&plan);
        prop_assert_eq!(decoded, plan);
    }

    #[test]
    fn prop_join_record_type_follows_matrix(
        left in arb_schema("l"),
        right in arb_schema("r"),
        join_type in arb_join_type(),
    ) {
        let left_rt = left.record_type();
        let right_rt = right.record_type();
        let expected = expected_join(&left_rt, &right_rt, join_type);
        prop_assert_eq!(join_record_type(&left_rt, &right_rt, join_type).unwrap(), expected.clone());

        let b = Builder::default();
        let l = b.named_scan(["l"], left);
        let r = b.named_scan(["r"], right);
        let cond = relplan::Expression::from(relplan::Literal::boolean(true));
        let join = b.join(l, r, cond, join_type).unwrap();
        prop_assert_eq!(join.record_type(), expected.clone());

        let names: Vec<String> = expected.fields().iter().map(|f| f.name.clone()).collect();
        let plan = b.plan(join, names).unwrap();
        let decoded = round_trip(&plan);
        prop_assert_eq!(decoded, plan);
    }

    #[test]
    fn prop_aggregate_output_is_groups_then_measures(
        (schema, columns) in arb_schema("g").prop_flat_map(|schema| {
            let len = schema.r#struct.types.len() as i32;
            (Just(schema), prop::collection::vec(0..len, 0..4))
        }),
        measures in 1usize..4,
    ) {
        let mut b = Builder::default();
        let uri = format!("{DEFAULT_URI_PREFIX}functions_aggregate_generic.yaml");
        let scan = b.named_scan(["t"], schema.clone());
        let mut aggs = Vec::new();
        for _ in 0..measures {
            let call = b.aggregate_fn(&uri, "count", Vec::new()).unwrap();
            aggs.push(b.measure(call, None).unwrap());
        }
        let agg = b.aggregate_columns(scan, aggs, &columns).unwrap();

        let record = agg.record_type();
        prop_assert_eq!(record.len(), columns.len() + measures);
        for (field, &col) in record.fields().iter().zip(&columns) {
            prop_assert_eq!(&field.name, &schema.names[col as usize]);
            prop_assert_eq!(&field.ty, &schema.r#struct.types[col as usize]);
        }
        for field in &record.fields()[columns.len()..] {
            prop_assert_eq!(&field.name, "count");
            prop_assert_eq!(&field.ty, &Type::required(TypeKind::I64));
        }

        let names: Vec<String> = (0..record.len()).map(|i| format!("o{i}")).collect();
        let plan = b.plan(agg, names).unwrap();
        prop_assert_eq!(plan.extensions().functions.len(), 1);
        let decoded = round_trip(&plan);
        prop_assert_eq!(decoded, plan);
    }

    #[test]
    fn prop_emit_out_of_bounds_is_rejected(
        schema in arb_schema("e"),
        bad in prop_oneof![(-100i32..0), (5i32..100)],
    ) {
        let b = Builder::default();
        let len = schema.r#struct.types.len() as i32;
        let idx = if bad >= 0 { bad.max(len) } else { bad };
        let err = b.named_scan_remap(["t"], schema, &[idx]).unwrap_err();
        prop_assert!(matches!(err, PlanError::InvalidRelation(_)));
        prop_assert!(err.message().contains("output mapping index out of range"));
    }

    #[test]
    fn prop_outer_join_is_nullable_everywhere(
        left in arb_schema("l"),
        right in arb_schema("r"),
    ) {
        let joined = join_record_type(&left.record_type(), &right.record_type(), JoinType::Outer).unwrap();
        prop_assert!(joined
            .fields()
            .iter()
            .all(|f| f.ty.nullability == Nullability::Nullable));
    }
}
