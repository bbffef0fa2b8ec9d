use super::*;

#[test]
fn test_table_follows_declaration_order() {
    for (i, op) in Operator::ALL.iter().enumerate() {
        assert_eq!(*op as usize, i, "{op} out of order");
    }
}

#[test]
fn test_every_operator_is_relational() {
    for op in Operator::ALL {
        assert!(op.has_tag(Tag::Relational), "{op} is missing Relational");
    }
}

#[test]
fn test_apply_and_non_apply_are_exclusive() {
    for op in Operator::ALL {
        assert!(
            !(op.has_tag(Tag::JoinApply) && op.has_tag(Tag::JoinNonApply)),
            "{op} carries both JoinApply and JoinNonApply"
        );
        if op.has_tag(Tag::JoinApply) || op.has_tag(Tag::JoinNonApply) {
            assert!(op.has_tag(Tag::Join));
        }
    }
    assert_eq!(Operator::with_tag(Tag::JoinApply).count(), 6);
    assert_eq!(Operator::with_tag(Tag::JoinNonApply).count(), 6);
    assert_eq!(Operator::with_tag(Tag::Join).count(), 16);
}

#[test]
fn test_family_membership() {
    let grouping: Vec<Operator> = Operator::with_tag(Tag::Grouping).collect();
    assert_eq!(
        grouping,
        vec![
            Operator::GroupBy,
            Operator::ScalarGroupBy,
            Operator::DistinctOn
        ]
    );
    let sets: Vec<Operator> = Operator::with_tag(Tag::Set).collect();
    assert_eq!(sets.len(), 6);
    assert!(sets.contains(&Operator::IntersectAll));
    assert!(!Operator::Scan.has_tag(Tag::Join));
    assert!(Operator::LookupJoin.has_tag(Tag::Join));
    assert!(!Operator::LookupJoin.has_tag(Tag::JoinNonApply));
}

#[test]
fn test_telemetry_tags() {
    assert!(Operator::Max1Row.has_tag(Tag::Telemetry));
    assert!(Operator::ZigzagJoin.has_tag(Tag::Telemetry));
    assert!(Operator::DistinctOn.has_tag(Tag::Telemetry));
    assert!(!Operator::GroupBy.has_tag(Tag::Telemetry));
    assert!(!Operator::Values.has_tag(Tag::Telemetry));
}

#[test]
fn test_tag_queries_are_idempotent() {
    for op in Operator::ALL {
        for tag in Tag::ALL {
            let first = op.has_tag(tag);
            for _ in 0..3 {
                assert_eq!(op.has_tag(tag), first);
            }
        }
        assert_eq!(op.tags(), op.tags());
    }
}

#[test]
fn test_tagset_display_and_len() {
    let set = TagSet::of(&[Tag::Set, Tag::Relational]);
    assert_eq!(set.len(), 2);
    assert_eq!(set.to_string(), "[Relational, Set]");
    assert!(TagSet::EMPTY.is_empty());
    assert_eq!(serde_json::to_string(&set).unwrap(), r#"["Relational","Set"]"#);
}

#[test]
fn test_name_lookup() {
    assert_eq!(Tag::from_name("joinapply"), Some(Tag::JoinApply));
    assert_eq!(Operator::from_name("Union-All"), Some(Operator::UnionAll));
    assert_eq!(Operator::from_name("nope"), None);
    for op in Operator::ALL {
        assert_eq!(Operator::from_name(op.name()), Some(op));
    }
}

#[test]
fn test_join_type_mapping_round_trips() {
    for op in Operator::ALL.into_iter().filter(|op| op.is_join_family()) {
        let jt = op.join_type().unwrap();
        let apply = op.has_tag(Tag::JoinApply);
        assert_eq!(Operator::join_for(jt, apply), op);
    }
    assert_eq!(Operator::MergeJoin.join_type(), None);
}
