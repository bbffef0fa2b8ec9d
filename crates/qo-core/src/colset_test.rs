use super::*;
use proptest::prelude::*;

fn c(id: u32) -> ColumnId {
    ColumnId::new(id)
}

fn set(ids: &[u32]) -> ColSet {
    ids.iter().copied().map(c).collect()
}

#[test]
fn test_colset_ignores_insertion_order() {
    assert_eq!(set(&[3, 1, 2]), set(&[1, 2, 3]));
    assert_eq!(set(&[1, 1, 2]).len(), 2);
}

#[test]
fn test_colset_algebra() {
    let a = set(&[1, 2, 3]);
    let b = set(&[3, 4]);
    assert_eq!(a.union(&b), set(&[1, 2, 3, 4]));
    assert_eq!(a.intersection(&b), set(&[3]));
    assert_eq!(a.difference(&b), set(&[1, 2]));
    assert!(a.intersects(&b));
    assert!(set(&[1]).is_subset_of(&a));
    assert!(set(&[5]).is_disjoint(&a));
}

#[test]
fn test_colset_display() {
    assert_eq!(set(&[2, 1]).to_string(), "(1,2)");
    assert_eq!(ColSet::new().to_string(), "()");
}

#[test]
fn test_collist_equality_is_positional() {
    let ab: ColList = vec![c(1), c(2)].into();
    let ba: ColList = vec![c(2), c(1)].into();
    assert_ne!(ab, ba);
    assert_eq!(ab.to_set(), ba.to_set());
    assert_eq!(ab.position(c(2)), Some(1));
    assert_eq!(ab[0], c(1));
}

#[test]
fn test_collist_duplicates_and_prefix() {
    let list: ColList = vec![c(1), c(2), c(1)].into();
    assert!(list.has_duplicates());
    let prefix: ColList = vec![c(1), c(2)].into();
    assert!(list.starts_with(&prefix));
    assert!(!prefix.starts_with(&list));
}

fn arb_set() -> impl Strategy<Value = ColSet> {
    prop::collection::vec(1u32..32, 0..12).prop_map(|ids| set(&ids))
}

proptest! {
    #[test]
    fn prop_union_is_commutative(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn prop_intersection_within_both(a in arb_set(), b in arb_set()) {
        let i = a.intersection(&b);
        prop_assert!(i.is_subset_of(&a));
        prop_assert!(i.is_subset_of(&b));
    }

    #[test]
    fn prop_difference_disjoint_from_subtrahend(a in arb_set(), b in arb_set()) {
        let d = a.difference(&b);
        prop_assert!(d.is_disjoint(&b));
        prop_assert_eq!(d.union(&a.intersection(&b)), a);
    }

    #[test]
    fn prop_cardinality_inclusion_exclusion(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(
            a.union(&b).len() + a.intersection(&b).len(),
            a.len() + b.len()
        );
    }
}
