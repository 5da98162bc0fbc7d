use super::{accepted_member_ids, is_accepted_member, may_message};
use crate::persistence::{MembershipStatus, SledStore};
use tempfile::{TempDir, tempdir};

fn create_test_store() -> (SledStore, TempDir) {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path().to_str().unwrap()).unwrap();
    (store, dir)
}

#[test]
fn test_one_follow_edge_is_enough_to_message() {
    let (store, _dir) = create_test_store();
    store.follow(2, 1).unwrap();

    assert!(may_message(&store, 1, 2).unwrap());
    assert!(may_message(&store, 2, 1).unwrap());
    assert!(!may_message(&store, 1, 3).unwrap());
}

#[test]
fn test_follow_changes_apply_immediately() {
    let (store, _dir) = create_test_store();
    assert!(!may_message(&store, 1, 2).unwrap());
    store.follow(1, 2).unwrap();
    assert!(may_message(&store, 1, 2).unwrap());
    store.unfollow(1, 2).unwrap();
    assert!(!may_message(&store, 1, 2).unwrap());
}

#[test]
fn test_non_positive_ids_are_never_authorized() {
    let (store, _dir) = create_test_store();
    store.follow(0, 2).unwrap();
    store.set_group_membership(0, 3, MembershipStatus::Accepted).unwrap();

    assert!(!may_message(&store, 0, 2).unwrap());
    assert!(!is_accepted_member(&store, 0, 3).unwrap());
    assert!(accepted_member_ids(&store, 0).unwrap().is_empty());
}

#[test]
fn test_membership_requires_accepted_status() {
    let (store, _dir) = create_test_store();
    store.set_group_membership(7, 3, MembershipStatus::Accepted).unwrap();
    store.set_group_membership(7, 4, MembershipStatus::Pending).unwrap();

    assert!(is_accepted_member(&store, 7, 3).unwrap());
    assert!(!is_accepted_member(&store, 7, 4).unwrap());
    assert_eq!(accepted_member_ids(&store, 7).unwrap(), vec![3]);
}
