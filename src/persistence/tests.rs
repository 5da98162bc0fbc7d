use super::{HistoryReader, MembershipStatus, MessageStore, SledStore, SocialGraph};
use crate::config::StorageSettings;
use crate::utils::error::StoreError;

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

fn create_test_store() -> (SledStore, TempDir) {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path().to_str().unwrap()).unwrap();
    (store, dir)
}

#[test]
fn test_follow_relationship_is_checked_in_both_directions() {
    let (store, _dir) = create_test_store();
    store.follow(1, 2).unwrap();

    assert!(store.follows_either(1, 2).unwrap());
    assert!(store.follows_either(2, 1).unwrap());
    assert!(!store.follows_either(1, 3).unwrap());

    store.unfollow(1, 2).unwrap();
    assert!(!store.follows_either(2, 1).unwrap());
}

#[test]
fn test_only_accepted_members_are_listed() {
    let (store, _dir) = create_test_store();
    store.set_group_membership(7, 3, MembershipStatus::Accepted).unwrap();
    store.set_group_membership(7, 4, MembershipStatus::Accepted).unwrap();
    store.set_group_membership(7, 5, MembershipStatus::Pending).unwrap();
    store.set_group_membership(8, 6, MembershipStatus::Accepted).unwrap();

    assert_eq!(store.accepted_member_ids(7).unwrap(), vec![3, 4]);
    assert!(store.is_accepted_member(7, 3).unwrap());
    assert!(!store.is_accepted_member(7, 5).unwrap());
    assert!(!store.is_accepted_member(7, 6).unwrap());

    store.set_group_membership(7, 5, MembershipStatus::Accepted).unwrap();
    assert_eq!(store.accepted_member_ids(7).unwrap(), vec![3, 4, 5]);

    store.remove_group_membership(7, 3).unwrap();
    assert_eq!(store.accepted_member_ids(7).unwrap(), vec![4, 5]);
}

#[test]
fn test_unknown_user_has_no_username() {
    let (store, _dir) = create_test_store();
    store.upsert_user(1, "alice").unwrap();
    assert_eq!(store.username(1).unwrap().as_deref(), Some("alice"));
    assert_eq!(store.username(2).unwrap(), None);
}

#[test]
fn test_history_is_shared_by_both_participants_in_order() {
    let (store, _dir) = create_test_store();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    store
        .persist_direct_message(1, 2, "hi", start)
        .unwrap();
    store
        .persist_direct_message(2, 1, "hey", start + Duration::seconds(1))
        .unwrap();
    store
        .persist_direct_message(1, 3, "elsewhere", start + Duration::seconds(2))
        .unwrap();
    store
        .persist_direct_message(1, 2, "how are you", start + Duration::seconds(3))
        .unwrap();

    let history = store.read_history(2, 1).unwrap();
    let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi", "hey", "how are you"]);
    assert_eq!(history[0].sender_id, 1);
    assert_eq!(history[0].receiver_id, 2);
    assert_eq!(history[0].created_at, start);
}

#[test]
fn test_history_page_is_newest_first() {
    let (store, _dir) = create_test_store();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    for i in 0..5 {
        store
            .persist_direct_message(1, 2, &format!("msg{i}"), start + Duration::seconds(i))
            .unwrap();
    }

    let page = store.read_history_page(1, 2, 1, 2).unwrap();
    let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["msg3", "msg2"]);
}

#[test]
fn test_same_timestamp_messages_are_all_kept() {
    let (store, _dir) = create_test_store();
    let at = Utc::now();
    store.persist_direct_message(1, 2, "a", at).unwrap();
    store.persist_direct_message(1, 2, "b", at).unwrap();

    let contents: Vec<_> = store
        .read_history(1, 2)
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["a", "b"]);
}

#[test]
fn test_group_message_from_non_member_is_rejected() {
    let (store, _dir) = create_test_store();
    store.set_group_membership(7, 3, MembershipStatus::Accepted).unwrap();
    store.set_group_membership(7, 9, MembershipStatus::Invited).unwrap();

    let err = store
        .persist_group_message(7, 9, "let me in", Utc::now())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAMember { group: 7, user: 9 }));
    assert!(store.read_group_backlog(7, 0, 30).unwrap().is_empty());
}

#[test]
fn test_group_backlog_pages_newest_then_returns_oldest_first() {
    let (store, _dir) = create_test_store();
    store.upsert_user(3, "carol").unwrap();
    store.set_group_membership(7, 3, MembershipStatus::Accepted).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    for i in 0..5 {
        store
            .persist_group_message(7, 3, &format!("g{i}"), start + Duration::seconds(i))
            .unwrap();
    }

    let latest = store.read_group_backlog(7, 0, 3).unwrap();
    let contents: Vec<_> = latest.iter().map(|e| e.message.content.as_str()).collect();
    assert_eq!(contents, vec!["g2", "g3", "g4"]);
    assert!(latest.iter().all(|e| e.username == "carol"));

    let older = store.read_group_backlog(7, 3, 3).unwrap();
    let contents: Vec<_> = older.iter().map(|e| e.message.content.as_str()).collect();
    assert_eq!(contents, vec!["g0", "g1"]);
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    {
        let store = SledStore::open(&path).unwrap();
        store.persist_direct_message(1, 2, "durable", Utc::now()).unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::open(&path).unwrap();
    assert_eq!(store.read_history(1, 2).unwrap().len(), 1);
}

#[test]
fn test_history_reader_pages_by_configured_size() {
    let (store, _dir) = create_test_store();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    for i in 0..5 {
        store
            .persist_direct_message(2, 1, &format!("m{i}"), start + Duration::seconds(i))
            .unwrap();
    }

    let settings = StorageSettings {
        history_page_size: 2,
        ..StorageSettings::default()
    };
    let reader = HistoryReader::new(Arc::new(store), &settings);

    let first = reader.conversation_page(1, 2, 0).unwrap();
    let contents: Vec<_> = first.iter().map(|f| f.content.as_str()).collect();
    assert_eq!(contents, vec!["m4", "m3"]);
    assert_eq!(first[0].kind, "private_message");
    assert_eq!(first[0].from, 2);
    assert_eq!(first[0].to, Some(1));
    assert_eq!(first[0].timestamp, Some(start + Duration::seconds(4)));

    let last = reader.conversation_page(1, 2, 2).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].content, "m0");
    assert!(reader.conversation_page(1, 2, 3).unwrap().is_empty());
}

#[test]
fn test_history_reader_renders_group_backlog_as_group_messages() {
    let (store, _dir) = create_test_store();
    store.upsert_user(3, "carol").unwrap();
    store.set_group_membership(7, 3, MembershipStatus::Accepted).unwrap();
    store.set_group_membership(7, 4, MembershipStatus::Accepted).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    store.persist_group_message(7, 3, "first", start).unwrap();
    store
        .persist_group_message(7, 4, "second", start + Duration::seconds(1))
        .unwrap();

    let reader = HistoryReader::new(Arc::new(store), &StorageSettings::default());
    let page = reader.group_backlog_page(7, 0).unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].kind, "group_message");
    assert_eq!(page[0].group_id, Some(7));
    assert_eq!(page[0].content, "first");
    assert_eq!(page[0].username.as_deref(), Some("carol"));
    assert_eq!(page[1].username.as_deref(), Some(""));
}
