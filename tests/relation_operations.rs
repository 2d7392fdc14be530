//! Relation attach/detach semantics.

mod common;

use resourcery::page::Pageable;
use resourcery::service::{ConflictCode, ServiceError};
use serde_json::json;

#[test]
fn attach_with_unresolvable_ids_lists_all_of_them_and_changes_nothing() {
    let registry = common::service_registry();
    let profiles = common::profiles(&registry);
    let sessions = common::sessions(&registry);

    profiles
        .create("t1", json!({"id": "p1", "bio": "x"}))
        .unwrap();
    sessions
        .create("t1", json!({"id": "s1", "device": "laptop"}))
        .unwrap();
    sessions
        .create("t1", json!({"id": "s2", "device": "phone"}))
        .unwrap();

    // Five requested, two unresolvable: the failure lists exactly those two.
    let requested: Vec<String> = ["s1", "ghost1", "s2", "ghost2", "s1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let err = profiles
        .add_related("t1", "p1", "sessions", &requested)
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::MissingRelated {
            resource: "session".into(),
            ids: vec!["ghost1".into(), "ghost2".into()],
        }
    );

    // No partial attach happened.
    let page = profiles
        .get_related("t1", "p1", "sessions", &Pageable::default())
        .unwrap();
    assert!(page.items.is_empty());
}

#[test]
fn attaching_an_already_related_id_is_a_distinct_conflict() {
    let registry = common::service_registry();
    let profiles = common::profiles(&registry);
    let sessions = common::sessions(&registry);

    profiles
        .create("t1", json!({"id": "p1", "bio": "x"}))
        .unwrap();
    sessions
        .create("t1", json!({"id": "s1", "device": "laptop"}))
        .unwrap();

    profiles
        .add_related("t1", "p1", "sessions", &["s1".into()])
        .unwrap();

    let err = profiles
        .add_related("t1", "p1", "sessions", &["s1".into()])
        .unwrap_err();
    let ServiceError::Conflict { code, message } = err else {
        panic!("expected a conflict");
    };
    assert_eq!(code, ConflictCode::RelatedResourceAlreadyExists);
    assert!(message.contains("s1"));
}

#[test]
fn detaching_unrelated_ids_names_the_target_type_and_ids() {
    let registry = common::service_registry();
    let profiles = common::profiles(&registry);
    let sessions = common::sessions(&registry);

    profiles
        .create("t1", json!({"id": "p1", "bio": "x"}))
        .unwrap();
    sessions
        .create("t1", json!({"id": "s1", "device": "laptop"}))
        .unwrap();
    profiles
        .add_related("t1", "p1", "sessions", &["s1".into()])
        .unwrap();

    let err = profiles
        .remove_related("t1", "p1", "sessions", &["s1".into(), "s9".into()])
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::NotRelated {
            resource: "session".into(),
            ids: vec!["s9".into()],
        }
    );

    // All-or-nothing: s1 is still attached.
    let page = profiles
        .get_related("t1", "p1", "sessions", &Pageable::default())
        .unwrap();
    assert_eq!(page.items.len(), 1);
}

#[test]
fn related_pages_are_sorted_and_paginated() {
    let registry = common::service_registry();
    let profiles = common::profiles(&registry);
    let sessions = common::sessions(&registry);

    profiles
        .create("t1", json!({"id": "p1", "bio": "x"}))
        .unwrap();
    let mut ids = Vec::new();
    for i in 0..5 {
        let id = format!("s{i}");
        sessions
            .create("t1", json!({"id": id, "device": format!("device-{i}")}))
            .unwrap();
        ids.push(id);
    }
    profiles.add_related("t1", "p1", "sessions", &ids).unwrap();

    let pageable = Pageable {
        page: 1,
        size: 2,
        sort: vec![resourcery::page::SortKey {
            field: "device".into(),
            ascending: false,
        }],
    };
    let page = profiles
        .get_related("t1", "p1", "sessions", &pageable)
        .unwrap();

    // Descending by device: d4 d3 | d2 d1 | d0 -> page 1 holds d2, d1.
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0]["device"], "device-2");
    assert_eq!(page.items[1]["device"], "device-1");
    assert!(page.has_next());
}

#[test]
fn unknown_relation_name_is_rejected() {
    let registry = common::service_registry();
    let profiles = common::profiles(&registry);

    profiles
        .create("t1", json!({"id": "p1", "bio": "x"}))
        .unwrap();

    let err = profiles
        .add_related("t1", "p1", "friends", &["s1".into()])
        .unwrap_err();
    assert!(matches!(err, ServiceError::IllegalArgument(_)));
}
