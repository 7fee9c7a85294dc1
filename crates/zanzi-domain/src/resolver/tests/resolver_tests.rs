//! Graph resolver test suite.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::mocks::{compile, create_resolver};
use crate::error::DomainError;
use crate::model::TypeSystem;
use crate::resolver::{CheckContext, CheckRequest, ResolverConfig};

const SERVER_MODEL: &str = r#"
type user

type group
  relations
    define member: [user, group#member]

type server
  relations
    define admin: [user, group#member]
    define operator: [user, group#member] or admin
    define viewer: [user, group#member] or operator
    define user: [user:*]
    define can_edit_server: admin
    define can_view_server: user or viewer

type project
  relations
    define server: [server]
    define manager: [user, group#member] or operator from server
    define can_edit: manager
    define can_view: manager or viewer from server

type instance
  relations
    define project: [project]
    define can_edit: can_edit from project
"#;

fn server_model() -> TypeSystem {
    compile(SERVER_MODEL)
}

fn req(user: &str, relation: &str, object: &str) -> CheckRequest {
    CheckRequest::parse(user, relation, object).expect("valid request")
}

// ========== Section 1: Direct Tuples and Wildcards ==========

#[tokio::test]
async fn test_check_returns_true_for_direct_tuple_assignment() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "admin", "server:lxd").await;

    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(result.allowed, "Direct tuple assignment should allow access");
}

#[tokio::test]
async fn test_check_returns_false_when_no_tuple_exists() {
    let model = server_model();
    let (_reader, resolver) = create_resolver(ResolverConfig::default());

    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed, "Should deny access when no tuple exists");
}

#[tokio::test]
async fn test_wildcard_grants_every_user_of_the_type() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:*", "user", "server:lxd").await;

    for name in ["alice", "bob", "carol"] {
        let result = resolver
            .check(&model, &req(&format!("user:{name}"), "can_view_server", "server:lxd"))
            .await
            .unwrap();
        assert!(result.allowed, "user:{name} should see the server through the wildcard");
    }

    let result = resolver
        .check(&model, &req("group:admins", "user", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed, "wildcard must not match a different type");
}

#[tokio::test]
async fn test_wildcard_never_satisfies_a_userset_user() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:*", "user", "server:lxd").await;

    let result = resolver
        .check(&model, &req("group:admins#member", "user", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_wildcard_ignored_when_relation_does_not_declare_it() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    // Written behind the model's back; admin does not accept user:*.
    reader.add("user:*", "admin", "server:lxd").await;

    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_wildcard_query_user_matches_only_literal_wildcard_tuple() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "user", "server:lxd").await;

    let result = resolver
        .check(&model, &req("user:*", "user", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed, "a single user does not make the wildcard hold");

    reader.add("user:*", "user", "server:lxd").await;
    let result = resolver
        .check(&model, &req("user:*", "user", "server:lxd"))
        .await
        .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_tuple_outside_type_restrictions_is_ignored() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:admins", "admin", "server:lxd").await;

    let result = resolver
        .check(&model, &req("group:admins", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

// ========== Section 2: Userset Tuples ==========

#[tokio::test]
async fn test_group_member_inherits_group_grant() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:admins#member", "admin", "server:lxd").await;
    reader.add("user:alice", "member", "group:admins").await;

    let result = resolver
        .check(&model, &req("user:alice", "can_edit_server", "server:lxd"))
        .await
        .unwrap();
    assert!(result.allowed);

    let result = resolver
        .check(&model, &req("user:bob", "can_edit_server", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_removing_either_tuple_revokes_group_grant() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:admins#member", "admin", "server:lxd").await;
    reader.add("user:alice", "member", "group:admins").await;

    reader.remove("user:alice", "member", "group:admins").await;
    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed, "removing membership must revoke access");

    reader.add("user:alice", "member", "group:admins").await;
    reader.remove("group:admins#member", "admin", "server:lxd").await;
    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(!result.allowed, "removing the group grant must revoke access");
}

#[tokio::test]
async fn test_nested_groups_resolve() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:admins#member", "admin", "server:lxd").await;
    reader.add("group:sre#member", "member", "group:admins").await;
    reader.add("user:alice", "member", "group:sre").await;

    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_userset_query_user_matches_literal_userset_tuple() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:admins#member", "admin", "server:lxd").await;

    let result = resolver
        .check(&model, &req("group:admins#member", "admin", "server:lxd"))
        .await
        .unwrap();
    assert!(result.allowed);
}

// ========== Section 3: Computed Usersets and Tuple-to-Userset ==========

#[tokio::test]
async fn test_computed_userset_chain() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "admin", "server:lxd").await;

    for relation in ["operator", "viewer", "can_view_server", "can_edit_server"] {
        let result = resolver
            .check(&model, &req("user:alice", relation, "server:lxd"))
            .await
            .unwrap();
        assert!(result.allowed, "admin should imply {relation}");
    }
}

#[tokio::test]
async fn test_tuple_to_userset_inherits_from_parent() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("server:lxd", "server", "project:p1").await;
    reader.add("project:p1", "project", "instance:i1").await;
    reader.add("group:admins#member", "admin", "server:lxd").await;
    reader.add("user:alice", "member", "group:admins").await;

    let result = resolver
        .check(&model, &req("user:alice", "can_edit", "instance:i1"))
        .await
        .unwrap();
    assert!(result.allowed, "server admin should edit instances two levels down");
}

#[tokio::test]
async fn test_tuple_to_userset_without_parent_is_false() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "admin", "server:lxd").await;

    let result = resolver
        .check(&model, &req("user:alice", "can_edit", "project:orphan"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_tuple_to_userset_considers_every_parent() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("server:a", "server", "project:p1").await;
    reader.add("server:b", "server", "project:p1").await;
    reader.add("user:alice", "operator", "server:b").await;

    let result = resolver
        .check(&model, &req("user:alice", "can_edit", "project:p1"))
        .await
        .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_tuple_to_userset_skips_parent_without_relation() {
    let model = compile(
        r#"
type user
type team
type folder
  relations
    define viewer: [user]
type document
  relations
    define parent: [folder, team]
    define viewer: viewer from parent
"#,
    );
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("team:t1", "parent", "document:d1").await;
    reader.add("folder:f1", "parent", "document:d1").await;
    reader.add("user:alice", "viewer", "folder:f1").await;

    let result = resolver
        .check(&model, &req("user:alice", "viewer", "document:d1"))
        .await
        .unwrap();
    assert!(result.allowed);
}

// ========== Section 4: Union, Intersection, Exclusion ==========

const SET_MODEL: &str = r#"
type user
type document
  relations
    define owner: [user]
    define editor: [user]
    define blocked: [user]
    define approved: [user]
    define any_role: owner or editor
    define both_roles: owner and editor
    define visible: owner but not blocked
    define gated: (owner or editor) and approved but not blocked
"#;

#[tokio::test]
async fn test_union_requires_any_branch() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "editor", "document:d").await;

    assert!(resolver
        .check(&model, &req("user:alice", "any_role", "document:d"))
        .await
        .unwrap()
        .allowed);
    assert!(!resolver
        .check(&model, &req("user:bob", "any_role", "document:d"))
        .await
        .unwrap()
        .allowed);
}

#[tokio::test]
async fn test_intersection_requires_every_branch() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "editor", "document:d").await;

    assert!(!resolver
        .check(&model, &req("user:alice", "both_roles", "document:d"))
        .await
        .unwrap()
        .allowed);

    reader.add("user:alice", "owner", "document:d").await;
    assert!(resolver
        .check(&model, &req("user:alice", "both_roles", "document:d"))
        .await
        .unwrap()
        .allowed);
}

#[tokio::test]
async fn test_exclusion_subtracts() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "owner", "document:d").await;
    reader.add("user:bob", "owner", "document:d").await;
    reader.add("user:bob", "blocked", "document:d").await;

    assert!(resolver
        .check(&model, &req("user:alice", "visible", "document:d"))
        .await
        .unwrap()
        .allowed);
    assert!(!resolver
        .check(&model, &req("user:bob", "visible", "document:d"))
        .await
        .unwrap()
        .allowed);
}

#[tokio::test]
async fn test_exclusion_skips_subtract_when_base_is_false() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "blocked", "document:d").await;

    let result = resolver
        .check(&model, &req("user:alice", "visible", "document:d"))
        .await
        .unwrap();
    assert!(!result.allowed);
    // One point lookup and one listing for `owner`; `blocked` is never read.
    assert_eq!(reader.read_count(), 2);
}

#[tokio::test]
async fn test_nested_set_operators() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "editor", "document:d").await;
    reader.add("user:alice", "approved", "document:d").await;
    reader.add("user:bob", "owner", "document:d").await;

    assert!(resolver
        .check(&model, &req("user:alice", "gated", "document:d"))
        .await
        .unwrap()
        .allowed);
    assert!(!resolver
        .check(&model, &req("user:bob", "gated", "document:d"))
        .await
        .unwrap()
        .allowed);

    reader.add("user:alice", "blocked", "document:d").await;
    assert!(!resolver
        .check(&model, &req("user:alice", "gated", "document:d"))
        .await
        .unwrap()
        .allowed);
}

#[tokio::test]
async fn test_union_short_circuits_pending_sibling() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "owner", "document:d").await;
    reader.hang_relation("editor").await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        resolver.check(&model, &req("user:alice", "any_role", "document:d")),
    )
    .await
    .expect("union should settle without the hanging branch")
    .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_intersection_short_circuits_pending_sibling() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "owner", "document:d").await;
    reader.hang_relation("editor").await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        resolver.check(&model, &req("user:bob", "both_roles", "document:d")),
    )
    .await
    .expect("intersection should settle without the hanging branch")
    .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_exclusion_ignores_failing_subtract_when_base_is_false() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.fail_relation("blocked").await;

    let result = resolver
        .check(&model, &req("user:alice", "visible", "document:d"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_union_without_grant_surfaces_branch_failure() {
    let model = compile(SET_MODEL);
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.fail_relation("editor").await;

    let err = resolver
        .check(&model, &req("user:alice", "any_role", "document:d"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::StoreUnavailable { .. }));
}

// ========== Section 5: Safety Features ==========

#[tokio::test]
async fn test_self_referential_cycle_terminates_false() {
    let model = compile(
        r#"
type user
type document
  relations
    define a: b
    define b: a
    define c: [user] or c
"#,
    );
    let (reader, resolver) = create_resolver(ResolverConfig::default());

    let result = resolver
        .check(&model, &req("user:alice", "a", "document:d"))
        .await
        .unwrap();
    assert!(!result.allowed);

    reader.add("user:alice", "c", "document:d").await;
    let result = resolver
        .check(&model, &req("user:alice", "c", "document:d"))
        .await
        .unwrap();
    assert!(result.allowed, "a cycle must not hide a direct grant");
}

#[tokio::test]
async fn test_group_membership_cycle_terminates() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:a#member", "member", "group:b").await;
    reader.add("group:b#member", "member", "group:a").await;

    let result = resolver
        .check(&model, &req("user:alice", "member", "group:a"))
        .await
        .unwrap();
    assert!(!result.allowed);

    reader.add("user:alice", "member", "group:b").await;
    let result = resolver
        .check(&model, &req("user:alice", "member", "group:a"))
        .await
        .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_depth_exceeded_is_an_error_not_false() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default().with_max_depth(3));
    for i in 0..5 {
        reader
            .add(&format!("group:g{}#member", i + 1), "member", &format!("group:g{i}"))
            .await;
    }
    reader.add("user:alice", "member", "group:g5").await;

    let result = resolver
        .check(&model, &req("user:alice", "member", "group:g0"))
        .await;
    assert!(
        matches!(result, Err(DomainError::DepthExceeded { max_depth: 3 })),
        "expected DepthExceeded, got {result:?}"
    );
}

#[tokio::test]
async fn test_depth_within_bound_resolves() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    for i in 0..10 {
        reader
            .add(&format!("group:g{}#member", i + 1), "member", &format!("group:g{i}"))
            .await;
    }
    reader.add("user:alice", "member", "group:g10").await;

    let result = resolver
        .check(&model, &req("user:alice", "member", "group:g0"))
        .await
        .unwrap();
    assert!(result.allowed);
}

#[tokio::test]
async fn test_unknown_type_and_relation_are_errors() {
    let model = server_model();
    let (_reader, resolver) = create_resolver(ResolverConfig::default());

    let result = resolver
        .check(&model, &req("user:alice", "viewer", "cluster:c1"))
        .await;
    assert!(matches!(result, Err(DomainError::UnknownType { .. })));

    let result = resolver
        .check(&model, &req("user:alice", "owner", "server:lxd"))
        .await;
    assert!(matches!(result, Err(DomainError::UnknownRelation { .. })));
}

#[tokio::test]
async fn test_dangling_userset_tuple_evaluates_false() {
    let model = compile(
        r#"
type user
type document
  relations
    define viewer: this
"#,
    );
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("team:t1#member", "viewer", "document:d").await;

    let result = resolver
        .check(&model, &req("user:alice", "viewer", "document:d"))
        .await
        .unwrap();
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_deadline_exceeded() {
    let model = server_model();
    let (reader, resolver) =
        create_resolver(ResolverConfig::default().with_timeout(Duration::from_millis(20)));
    reader.set_delay(Duration::from_secs(5)).await;

    let result = resolver
        .check(&model, &req("user:alice", "admin", "server:lxd"))
        .await;
    assert!(
        matches!(result, Err(DomainError::DeadlineExceeded { duration_ms: 20 })),
        "expected DeadlineExceeded, got {result:?}"
    );
}

#[tokio::test]
async fn test_context_timeout_overrides_config() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.set_delay(Duration::from_secs(5)).await;

    let ctx = CheckContext::new().with_timeout(Duration::from_millis(10));
    let result = resolver
        .check_with_context(&model, &req("user:alice", "admin", "server:lxd"), &ctx)
        .await;
    assert!(matches!(result, Err(DomainError::DeadlineExceeded { duration_ms: 10 })));
}

#[tokio::test]
async fn test_cancellation_aborts_check() {
    let model = Arc::new(server_model());
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.set_delay(Duration::from_secs(5)).await;
    let resolver = Arc::new(resolver);

    let token = CancellationToken::new();
    let ctx = CheckContext::new().with_cancellation(token.clone());
    let handle = {
        let model = Arc::clone(&model);
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            resolver
                .check_with_context(&model, &req("user:alice", "admin", "server:lxd"), &ctx)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(DomainError::Cancelled)));
}

// ========== Section 6: Store Failures and Concurrency ==========

#[tokio::test]
async fn test_store_failure_propagates() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "admin", "server:lxd").await;
    reader.fail_reads();

    let result = resolver
        .check(&model, &req("user:alice", "can_view_server", "server:lxd"))
        .await;
    assert!(
        matches!(result, Err(DomainError::StoreUnavailable { .. })),
        "store failures must not become false, got {result:?}"
    );
}

#[tokio::test]
async fn test_concurrent_checks_share_model_and_agree() {
    let model = Arc::new(server_model());
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("group:ops#member", "operator", "server:lxd").await;
    reader.add("server:lxd", "server", "project:p1").await;
    for i in 0..20 {
        reader
            .add(&format!("user:u{i}"), "member", "group:ops")
            .await;
    }
    let resolver = Arc::new(resolver);

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let model = Arc::clone(&model);
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                resolver
                    .check(&model, &req(&format!("user:u{i}"), "can_edit", "project:p1"))
                    .await
                    .map(|r| r.allowed)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let allowed = handle.await.unwrap().unwrap();
        assert_eq!(allowed, i < 20, "user:u{i}");
    }
}

#[tokio::test]
async fn test_repeated_check_is_idempotent() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:alice", "viewer", "server:lxd").await;

    let request = req("user:alice", "can_view_server", "server:lxd");
    let first = resolver.check(&model, &request).await.unwrap();
    let second = resolver.check(&model, &request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_seed_scenario() {
    let model = server_model();
    let (reader, resolver) = create_resolver(ResolverConfig::default());
    reader.add("user:*", "user", "server:lxd").await;
    reader.add("server:lxd", "server", "project:p1").await;
    reader.add("group:admins#member", "admin", "server:lxd").await;
    reader.add("user:alice", "member", "group:admins").await;

    assert!(resolver
        .check(&model, &req("user:alice", "can_edit_server", "server:lxd"))
        .await
        .unwrap()
        .allowed);
    assert!(!resolver
        .check(&model, &req("user:bob", "can_edit_server", "server:lxd"))
        .await
        .unwrap()
        .allowed);
    assert!(resolver
        .check(&model, &req("user:bob", "can_view_server", "server:lxd"))
        .await
        .unwrap()
        .allowed);
}
