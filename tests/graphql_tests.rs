//! Resolvers mounted in an async-graphql dynamic schema.

mod common;

use std::sync::atomic::Ordering;

use async_graphql::Request;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::*;
use orm_resolver::orm::Model;
use orm_resolver::{Resolve, ResolveContext, ResolveInfo, ResolverArgs, resolver};

async fn run(query: &str) -> async_graphql::Response {
    build_schema(Some(seeded_db().await))
        .execute(Request::new(query))
        .await
}

#[tokio::test]
async fn test_user_by_id_returns_only_name() {
    let response = run("{ user(id: 1) { name } }").await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "user": { "name": "Ada Lovelace" } })
    );
}

#[tokio::test]
async fn test_first_two_tasks_by_date() {
    let response = run("{ user(id: 1) { tasks(first: 2) { title } } }").await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({
            "user": {
                "tasks": [
                    { "title": "Book flights" },
                    { "title": "Write the report" }
                ]
            }
        })
    );
}

#[tokio::test]
async fn test_list_arguments() {
    let response = run(r#"{ users(order: "reverse:name", limit: 1) { id name } }"#).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "users": [{ "id": 2, "name": "Grace Hopper" }] })
    );
}

#[tokio::test]
async fn test_nested_association_per_parent() {
    let query = r#"{
        users {
            name
            tasks(limit: 1, order: "reverse:created_at") { title createdAt user { name } }
        }
    }"#;
    let response = run(query).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({
            "users": [
                {
                    "name": "Ada Lovelace",
                    "tasks": [{
                        "title": "Ship release",
                        "createdAt": "2014-06-20",
                        "user": { "name": "Ada Lovelace" }
                    }]
                },
                {
                    "name": "Grace Hopper",
                    "tasks": [{
                        "title": "Review compiler",
                        "createdAt": "2014-07-01",
                        "user": { "name": "Grace Hopper" }
                    }]
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_wrapped_field_matches_direct_field() {
    let schema = build_schema(Some(seeded_db().await));

    let direct = schema
        .execute(Request::new(r#"{ users(order: "name", offset: 1) { id name } }"#))
        .await;
    let wrapped = schema
        .execute(Request::new(r#"{ wrappedUsers(order: "name", offset: 1) { id name } }"#))
        .await;

    assert!(direct.errors.is_empty() && wrapped.errors.is_empty());
    assert_eq!(
        direct.data.into_json().unwrap()["users"],
        wrapped.data.into_json().unwrap()["wrappedUsers"]
    );
}

#[tokio::test]
async fn test_failing_field_is_null_with_error_and_siblings_resolve() {
    let db = seeded_db().await;
    let expected = resolver(Model::<Ghost>::new())
        .resolve(
            None,
            &ResolverArgs::new(),
            &ResolveContext::new(db.clone()),
            &ResolveInfo::list("ghosts"),
        )
        .await
        .unwrap_err()
        .to_string();

    let response = build_schema(Some(db))
        .execute(Request::new("{ users { name } ghosts { id } }"))
        .await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, expected);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({
            "users": [{ "name": "Ada Lovelace" }, { "name": "Grace Hopper" }],
            "ghosts": null
        })
    );
}

#[tokio::test]
async fn test_missing_required_argument_never_reaches_resolver() {
    let (logger, calls) = counting_logger();
    let response = build_schema(Some(seeded_db().await))
        .execute(Request::new("{ user { name } }").data(logger))
        .await;

    assert!(!response.errors.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_request_logger_called_once_per_resolver_call() {
    let (logger, calls) = counting_logger();
    let response = build_schema(Some(seeded_db().await))
        .execute(Request::new("{ user(id: 1) { name tasks(first: 2) { title } } }").data(logger))
        .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    // One query for the user, one for their tasks
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_schema_without_database_reports_error() {
    let response = build_schema(None)
        .execute(Request::new("{ user(id: 1) { name } }"))
        .await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Database is not available in the execution context"
    );
    assert_eq!(response.data.into_json().unwrap(), json!({ "user": null }));
}

#[tokio::test]
async fn test_only_root_field_failing_keeps_data_object() {
    let response = run("{ ghosts { id } }").await;

    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("no such table"));
    assert_eq!(response.data.into_json().unwrap(), json!({ "ghosts": null }));
}

#[tokio::test]
async fn test_non_null_field_error_propagates_to_parent() {
    // `users` is `[User!]!`, so its failure nulls the whole response data
    let response = build_schema(None)
        .execute(Request::new("{ users { name } }"))
        .await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Database is not available in the execution context"
    );
    assert_eq!(response.data.into_json().unwrap(), json!(null));
}
