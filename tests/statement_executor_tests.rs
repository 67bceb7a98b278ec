use almond::ast::{FunctionDef, FunctionType, Invocation, Statement, Type, Value};
use almond::executor::{AppOutput, ExecutionError, ReplayAppFactory, StatementExecutor, MORE_SIZE, PAGE_SIZE};
use almond::schema::MemorySchemaRetriever;
use almond::AgentError;
use serde_json::json;
use std::sync::Arc;

const RESTAURANTS: &str = "com.yelp:restaurant";

fn executor(apps: ReplayAppFactory) -> StatementExecutor {
    let schemas = MemorySchemaRetriever::new().with(
        FunctionDef::new("com.yelp", "restaurant", FunctionType::Query)
            .with_arg("name", Type::String)
            .with_arg("rating", Type::Number),
    );
    StatementExecutor::new(Arc::new(apps), Arc::new(schemas))
}

fn restaurants() -> Statement {
    Statement::query(Invocation::new("com.yelp", "restaurant", FunctionType::Query))
}

fn rows(n: usize) -> Vec<AppOutput> {
    (0..n)
        .map(|i| AppOutput::result(Some(RESTAURANTS), json!({ "name": format!("place {}", i), "rating": i })))
        .collect()
}

fn error(code: Option<&str>, message: &str) -> AppOutput {
    AppOutput::Error(ExecutionError::new(code, message))
}

#[tokio::test]
async fn test_twelve_rows_are_paginated() {
    let apps = ReplayAppFactory::new().with(RESTAURANTS, rows(12));
    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();

    assert_eq!(list.results.len(), PAGE_SIZE);
    assert_eq!(list.count, 12);
    assert!(!list.more);
    assert_eq!(list.error, None);
    assert_eq!(list.results[0].get("rating"), Some(&Value::Number(0.0)));
    assert_eq!(list.results[9].get("name"), Some(&Value::String("place 9".into())));
}

#[tokio::test]
async fn test_exactly_more_size_rows_is_not_truncated() {
    let apps = ReplayAppFactory::new().with(RESTAURANTS, rows(MORE_SIZE));
    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();

    assert_eq!(list.count, MORE_SIZE);
    assert!(!list.more);
}

#[tokio::test]
async fn test_rows_beyond_more_size_set_more() {
    let apps = ReplayAppFactory::new().with(RESTAURANTS, rows(MORE_SIZE + 7));
    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();

    assert_eq!(list.count, MORE_SIZE);
    assert!(list.more);
    assert_eq!(list.results.len(), PAGE_SIZE);
}

#[tokio::test]
async fn test_continuous_source_is_bounded() {
    let mut apps = ReplayAppFactory::new();
    apps.register_continuous(RESTAURANTS, AppOutput::result(Some(RESTAURANTS), json!({ "rating": 5 })));
    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();

    assert_eq!(list.count, MORE_SIZE);
    assert!(list.more);
}

#[tokio::test]
async fn test_first_usable_error_code_wins() {
    let mut outputs = rows(2);
    outputs.push(error(Some("E_INTERNAL"), "boom"));
    outputs.push(error(Some("rate_limited"), "too many requests"));
    outputs.push(error(Some("quota"), "over quota"));
    let apps = ReplayAppFactory::new().with(RESTAURANTS, outputs);

    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();
    assert_eq!(list.error, Some(Value::Enum("rate_limited".into())));
    assert_eq!(list.count, 2);
    assert!(list.has_error());
}

#[tokio::test]
async fn test_message_used_when_no_code() {
    let outputs = vec![
        error(None, ""),
        error(Some("E_SYSTEM"), "first message"),
        error(None, "second message"),
    ];
    let apps = ReplayAppFactory::new().with(RESTAURANTS, outputs);

    let list = executor(apps).execute_statement(&restaurants()).await.unwrap();
    assert_eq!(list.error, Some(Value::String("first message".into())));
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_failed_app_construction_reports_empty_list() {
    let list = executor(ReplayAppFactory::new())
        .execute_statement(&restaurants())
        .await
        .unwrap();

    assert!(list.results.is_empty());
    assert_eq!(list.count, 0);
    assert!(!list.more);
    assert_eq!(list.error, None);
}

#[tokio::test]
async fn test_schema_failure_propagates() {
    let outputs = vec![AppOutput::result(Some("com.unknown:thing"), json!({ "x": 1 }))];
    let apps = ReplayAppFactory::new().with(RESTAURANTS, outputs);

    let err = executor(apps).execute_statement(&restaurants()).await.unwrap_err();
    assert!(matches!(err, AgentError::SchemaNotFound { .. }));
}
