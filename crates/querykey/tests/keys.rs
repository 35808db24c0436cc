// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for cache key derivation.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use querykey::{
    EvaluationFailure, Expr, KeyErrorKind, Lambda, Method, Parameter, Query, Value, ValueType, derive_key, hash,
};

fn book() -> ValueType {
    ValueType::record("Book")
}

fn books_by_category(category: &str) -> Query {
    let x = Parameter::new("x", book());
    Query::from_source("books", book())
        .filter(Lambda::new(
            x.clone(),
            x.field("Category", ValueType::Str)
                .equals(Expr::captured_value("category", category)),
        ))
        .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)))
}

fn books_with_ids(ids: Vec<i64>) -> Query {
    let x = Parameter::new("x", book());
    let ids = Expr::captured("ids", ValueType::sequence(ValueType::Int), move || Ok(Value::from(ids.clone())));
    Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        Expr::call(Method::contains(ValueType::Int), vec![ids, x.field("Id", ValueType::Int)]),
    ))
}

#[test]
fn same_query_built_twice_gives_same_key() {
    let first = derive_key(Some(books_by_category("Books").expression()), &[Value::from(42)]).expect("key derives");
    let second = derive_key(Some(books_by_category("Books").expression()), &[Value::from(42)]).expect("key derives");
    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 32);
}

#[test]
fn key_is_canonical_text_hash() {
    let key = derive_key(Some(books_by_category("Books").expression()), &[Value::from(42)]).expect("key derives");
    let text = r#"Select(Where(source(books), x => (x.Category == "Books")), x => x.Title),42"#;
    assert_eq!(key, hash(text));
}

#[test]
fn different_captured_values_give_different_keys() {
    let books = derive_key(Some(books_by_category("Books").expression()), &[]).expect("key derives");
    let music = derive_key(Some(books_by_category("Music").expression()), &[]).expect("key derives");
    assert_ne!(books, music);
}

#[test]
fn different_params_give_different_keys() {
    let query = books_by_category("Books");
    let a = derive_key(Some(query.expression()), &[Value::from(1)]).expect("key derives");
    let b = derive_key(Some(query.expression()), &[Value::from(2)]).expect("key derives");
    let swapped_a = derive_key(Some(query.expression()), &[Value::from(1), Value::from(2)]).expect("key derives");
    let swapped_b = derive_key(Some(query.expression()), &[Value::from(2), Value::from(1)]).expect("key derives");
    assert_ne!(a, b);
    assert_ne!(swapped_a, swapped_b);
}

#[test]
fn params_that_flatten_alike_give_different_keys() {
    let query = books_by_category("Books");
    let key = |params: &[Value]| derive_key(Some(query.expression()), params).expect("key derives");

    assert_ne!(key(&[Value::from("a,b")]), key(&[Value::from("a"), Value::from("b")]));
    assert_ne!(key(&[Value::Null]), key(&[Value::from("")]));
    assert_ne!(key(&[Value::from(vec![1, 2])]), key(&[Value::from(1), Value::from(2)]));
    assert_ne!(key(&[Value::from(42)]), key(&[Value::from("42")]));
}

#[test]
fn captured_value_is_read_at_derivation_time() {
    let limit = Arc::new(AtomicI64::new(5));
    let reader = Arc::clone(&limit);
    let x = Parameter::new("x", book());
    let query = Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        x.field("Price", ValueType::Int).greater_than(Expr::captured("limit", ValueType::Int, move || {
            Ok(Value::Int(reader.load(Ordering::SeqCst)))
        })),
    ));

    let before = derive_key(Some(query.expression()), &[]).expect("key derives");
    limit.store(6, Ordering::SeqCst);
    let after = derive_key(Some(query.expression()), &[]).expect("key derives");
    assert_ne!(before, after);
}

#[test]
fn closed_arithmetic_is_folded() {
    let x = Parameter::new("x", book());
    let folded = Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        x.field("Price", ValueType::Int)
            .greater_than(Expr::constant(5).plus(Expr::constant(3))),
    ));
    let literal = Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        x.field("Price", ValueType::Int).greater_than(Expr::constant(8)),
    ));

    let a = derive_key(Some(folded.expression()), &[]).expect("key derives");
    let b = derive_key(Some(literal.expression()), &[]).expect("key derives");
    assert_eq!(a, b);
}

#[test]
fn equal_collections_give_equal_keys() {
    let a = derive_key(Some(books_with_ids(vec![1, 2, 3]).expression()), &[]).expect("key derives");
    let b = derive_key(Some(books_with_ids(vec![1, 2, 3]).expression()), &[]).expect("key derives");
    assert_eq!(a, b);
}

#[test]
fn collection_order_is_significant() {
    let a = derive_key(Some(books_with_ids(vec![1, 2]).expression()), &[]).expect("key derives");
    let b = derive_key(Some(books_with_ids(vec![2, 1]).expression()), &[]).expect("key derives");
    assert_ne!(a, b);
}

#[test]
fn large_collections_still_give_fixed_length_keys() {
    let key = derive_key(Some(books_with_ids((0..10_000).collect()).expression()), &[]).expect("key derives");
    assert_eq!(key.as_str().len(), 32);
}

#[test]
fn failing_capture_falls_back_to_params() {
    let x = Parameter::new("x", book());
    let query = Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        x.field("Owner", ValueType::Str).equals(Expr::captured("session", ValueType::Str, || {
            Err(EvaluationFailure::from_message("value(session)", "session closed"))
        })),
    ));

    let key = derive_key(Some(query.expression()), &[Value::from("books"), Value::from(7)]).expect("fallback derives");
    assert_eq!(key, hash("books-7"));
}

#[test]
fn failing_capture_without_params_is_invalid_argument() {
    let x = Parameter::new("x", book());
    let query = Query::from_source("books", book()).filter(Lambda::new(
        x.clone(),
        x.field("Owner", ValueType::Str).equals(Expr::captured("session", ValueType::Str, || {
            Err(EvaluationFailure::from_message("value(session)", "session closed"))
        })),
    ));

    let error = derive_key(Some(query.expression()), &[]).expect_err("no fallback parameters");
    assert_eq!(error.kind(), KeyErrorKind::InvalidArgument);
}

#[test]
fn value_keys_join_parameters() {
    let key = derive_key(None, &[Value::from("books"), Value::Null, Value::from(vec![1, 2])]).expect("key derives");
    assert_eq!(key, hash("books--1-2"));
}
