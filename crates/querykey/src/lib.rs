// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Deterministic cache keys derived from query expression trees.
//!
//! A query is an expression tree over a data source: filters and projections
//! written as lambdas over "the current row", mixed with values captured from the
//! surrounding code. Two queries that would return the same rows should get the
//! same key, and two that would not should get different keys.
//!
//! Key derivation runs in four steps:
//!
//! 1. [`partial_eval`] folds every sub-tree that does not depend on the row into a
//!    literal, so captured values are keyed by value rather than by name.
//! 2. [`rewrite_collections`] replaces list literals passed as sequence operands
//!    with a single `{a|b|c}` token, so keys do not grow with the list.
//! 3. The tree is rendered and the extra key parameters are appended with
//!    [`stringify`].
//! 4. [`hash`] turns the text into a fixed-length [`CacheKey`].
//!
//! When a captured value cannot be read, [`derive_key`] falls back to a key built
//! from the extra parameters alone.
//!
//! # Examples
//!
//! ```
//! use querykey::{Expr, Lambda, Parameter, Query, Value, ValueType, derive_key};
//!
//! let book = ValueType::record("Book");
//! let x = Parameter::new("x", book.clone());
//! let category = String::from("Books");
//!
//! let query = Query::from_source("books", book)
//!     .filter(Lambda::new(
//!         x.clone(),
//!         x.field("Category", ValueType::Str).equals(Expr::captured_value("category", category)),
//!     ))
//!     .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));
//!
//! let first = derive_key(Some(query.expression()), &[Value::from(42)])?;
//! let second = derive_key(Some(query.expression()), &[Value::from(42)])?;
//! assert_eq!(first, second);
//! assert_eq!(first.as_str().len(), 32);
//! # Ok::<(), querykey::KeyError>(())
//! ```
//!
//! # Features
//!
//! - `logs`: emits a `tracing` debug event named `querykey.fallback` when key
//!   derivation falls back to the extra parameters.

mod digest;
mod error;
pub mod eval;
mod expr;
mod generator;
mod query;
pub mod rewrite;
mod stringify;
mod value;

#[doc(inline)]
pub use digest::{CacheKey, hash};
#[doc(inline)]
pub use error::{EvaluationFailure, KeyError, KeyErrorKind};
#[doc(inline)]
pub use eval::{apply, evaluate, partial_eval};
#[doc(inline)]
pub use expr::{BinaryOp, Captured, Expr, Lambda, Method, Parameter, QueryOperator, UnaryOp};
#[doc(inline)]
pub use generator::{ExpressionKeyGenerator, KeyGenerator, ValueKeyGenerator, derive_key};
#[doc(inline)]
pub use query::Query;
#[doc(inline)]
pub use rewrite::rewrite_collections;
#[doc(inline)]
pub use stringify::{KEY_SEPARATOR, PARAM_SEPARATOR, SUMMARY_SEPARATOR, stringify, stringify_all};
#[doc(inline)]
pub use value::{Value, ValueType};
