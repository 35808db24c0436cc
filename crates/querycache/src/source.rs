// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query execution collaborators.
//!
//! Caching a query needs something that can run it on a miss. [`QuerySource`] is
//! that seam; [`InMemorySource`] runs `Where`/`Select` chains over in-memory
//! tables of records.

use std::{collections::HashMap, sync::Arc};

use querykey::{Expr, Query, QueryOperator, Value, apply};

use crate::Error;

/// Runs queries and returns their rows.
pub trait QuerySource: Send + Sync {
    /// Executes `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`Query`](crate::ErrorKind::Query) error if the query cannot be
    /// executed.
    fn fetch(&self, query: &Query) -> Result<Vec<Value>, Error>;

    /// Async form of [`QuerySource::fetch`]; defaults to the blocking call.
    fn fetch_async(&self, query: &Query) -> impl Future<Output = Result<Vec<Value>, Error>> + Send {
        async move { self.fetch(query) }
    }
}

/// Named tables of rows held in memory.
///
/// Supports queries built from [`Query::filter`] and [`Query::select`]: each
/// lambda is applied to every row, with captured values read at fetch time.
///
/// # Examples
///
/// ```
/// use querycache::{InMemorySource, QuerySource};
/// use querykey::{Expr, Lambda, Parameter, Query, Value, ValueType};
///
/// let source = InMemorySource::new().with_table(
///     "books",
///     [
///         Value::record([("Title", Value::from("Dune")), ("Price", Value::from(9))]),
///         Value::record([("Title", Value::from("Emma")), ("Price", Value::from(4))]),
///     ],
/// );
///
/// let book = ValueType::record("Book");
/// let x = Parameter::new("x", book.clone());
/// let query = Query::from_source("books", book)
///     .filter(Lambda::new(x.clone(), x.field("Price", ValueType::Int).greater_than(Expr::constant(5))))
///     .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));
///
/// assert_eq!(source.fetch(&query)?, vec![Value::from("Dune")]);
/// # Ok::<(), querycache::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    tables: HashMap<String, Arc<[Value]>>,
}

impl InMemorySource {
    /// Creates a source without tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the table `name`.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, rows: impl IntoIterator<Item = Value>) -> Self {
        self.insert_table(name, rows);
        self
    }

    /// Adds or replaces the table `name` in place.
    pub fn insert_table(&mut self, name: impl Into<String>, rows: impl IntoIterator<Item = Value>) {
        self.tables.insert(name.into(), rows.into_iter().collect());
    }

    fn execute(&self, expr: &Expr) -> Result<Vec<Value>, Error> {
        match expr {
            Expr::Source { name, .. } => self
                .tables
                .get(&**name)
                .map(|rows| rows.to_vec())
                .ok_or_else(|| Error::query(format!("unknown source `{name}`"))),
            Expr::MethodCall { method, args, .. } => {
                let (Some(operator), [input, Expr::Lambda(lambda)]) = (method.operator(), args.as_slice()) else {
                    return Err(Error::query(format!("unsupported query operator `{}`", method.name())));
                };
                let rows = self.execute(input)?;
                match operator {
                    QueryOperator::Where => {
                        let mut kept = Vec::new();
                        for row in rows {
                            match apply(lambda, &row)? {
                                Value::Bool(true) => kept.push(row),
                                Value::Bool(false) | Value::Null => {}
                                other => return Err(Error::query(format!("predicate returned `{other}`, not a boolean"))),
                            }
                        }
                        Ok(kept)
                    }
                    QueryOperator::Select => rows.iter().map(|row| apply(lambda, row).map_err(Error::from)).collect(),
                }
            }
            other => Err(Error::query(format!("`{other}` is not a query"))),
        }
    }
}

impl QuerySource for InMemorySource {
    fn fetch(&self, query: &Query) -> Result<Vec<Value>, Error> {
        self.execute(query.expression())
    }
}

#[cfg(test)]
mod tests {
    use querykey::{Lambda, Parameter, ValueType};

    use super::*;
    use crate::ErrorKind;

    fn books() -> InMemorySource {
        InMemorySource::new().with_table(
            "books",
            [
                Value::record([("Title", Value::from("Dune")), ("Category", Value::from("Books"))]),
                Value::record([("Title", Value::from("Heat")), ("Category", Value::from("Films"))]),
                Value::record([("Title", Value::from("Emma")), ("Category", Value::from("Books"))]),
            ],
        )
    }

    fn category_is(category: &str) -> Query {
        let book = ValueType::record("Book");
        let x = Parameter::new("x", book.clone());
        Query::from_source("books", book)
            .filter(Lambda::new(x.clone(), x.field("Category", ValueType::Str).equals(Expr::constant(category))))
    }

    #[test]
    fn unfiltered_source_returns_all_rows() {
        let rows = books()
            .fetch(&Query::from_source("books", ValueType::record("Book")))
            .expect("table exists");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let rows = books().fetch(&category_is("Books")).expect("query runs");
        let titles: Vec<_> = rows.iter().filter_map(|row| row.field("Title")).cloned().collect();
        assert_eq!(titles, vec![Value::from("Dune"), Value::from("Emma")]);
    }

    #[test]
    fn unknown_table_is_query_error() {
        let error = InMemorySource::new()
            .fetch(&category_is("Books"))
            .expect_err("no tables");
        assert_eq!(error.kind(), ErrorKind::Query);
    }

    #[test]
    fn non_boolean_predicate_is_query_error() {
        let book = ValueType::record("Book");
        let x = Parameter::new("x", book.clone());
        let query = Query::from_source("books", book).filter(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));

        let error = books().fetch(&query).expect_err("predicate yields strings");
        assert_eq!(error.kind(), ErrorKind::Query);
    }

    #[test]
    fn async_fetch_matches_blocking_fetch() {
        let source = books();
        let query = category_is("Films");
        let rows = futures::executor::block_on(source.fetch_async(&query)).expect("query runs");
        assert_eq!(rows, source.fetch(&query).expect("query runs"));
    }
}
