// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::{Expr, Lambda, Method, ValueType};

/// A query: a chain of `Where` and `Select` operators over a named source.
///
/// The query is only a description. Executing it is up to a query source; deriving
/// a key from it is up to [`derive_key`](crate::derive_key).
///
/// # Examples
///
/// ```
/// use querykey::{Expr, Lambda, Parameter, Query, ValueType};
///
/// let book = ValueType::record("Book");
/// let x = Parameter::new("x", book.clone());
/// let query = Query::from_source("books", book.clone())
///     .filter(Lambda::new(x.clone(), x.field("Category", ValueType::Str).equals(Expr::constant("Books"))))
///     .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));
///
/// assert_eq!(query.source(), "books");
/// assert_eq!(query.row_type(), &ValueType::Str);
/// assert_eq!(
///     query.expression().to_string(),
///     r#"Select(Where(source(books), x => (x.Category == "Books")), x => x.Title)"#
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Query {
    source: Arc<str>,
    row: ValueType,
    expression: Expr,
}

impl Query {
    /// Starts a query over the source `name` producing rows of type `row`.
    pub fn from_source(name: impl Into<Arc<str>>, row: ValueType) -> Self {
        let source = name.into();
        Self {
            expression: Expr::source(Arc::clone(&source), row.clone()),
            source,
            row,
        }
    }

    /// Keeps the rows for which `predicate` holds.
    #[must_use]
    pub fn filter(self, predicate: Lambda) -> Self {
        let method = Method::where_(self.row.clone());
        Self {
            expression: Expr::call(method, vec![self.expression, predicate.into()]),
            ..self
        }
    }

    /// Projects each row through `selector`.
    #[must_use]
    pub fn select(self, selector: Lambda) -> Self {
        let output = selector.body().ty();
        let method = Method::select(self.row.clone(), output.clone());
        Self {
            expression: Expr::call(method, vec![self.expression, selector.into()]),
            row: output,
            ..self
        }
    }

    /// The name of the source the query reads from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The type of the rows the query produces.
    #[must_use]
    pub fn row_type(&self) -> &ValueType {
        &self.row
    }

    /// The expression tree describing the query.
    #[must_use]
    pub fn expression(&self) -> &Expr {
        &self.expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parameter, QueryOperator};

    #[test]
    fn source_only_query_is_the_source() {
        let query = Query::from_source("books", ValueType::record("Book"));
        assert_eq!(query.expression().to_string(), "source(books)");
        assert!(query.expression().ty().is_queryable());
    }

    #[test]
    fn operators_nest_outward() {
        let book = ValueType::record("Book");
        let x = Parameter::new("x", book.clone());
        let query = Query::from_source("books", book)
            .filter(Lambda::new(x.clone(), x.field("Price", ValueType::Int).greater_than(Expr::constant(3))))
            .select(Lambda::new(x.clone(), x.field("Price", ValueType::Int)));

        let Expr::MethodCall { method, args, .. } = query.expression() else {
            unreachable!("expected a method call, got {}", query.expression());
        };
        assert_eq!(method.operator(), Some(QueryOperator::Select));
        assert_eq!(query.expression().ty(), ValueType::queryable(ValueType::Int));
        let Some(Expr::MethodCall { method: inner, .. }) = args.first() else {
            unreachable!("expected the filter as first argument");
        };
        assert_eq!(inner.operator(), Some(QueryOperator::Where));
    }
}
