// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key generators and the fallback policy that chooses between them.

use crate::{
    CacheKey, EvaluationFailure, Expr, KEY_SEPARATOR, KeyError, PARAM_SEPARATOR, Value, hash, partial_eval, rewrite_collections,
    stringify_all,
};

/// Produces the canonical key text for a request.
///
/// The text is hashed by [`derive_key`]; generators never hash themselves.
pub trait KeyGenerator {
    /// Produces key text from the generator's own input plus `params`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the key cannot be produced.
    fn generate(&self, params: &[Value]) -> Result<String, KeyError>;
}

/// Derives key text from the query expression.
///
/// Closed-over values are folded into literals, collection literals are
/// summarized, and the resulting tree is rendered. Extra parameters are
/// appended after a [`PARAM_SEPARATOR`], each rendered as a literal so strings
/// are quoted, `Null` is `null` and lists keep their brackets.
///
/// # Examples
///
/// ```
/// use querykey::{Expr, ExpressionKeyGenerator, KeyGenerator, Lambda, Parameter, Value, ValueType};
///
/// let x = Parameter::new("x", ValueType::record("Book"));
/// let predicate = Expr::from(Lambda::new(x.clone(), x.field("Id", ValueType::Int).equals(Expr::captured_value("id", 7))));
///
/// let text = ExpressionKeyGenerator::new(&predicate).generate(&[Value::from(42)])?;
/// assert_eq!(text, "x => (x.Id == 7),42");
/// # Ok::<(), querykey::KeyError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ExpressionKeyGenerator<'a> {
    expression: &'a Expr,
}

impl<'a> ExpressionKeyGenerator<'a> {
    /// Creates a generator over `expression`.
    #[must_use]
    pub fn new(expression: &'a Expr) -> Self {
        Self { expression }
    }

    fn render(&self) -> Result<String, EvaluationFailure> {
        let folded = partial_eval(self.expression)?;
        Ok(rewrite_collections(&folded).to_string())
    }
}

impl KeyGenerator for ExpressionKeyGenerator<'_> {
    fn generate(&self, params: &[Value]) -> Result<String, KeyError> {
        Ok(append_params(self.render()?, params))
    }
}

fn append_params(mut text: String, params: &[Value]) -> String {
    text.push_str(PARAM_SEPARATOR);
    let rendered: Vec<String> = params.iter().map(|param| param.literal().to_string()).collect();
    text.push_str(&rendered.join(PARAM_SEPARATOR));
    text
}

/// Derives key text from the extra parameters alone, joined with [`KEY_SEPARATOR`].
///
/// # Examples
///
/// ```
/// use querykey::{KeyGenerator, Value, ValueKeyGenerator};
///
/// let text = ValueKeyGenerator.generate(&[Value::from("books"), Value::from(42)])?;
/// assert_eq!(text, "books-42");
/// ValueKeyGenerator.generate(&[]).expect_err("no parameters");
/// # Ok::<(), querykey::KeyError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueKeyGenerator;

impl KeyGenerator for ValueKeyGenerator {
    fn generate(&self, params: &[Value]) -> Result<String, KeyError> {
        if params.is_empty() {
            return Err(KeyError::invalid_argument("a value-based key needs at least one parameter"));
        }
        Ok(stringify_all(params, KEY_SEPARATOR))
    }
}

/// Derives the cache key for a query expression and its extra parameters.
///
/// With an expression, the key is built by [`ExpressionKeyGenerator`]. If a
/// closed sub-tree fails to evaluate, or no expression is given, the key is
/// built by [`ValueKeyGenerator`] from `params` alone.
///
/// # Errors
///
/// Returns [`KeyError`] with [`InvalidArgument`](crate::KeyErrorKind::InvalidArgument)
/// when the value-based path is taken with no parameters.
///
/// # Examples
///
/// ```
/// use querykey::{Value, derive_key};
///
/// let key = derive_key(None, &[Value::from("books"), Value::from(42)])?;
/// assert_eq!(key.as_str().len(), 32);
/// # Ok::<(), querykey::KeyError>(())
/// ```
pub fn derive_key(expression: Option<&Expr>, params: &[Value]) -> Result<CacheKey, KeyError> {
    let text = match expression {
        Some(expression) => match ExpressionKeyGenerator::new(expression).render() {
            Ok(text) => append_params(text, params),
            Err(failure) => {
                log_fallback(&failure);
                ValueKeyGenerator.generate(params)?
            }
        },
        None => ValueKeyGenerator.generate(params)?,
    };
    Ok(hash(&text))
}

#[cfg_attr(not(feature = "logs"), expect(unused_variables, reason = "only read when logging"))]
fn log_fallback(failure: &EvaluationFailure) {
    #[cfg(feature = "logs")]
    tracing::debug!(
        expression = failure.expression(),
        error = %failure,
        "querykey.fallback"
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{KeyErrorKind, Lambda, Parameter, ValueType};

    fn by_category(category: Expr) -> Expr {
        let x = Parameter::new("x", ValueType::record("Book"));
        Lambda::new(x.clone(), x.field("Category", ValueType::Str).equals(category)).into()
    }

    #[test]
    fn expression_params_render_unambiguously() {
        let expr = by_category(Expr::captured_value("category", "Books"));
        let generator = ExpressionKeyGenerator::new(&expr);
        let text = |params: &[Value]| generator.generate(params).expect("expression renders");

        assert_eq!(
            text(&[Value::from("a,b"), Value::Null, Value::from(vec![1, 2])]),
            r#"x => (x.Category == "Books"),"a,b",null,[1, 2]"#
        );
        assert_ne!(text(&[Value::from("a,b")]), text(&[Value::from("a"), Value::from("b")]));
        assert_ne!(text(&[Value::Null]), text(&[Value::from("")]));
        assert_ne!(text(&[Value::from(vec![1, 2])]), text(&[Value::from(1), Value::from(2)]));
    }

    #[test]
    fn expression_text_appends_params() {
        let expr = by_category(Expr::captured_value("category", "Books"));
        let text = ExpressionKeyGenerator::new(&expr)
            .generate(&[Value::from(42), Value::from("en")])
            .expect("expression renders");
        assert_eq!(text, r#"x => (x.Category == "Books"),42,"en""#);
    }

    #[test]
    fn expression_text_without_params_ends_with_separator() {
        let expr = by_category(Expr::constant("Books"));
        let text = ExpressionKeyGenerator::new(&expr).generate(&[]).expect("expression renders");
        assert_eq!(text, r#"x => (x.Category == "Books"),"#);
    }

    #[test]
    fn expression_failure_is_reported_by_generator() {
        let expr = by_category(Expr::captured("category", ValueType::Str, || {
            Err(EvaluationFailure::new("value(category)"))
        }));
        let error = ExpressionKeyGenerator::new(&expr).generate(&[]).expect_err("capture fails");
        assert_eq!(error.kind(), KeyErrorKind::EvaluationFailure);
    }

    #[test]
    fn derive_key_falls_back_to_params() {
        let expr = by_category(Expr::captured("category", ValueType::Str, || {
            Err(EvaluationFailure::new("value(category)"))
        }));
        let params = [Value::from("books"), Value::from(1)];
        let key = derive_key(Some(&expr), &params).expect("fallback succeeds");
        assert_eq!(key, hash("books-1"));
    }

    #[test]
    fn derive_key_fallback_without_params_is_invalid() {
        let expr = by_category(Expr::captured("category", ValueType::Str, || {
            Err(EvaluationFailure::new("value(category)"))
        }));
        let error = derive_key(Some(&expr), &[]).expect_err("nothing to fall back to");
        assert_eq!(error.kind(), KeyErrorKind::InvalidArgument);
    }

    #[test]
    fn derive_key_without_expression_uses_params() {
        let key = derive_key(None, &[Value::from("a")]).expect("params given");
        assert_eq!(key, hash("a"));
        let error = derive_key(None, &[]).expect_err("no params");
        assert_eq!(error.kind(), KeyErrorKind::InvalidArgument);
    }

    #[test]
    fn derive_key_hashes_expression_text() {
        let expr = by_category(Expr::constant("Books"));
        let key = derive_key(Some(&expr), &[Value::from(42)]).expect("expression renders");
        assert_eq!(key, hash(r#"x => (x.Category == "Books"),42"#));
    }
}
