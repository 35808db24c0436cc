// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Partial evaluation of expression trees.
//!
//! [`partial_eval`] replaces every maximal sub-tree that neither references the
//! bound parameter nor produces a query with a [`Expr::Constant`] holding its
//! value. It runs in two passes: `nominate` annotates each node with whether it
//! is locally evaluable, then the substitution pass walks top-down and folds the
//! first evaluable node on every path, so nothing below an evaluated node is
//! evaluated twice and no parameter-free leaf inside a parameter-dependent
//! ancestor is folded on its own.
//!
//! The same interpreter evaluates lambdas against a row in [`apply`], which is
//! what in-memory query sources use.

use crate::{BinaryOp, EvaluationFailure, Expr, Lambda, UnaryOp, Value};

/// Evaluability annotation mirroring the shape of an expression tree.
#[derive(Debug)]
struct Nomination {
    evaluable: bool,
    children: Vec<Self>,
}

/// Post-order pass computing [`Nomination`]s.
fn nominate(expr: &Expr) -> Nomination {
    let children: Vec<Nomination> = expr.children().into_iter().map(nominate).collect();
    let evaluable = is_locally_evaluable(expr) && children.iter().all(|child| child.evaluable);
    Nomination { evaluable, children }
}

/// Node-level rule; children are checked by `nominate`.
///
/// Lambdas declare the bound parameter, so they count as depending on it.
fn is_locally_evaluable(expr: &Expr) -> bool {
    !matches!(expr, Expr::Parameter(_) | Expr::Lambda(_)) && !expr.ty().is_queryable()
}

/// Folds every maximal closed sub-tree of `expr` into a constant.
///
/// The input is left untouched; a new tree is returned.
///
/// # Errors
///
/// Returns [`EvaluationFailure`] when a closed sub-tree fails to evaluate, for
/// instance because a captured value can no longer be read.
///
/// # Examples
///
/// ```
/// use querykey::{Expr, Lambda, Parameter, ValueType, partial_eval};
///
/// let x = Parameter::new("x", ValueType::record("Book"));
/// let bound = Expr::constant(5).plus(Expr::constant(3));
/// let predicate = Expr::from(Lambda::new(x.clone(), x.field("Price", ValueType::Int).greater_than(bound)));
///
/// let folded = partial_eval(&predicate)?;
/// assert_eq!(folded.to_string(), "x => (x.Price > 8)");
/// # Ok::<(), querykey::EvaluationFailure>(())
/// ```
pub fn partial_eval(expr: &Expr) -> Result<Expr, EvaluationFailure> {
    let nomination = nominate(expr);
    substitute(expr, &nomination)
}

fn substitute(expr: &Expr, nomination: &Nomination) -> Result<Expr, EvaluationFailure> {
    if nomination.evaluable {
        if matches!(expr, Expr::Constant { .. }) {
            return Ok(expr.clone());
        }
        let value = evaluate(expr)?;
        return Ok(Expr::Constant { value, ty: expr.ty() });
    }

    let mut annotations = nomination.children.iter();
    expr.map_children(|_, child| match annotations.next() {
        Some(annotation) => substitute(child, annotation),
        None => Ok(child.clone()),
    })
}

/// Evaluates a closed expression.
///
/// # Errors
///
/// Returns [`EvaluationFailure`] if the expression references a parameter,
/// contains a query source or lambda, or if any operation fails.
///
/// # Examples
///
/// ```
/// use querykey::{Expr, Value, evaluate};
///
/// let sum = Expr::constant(5).plus(Expr::captured_value("offset", 3));
/// assert_eq!(evaluate(&sum)?, Value::Int(8));
/// # Ok::<(), querykey::EvaluationFailure>(())
/// ```
pub fn evaluate(expr: &Expr) -> Result<Value, EvaluationFailure> {
    evaluate_in(expr, None)
}

/// Evaluates the lambda body with its parameter bound to `argument`.
///
/// # Errors
///
/// Returns [`EvaluationFailure`] if the body cannot be evaluated.
///
/// # Examples
///
/// ```
/// use querykey::{Expr, Lambda, Parameter, Value, ValueType, apply};
///
/// let x = Parameter::new("x", ValueType::record("Book"));
/// let title = Lambda::new(x.clone(), x.field("Title", ValueType::Str));
/// let row = Value::record([("Title", Value::from("Dune"))]);
/// assert_eq!(apply(&title, &row)?, Value::from("Dune"));
/// # Ok::<(), querykey::EvaluationFailure>(())
/// ```
pub fn apply(lambda: &Lambda, argument: &Value) -> Result<Value, EvaluationFailure> {
    evaluate_in(lambda.body(), Some((lambda.param().name(), argument)))
}

type Binding<'a> = Option<(&'a str, &'a Value)>;

fn evaluate_in(expr: &Expr, binding: Binding<'_>) -> Result<Value, EvaluationFailure> {
    match expr {
        Expr::Constant { value, .. } => Ok(value.clone()),
        Expr::Captured(captured) => captured.read(),
        Expr::Parameter(param) => match binding {
            Some((name, value)) if name == param.name() => Ok(value.clone()),
            _ => Err(EvaluationFailure::new(param.name())),
        },
        Expr::Source { .. } | Expr::Lambda(_) => Err(EvaluationFailure::new(expr.to_string())),
        Expr::Member { target, field, .. } => match evaluate_in(target, binding)? {
            Value::Record(fields) => Ok(fields.get(&**field).cloned().unwrap_or_default()),
            Value::Null => Ok(Value::Null),
            _ => Err(EvaluationFailure::new(expr.to_string())),
        },
        Expr::MethodCall { method, instance, args } => {
            let instance = instance.as_deref().map(|i| evaluate_in(i, binding)).transpose()?;
            let args = args
                .iter()
                .map(|arg| evaluate_in(arg, binding))
                .collect::<Result<Vec<_>, _>>()?;
            method.invoke(instance.as_ref(), &args)
        }
        Expr::Unary { op, operand } => {
            let operand = evaluate_in(operand, binding)?;
            unary(*op, &operand).ok_or_else(|| EvaluationFailure::new(expr.to_string()))
        }
        Expr::Binary { op: BinaryOp::And, left, right } => {
            if truth(expr, &evaluate_in(left, binding)?)? == Value::Bool(false) {
                return Ok(Value::Bool(false));
            }
            truth(expr, &evaluate_in(right, binding)?)
        }
        Expr::Binary { op: BinaryOp::Or, left, right } => {
            if truth(expr, &evaluate_in(left, binding)?)? == Value::Bool(true) {
                return Ok(Value::Bool(true));
            }
            truth(expr, &evaluate_in(right, binding)?)
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate_in(left, binding)?;
            let right = evaluate_in(right, binding)?;
            binary(*op, &left, &right).ok_or_else(|| EvaluationFailure::new(expr.to_string()))
        }
    }
}

fn truth(expr: &Expr, value: &Value) -> Result<Value, EvaluationFailure> {
    value
        .as_bool()
        .map(Value::Bool)
        .ok_or_else(|| EvaluationFailure::new(expr.to_string()))
}

fn unary(op: UnaryOp, operand: &Value) -> Option<Value> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int(i)) => i.checked_neg().map(Value::Int),
        (UnaryOp::Negate, Value::Float(x)) => Some(Value::Float(-x)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss, reason = "mixed int/float arithmetic follows float semantics")]
fn binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    use std::cmp::Ordering;

    match op {
        BinaryOp::Eq => Some(Value::Bool(left.compare(right).map_or(left == right, Ordering::is_eq))),
        BinaryOp::Ne => Some(Value::Bool(left.compare(right).map_or(left != right, Ordering::is_ne))),
        BinaryOp::Lt => left.compare(right).map(|o| Value::Bool(o.is_lt())),
        BinaryOp::Le => left.compare(right).map(|o| Value::Bool(o.is_le())),
        BinaryOp::Gt => left.compare(right).map(|o| Value::Bool(o.is_gt())),
        BinaryOp::Ge => left.compare(right).map(|o| Value::Bool(o.is_ge())),
        BinaryOp::And | BinaryOp::Or => None,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (left, right) {
            (Value::Str(a), b) if op == BinaryOp::Add => Some(Value::Str(format!("{a}{b}"))),
            (a, Value::Str(b)) if op == BinaryOp::Add => Some(Value::Str(format!("{a}{b}"))),
            (Value::Int(a), Value::Int(b)) => integer(op, *a, *b).map(Value::Int),
            (Value::Int(a), Value::Float(b)) => Some(Value::Float(float(op, *a as f64, *b))),
            (Value::Float(a), Value::Int(b)) => Some(Value::Float(float(op, *a, *b as f64))),
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(float(op, *a, *b))),
            _ => None,
        },
    }
}

fn integer(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        _ => None,
    }
}

fn float(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Method, Parameter, ValueType};

    fn book() -> Parameter {
        Parameter::new("x", ValueType::record("Book"))
    }

    #[test]
    fn folds_closed_arithmetic_inside_predicate() {
        let x = book();
        let body = x
            .field("Price", ValueType::Int)
            .greater_than(Expr::constant(5).plus(Expr::constant(3)));
        let folded = partial_eval(&Lambda::new(x, body).into()).expect("closed sub-tree evaluates");
        assert_eq!(folded.to_string(), "x => (x.Price > 8)");
    }

    #[test]
    fn leaves_parameter_dependent_predicate_intact() {
        let x = book();
        let body = x
            .field("Price", ValueType::Int)
            .greater_than(x.field("Cost", ValueType::Int));
        let expr: Expr = Lambda::new(x, body).into();
        let folded = partial_eval(&expr).expect("nothing to evaluate");
        assert_eq!(folded.to_string(), expr.to_string());
    }

    #[test]
    fn captured_values_become_literals() {
        let x = book();
        let body = x
            .field("Category", ValueType::Str)
            .equals(Expr::captured_value("category", "Books"));
        let folded = partial_eval(&Lambda::new(x, body).into()).expect("capture reads");
        assert_eq!(folded.to_string(), r#"x => (x.Category == "Books")"#);
    }

    #[test]
    fn evaluates_only_the_maximal_sub_tree() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let capture = Expr::captured("limit", ValueType::Int, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int(2))
        });
        let x = book();
        let body = x
            .field("Price", ValueType::Int)
            .greater_than(capture.plus(Expr::constant(1)).plus(Expr::constant(1)));
        let folded = partial_eval(&Lambda::new(x, body).into()).expect("capture reads");
        assert_eq!(folded.to_string(), "x => (x.Price > 4)");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queryable_sub_trees_are_not_evaluated() {
        let source = Expr::source("books", ValueType::record("Book"));
        let folded = partial_eval(&source).expect("nothing to evaluate");
        assert_eq!(folded.to_string(), "source(books)");

        let nested = Expr::captured("subquery", ValueType::queryable(ValueType::Int), || {
            Err(EvaluationFailure::new("subquery"))
        });
        let folded = partial_eval(&nested).expect("query-typed captures stay structural");
        assert_eq!(folded.to_string(), "value(subquery)");
    }

    #[test]
    fn failing_capture_surfaces_failure() {
        let x = book();
        let capture = Expr::captured("session", ValueType::Int, || {
            Err(EvaluationFailure::from_message("value(session)", "session closed"))
        });
        let body = x.field("Owner", ValueType::Int).equals(capture);
        let failure = partial_eval(&Lambda::new(x, body).into()).expect_err("capture fails");
        assert_eq!(failure.expression(), "value(session)");
    }

    #[test]
    fn original_tree_is_not_mutated() {
        let x = book();
        let expr: Expr = Lambda::new(x.clone(), x.field("Id", ValueType::Int).equals(Expr::captured_value("id", 7))).into();
        let _folded = partial_eval(&expr).expect("capture reads");
        assert_eq!(expr.to_string(), "x => (x.Id == value(id))");
    }

    #[test]
    fn folds_method_calls_without_parameters() {
        let call = Expr::constant("BOOKS").call_on(Method::to_lowercase(), Vec::new());
        let folded = partial_eval(&call).expect("method runs");
        assert_eq!(folded.to_string(), r#""books""#);
    }

    #[test]
    fn apply_binds_parameter() {
        let x = book();
        let predicate = Lambda::new(
            x.clone(),
            x.field("Price", ValueType::Int)
                .greater_than(Expr::constant(10))
                .and(x.field("Category", ValueType::Str).equals(Expr::constant("Books"))),
        );
        let cheap = Value::record([("Price", Value::from(5)), ("Category", Value::from("Books"))]);
        let pricey = Value::record([("Price", Value::from(15)), ("Category", Value::from("Books"))]);
        assert_eq!(apply(&predicate, &cheap).expect("evaluates"), Value::Bool(false));
        assert_eq!(apply(&predicate, &pricey).expect("evaluates"), Value::Bool(true));
    }

    #[test]
    fn unbound_parameter_fails() {
        let x = book();
        let failure = evaluate(&x.field("Id", ValueType::Int)).expect_err("parameter is unbound");
        assert_eq!(failure.expression(), "x");
    }

    #[test]
    fn arithmetic_covers_mixed_operands() {
        assert_eq!(evaluate(&Expr::constant(1).plus(Expr::constant(0.5))).expect("adds"), Value::Float(1.5));
        assert_eq!(evaluate(&Expr::constant("id-").plus(Expr::constant(7))).expect("concats"), Value::from("id-7"));
        evaluate(&Expr::binary(BinaryOp::Div, Expr::constant(1), Expr::constant(0))).expect_err("division by zero");
        assert_eq!(evaluate(&Expr::constant(true).logical_not()).expect("negates"), Value::Bool(false));
    }

    #[test]
    fn logic_rejects_non_boolean_operands() {
        let five_and_true = Expr::constant(5).and(Expr::constant(true));
        evaluate(&five_and_true).expect_err("left operand is not a boolean");
        partial_eval(&five_and_true).expect_err("closed sub-tree is not folded");

        let five_or_false = Expr::binary(BinaryOp::Or, Expr::constant(5), Expr::constant(false));
        evaluate(&five_or_false).expect_err("left operand is not a boolean");

        let short_circuit = Expr::constant(false).and(Expr::constant(5));
        assert_eq!(evaluate(&short_circuit).expect("right side is skipped"), Value::Bool(false));
    }
}
