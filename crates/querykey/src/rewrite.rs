// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Collection-literal summaries.
//!
//! Once closed sub-trees are folded, a captured list shows up as a constant
//! operand of a method call such as `Contains`. Rendering it verbatim would make
//! the key grow with the list, so [`rewrite_collections`] replaces such operands
//! with a single string `{a|b|c}`.

use std::convert::Infallible;

use crate::{Expr, SUMMARY_SEPARATOR, Value, ValueType, stringify};

/// Replaces list constants passed where a method declares a sequence operand
/// with a bounded textual summary.
///
/// A call is rebuilt only if every summary is assignable to the operand type it
/// replaces; otherwise that call keeps its operands. Element order is kept, so
/// `[1, 2]` and `[2, 1]` summarize differently.
///
/// # Examples
///
/// ```
/// use querykey::{Expr, Method, Parameter, ValueType, rewrite_collections};
///
/// let x = Parameter::new("x", ValueType::record("Book"));
/// let ids = Expr::typed_constant(vec![1, 2, 3], ValueType::sequence(ValueType::Int));
/// let call = Expr::call(Method::contains(ValueType::Int), vec![ids, x.field("Id", ValueType::Int)]);
///
/// assert_eq!(rewrite_collections(&call).to_string(), r#"Contains("{1|2|3}", x.Id)"#);
/// ```
#[must_use]
pub fn rewrite_collections(expr: &Expr) -> Expr {
    let summarized = summarize_operands(expr);
    let node = summarized.as_ref().unwrap_or(expr);
    let Ok(rewritten) = node.map_children(|_, child| Ok::<_, Infallible>(rewrite_collections(child)));
    rewritten
}

/// Summarizes the list operands of a method call, or returns `None` if the
/// node is left as it is.
fn summarize_operands(expr: &Expr) -> Option<Expr> {
    let Expr::MethodCall { method, instance, .. } = expr else {
        return None;
    };

    let declared: Vec<ValueType> = instance
        .iter()
        .map(|instance| instance.ty())
        .chain(method.params().iter().cloned())
        .collect();

    let replacements: Vec<Option<Expr>> = expr
        .children()
        .into_iter()
        .enumerate()
        .map(|(i, operand)| declared.get(i).filter(|ty| ty.is_sequence()).and_then(|_| summary(operand)))
        .collect();

    if replacements.iter().all(Option::is_none) {
        return None;
    }

    let assignable = replacements
        .iter()
        .zip(&declared)
        .all(|(replacement, ty)| replacement.as_ref().is_none_or(|r| ty.is_assignable_from(&r.ty())));
    if !assignable {
        return None;
    }

    let Ok(rebuilt) = expr.map_children(|i, operand| {
        Ok::<_, Infallible>(replacements.get(i).cloned().flatten().unwrap_or_else(|| operand.clone()))
    });
    Some(rebuilt)
}

fn summary(operand: &Expr) -> Option<Expr> {
    match operand {
        Expr::Constant { value: list @ Value::List(_), .. } => {
            Some(Expr::constant(format!("{{{}}}", stringify(list, SUMMARY_SEPARATOR))))
        }
        _ => None,
    }
}
