// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Value;

/// Separator between extra parameters in a value-based key.
pub const KEY_SEPARATOR: &str = "-";

/// Separator between extra parameters appended to an expression-based key.
pub const PARAM_SEPARATOR: &str = ",";

/// Separator between elements of a collection-literal summary.
pub const SUMMARY_SEPARATOR: &str = "|";

/// Renders a value as key text.
///
/// Scalars use their natural form and `Null` is the empty token. Lists are
/// flattened recursively and their tokens joined with `separator`; an empty
/// nested list contributes no token. Records render as `{field=value,...}` in
/// field order.
///
/// # Examples
///
/// ```
/// use querykey::{Value, stringify};
///
/// let value = Value::from(vec![Value::from(1), Value::from(vec![2, 3]), Value::Null]);
/// assert_eq!(stringify(&value, "-"), "1-2-3-");
/// ```
#[must_use]
pub fn stringify(value: &Value, separator: &str) -> String {
    let mut tokens = Vec::new();
    flatten(value, separator, &mut tokens);
    tokens.join(separator)
}

/// Renders each value with [`stringify`] and joins the results with `separator`.
#[must_use]
pub fn stringify_all(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(|value| stringify(value, separator))
        .collect::<Vec<_>>()
        .join(separator)
}

fn flatten(value: &Value, separator: &str, tokens: &mut Vec<String>) {
    match value {
        Value::List(items) => {
            for item in items {
                flatten(item, separator, tokens);
            }
        }
        Value::Record(fields) => {
            let body = fields
                .iter()
                .map(|(name, field)| format!("{name}={}", stringify(field, separator)))
                .collect::<Vec<_>>()
                .join(",");
            tokens.push(format!("{{{body}}}"));
        }
        scalar => tokens.push(scalar.to_string()),
    }
}
